use super::{Deployment, deploy_contract};
use crate::coerce::{AddressCoercer, EventCoercer};
use crate::command::{Arg, BoundArguments, CommandResolver, CommandShape, Strictness};
use crate::core::{Address, DeclarationError, EngineError, HandlerError, Result};
use crate::event::Event;
use crate::outcome::Outcome;
use crate::registry::IndexedData;
use crate::state::{Applied, RunState};
use futures::FutureExt;
use serde_json::json;

pub const PRICE_ORACLE_PROXY: &str = "PriceOracleProxy";

/// Markets the proxy is wired to, in constructor order after the guardian
/// and the backing oracle.
const MARKETS: [&str; 5] = ["vBNB", "vUSDC", "vSAI", "vDAI", "vUSDT"];

/// Catch-all fetcher for the proxy's constructor arguments. It binds the
/// bare argument list (`Admin (PriceOracle Address) vBNB …`), with no
/// command word in front.
pub fn price_oracle_proxy_fetcher(
    strictness: Strictness,
) -> std::result::Result<CommandResolver<Deployment>, DeclarationError> {
    let mut args = vec![
        Arg::new("guardian", AddressCoercer),
        Arg::new("priceOracle", AddressCoercer),
    ];
    args.extend(MARKETS.iter().map(|market| Arg::new(*market, AddressCoercer)));

    let fetcher = CommandShape::new(
        "Price oracle proxy constructor arguments",
        PRICE_ORACLE_PROXY,
        args,
        |state, from, args| deploy_price_oracle_proxy(state, from, args).boxed(),
    )?
    .catch_all();

    CommandResolver::with_shapes(PRICE_ORACLE_PROXY, strictness, vec![fetcher])
}

/// `PriceOracleProxy Deploy …params`: hands the params to the fetcher.
pub fn price_oracle_proxy_shapes(
    strictness: Strictness,
) -> std::result::Result<Vec<CommandShape<Deployment>>, DeclarationError> {
    let fetcher = price_oracle_proxy_fetcher(strictness)?;

    let deploy = CommandShape::new(
        r#"
        #### Deploy

        Deploys the price oracle that proxies to a backing oracle.
        Params: <guardian> <priceOracle> <vBNB> <vUSDC> <vSAI> <vDAI> <vUSDT>
        E.g. "PriceOracleProxy Deploy Admin (PriceOracle Address) vBNB vUSDC vSAI vDAI vUSDT"
        "#,
        "Deploy",
        vec![Arg::new("params", EventCoercer).catch_all()],
        move |state, from, args| {
            let fetcher = fetcher.clone();
            async move { fetch_and_deploy(&fetcher, state, from, args).await }.boxed()
        },
    )?;
    Ok(vec![deploy])
}

pub fn price_oracle_proxy_resolver(
    strictness: Strictness,
) -> std::result::Result<CommandResolver<Deployment>, DeclarationError> {
    CommandResolver::with_shapes(
        PRICE_ORACLE_PROXY,
        strictness,
        price_oracle_proxy_shapes(strictness)?,
    )
}

/// Bind `params` (the constructor arguments alone) with the catch-all
/// fetcher, deploy, and fold the result.
pub async fn build_price_oracle_proxy(
    state: &RunState,
    from: &Address,
    params: &Event,
) -> Result<Applied<Deployment>> {
    let fetcher = price_oracle_proxy_fetcher(Strictness::Strict)?;
    state.apply(from, &fetcher, params).await
}

async fn fetch_and_deploy(
    fetcher: &CommandResolver<Deployment>,
    state: RunState,
    from: Address,
    args: BoundArguments,
) -> Outcome<Deployment> {
    let params = match args.event("params") {
        Ok(params) => params.clone(),
        Err(err) => return Outcome::failure(err),
    };

    match fetcher.dispatch(&state, &from, &params).await {
        Ok(outcome) => outcome,
        Err(EngineError::Bind(err)) => Outcome::failure(HandlerError::Arguments(err)),
        Err(err) => Outcome::failure(HandlerError::Failed(err.to_string())),
    }
}

async fn deploy_price_oracle_proxy(
    state: RunState,
    from: Address,
    args: BoundArguments,
) -> Outcome<Deployment> {
    let markets = match MARKETS
        .iter()
        .map(|market| args.address(market).map(|address| (*market, address.clone())))
        .collect::<std::result::Result<Vec<_>, _>>()
    {
        Ok(markets) => markets,
        Err(err) => return Outcome::failure(err),
    };

    deploy_contract(
        &state,
        &from,
        PRICE_ORACLE_PROXY,
        "Price Oracle Proxy",
        args.values(),
        |handle| {
            let mut data = json!({
                "description": "Price Oracle Proxy",
                "address": handle.address,
            });
            for (market, address) in markets {
                data[market] = json!(address);
            }
            vec![
                IndexedData::new([PRICE_ORACLE_PROXY], data.clone()),
                IndexedData::new(["Contracts", PRICE_ORACLE_PROXY], data),
            ]
        },
    )
    .await
}
