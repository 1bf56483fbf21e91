use super::{Deployment, deploy_contract};
use crate::coerce::{NumberCoercer, TextCoercer};
use crate::command::{Arg, BoundArguments, CommandResolver, CommandShape, Strictness};
use crate::core::{Address, DeclarationError, Value};
use crate::outcome::Outcome;
use crate::registry::IndexedData;
use crate::state::RunState;
use futures::FutureExt;
use serde_json::json;

pub const TOKEN: &str = "Token";
const DEFAULT_DECIMALS: u128 = 18;

/// Two overloads of `Token Deploy`; the explicit-decimals form is declared
/// first so it wins whenever three tokens are given.
pub fn token_shapes() -> Result<Vec<CommandShape<Deployment>>, DeclarationError> {
    let with_decimals = CommandShape::new(
        "Deploys an ERC-20 style token with explicit decimals",
        "Deploy",
        vec![
            Arg::new("symbol", TextCoercer),
            Arg::new("name", TextCoercer),
            Arg::new("decimals", NumberCoercer),
        ],
        |state, from, args| deploy_token(state, from, args).boxed(),
    )?;

    let standard = CommandShape::new(
        "Deploys an ERC-20 style token with 18 decimals",
        "Deploy",
        vec![Arg::new("symbol", TextCoercer), Arg::new("name", TextCoercer)],
        |state, from, args| deploy_token(state, from, args).boxed(),
    )?;

    Ok(vec![with_decimals, standard])
}

pub fn token_resolver(strictness: Strictness) -> Result<CommandResolver<Deployment>, DeclarationError> {
    CommandResolver::with_shapes(TOKEN, strictness, token_shapes()?)
}

async fn deploy_token(state: RunState, from: Address, args: BoundArguments) -> Outcome<Deployment> {
    let (symbol, name) = match (args.text("symbol"), args.text("name")) {
        (Ok(symbol), Ok(name)) => (symbol.to_string(), name.to_string()),
        (Err(err), _) | (_, Err(err)) => return Outcome::failure(err),
    };
    let decimals = if args.contains("decimals") {
        match args.number("decimals") {
            Ok(decimals) => decimals,
            Err(err) => return Outcome::failure(err),
        }
    } else {
        DEFAULT_DECIMALS
    };

    let arguments = vec![
        Value::Text(name.clone()),
        Value::Text(symbol.clone()),
        Value::Number(decimals),
    ];

    deploy_contract(&state, &from, TOKEN, &name, arguments, |handle| {
        let data = json!({
            "symbol": symbol,
            "name": name,
            "decimals": decimals.to_string(),
            "address": handle.address,
        });
        vec![
            IndexedData::new([symbol.as_str()], data.clone()),
            IndexedData::new(["Tokens", symbol.as_str()], data),
        ]
    })
    .await
}
