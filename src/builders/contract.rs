use super::{Deployment, deploy_contract};
use crate::coerce::{EachCoercer, NetworkCoercer, TextCoercer};
use crate::command::{Arg, BoundArguments, CommandResolver, CommandShape, Strictness};
use crate::core::{Address, DeclarationError};
use crate::outcome::Outcome;
use crate::registry::IndexedData;
use crate::state::RunState;
use futures::FutureExt;
use serde_json::json;

pub const CONTRACT: &str = "Contract";

pub fn contract_shapes() -> Result<Vec<CommandShape<Deployment>>, DeclarationError> {
    let shape = CommandShape::new(
        r#"
        #### Contract

        Deploys any contract by name and publishes it under a label.
        E.g. "Contract Deploy SimplePriceOracle PriceOracle"
        "#,
        "Deploy",
        vec![
            Arg::new("contract", TextCoercer),
            Arg::new("label", TextCoercer),
            Arg::new("network", NetworkCoercer).implicit(),
            Arg::new("arguments", EachCoercer::addresses()).catch_all(),
        ],
        |state, from, args| deploy_labelled(state, from, args).boxed(),
    )?;
    Ok(vec![shape])
}

pub fn contract_resolver(strictness: Strictness) -> Result<CommandResolver<Deployment>, DeclarationError> {
    CommandResolver::with_shapes(CONTRACT, strictness, contract_shapes()?)
}

async fn deploy_labelled(state: RunState, from: Address, args: BoundArguments) -> Outcome<Deployment> {
    let (contract, label, network, arguments) = match (
        args.text("contract"),
        args.text("label"),
        args.text("network"),
        args.list("arguments"),
    ) {
        (Ok(contract), Ok(label), Ok(network), Ok(arguments)) => (
            contract.to_string(),
            label.to_string(),
            network.to_string(),
            arguments.to_vec(),
        ),
        (Err(err), _, _, _) | (_, Err(err), _, _) | (_, _, Err(err), _) | (_, _, _, Err(err)) => {
            return Outcome::failure(err);
        }
    };

    deploy_contract(&state, &from, &contract, &label, arguments, |handle| {
        let data = json!({
            "contract": contract,
            "label": label,
            "network": network,
            "address": handle.address,
        });
        vec![
            IndexedData::new([label.as_str()], data.clone()),
            IndexedData::new(["Contracts", label.as_str()], data),
        ]
    })
    .await
}
