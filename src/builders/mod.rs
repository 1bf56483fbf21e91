//! Command definitions built on the engine. Each builder is a client: it
//! declares shapes and a handler, and leaves resolution and folding to the
//! engine.

pub mod contract;
pub mod price_oracle_proxy;
pub mod token;

use crate::command::{CommandCatalogue, Strictness};
use crate::core::{Address, DeclarationError, Value};
use crate::outcome::Outcome;
use crate::registry::{Handle, IndexedData};
use crate::state::{Registrable, RunState};

/// A deployed contract together with the index views it is published under.
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    pub handle: Handle,
    pub description: String,
    pub index: Vec<IndexedData>,
}

impl Registrable for Deployment {
    fn handle(&self) -> &Handle {
        &self.handle
    }

    fn index(&self) -> Vec<IndexedData> {
        self.index.clone()
    }
}

/// Deploy `contract` through the run's deployer and describe the result.
/// `index` receives the fresh handle and returns the views to publish.
pub(crate) async fn deploy_contract<F>(
    state: &RunState,
    from: &Address,
    contract: &str,
    description: &str,
    arguments: Vec<Value>,
    index: F,
) -> Outcome<Deployment>
where
    F: FnOnce(&Handle) -> Vec<IndexedData>,
{
    state
        .environment()
        .deployer()
        .deploy(contract, from, arguments)
        .await
        .map(|handle, _| Deployment {
            index: index(&handle),
            description: description.to_string(),
            handle,
        })
}

/// Catalogue with every built-in command word.
pub fn default_catalogue(
    strictness: Strictness,
) -> Result<CommandCatalogue<Deployment>, DeclarationError> {
    let mut catalogue = CommandCatalogue::new();
    catalogue.register(contract::contract_resolver(strictness)?)?;
    catalogue.register(token::token_resolver(strictness)?)?;
    catalogue.register(price_oracle_proxy::price_oracle_proxy_resolver(strictness)?)?;
    Ok(catalogue)
}
