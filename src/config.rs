use crate::command::Strictness;
use crate::core::{Address, EngineError, Result};
use crate::deploy::SimulatedDeployer;
use crate::state::Environment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Scenario run configuration
///
/// Loaded from JSON or assembled with the builder methods:
///
/// ```json
/// {
///   "network": "development",
///   "accounts": { "Admin": "0x01", "Guardian": "0x02" },
///   "default_actor": "Admin",
///   "strictness": "strict",
///   "rejected_contracts": ["Comptroller"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Network name exposed to commands
    pub network: String,

    /// Account aliases usable wherever an address is expected
    pub accounts: BTreeMap<String, String>,

    /// Alias or literal address commands run as
    pub default_actor: String,

    /// Catch-all resolution policy
    pub strictness: Strictness,

    /// Contracts the simulated deployer refuses
    pub rejected_contracts: Vec<String>,

    /// First address the simulated deployer hands out
    pub first_address: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        let mut accounts = BTreeMap::new();
        accounts.insert("Admin".to_string(), Address::from_index(1).to_string());
        accounts.insert("Guardian".to_string(), Address::from_index(2).to_string());

        Self {
            network: "development".to_string(),
            accounts,
            default_actor: "Admin".to_string(),
            strictness: Strictness::Strict,
            rejected_contracts: Vec::new(),
            first_address: 0x1000,
        }
    }
}

impl ScenarioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the network name
    pub fn network(mut self, network: &str) -> Self {
        self.network = network.to_string();
        self
    }

    /// Add or replace an account alias
    pub fn account(mut self, alias: &str, address: &str) -> Self {
        self.accounts.insert(alias.to_string(), address.to_string());
        self
    }

    /// Set the acting account
    pub fn default_actor(mut self, actor: &str) -> Self {
        self.default_actor = actor.to_string();
        self
    }

    /// Set catch-all resolution strictness
    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Make the simulated deployer reject a contract
    pub fn reject_contract(mut self, contract: &str) -> Self {
        self.rejected_contracts.push(contract.to_string());
        self
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Build the run environment with a simulated deployer.
    pub fn environment(&self) -> Result<Environment> {
        let deployer = SimulatedDeployer::new(self.first_address)
            .rejecting(self.rejected_contracts.iter().cloned());
        let mut environment = Environment::new(&self.network, Arc::new(deployer));

        for (alias, literal) in &self.accounts {
            let address = Address::parse(literal).ok_or_else(|| {
                EngineError::Config(format!("account '{}' has invalid address '{}'", alias, literal))
            })?;
            environment = environment.with_account(alias, address);
        }

        Ok(environment)
    }

    /// Resolve `default_actor` against the configured accounts.
    pub fn actor(&self) -> Result<Address> {
        if let Some(address) = Address::parse(&self.default_actor) {
            return Ok(address);
        }
        self.accounts
            .get(&self.default_actor)
            .and_then(|literal| Address::parse(literal))
            .ok_or_else(|| {
                EngineError::Config(format!("unknown default actor '{}'", self.default_actor))
            })
    }
}
