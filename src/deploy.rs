use crate::core::{Address, HandlerError, Value};
use crate::outcome::{CausalRecord, Outcome};
use crate::registry::Handle;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Backend that turns a constructor call into a live contract.
#[async_trait]
pub trait Deployer: Send + Sync {
    async fn deploy(&self, contract: &str, from: &Address, arguments: Vec<Value>) -> Outcome<Handle>;
}

/// In-process deployer: hands out sequential addresses and can be told to
/// reject particular contracts.
pub struct SimulatedDeployer {
    next_address: AtomicU64,
    rejected: HashSet<String>,
}

impl SimulatedDeployer {
    pub fn new(first_address: u64) -> Self {
        Self {
            next_address: AtomicU64::new(first_address),
            rejected: HashSet::new(),
        }
    }

    pub fn rejecting<I, S>(mut self, contracts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rejected.extend(contracts.into_iter().map(Into::into));
        self
    }

    /// Address the next successful deploy will receive.
    pub fn peek_next(&self) -> Address {
        Address::from_index(self.next_address.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl Deployer for SimulatedDeployer {
    async fn deploy(&self, contract: &str, from: &Address, arguments: Vec<Value>) -> Outcome<Handle> {
        let record = CausalRecord::new(contract, from.clone(), arguments);

        if self.rejected.contains(contract) {
            warn!(contract, from = %from, "deploy rejected");
            return Outcome::failure_with_record(
                HandlerError::Rejected {
                    contract: contract.to_string(),
                    reason: "contract is on the reject list".to_string(),
                },
                record,
            );
        }

        let address = Address::from_index(self.next_address.fetch_add(1, Ordering::SeqCst));
        debug!(contract, address = %address, "contract deployed");
        Outcome::success(Handle::new(contract, address), record)
    }
}
