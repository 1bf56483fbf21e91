use crate::command::CommandResolver;
use crate::core::{Address, FoldError, Result};
use crate::deploy::Deployer;
use crate::event::Event;
use crate::outcome::CausalRecord;
use crate::registry::{Handle, IndexedData, Registry, RegistryEntry};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, Level, event, info_span};
use uuid::Uuid;

/// Process-wide context shared by every snapshot of a run.
pub struct Environment {
    pub network: String,
    accounts: BTreeMap<String, Address>,
    deployer: Arc<dyn Deployer>,
}

impl Environment {
    pub fn new(network: impl Into<String>, deployer: Arc<dyn Deployer>) -> Self {
        Self {
            network: network.into(),
            accounts: BTreeMap::new(),
            deployer,
        }
    }

    /// Register an account alias such as `Admin`.
    pub fn with_account(mut self, alias: impl Into<String>, address: Address) -> Self {
        self.accounts.insert(alias.into(), address);
        self
    }

    pub fn account(&self, alias: &str) -> Option<&Address> {
        self.accounts.get(alias)
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&str, &Address)> {
        self.accounts.iter().map(|(alias, address)| (alias.as_str(), address))
    }

    pub fn deployer(&self) -> &Arc<dyn Deployer> {
        &self.deployer
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("network", &self.network)
            .field("accounts", &self.accounts)
            .finish_non_exhaustive()
    }
}

/// A value a command produces that can be folded into the registry.
pub trait Registrable: Send + 'static {
    fn handle(&self) -> &Handle;

    /// Index views to publish the entity under.
    fn index(&self) -> Vec<IndexedData>;

    /// Registry entry name; defaults to the handle's address.
    fn entry_name(&self) -> String {
        self.handle().address.to_string()
    }
}

/// Result of applying one command: the next snapshot and what was produced.
#[derive(Debug, Clone)]
pub struct Applied<T> {
    pub state: RunState,
    pub value: T,
    pub record: CausalRecord,
}

/// Immutable snapshot of a run. Every successful command yields a new
/// snapshot; older snapshots remain valid and unchanged.
#[derive(Debug, Clone)]
pub struct RunState {
    run_id: Uuid,
    registry: Registry,
    environment: Arc<Environment>,
    sequence: u64,
    history: im::Vector<String>,
}

impl PartialEq for RunState {
    fn eq(&self, other: &Self) -> bool {
        self.run_id == other.run_id
            && self.sequence == other.sequence
            && Arc::ptr_eq(&self.environment, &other.environment)
            && self.registry == other.registry
            && self.history == other.history
    }
}

impl RunState {
    pub fn new(environment: Environment) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            registry: Registry::new(),
            environment: Arc::new(environment),
            sequence: 0,
            history: im::Vector::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Number of commands folded so far.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Text of every applied statement, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    pub fn account(&self, alias: &str) -> Option<&Address> {
        self.environment.account(alias)
    }

    /// Resolve a name to an address: account alias, then registry.
    pub fn resolve_address(&self, name: &str) -> Option<&Address> {
        self.account(name)
            .or_else(|| self.registry.resolve_address(name))
    }

    /// Fold one produced entity into a new snapshot. This is the only way a
    /// `RunState` gains entries.
    pub fn fold(
        &self,
        statement: impl Into<String>,
        name: impl Into<String>,
        handle: Handle,
        record: CausalRecord,
        metadata: Vec<IndexedData>,
    ) -> std::result::Result<RunState, FoldError> {
        let sequence = self.sequence + 1;
        let registry = self.registry.with_entry(RegistryEntry {
            name: name.into(),
            handle,
            record,
            metadata,
            sequence,
        })?;

        let mut history = self.history.clone();
        history.push_back(statement.into());

        Ok(RunState {
            run_id: self.run_id,
            registry,
            environment: Arc::clone(&self.environment),
            sequence,
            history,
        })
    }

    /// Apply one command: resolve `event` against `resolver`, run the matched
    /// handler as `actor`, and fold its product. Any failure leaves `self`
    /// as the current snapshot; nothing is partially applied.
    pub async fn apply<T: Registrable>(
        &self,
        actor: &Address,
        resolver: &CommandResolver<T>,
        statement: &Event,
    ) -> Result<Applied<T>> {
        let span = info_span!(
            "apply",
            command = %resolver.name(),
            sequence = self.sequence + 1
        );

        async move {
            let (value, record) = resolver.resolve(self, actor, statement).await?;
            let state = self.fold(
                format!("{} {}", resolver.name(), statement.to_line()),
                value.entry_name(),
                value.handle().clone(),
                record.clone(),
                value.index(),
            )?;
            event!(
                Level::INFO,
                entry = %value.entry_name(),
                entries = state.registry.len(),
                "command folded"
            );
            Ok(Applied {
                state,
                value,
                record,
            })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
pub(crate) fn test_state() -> RunState {
    use crate::deploy::SimulatedDeployer;

    RunState::new(
        Environment::new("test", Arc::new(SimulatedDeployer::new(0x1000)))
            .with_account("Admin", Address::from_index(1))
            .with_account("Guardian", Address::from_index(2)),
    )
}
