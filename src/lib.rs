// ============================================================================
// Scenario Engine Library
// ============================================================================

pub mod core;
pub mod event;
pub mod command;
pub mod coerce;
pub mod outcome;
pub mod registry;
pub mod state;
pub mod deploy;
pub mod builders;
pub mod config;
pub mod scenario;

// Re-export main types for convenience
pub use crate::core::{
    Address, BindError, CoercionError, DeclarationError, EngineError, FoldError, HandlerError,
    ResolutionError, Result, Value,
};
pub use event::{Event, parse_event, parse_script};
pub use command::{
    Arg, ArgumentBinder, BoundArguments, Coercer, CommandCatalogue, CommandResolver,
    CommandShape, ShapeOptions, Strictness,
};
pub use outcome::{CausalRecord, Outcome};
pub use registry::{Handle, IndexedData, Registry, RegistryEntry};
pub use state::{Applied, Environment, Registrable, RunState};
pub use deploy::{Deployer, SimulatedDeployer};
pub use config::ScenarioConfig;

// ============================================================================
// High-level Scenario API
// ============================================================================

/// Scenario runner with the built-in command catalogue
///
/// This is the recommended entry point: it owns the current run snapshot and
/// threads it from statement to statement.
///
/// # Examples
///
/// ```ignore
/// use scenario_engine::{Scenario, ScenarioConfig};
///
/// # async fn run() -> scenario_engine::Result<()> {
/// let mut scenario = Scenario::new(&ScenarioConfig::default())?;
///
/// scenario.apply_line("Token Deploy vBNB \"Venus BNB\" 8").await?;
/// let proxy = scenario
///     .apply_line("PriceOracleProxy Deploy Admin Guardian vBNB vBNB vBNB vBNB vBNB")
///     .await?;
///
/// println!("proxy deployed at {}", proxy.value.handle.address);
/// # Ok(())
/// # }
/// ```
pub use scenario::{Scenario, ScenarioFailure, ScenarioReport};
