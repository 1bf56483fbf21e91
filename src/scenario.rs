use crate::builders::{Deployment, default_catalogue};
use crate::command::CommandCatalogue;
use crate::config::ScenarioConfig;
use crate::core::{Address, EngineError, Result};
use crate::event::{Event, parse_event, parse_script};
use crate::state::{Applied, RunState};
use tracing::{info, warn};

/// Drives a scenario: routes each statement to its command word and threads
/// the resulting snapshot into the next statement.
///
/// Statements look like `<Word> <Shape> args…`, optionally prefixed with
/// `From <Account>` to run a single statement as another actor.
pub struct Scenario {
    catalogue: CommandCatalogue<Deployment>,
    state: RunState,
    actor: Address,
}

/// Where a script stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioFailure {
    pub line: usize,
    pub statement: String,
    pub error: EngineError,
}

#[derive(Debug, Clone)]
pub struct ScenarioReport {
    /// Statements applied successfully
    pub applied: usize,
    pub failure: Option<ScenarioFailure>,
    /// Last good snapshot: the state before the failing statement, if any
    pub state: RunState,
}

impl ScenarioReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

impl Scenario {
    pub fn new(config: &ScenarioConfig) -> Result<Self> {
        let catalogue = default_catalogue(config.strictness)?;
        Self::with_catalogue(config, catalogue)
    }

    pub fn with_catalogue(
        config: &ScenarioConfig,
        catalogue: CommandCatalogue<Deployment>,
    ) -> Result<Self> {
        Ok(Self {
            catalogue,
            state: RunState::new(config.environment()?),
            actor: config.actor()?,
        })
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn actor(&self) -> &Address {
        &self.actor
    }

    pub fn catalogue(&self) -> &CommandCatalogue<Deployment> {
        &self.catalogue
    }

    /// Apply one statement. On failure the current snapshot is kept.
    pub async fn apply_event(&mut self, statement: &Event) -> Result<Applied<Deployment>> {
        let (actor, command) = self.split_actor(statement)?;
        let (word, args) = match command {
            [Event::Atom(word), args @ ..] => (word.as_str(), args),
            _ => {
                return Err(EngineError::Parse(format!(
                    "statement '{}' has no command word",
                    statement.to_line()
                )));
            }
        };
        let resolver = self.catalogue.resolver(word)?;
        let rest = Event::List(args.to_vec());

        let applied = self.state.apply(&actor, resolver, &rest).await?;
        self.state = applied.state.clone();
        Ok(applied)
    }

    pub async fn apply_line(&mut self, line: &str) -> Result<Applied<Deployment>> {
        let statement = parse_event(line)?;
        self.apply_event(&statement).await
    }

    /// Apply every statement of `script` in order, stopping at the first failure.
    pub async fn run_script(&mut self, script: &str) -> ScenarioReport {
        let statements = match parse_script(script) {
            Ok(statements) => statements,
            Err(error) => {
                return ScenarioReport {
                    applied: 0,
                    failure: Some(ScenarioFailure {
                        line: 0,
                        statement: String::new(),
                        error,
                    }),
                    state: self.state.clone(),
                };
            }
        };

        let mut applied = 0;
        for (line, statement) in statements {
            match self.apply_event(&statement).await {
                Ok(result) => {
                    applied += 1;
                    info!(line, entry = %result.value.handle.address, "statement applied");
                }
                Err(error) => {
                    warn!(line, error = %error, "scenario aborted");
                    return ScenarioReport {
                        applied,
                        failure: Some(ScenarioFailure {
                            line,
                            statement: statement.to_line(),
                            error,
                        }),
                        state: self.state.clone(),
                    };
                }
            }
        }

        ScenarioReport {
            applied,
            failure: None,
            state: self.state.clone(),
        }
    }

    fn split_actor<'e>(&self, statement: &'e Event) -> Result<(Address, &'e [Event])> {
        let items = statement.items();
        match items {
            [Event::Atom(from), who, rest @ ..] if from == "From" => {
                let alias = who
                    .as_atom()
                    .ok_or_else(|| EngineError::Parse(format!("bad actor '{}'", who)))?;
                let actor = Address::parse(alias)
                    .or_else(|| self.state.account(alias).cloned())
                    .ok_or_else(|| EngineError::Parse(format!("unknown actor '{}'", alias)))?;
                Ok((actor, rest))
            }
            _ => Ok((self.actor.clone(), items)),
        }
    }
}
