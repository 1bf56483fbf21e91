use crate::core::{CoercionError, DeclarationError, Value};
use crate::event::Event;
use crate::state::RunState;
use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Turns one event item into a typed value.
///
/// A catch-all argument's coercer receives every remaining token wrapped in a
/// single `Event::List`; an implicit argument's coercer receives an empty list.
#[async_trait]
pub trait Coercer: Send + Sync {
    /// Kind shown in usage strings, e.g. `Address`.
    fn kind(&self) -> &'static str;

    async fn coerce(&self, state: &RunState, event: &Event) -> Result<Value, CoercionError>;
}

/// Argument declaration of a command shape.
#[derive(Clone)]
pub struct Arg {
    pub name: String,
    coercer: Arc<dyn Coercer>,
    pub optional: bool,
    pub default: Option<Value>,
    pub catch_all: bool,
    pub implicit: bool,
}

impl Arg {
    pub fn new(name: impl Into<String>, coercer: impl Coercer + 'static) -> Self {
        Self::with_coercer(name, Arc::new(coercer))
    }

    pub fn with_coercer(name: impl Into<String>, coercer: Arc<dyn Coercer>) -> Self {
        Self {
            name: name.into(),
            coercer,
            optional: false,
            default: None,
            catch_all: false,
            implicit: false,
        }
    }

    /// An absent token leaves the argument unbound.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// An absent token binds `value` instead.
    pub fn default_value(mut self, value: Value) -> Self {
        self.optional = true;
        self.default = Some(value);
        self
    }

    /// Absorb every remaining token as one aggregate.
    pub fn catch_all(mut self) -> Self {
        self.catch_all = true;
        self
    }

    /// Consume no token; the value is derived from the run state.
    pub fn implicit(mut self) -> Self {
        self.implicit = true;
        self
    }

    pub fn coercer(&self) -> &dyn Coercer {
        self.coercer.as_ref()
    }

    /// Whether this declaration takes exactly one positional token.
    pub fn is_positional(&self) -> bool {
        !self.implicit && !self.catch_all
    }

    pub fn usage(&self) -> Option<String> {
        if self.implicit {
            return None;
        }
        let kind = self.coercer.kind();
        Some(if self.catch_all {
            format!("<{}:{}...>", self.name, kind)
        } else if self.optional {
            format!("[{}:{}]", self.name, kind)
        } else {
            format!("<{}:{}>", self.name, kind)
        })
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arg")
            .field("name", &self.name)
            .field("kind", &self.coercer.kind())
            .field("optional", &self.optional)
            .field("default", &self.default)
            .field("catch_all", &self.catch_all)
            .field("implicit", &self.implicit)
            .finish()
    }
}

/// Check a declaration list before any event is bound against it.
pub fn validate_declarations(args: &[Arg]) -> Result<(), DeclarationError> {
    let mut seen = HashSet::new();
    let mut saw_optional = false;

    for (idx, arg) in args.iter().enumerate() {
        if !seen.insert(arg.name.as_str()) {
            return Err(DeclarationError::DuplicateArgument(arg.name.clone()));
        }
        if arg.catch_all && idx + 1 != args.len() {
            return Err(DeclarationError::CatchAllNotLast(arg.name.clone()));
        }
        if !arg.is_positional() {
            continue;
        }
        if arg.optional {
            saw_optional = true;
        } else if saw_optional {
            return Err(DeclarationError::RequiredAfterOptional(arg.name.clone()));
        }
    }

    Ok(())
}
