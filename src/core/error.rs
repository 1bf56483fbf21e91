use thiserror::Error;

/// A single token could not be turned into a typed value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error("expected {expected}, got '{found}'")]
    Mismatch { expected: &'static str, found: String },

    #[error("unknown name '{0}'")]
    UnknownName(String),

    #[error("{0}")]
    Invalid(String),
}

/// An argument declaration list is malformed. Raised when a shape is built,
/// never while an event is being bound.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("catch-all argument <{0}> must be the last declaration")]
    CatchAllNotLast(String),

    #[error("argument <{0}> is declared twice")]
    DuplicateArgument(String),

    #[error("required argument <{0}> follows an optional one")]
    RequiredAfterOptional(String),

    #[error("command '{0}' is registered twice")]
    DuplicateCommand(String),

    #[error("command '{0}' mixes a catch-all shape with other shapes under strict resolution")]
    CatchAllConflict(String),
}

/// Tokens could not be bound to a shape's declarations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("expected command '{expected}', got '{found}'")]
    NameMismatch { expected: String, found: String },

    #[error("missing argument #{position} <{declaration}>")]
    MissingArgument { declaration: String, position: usize },

    #[error("argument <{declaration}> rejected '{token}': {cause}")]
    Coercion {
        declaration: String,
        token: String,
        cause: CoercionError,
    },

    #[error("too many arguments: {extra} left unbound starting at '{first}'")]
    TooManyArgs { extra: usize, first: String },
}

impl BindError {
    /// Name of the declaration the failure is attributed to, if any.
    pub fn declaration(&self) -> Option<&str> {
        match self {
            Self::MissingArgument { declaration, .. } | Self::Coercion { declaration, .. } => {
                Some(declaration)
            }
            _ => None,
        }
    }
}

/// No candidate shape could bind the event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no shape of '{command}' matched ({})", render_attempts(.attempts))]
pub struct ResolutionError {
    pub command: String,
    /// One `(usage, cause)` pair per candidate, in declaration order.
    pub attempts: Vec<(String, BindError)>,
}

fn render_attempts(attempts: &[(String, BindError)]) -> String {
    if attempts.is_empty() {
        return "no shapes registered".to_string();
    }
    attempts
        .iter()
        .map(|(usage, cause)| format!("\"{}\": {}", usage, cause))
        .collect::<Vec<_>>()
        .join("; ")
}

/// The matched handler (or the external system behind it) failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("deploy of {contract} rejected: {reason}")]
    Rejected { contract: String, reason: String },

    #[error("argument <{0}> was not bound")]
    MissingBound(String),

    /// A nested fetcher could not bind the arguments it was handed.
    #[error("arguments rejected: {0}")]
    Arguments(BindError),

    #[error("argument <{name}> is {found}, expected {expected}")]
    WrongType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0}")]
    Failed(String),
}

/// A successful outcome could not be folded into the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FoldError {
    #[error("registry already holds an entry named '{0}'")]
    DuplicateName(String),

    #[error("malformed index path {0}")]
    MalformedIndex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    #[error("Declaration error: {0}")]
    Declaration(#[from] DeclarationError),

    #[error("Bind error: {0}")]
    Bind(#[from] BindError),

    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Fold error: {0}")]
    Fold(#[from] FoldError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
