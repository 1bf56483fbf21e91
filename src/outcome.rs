use crate::core::{Address, HandlerError, Value};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// How a value came to exist: which contract was invoked, by whom, with what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CausalRecord {
    pub contract: String,
    pub actor: Address,
    pub arguments: Vec<Value>,
    /// Position in the run the command was applied at; 0 until a resolver
    /// stamps it.
    pub sequence: u64,
    pub at: DateTime<Utc>,
}

impl CausalRecord {
    pub fn new(contract: impl Into<String>, actor: Address, arguments: Vec<Value>) -> Self {
        Self {
            contract: contract.into(),
            actor,
            arguments,
            sequence: 0,
            at: Utc::now(),
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

/// Result of a handler: a value with its causal record, or a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Succeeded { value: T, record: CausalRecord },
    Failed {
        error: HandlerError,
        /// Present when the external call got far enough to be recorded.
        record: Option<CausalRecord>,
    },
}

impl<T> Outcome<T> {
    pub fn success(value: T, record: CausalRecord) -> Self {
        Self::Succeeded { value, record }
    }

    pub fn failure(error: HandlerError) -> Self {
        Self::Failed {
            error,
            record: None,
        }
    }

    pub fn failure_with_record(error: HandlerError, record: CausalRecord) -> Self {
        Self::Failed {
            error,
            record: Some(record),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn record(&self) -> Option<&CausalRecord> {
        match self {
            Self::Succeeded { record, .. } => Some(record),
            Self::Failed { record, .. } => record.as_ref(),
        }
    }

    pub fn error(&self) -> Option<&HandlerError> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    /// Transform the value; a failure passes through untouched.
    pub fn map<U>(self, f: impl FnOnce(T, &CausalRecord) -> U) -> Outcome<U> {
        match self {
            Self::Succeeded { value, record } => {
                let value = f(value, &record);
                Outcome::Succeeded { value, record }
            }
            Self::Failed { error, record } => Outcome::Failed { error, record },
        }
    }

    /// Chain a fallible step; a failure passes through untouched.
    pub fn and_then<U>(self, f: impl FnOnce(T, CausalRecord) -> Outcome<U>) -> Outcome<U> {
        match self {
            Self::Succeeded { value, record } => f(value, record),
            Self::Failed { error, record } => Outcome::Failed { error, record },
        }
    }

    /// Stamp the record, on success or failure, with its run position.
    pub fn sequenced(self, sequence: u64) -> Self {
        match self {
            Self::Succeeded { value, record } => Self::Succeeded {
                value,
                record: record.with_sequence(sequence),
            },
            Self::Failed { error, record } => Self::Failed {
                error,
                record: record.map(|record| record.with_sequence(sequence)),
            },
        }
    }

    pub fn into_result(self) -> Result<(T, CausalRecord), HandlerError> {
        match self {
            Self::Succeeded { value, record } => Ok((value, record)),
            Self::Failed { error, .. } => Err(error),
        }
    }
}

impl<T> From<Result<(T, CausalRecord), HandlerError>> for Outcome<T> {
    fn from(result: Result<(T, CausalRecord), HandlerError>) -> Self {
        match result {
            Ok((value, record)) => Self::success(value, record),
            Err(error) => Self::failure(error),
        }
    }
}
