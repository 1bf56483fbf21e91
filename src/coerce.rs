//! Built-in coercers for the primitive argument kinds.

use crate::command::Coercer;
use crate::core::{Address, CoercionError, Value};
use crate::event::Event;
use crate::state::RunState;
use async_trait::async_trait;
use std::sync::Arc;

/// Literal `0x…` address, account alias, registry name, or `(<Name> Address)`.
pub struct AddressCoercer;

#[async_trait]
impl Coercer for AddressCoercer {
    fn kind(&self) -> &'static str {
        "Address"
    }

    async fn coerce(&self, state: &RunState, event: &Event) -> Result<Value, CoercionError> {
        match event {
            Event::Atom(text) => {
                if let Some(address) = Address::parse(text) {
                    return Ok(Value::Address(address));
                }
                if text.starts_with("0x") || text.starts_with("0X") {
                    return Err(CoercionError::Invalid(format!("malformed address '{}'", text)));
                }
                state
                    .resolve_address(text)
                    .cloned()
                    .map(Value::Address)
                    .ok_or_else(|| CoercionError::UnknownName(text.clone()))
            }
            Event::List(items) => match items.as_slice() {
                [inner] => self.coerce(state, inner).await,
                [Event::Atom(name), Event::Atom(field)] if field == "Address" => state
                    .registry()
                    .resolve_address(name)
                    .cloned()
                    .map(Value::Address)
                    .ok_or_else(|| CoercionError::UnknownName(name.clone())),
                _ => Err(CoercionError::Mismatch {
                    expected: "Address",
                    found: event.to_line(),
                }),
            },
        }
    }
}

/// Unsigned integer, optionally scaled: `1e18`, `5e6`.
pub struct NumberCoercer;

#[async_trait]
impl Coercer for NumberCoercer {
    fn kind(&self) -> &'static str {
        "Number"
    }

    async fn coerce(&self, _state: &RunState, event: &Event) -> Result<Value, CoercionError> {
        let text = event.as_atom().ok_or_else(|| CoercionError::Mismatch {
            expected: "Number",
            found: event.to_line(),
        })?;
        parse_number(text).map(Value::Number)
    }
}

fn parse_number(text: &str) -> Result<u128, CoercionError> {
    let mismatch = || CoercionError::Mismatch {
        expected: "Number",
        found: text.to_string(),
    };
    let overflow = || CoercionError::Invalid(format!("number '{}' is out of range", text));

    let (mantissa, exponent) = match text.split_once(['e', 'E']) {
        Some((m, e)) => (m, Some(e)),
        None => (text, None),
    };
    if mantissa.is_empty() || !mantissa.chars().all(|c| c.is_ascii_digit()) {
        return Err(mismatch());
    }
    let base: u128 = mantissa.parse().map_err(|_| overflow())?;

    match exponent {
        None => Ok(base),
        Some(exp) if base == 0 => {
            exp.parse::<u32>().map_err(|_| mismatch())?;
            Ok(0)
        }
        Some(exp) => {
            let exp: u32 = exp.parse().map_err(|_| mismatch())?;
            10u128
                .checked_pow(exp)
                .and_then(|scale| base.checked_mul(scale))
                .ok_or_else(overflow)
        }
    }
}

/// Any single atom, taken verbatim.
pub struct TextCoercer;

#[async_trait]
impl Coercer for TextCoercer {
    fn kind(&self) -> &'static str {
        "String"
    }

    async fn coerce(&self, _state: &RunState, event: &Event) -> Result<Value, CoercionError> {
        event
            .as_atom()
            .map(|text| Value::Text(text.to_string()))
            .ok_or_else(|| CoercionError::Mismatch {
                expected: "String",
                found: event.to_line(),
            })
    }
}

/// `True` or `False`, case-insensitive.
pub struct BoolCoercer;

#[async_trait]
impl Coercer for BoolCoercer {
    fn kind(&self) -> &'static str {
        "Bool"
    }

    async fn coerce(&self, _state: &RunState, event: &Event) -> Result<Value, CoercionError> {
        match event.as_atom().map(str::to_ascii_lowercase).as_deref() {
            Some("true") => Ok(Value::Bool(true)),
            Some("false") => Ok(Value::Bool(false)),
            _ => Err(CoercionError::Mismatch {
                expected: "Bool",
                found: event.to_line(),
            }),
        }
    }
}

/// Passes the event through uncoerced.
pub struct EventCoercer;

#[async_trait]
impl Coercer for EventCoercer {
    fn kind(&self) -> &'static str {
        "Event"
    }

    async fn coerce(&self, _state: &RunState, event: &Event) -> Result<Value, CoercionError> {
        Ok(Value::Event(event.clone()))
    }
}

/// Coerces every item of a list with an inner coercer, keeping order.
/// Meant for catch-all arguments.
pub struct EachCoercer {
    inner: Arc<dyn Coercer>,
    kind: &'static str,
}

impl EachCoercer {
    pub fn new(inner: impl Coercer + 'static, kind: &'static str) -> Self {
        Self {
            inner: Arc::new(inner),
            kind,
        }
    }

    pub fn addresses() -> Self {
        Self::new(AddressCoercer, "Address")
    }
}

#[async_trait]
impl Coercer for EachCoercer {
    fn kind(&self) -> &'static str {
        self.kind
    }

    async fn coerce(&self, state: &RunState, event: &Event) -> Result<Value, CoercionError> {
        let mut values = Vec::with_capacity(event.items().len());
        for item in event.items() {
            values.push(self.inner.coerce(state, item).await?);
        }
        Ok(Value::List(values))
    }
}

/// Implicit: the environment's network name.
pub struct NetworkCoercer;

#[async_trait]
impl Coercer for NetworkCoercer {
    fn kind(&self) -> &'static str {
        "Network"
    }

    async fn coerce(&self, state: &RunState, _event: &Event) -> Result<Value, CoercionError> {
        Ok(Value::Text(state.environment().network.clone()))
    }
}
