use super::arg::Arg;
use crate::core::{Address, BindError, HandlerError, Value};
use crate::event::Event;
use crate::state::RunState;
use tracing::trace;

/// Typed values bound to a shape's declarations, in declaration order.
///
/// Optional declarations whose token was absent are simply missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundArguments {
    values: Vec<(String, Value)>,
}

impl BoundArguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Bound values in declaration order.
    pub fn values(&self) -> Vec<Value> {
        self.values.iter().map(|(_, value)| value.clone()).collect()
    }

    fn require(&self, name: &str) -> Result<&Value, HandlerError> {
        self.get(name)
            .ok_or_else(|| HandlerError::MissingBound(name.to_string()))
    }

    pub fn address(&self, name: &str) -> Result<&Address, HandlerError> {
        let value = self.require(name)?;
        value.as_address().ok_or_else(|| wrong_type(name, "Address", value))
    }

    pub fn optional_address(&self, name: &str) -> Result<Option<&Address>, HandlerError> {
        match self.get(name) {
            None | Some(Value::Nothing) => Ok(None),
            Some(_) => self.address(name).map(Some),
        }
    }

    pub fn number(&self, name: &str) -> Result<u128, HandlerError> {
        let value = self.require(name)?;
        value.as_number().ok_or_else(|| wrong_type(name, "Number", value))
    }

    pub fn text(&self, name: &str) -> Result<&str, HandlerError> {
        let value = self.require(name)?;
        value.as_text().ok_or_else(|| wrong_type(name, "String", value))
    }

    pub fn optional_text(&self, name: &str) -> Result<Option<&str>, HandlerError> {
        match self.get(name) {
            None | Some(Value::Nothing) => Ok(None),
            Some(_) => self.text(name).map(Some),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool, HandlerError> {
        let value = self.require(name)?;
        value.as_bool().ok_or_else(|| wrong_type(name, "Bool", value))
    }

    pub fn list(&self, name: &str) -> Result<&[Value], HandlerError> {
        let value = self.require(name)?;
        value.as_list().ok_or_else(|| wrong_type(name, "List", value))
    }

    pub fn event(&self, name: &str) -> Result<&Event, HandlerError> {
        let value = self.require(name)?;
        value.as_event().ok_or_else(|| wrong_type(name, "Event", value))
    }

    fn insert(&mut self, name: &str, value: Value) {
        self.values.push((name.to_string(), value));
    }
}

fn wrong_type(name: &str, expected: &'static str, found: &Value) -> HandlerError {
    HandlerError::WrongType {
        name: name.to_string(),
        expected,
        found: found.type_name(),
    }
}

/// Binds event tokens to argument declarations, left to right.
pub struct ArgumentBinder;

impl ArgumentBinder {
    /// Bind `tokens` against `args`. Either every declaration is satisfied or
    /// an error is returned; a partial binding never escapes.
    pub async fn bind(
        state: &RunState,
        args: &[Arg],
        tokens: &[Event],
    ) -> Result<BoundArguments, BindError> {
        let mut bound = BoundArguments::default();
        let mut cursor = 0;

        for (idx, arg) in args.iter().enumerate() {
            if arg.implicit {
                let value = coerce(state, arg, &Event::List(Vec::new())).await?;
                bound.insert(&arg.name, value);
                continue;
            }

            if arg.catch_all {
                let rest = Event::List(tokens[cursor..].to_vec());
                cursor = tokens.len();
                let value = coerce(state, arg, &rest).await?;
                bound.insert(&arg.name, value);
                continue;
            }

            match tokens.get(cursor) {
                Some(token) => {
                    cursor += 1;
                    let value = coerce(state, arg, token).await?;
                    bound.insert(&arg.name, value);
                }
                None => match &arg.default {
                    Some(default) => bound.insert(&arg.name, default.clone()),
                    None if arg.optional => {}
                    None => {
                        return Err(BindError::MissingArgument {
                            declaration: arg.name.clone(),
                            position: idx + 1,
                        });
                    }
                },
            }
        }

        if cursor < tokens.len() {
            return Err(BindError::TooManyArgs {
                extra: tokens.len() - cursor,
                first: tokens[cursor].to_string(),
            });
        }

        trace!(bound = bound.len(), "arguments bound");
        Ok(bound)
    }
}

async fn coerce(state: &RunState, arg: &Arg, event: &Event) -> Result<Value, BindError> {
    arg.coercer()
        .coerce(state, event)
        .await
        .map_err(|cause| BindError::Coercion {
            declaration: arg.name.clone(),
            token: event.to_line(),
            cause,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::{AddressCoercer, EventCoercer, NetworkCoercer, NumberCoercer, TextCoercer};
    use crate::core::CoercionError;
    use crate::state::test_state;

    fn tokens(words: &[&str]) -> Vec<Event> {
        words.iter().map(|w| Event::atom(*w)).collect()
    }

    #[tokio::test]
    async fn test_binds_in_declaration_order() {
        let state = test_state();
        let args = vec![Arg::new("a", AddressCoercer), Arg::new("n", NumberCoercer)];
        let bound = ArgumentBinder::bind(&state, &args, &tokens(&["0xAA", "42"]))
            .await
            .unwrap();

        assert_eq!(bound.address("a").unwrap(), &Address::from_index(0xaa));
        assert_eq!(bound.number("n").unwrap(), 42);
        assert_eq!(bound.iter().map(|(n, _)| n).collect::<Vec<_>>(), vec!["a", "n"]);
    }

    #[tokio::test]
    async fn test_optional_absent_is_omitted_and_default_is_bound() {
        let state = test_state();
        let args = vec![
            Arg::new("name", TextCoercer),
            Arg::new("label", TextCoercer).optional(),
            Arg::new("decimals", NumberCoercer).default_value(Value::Number(18)),
        ];
        let bound = ArgumentBinder::bind(&state, &args, &tokens(&["Dai"]))
            .await
            .unwrap();

        assert!(!bound.contains("label"));
        assert_eq!(bound.optional_text("label").unwrap(), None);
        assert_eq!(bound.number("decimals").unwrap(), 18);
    }

    #[tokio::test]
    async fn test_coercion_failure_aborts_whole_bind() {
        let state = test_state();
        let args = vec![Arg::new("a", AddressCoercer), Arg::new("n", NumberCoercer)];
        let err = ArgumentBinder::bind(&state, &args, &tokens(&["0xAA", "lots"]))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            BindError::Coercion {
                declaration: "n".into(),
                token: "lots".into(),
                cause: CoercionError::Mismatch {
                    expected: "Number",
                    found: "lots".into()
                },
            }
        );
    }

    #[tokio::test]
    async fn test_too_many_tokens_without_catch_all() {
        let state = test_state();
        let args = vec![Arg::new("name", TextCoercer)];
        let err = ArgumentBinder::bind(&state, &args, &tokens(&["a", "b", "c"]))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BindError::TooManyArgs {
                extra: 2,
                first: "b".into()
            }
        );
    }

    #[tokio::test]
    async fn test_implicit_consumes_no_token() {
        let state = test_state();
        let args = vec![
            Arg::new("name", TextCoercer),
            Arg::new("seen", EventCoercer).implicit(),
            Arg::new("network", NetworkCoercer).implicit(),
            Arg::new("n", NumberCoercer),
        ];
        let bound = ArgumentBinder::bind(&state, &args, &tokens(&["x", "5"]))
            .await
            .unwrap();

        assert_eq!(bound.get("seen"), Some(&Value::Event(Event::List(vec![]))));
        assert_eq!(bound.text("network").unwrap(), "test");
        assert_eq!(bound.number("n").unwrap(), 5);
        assert_eq!(
            bound.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            vec!["name", "seen", "network", "n"]
        );
    }

    #[tokio::test]
    async fn test_implicit_coercion_failure_aborts_bind() {
        let state = test_state();
        let args = vec![
            Arg::new("name", TextCoercer),
            Arg::new("count", NumberCoercer).implicit(),
            Arg::new("n", NumberCoercer),
        ];
        let err = ArgumentBinder::bind(&state, &args, &tokens(&["x", "5"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BindError::Coercion { ref declaration, cause: CoercionError::Mismatch { .. }, .. }
                if declaration == "count"
        ));
    }

    #[tokio::test]
    async fn test_catch_all_with_zero_and_many_tokens() {
        let state = test_state();
        let args = vec![
            Arg::new("name", TextCoercer),
            Arg::new("rest", EventCoercer).catch_all(),
        ];

        let empty = ArgumentBinder::bind(&state, &args, &tokens(&["x"]))
            .await
            .unwrap();
        assert_eq!(empty.get("rest"), Some(&Value::Event(Event::List(vec![]))));

        let many = ArgumentBinder::bind(&state, &args, &tokens(&["x", "c", "a", "b"]))
            .await
            .unwrap();
        assert_eq!(
            many.get("rest"),
            Some(&Value::Event(Event::words(&["c", "a", "b"])))
        );
    }
}
