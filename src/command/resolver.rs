use super::binder::BoundArguments;
use super::shape::CommandShape;
use crate::core::{Address, DeclarationError, EngineError, ResolutionError, Result};
use crate::event::Event;
use crate::outcome::{CausalRecord, Outcome};
use crate::state::RunState;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

/// How catch-all shapes combine with other shapes under one command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// A catch-all shape must be the only shape of its command.
    #[default]
    Strict,
    /// Catch-all shapes take part in the ordered scan like any other.
    Lenient,
}

impl FromStr for Strictness {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("unknown strictness '{}' (expected strict or lenient)", other)),
        }
    }
}

/// Ordered set of shapes sharing one command name.
///
/// Shapes are tried in registration order and the first one that binds wins;
/// later shapes are never consulted afterwards, whatever its handler returns.
pub struct CommandResolver<T> {
    name: String,
    shapes: Vec<CommandShape<T>>,
    strictness: Strictness,
}

impl<T> Clone for CommandResolver<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            shapes: self.shapes.clone(),
            strictness: self.strictness,
        }
    }
}

impl<T: Send + 'static> CommandResolver<T> {
    pub fn new(name: impl Into<String>, strictness: Strictness) -> Self {
        Self {
            name: name.into(),
            shapes: Vec::new(),
            strictness,
        }
    }

    pub fn with_shapes(
        name: impl Into<String>,
        strictness: Strictness,
        shapes: Vec<CommandShape<T>>,
    ) -> std::result::Result<Self, DeclarationError> {
        let mut resolver = Self::new(name, strictness);
        for shape in shapes {
            resolver.register(shape)?;
        }
        Ok(resolver)
    }

    pub fn register(&mut self, shape: CommandShape<T>) -> std::result::Result<(), DeclarationError> {
        if self.strictness == Strictness::Strict
            && !self.shapes.is_empty()
            && (shape.is_catch_all() || self.shapes.iter().any(CommandShape::is_catch_all))
        {
            return Err(DeclarationError::CatchAllConflict(self.name.clone()));
        }
        self.shapes.push(shape);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    pub fn shapes(&self) -> &[CommandShape<T>] {
        &self.shapes
    }

    pub fn usage(&self) -> Vec<String> {
        self.shapes.iter().map(CommandShape::usage).collect()
    }

    /// Find the first shape that binds `event`.
    ///
    /// With a single candidate its bind error is returned as is; with several,
    /// a `ResolutionError` lists why each one was rejected.
    pub async fn select(
        &self,
        state: &RunState,
        event: &Event,
    ) -> Result<(&CommandShape<T>, BoundArguments)> {
        let mut attempts = Vec::with_capacity(self.shapes.len());

        for shape in &self.shapes {
            match shape.bind(state, event).await {
                Ok(bound) => {
                    debug!(command = %self.name, shape = %shape.usage(), "shape selected");
                    return Ok((shape, bound));
                }
                Err(err) => {
                    debug!(command = %self.name, shape = %shape.usage(), error = %err, "shape rejected");
                    attempts.push((shape.usage(), err));
                }
            }
        }

        if attempts.len() == 1 {
            let (_, err) = attempts.remove(0);
            return Err(EngineError::Bind(err));
        }
        Err(EngineError::Resolution(ResolutionError {
            command: self.name.clone(),
            attempts,
        }))
    }

    /// Select a shape and invoke its handler once. The outcome's record is
    /// stamped with the sequence number the command would be folded at.
    pub async fn dispatch(
        &self,
        state: &RunState,
        actor: &Address,
        event: &Event,
    ) -> Result<Outcome<T>> {
        let (shape, bound) = self.select(state, event).await?;
        let outcome = shape.invoke(state.clone(), actor.clone(), bound).await;
        Ok(outcome.sequenced(state.sequence() + 1))
    }

    /// Like `dispatch`, with a failed outcome turned into an error.
    pub async fn resolve(
        &self,
        state: &RunState,
        actor: &Address,
        event: &Event,
    ) -> Result<(T, CausalRecord)> {
        let outcome = self.dispatch(state, actor, event).await?;
        outcome.into_result().map_err(|err| {
            warn!(command = %self.name, error = %err, "handler failed");
            EngineError::Handler(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::{EventCoercer, NumberCoercer, TextCoercer};
    use crate::command::Arg;
    use crate::core::{BindError, HandlerError, Value};
    use crate::state::test_state;
    use futures::FutureExt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn shape(
        label: &'static str,
        args: Vec<Arg>,
        calls: Arc<AtomicUsize>,
        fail: bool,
    ) -> CommandShape<&'static str> {
        CommandShape::new(label, "Deploy", args, move |_state, actor, args| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if fail {
                    Outcome::failure(HandlerError::Failed(format!("{} failed", label)))
                } else {
                    Outcome::success(label, CausalRecord::new(label, actor, args.values()))
                }
            }
            .boxed()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_first_binding_shape_wins_even_if_handler_fails() {
        let first_calls = Arc::new(AtomicUsize::new(0));
        let second_calls = Arc::new(AtomicUsize::new(0));
        let resolver = CommandResolver::with_shapes(
            "Token",
            Strictness::Strict,
            vec![
                shape("first", vec![Arg::new("name", TextCoercer)], first_calls.clone(), true),
                shape("second", vec![Arg::new("name", TextCoercer)], second_calls.clone(), false),
            ],
        )
        .unwrap();

        let state = test_state();
        let err = resolver
            .resolve(&state, &Address::from_index(1), &Event::words(&["Deploy", "DAI"]))
            .await
            .unwrap_err();

        assert_eq!(err, EngineError::Handler(HandlerError::Failed("first failed".into())));
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_overloads_fall_through_on_bind_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CommandResolver::with_shapes(
            "Token",
            Strictness::Strict,
            vec![
                shape(
                    "with-decimals",
                    vec![Arg::new("name", TextCoercer), Arg::new("decimals", NumberCoercer)],
                    calls.clone(),
                    false,
                ),
                shape("plain", vec![Arg::new("name", TextCoercer)], calls.clone(), false),
            ],
        )
        .unwrap();

        let state = test_state();
        let actor = Address::from_index(1);
        let (picked, record) = resolver
            .resolve(&state, &actor, &Event::words(&["Deploy", "DAI"]))
            .await
            .unwrap();
        assert_eq!(picked, "plain");
        assert_eq!(record.arguments, vec![Value::Text("DAI".into())]);

        let (picked, _) = resolver
            .resolve(&state, &actor, &Event::words(&["Deploy", "DAI", "18"]))
            .await
            .unwrap();
        assert_eq!(picked, "with-decimals");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unmatched_lists_every_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CommandResolver::with_shapes(
            "Token",
            Strictness::Strict,
            vec![
                shape("a", vec![Arg::new("n", NumberCoercer)], calls.clone(), false),
                shape("b", vec![], calls.clone(), false),
            ],
        )
        .unwrap();

        let err = resolver
            .select(&test_state(), &Event::words(&["Deploy", "x"]))
            .await
            .unwrap_err();

        match err {
            EngineError::Resolution(ResolutionError { command, attempts }) => {
                assert_eq!(command, "Token");
                assert_eq!(attempts.len(), 2);
                assert!(matches!(attempts[0].1, BindError::Coercion { .. }));
                assert!(matches!(attempts[1].1, BindError::TooManyArgs { .. }));
            }
            other => panic!("expected resolution error, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_catch_all_shape_strictness() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loose = || {
            shape("loose", vec![Arg::new("all", EventCoercer).catch_all()], calls.clone(), false)
                .catch_all()
        };
        let named = || shape("named", vec![Arg::new("n", NumberCoercer)], calls.clone(), false);

        let strict = CommandResolver::with_shapes("Token", Strictness::Strict, vec![named(), loose()]);
        assert_eq!(
            strict.err(),
            Some(DeclarationError::CatchAllConflict("Token".into()))
        );

        let lenient =
            CommandResolver::with_shapes("Token", Strictness::Lenient, vec![named(), loose()])
                .unwrap();
        let (picked, _) = lenient
            .resolve(
                &test_state(),
                &Address::from_index(1),
                &Event::words(&["Anything", "goes", "here"]),
            )
            .await
            .unwrap();
        assert_eq!(picked, "loose");
    }

    #[tokio::test]
    async fn test_dispatch_stamps_run_position() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CommandResolver::with_shapes(
            "Token",
            Strictness::Strict,
            vec![shape("ok", vec![Arg::new("name", TextCoercer)], calls.clone(), false)],
        )
        .unwrap();
        let failing = CommandResolver::with_shapes(
            "Token",
            Strictness::Strict,
            vec![shape("bad", vec![], calls.clone(), true)],
        )
        .unwrap();

        let state = test_state();
        let actor = Address::from_index(1);
        let (_, record) = resolver
            .resolve(&state, &actor, &Event::words(&["Deploy", "DAI"]))
            .await
            .unwrap();
        assert_eq!(record.sequence, state.sequence() + 1);

        let outcome = failing
            .dispatch(&state, &actor, &Event::words(&["Deploy"]))
            .await
            .unwrap();
        assert_eq!(outcome.error(), Some(&HandlerError::Failed("bad failed".into())));
    }

    #[test]
    fn test_strictness_from_str() {
        assert_eq!("Lenient".parse::<Strictness>().unwrap(), Strictness::Lenient);
        assert!("loose".parse::<Strictness>().is_err());
    }
}
