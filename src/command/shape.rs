use super::arg::{Arg, validate_declarations};
use super::binder::{ArgumentBinder, BoundArguments};
use crate::core::{Address, BindError, DeclarationError};
use crate::event::Event;
use crate::outcome::Outcome;
use crate::state::RunState;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

pub type HandlerFuture<T> = BoxFuture<'static, Outcome<T>>;

/// Handler of a bound command: `(state, actor, arguments) -> Outcome`.
///
/// The state is a snapshot; a handler reports results through the returned
/// outcome and never writes to the registry itself.
pub type CommandHandler<T> =
    Arc<dyn Fn(RunState, Address, BoundArguments) -> HandlerFuture<T> + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShapeOptions {
    /// Match any leading word and bind the whole event, name included.
    pub catch_all: bool,
}

/// One typed, named command definition.
pub struct CommandShape<T> {
    name: String,
    description: String,
    args: Vec<Arg>,
    handler: CommandHandler<T>,
    options: ShapeOptions,
}

impl<T> Clone for CommandShape<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            args: self.args.clone(),
            handler: Arc::clone(&self.handler),
            options: self.options,
        }
    }
}

impl<T: Send + 'static> CommandShape<T> {
    /// Declare a shape. The declaration list is validated here, so a bad
    /// catalogue fails at startup rather than on the first matching event.
    pub fn new<F>(
        description: impl Into<String>,
        name: impl Into<String>,
        args: Vec<Arg>,
        handler: F,
    ) -> Result<Self, DeclarationError>
    where
        F: Fn(RunState, Address, BoundArguments) -> HandlerFuture<T> + Send + Sync + 'static,
    {
        validate_declarations(&args)?;
        Ok(Self {
            name: name.into(),
            description: dedent(&description.into()),
            args,
            handler: Arc::new(handler),
            options: ShapeOptions::default(),
        })
    }

    pub fn with_options(mut self, options: ShapeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn catch_all(self) -> Self {
        self.with_options(ShapeOptions { catch_all: true })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn is_catch_all(&self) -> bool {
        self.options.catch_all
    }

    /// Usage line, e.g. `Deploy <guardian:Address> [label:String]`.
    pub fn usage(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        if !self.options.catch_all {
            parts.push(self.name.clone());
        }
        parts.extend(self.args.iter().filter_map(Arg::usage));
        parts.join(" ")
    }

    /// Tokens this shape binds from `event`.
    pub fn argument_tokens<'e>(&self, event: &'e Event) -> Result<&'e [Event], BindError> {
        if self.options.catch_all {
            return Ok(event.items());
        }
        match event.head() {
            Some(head) if head == self.name => Ok(event.tail()),
            other => Err(BindError::NameMismatch {
                expected: self.name.clone(),
                found: other.map(str::to_string).unwrap_or_else(|| event.to_line()),
            }),
        }
    }

    pub async fn bind(&self, state: &RunState, event: &Event) -> Result<BoundArguments, BindError> {
        let tokens = self.argument_tokens(event)?;
        ArgumentBinder::bind(state, &self.args, tokens).await
    }

    pub(crate) fn invoke(
        &self,
        state: RunState,
        actor: Address,
        args: BoundArguments,
    ) -> HandlerFuture<T> {
        (self.handler)(state, actor, args)
    }
}

impl<T> fmt::Debug for CommandShape<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandShape")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Strip the common leading indentation from a multi-line description.
fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|line| match line.char_indices().nth(indent) {
            Some((offset, _)) => &line[offset..],
            None => line.trim_start(),
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::{AddressCoercer, TextCoercer};
    use crate::outcome::{CausalRecord, Outcome};
    use futures::FutureExt;

    fn echo_shape() -> CommandShape<String> {
        CommandShape::new(
            "Echo a name",
            "Echo",
            vec![Arg::new("name", TextCoercer), Arg::new("to", AddressCoercer).optional()],
            |_state, actor, args| {
                async move {
                    match args.text("name") {
                        Ok(name) => Outcome::success(
                            name.to_string(),
                            CausalRecord::new("Echo", actor, args.values()),
                        ),
                        Err(err) => Outcome::failure(err),
                    }
                }
                .boxed()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_usage_includes_name_unless_catch_all() {
        let shape = echo_shape();
        assert_eq!(shape.usage(), "Echo <name:String> [to:Address]");
        assert_eq!(shape.catch_all().usage(), "<name:String> [to:Address]");
    }

    #[test]
    fn test_argument_tokens_checks_name() {
        let shape = echo_shape();
        let event = Event::words(&["Echo", "hi"]);
        assert_eq!(shape.argument_tokens(&event).unwrap().len(), 1);

        let other = Event::words(&["Shout", "hi"]);
        assert_eq!(
            shape.argument_tokens(&other).unwrap_err(),
            BindError::NameMismatch {
                expected: "Echo".into(),
                found: "Shout".into()
            }
        );

        let loose = shape.catch_all();
        assert_eq!(loose.argument_tokens(&other).unwrap().len(), 2);
    }

    #[test]
    fn test_description_is_dedented() {
        assert_eq!(dedent("\n    #### Title\n\n    * line\n  "), "#### Title\n\n* line");
    }

    #[test]
    fn test_description_with_wide_whitespace() {
        assert_eq!(dedent("\u{3000}\u{3000}Title\n\u{3000}\u{3000}  body"), "Title\n  body");
        assert_eq!(dedent("  \u{3000}Title\n \u{3000}\u{3000}\u{3000}body"), "Title\n\u{3000}body");
    }
}
