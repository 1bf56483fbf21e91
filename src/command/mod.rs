//! Command resolution pipeline
//!
//! Event -> CommandResolver (ordered shapes) -> ArgumentBinder -> handler -> Outcome

pub mod arg;
pub mod binder;
pub mod catalogue;
pub mod resolver;
pub mod shape;

pub use arg::{Arg, Coercer, validate_declarations};
pub use binder::{ArgumentBinder, BoundArguments};
pub use catalogue::CommandCatalogue;
pub use resolver::{CommandResolver, Strictness};
pub use shape::{CommandHandler, CommandShape, HandlerFuture, ShapeOptions};
