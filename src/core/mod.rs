pub mod error;
pub mod value;

pub use error::{
    BindError, CoercionError, DeclarationError, EngineError, FoldError, HandlerError,
    ResolutionError, Result,
};
pub use value::{Address, Value};
