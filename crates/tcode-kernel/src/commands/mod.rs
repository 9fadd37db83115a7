//! Commands: the trait, the ordered registry, the execution context and the
//! built-in command set.

pub mod builtin;
mod context;
mod registry;
mod traits;

pub use builtin::register_builtins;
pub use context::ExecContext;
pub use registry::{CommandRegistry, Registration};
pub use traits::{Arity, Command, CommandError, CommandResult, FnCommand};
