//! tcode-kernel: the core of the T-Code command engine.
//!
//! This crate provides:
//!
//! - **Tokenizer**: splits a command's argument text on top-level commas
//! - **Coercion**: turns raw argument tokens into typed [`Value`]s
//! - **Registry**: ordered commands with structural `start name(args) end` patterns
//! - **Dispatcher**: first structural match wins, arity checked before the handler runs
//! - **Block compiler**: command lines one at a time, ordinary code runs as units
//! - **Fallback interpreter**: a small Python-flavoured language (logos + chumsky)
//! - **Process runner**: shell commands with line-by-line output and cancellation
//!
//! ```no_run
//! # async fn demo() -> Result<(), tcode_kernel::EngineError> {
//! use tcode_kernel::{Engine, EngineConfig};
//!
//! let engine = Engine::new(EngineConfig::default())?;
//! let out = engine.compile("!var.create(x, 10)\nprint(x * 2)").await;
//! assert_eq!(out, "created x = 10\n20");
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod ast;
pub mod commands;
pub mod compiler;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod literal;
pub mod parser;
pub mod process;
pub mod value;

pub use compiler::BlockOutput;
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, ErrorKind, Outcome};
pub use value::Value;
