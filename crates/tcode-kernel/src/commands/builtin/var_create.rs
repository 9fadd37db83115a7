//! var.create: Store a value in the variable store.
//!
//! ```text
//! !var.create(x, 10)       → created x = 10
//! !var.create(greeting, "hi there")
//! ```

use async_trait::async_trait;

use crate::commands::{Arity, Command, CommandResult, ExecContext};
use crate::value::Value;

/// var.create command: binds a name in the shared variable store.
pub struct VarCreate;

#[async_trait]
impl Command for VarCreate {
    fn name(&self) -> &str {
        "var.create"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn help(&self) -> &str {
        "!var.create(name, value): create a variable"
    }

    async fn execute(&self, args: Vec<Value>, ctx: &ExecContext) -> CommandResult {
        let mut args = args.into_iter();
        let name = args.next().unwrap_or(Value::None).to_string();
        let value = args.next().unwrap_or(Value::None);

        let message = format!("created {name} = {value}");
        ctx.set_var(name, value).await;
        Ok(message)
    }
}
