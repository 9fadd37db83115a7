//! help: Show the available commands.

use async_trait::async_trait;

use crate::commands::{Arity, Command, CommandResult, ExecContext};
use crate::value::Value;

pub const HELP_TEXT: &str = "\
Available commands:
- help(): show this help
- sys_dia(): show the system diagnostic script
- program_init(): install the assistant's dependencies and start its service
- exit(): leave the program
- cmd(\"command\"): run a system command
- cmd_init(): initialize the command line
- cmd_kill(): interrupt the running command
- !var.create(name, value): create a variable

Examples:
cmd(\"pip list\")          - list installed packages
cmd(\"python --version\")  - show the Python version
cmd(\"dir\")               - list the folder contents (Windows)
cmd ls                   - list the folder contents (Linux/Mac)";

/// Help command: static command summary.
pub struct Help;

#[async_trait]
impl Command for Help {
    fn name(&self) -> &str {
        "help"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(0)
    }

    fn help(&self) -> &str {
        "show this help"
    }

    async fn execute(&self, _args: Vec<Value>, _ctx: &ExecContext) -> CommandResult {
        Ok(HELP_TEXT.to_string())
    }
}
