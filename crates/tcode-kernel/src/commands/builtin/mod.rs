//! Built-in commands.
//!
//! These are installed by [`crate::Engine::new`] in the order listed in
//! [`register_builtins`]; that order is the matching priority.

mod cmd;
mod exit;
mod help;
mod program_init;
mod sys_dia;
mod var_create;

use std::sync::Arc;

pub use cmd::{Cmd, CmdInit, CmdKill};
pub use exit::Exit;
pub use help::{Help, HELP_TEXT};
pub use program_init::{ProgramInit, DONE_BANNER};
pub use sys_dia::SysDia;
pub use var_create::VarCreate;

use super::{Command, CommandRegistry};

/// Register all built-in commands with the registry.
///
/// `var.create` is bound to the configured command prefix; the rest are
/// undecorated.
pub fn register_builtins(registry: &mut CommandRegistry, prefix: &str) -> Result<(), regex::Error> {
    let builtins: Vec<(Arc<dyn Command>, &str)> = vec![
        (Arc::new(VarCreate), prefix),
        (Arc::new(Help), ""),
        (Arc::new(SysDia), ""),
        (Arc::new(ProgramInit), ""),
        (Arc::new(Exit), ""),
        (Arc::new(Cmd), ""),
        (Arc::new(CmdInit), ""),
        (Arc::new(CmdKill), ""),
    ];
    for (command, start) in builtins {
        registry.register(command, start, "")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_in_priority_order() {
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry, "!").expect("valid patterns");
        assert_eq!(registry.names(), vec![
            "var.create",
            "help",
            "sys_dia",
            "program_init",
            "exit",
            "cmd",
            "cmd_init",
            "cmd_kill",
        ]);
        assert_eq!(registry.get("var.create").map(|r| r.start()), Some("!"));
    }
}
