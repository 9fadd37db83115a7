//! T-Code terminal: an interactive front-end for the command engine.
//!
//! Each line is compiled as one block. Lines that start an external process
//! (`cmd ...`, `program_init()`) run on a background task so the prompt
//! stays usable; their output is printed when they finish. While one is
//! running, only `cmd_kill()` and meta-commands are accepted.
//!
//! Meta-commands: `/help`, `/vars`, `/quit`.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, ExternalPrinter};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

use tcode_kernel::config::paths;
use tcode_kernel::dispatch;
use tcode_kernel::{BlockOutput, Engine};

pub const PROMPT: &str = "T-Code> ";

/// Reply to input arriving while a background command runs.
pub const BUSY_MESSAGE: &str = "wait for the current command to finish";

/// Commands that run on a background task.
const BACKGROUND_COMMANDS: &[&str] = &["cmd", "program_init"];

/// Commands accepted while a background command runs.
const WHILE_BUSY_COMMANDS: &[&str] = &["cmd_kill"];

/// Receives the output of finished background commands.
pub type Notifier = Arc<dyn Fn(String) + Send + Sync>;

/// Interactive session state.
pub struct Repl {
    engine: Arc<Engine>,
    notify: Notifier,
    color: bool,
    running: Option<JoinHandle<()>>,
}

impl Repl {
    /// Create a REPL around `engine`. Background results go to `notify`.
    pub fn new(engine: Engine, notify: Notifier) -> Self {
        Self {
            engine: Arc::new(engine),
            notify,
            color: false,
            running: None,
        }
    }

    /// Paint errors red.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Whether a background command is still running.
    pub fn is_busy(&self) -> bool {
        self.running.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Whether the session should end.
    pub fn should_exit(&self) -> bool {
        self.engine.exit_requested()
    }

    /// Process a single line of input.
    ///
    /// Returns the text to print now, if any. Background commands report
    /// through the notifier instead.
    pub async fn process_line(&mut self, line: &str) -> Result<Option<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if trimmed.starts_with('/') {
            return self.handle_meta_command(trimmed).await;
        }

        let command = self.command_name(trimmed);
        if self.is_busy() && !command.as_deref().is_some_and(|c| WHILE_BUSY_COMMANDS.contains(&c)) {
            return Ok(Some(BUSY_MESSAGE.to_string()));
        }

        if command.as_deref().is_some_and(|c| BACKGROUND_COMMANDS.contains(&c)) {
            self.spawn_background(trimmed.to_string());
            return Ok(None);
        }

        let output = self.engine.compile_block(trimmed).await?;
        Ok(Some(render(&output, self.color)))
    }

    /// Cancel the running external process, if there is one.
    pub async fn interrupt(&self) -> Option<String> {
        if !self.engine.runner().is_active().await {
            return None;
        }
        let outcome = self.engine.call_command("cmd_kill", vec![]).await;
        Some(match outcome {
            Ok(text) => text,
            Err(e) => paint_error(&e.to_string(), self.color),
        })
    }

    /// Wait for the background command, if any, to finish.
    pub async fn wait_for_command(&mut self) {
        if let Some(handle) = self.running.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "background command task failed");
            }
        }
    }

    fn spawn_background(&mut self, line: String) {
        let engine = Arc::clone(&self.engine);
        let notify = Arc::clone(&self.notify);
        let color = self.color;
        tracing::debug!(%line, "starting background command");
        self.running = Some(tokio::spawn(async move {
            let text = match engine.compile_block(&line).await {
                Ok(output) => render(&output, color),
                Err(e) => paint_error(&e.to_string(), color),
            };
            notify(text);
        }));
    }

    /// Name of the command `line` would invoke, trying the line as written
    /// and then without the command prefix.
    fn command_name(&self, line: &str) -> Option<String> {
        let registry = self.engine.registry();
        let prefix = self.engine.config().command_prefix.as_str();
        dispatch::match_input(registry, line)
            .or_else(|| {
                let bare = line.strip_prefix(prefix).filter(|_| !prefix.is_empty())?;
                dispatch::match_input(registry, bare)
            })
            .map(|invocation| invocation.command.name().to_string())
    }

    /// Handle a meta-command (starts with /).
    async fn handle_meta_command(&mut self, cmd: &str) -> Result<Option<String>> {
        let command = cmd.split_whitespace().next().unwrap_or("");

        match command {
            "/quit" | "/q" | "/exit" => {
                self.engine.context().request_exit();
                Ok(None)
            }
            "/help" | "/h" | "/?" => Ok(Some(HELP_TEXT.to_string())),
            "/vars" | "/scope" => {
                let vars = self.engine.list_vars().await;
                if vars.is_empty() {
                    return Ok(Some("(no variables set)".to_string()));
                }
                let mut output = String::from("Variables:");
                for (name, value) in vars {
                    output.push_str(&format!("\n  {name} = {}", value.repr()));
                }
                Ok(Some(output))
            }
            _ => Ok(Some(format!(
                "Unknown command: {command}\nType /help for available commands."
            ))),
        }
    }
}

/// Join the non-empty results of a block, painting errors when `color` is set.
pub fn render(output: &BlockOutput, color: bool) -> String {
    if !color {
        return output.render();
    }
    output
        .segments
        .iter()
        .filter_map(|segment| match segment {
            Ok(text) if text.is_empty() => None,
            Ok(text) => Some(text.clone()),
            Err(e) => Some(paint_error(&e.to_string(), true)),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn paint_error(message: &str, color: bool) -> String {
    if color {
        message.red().to_string()
    } else {
        message.to_string()
    }
}

const HELP_TEXT: &str = r#"T-Code terminal

Meta Commands:
  /help, /h, /?     Show this help
  /vars             List variables
  /quit, /q         Exit the terminal

Ctrl-C cancels a running system command. Ctrl-D exits.
Type help() for the engine's commands.

Examples:
  !var.create(x, 10)
  x * 2
  cmd ls -la
  cmd_kill()
"#;

/// Compile `text` as one block and print the result. Returns whether every
/// segment succeeded.
pub fn run_block(engine: Engine, text: &str) -> Result<bool> {
    let runtime = build_runtime()?;
    let output = runtime.block_on(engine.compile_block(text))?;
    let rendered = render(&output, false);
    if !rendered.is_empty() {
        println!("{rendered}");
    }
    Ok(!output.has_errors())
}

/// Run the interactive terminal.
pub fn run(engine: Engine) -> Result<()> {
    println!("T-Code v{}", env!("CARGO_PKG_VERSION"));
    println!("Type help() for commands, /quit to exit.\n");

    let runtime = build_runtime()?;
    let mut rl = DefaultEditor::new().context("Failed to create editor")?;

    let history_path = paths::history_file();
    if let Err(e) = rl.load_history(&history_path) {
        tracing::debug!(path = %history_path.display(), error = %e, "no history loaded");
    }

    let notify: Notifier = match rl.create_external_printer() {
        Ok(printer) => {
            let printer = Mutex::new(printer);
            Arc::new(move |text: String| {
                if let Ok(mut printer) = printer.lock() {
                    if let Err(e) = printer.print(text) {
                        tracing::warn!(error = %e, "failed to print background output");
                    }
                }
            })
        }
        Err(e) => {
            tracing::debug!(error = %e, "no external printer, printing directly");
            Arc::new(|text: String| println!("{text}"))
        }
    };

    let mut repl = Repl::new(engine, notify).with_color(true);

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if let Err(e) = rl.add_history_entry(line.as_str()) {
                    tracing::debug!(error = %e, "history entry not added");
                }

                match runtime.block_on(repl.process_line(&line)) {
                    Ok(Some(output)) if !output.is_empty() => println!("{output}"),
                    Ok(_) => {}
                    Err(e) => eprintln!("{}", format!("Error: {e}").red()),
                }
            }
            Err(ReadlineError::Interrupted) => match runtime.block_on(repl.interrupt()) {
                Some(message) => println!("{message}"),
                None => println!("^C"),
            },
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }

        if repl.should_exit() {
            break;
        }
    }

    if let Some(parent) = history_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!(error = %e, "failed to create history directory");
        }
    }
    if let Err(e) = rl.save_history(&history_path) {
        tracing::warn!(path = %history_path.display(), error = %e, "failed to save history");
    }

    if repl.is_busy() {
        runtime.block_on(repl.interrupt());
    }
    Ok(())
}

fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}
