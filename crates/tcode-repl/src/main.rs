//! T-Code terminal entry point.
//!
//! ```bash
//! tcode                    # interactive
//! tcode run script.tc      # compile a whole file as one block
//! tcode -c 'cmd ls'        # compile one block and print the result
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tcode_kernel::{Engine, EngineConfig};

#[derive(Parser, Debug)]
#[command(name = "tcode", version, about = "T-Code command terminal")]
struct Cli {
    /// Compile TEXT as one block, print the result and exit
    #[arg(short = 'c', value_name = "TEXT", conflicts_with = "command")]
    code: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a whole file as one block
    Run {
        /// Source file
        file: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    }
    .context("Failed to load configuration")?;
    let engine = Engine::new(config).context("Failed to create engine")?;

    let text = match (cli.command, cli.code) {
        (Some(Command::Run { file }), _) => Some(
            std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?,
        ),
        (None, Some(code)) => Some(code),
        (None, None) => None,
    };

    match text {
        Some(text) => {
            let ok = tcode_repl::run_block(engine, &text)?;
            Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        None => {
            tcode_repl::run(engine)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
