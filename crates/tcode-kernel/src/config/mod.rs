//! Engine configuration.
//!
//! Loaded from `$XDG_CONFIG_HOME/tcode/config.toml` when present. Every field
//! is optional; missing fields take the defaults below.
//!
//! ```toml
//! command_prefix = "!"
//! diagnostic_script = "scripts/test_sys.bat"
//! setup_commands = ["ollama pull tinyllama"]
//!
//! [process]
//! shell = ["bash", "-lc"]
//! extra_path = ["/opt/tools/bin"]
//! kill_grace_ms = 2000
//! ```

pub mod paths;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for the command engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Marker that starts a command line inside a block.
    pub command_prefix: String,
    /// File shown by `sys_dia`.
    pub diagnostic_script: PathBuf,
    /// Shell lines run in order by `program_init`.
    pub setup_commands: Vec<String>,
    pub process: RunnerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command_prefix: "!".to_string(),
            diagnostic_script: PathBuf::from("scripts/test_sys.bat"),
            setup_commands: vec![
                "ollama pull tinyllama".to_string(),
                "pip install requests pillow numpy transformers flask flask-cors tk pygetwindow \
                 pyscreeze streamlit rich"
                    .to_string(),
                "ollama serve".to_string(),
            ],
            process: RunnerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load from the default config file, or defaults if it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = paths::config_file();
        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from an explicit path. A missing file is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

/// Settings for the external process runner.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Shell program and flags; the command line is appended as the last
    /// argument. `None` picks `sh -c` or `cmd /C` for the platform.
    pub shell: Option<Vec<String>>,
    /// Directories appended to `PATH` after the platform system directories.
    pub extra_path: Vec<PathBuf>,
    /// How long `cmd_kill` waits after a graceful stop before forcing it.
    pub kill_grace_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            shell: None,
            extra_path: Vec::new(),
            kill_grace_ms: 2000,
        }
    }
}

impl RunnerConfig {
    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }

    /// The shell invocation, resolved for the current platform.
    pub fn shell_argv(&self) -> Vec<String> {
        match &self.shell {
            Some(argv) if !argv.is_empty() => argv.clone(),
            _ if cfg!(windows) => vec!["cmd".to_string(), "/C".to_string()],
            _ => vec!["sh".to_string(), "-c".to_string()],
        }
    }
}
