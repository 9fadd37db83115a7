//! XDG Base Directory paths for T-Code files.
//!
//! | Purpose | XDG Variable | Default | T-Code Path |
//! |---------|--------------|---------|-------------|
//! | Config | `$XDG_CONFIG_HOME` | `~/.config` | `$XDG_CONFIG_HOME/tcode/config.toml` |
//! | History | `$XDG_DATA_HOME` | `~/.local/share` | `$XDG_DATA_HOME/tcode/history.txt` |

use std::path::PathBuf;

use directories::BaseDirs;

const APP_DIR: &str = "tcode";

/// Get the data directory for persistent state.
///
/// Uses `$XDG_DATA_HOME/tcode` or falls back to `~/.local/share/tcode`.
pub fn data_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".local").join("share"))
        .join(APP_DIR)
}

/// Get the config directory.
///
/// Uses `$XDG_CONFIG_HOME/tcode` or falls back to `~/.config/tcode`.
pub fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".config"))
        .join(APP_DIR)
}

/// Default location of the engine configuration file.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Default location of the terminal history file.
pub fn history_file() -> PathBuf {
    data_dir().join("history.txt")
}

/// Fallback home directory when BaseDirs fails.
fn home_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_under_tcode() {
        assert!(data_dir().ends_with("tcode"));
        assert!(config_dir().ends_with("tcode"));
    }

    #[test]
    fn files_live_in_their_dirs() {
        assert!(config_file().starts_with(config_dir()));
        assert!(config_file().ends_with("config.toml"));
        assert!(history_file().starts_with(data_dir()));
    }
}
