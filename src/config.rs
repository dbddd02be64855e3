//! Configuration loading from monkeyc.toml
//!
//! Defaults for a project can live in a `monkeyc.toml` discovered by
//! walking up from the current directory. CLI flags always win; the file
//! only fills in what the command line left unset.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level monkeyc configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MonkeyConfig {
    /// Runner defaults (compiler, timeout, task count, pool size).
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Charset class toggles and custom alphabet.
    #[serde(default)]
    pub charset: CharsetConfig,
    /// Output locations and error reporting.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Runner defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunnerConfig {
    /// Compiler executable (default `cc` when unset here and on the CLI).
    #[serde(default)]
    pub compiler: Option<String>,
    /// Per-attempt compile timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Task count; 0 means unbounded.
    #[serde(default)]
    pub tasks: Option<u64>,
    /// Worker pool size (default: available parallelism).
    #[serde(default)]
    pub jobs: Option<usize>,
}

/// Charset defaults, mirroring the CLI class toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharsetConfig {
    /// Include lowercase letters.
    #[serde(default = "default_true")]
    pub lowercase: bool,
    /// Include uppercase letters.
    #[serde(default = "default_true")]
    pub uppercase: bool,
    /// Include digits.
    #[serde(default = "default_true")]
    pub digits: bool,
    /// Include C-flavored punctuation.
    #[serde(default = "default_true")]
    pub symbols: bool,
    /// Include whitespace characters.
    #[serde(default)]
    pub whitespace: bool,
    /// Explicit alphabet; overrides the class toggles.
    #[serde(default)]
    pub custom: Option<String>,
}

impl Default for CharsetConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            uppercase: true,
            digits: true,
            symbols: true,
            whitespace: false,
            custom: None,
        }
    }
}

/// Output defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Directory accepted sources are kept in.
    #[serde(default)]
    pub results_dir: Option<String>,
    /// Print truncated compiler errors for failed probes.
    #[serde(default)]
    pub show_errors: bool,
}

fn default_true() -> bool {
    true
}

impl MonkeyConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Discover and load a `monkeyc.toml` by walking up from the current
    /// directory. Returns `None` when no file is found or it fails to parse.
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("monkeyc.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_builtin_defaults() {
        let config = MonkeyConfig::default();
        assert!(config.runner.compiler.is_none());
        assert!(config.charset.lowercase);
        assert!(!config.charset.whitespace);
        assert!(!config.output.show_errors);
    }

    #[test]
    fn partial_toml_fills_the_rest_with_defaults() {
        let toml_str = r#"
            [runner]
            compiler = "clang"
            timeout_secs = 5

            [charset]
            symbols = false
        "#;

        let config: MonkeyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.compiler.as_deref(), Some("clang"));
        assert_eq!(config.runner.timeout_secs, Some(5));
        assert!(!config.charset.symbols);
        // Untouched sections keep their defaults.
        assert!(config.charset.digits);
        assert!(config.output.results_dir.is_none());
    }

    #[test]
    fn load_reads_a_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monkeyc.toml");
        std::fs::write(&path, "[output]\nresults_dir = \"found\"\nshow_errors = true\n").unwrap();

        let config = MonkeyConfig::load(&path).unwrap();
        assert_eq!(config.output.results_dir.as_deref(), Some("found"));
        assert!(config.output.show_errors);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monkeyc.toml");
        std::fs::write(&path, "[runner\ncompiler = ").unwrap();
        assert!(MonkeyConfig::load(&path).is_err());
    }
}
