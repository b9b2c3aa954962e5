use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::{normalize_server, Args};
use crate::github::DEFAULT_SERVER;
use crate::mime::MimeProbe;

pub const DEFAULT_CREDENTIALS_FILE: &str = "~/.github-binary-uploadrc";

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub default: DefaultConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DefaultConfig {
    #[serde(default = "default_server")]
    pub server: String,

    #[serde(default = "default_credentials_file")]
    pub credentials_file: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub mime_probe: MimeProbe,
}

impl Default for DefaultConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            credentials_file: default_credentials_file(),
            timeout: default_timeout(),
            mime_probe: MimeProbe::default(),
        }
    }
}

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

fn default_credentials_file() -> String {
    DEFAULT_CREDENTIALS_FILE.to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Effective settings after merging the command line over the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server: String,
    pub credentials_file: PathBuf,
    pub timeout: Duration,
    pub mime_probe: MimeProbe,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration {}", path.display()))?;
        if config.default.timeout == 0 {
            anyhow::bail!("Invalid configuration {}: timeout must be at least 1 second", path.display());
        }
        Ok(config)
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("github-binary-upload.toml"))
            .unwrap_or_else(|| PathBuf::from("~/.config/github-binary-upload.toml"))
    }

    /// Merge configuration with command line arguments
    pub fn settings_for(&self, args: &Args) -> crate::error::Result<Settings> {
        let server = args.github_server.as_deref().unwrap_or(&self.default.server);
        let credentials_file = args
            .credentials_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.default.credentials_file));

        Ok(Settings {
            server: normalize_server(server)?,
            credentials_file: expand_home(&credentials_file),
            timeout: Duration::from_secs(args.timeout.unwrap_or(self.default.timeout)),
            mime_probe: self.default.mime_probe,
        })
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match directories::BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("test.toml");

        let config_content = r#"
[default]
server = "github.example.com"
credentials_file = "/etc/ci/uploadrc"
timeout = 120
mime_probe = "extension"
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = Config::load(&config_path).unwrap();

        assert_eq!(config.default.server, "github.example.com");
        assert_eq!(config.default.credentials_file, "/etc/ci/uploadrc");
        assert_eq!(config.default.timeout, 120);
        assert_eq!(config.default.mime_probe, MimeProbe::Extension);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default.server, "github.com");
        assert_eq!(config.default.credentials_file, "~/.github-binary-uploadrc");
        assert_eq!(config.default.timeout, 60);
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.default.server, "github.com");
    }

    #[test]
    fn test_invalid_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("broken.toml");
        fs::write(&config_path, "[default\nserver = ").unwrap();
        assert!(Config::load(&config_path).is_err());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("zero.toml");
        fs::write(&config_path, "[default]\ntimeout = 0\n").unwrap();

        let err = Config::load(&config_path).unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_args_override_config() {
        let config = Config {
            default: DefaultConfig {
                server: "github.example.com".to_string(),
                credentials_file: "/etc/ci/uploadrc".to_string(),
                timeout: 120,
                mime_probe: MimeProbe::Extension,
            },
        };

        let args = Args::parse_from(["github-binary-upload", "acme/widget", "v1.0.0"]);
        let settings = config.settings_for(&args).unwrap();
        assert_eq!(settings.server, "github.example.com");
        assert_eq!(settings.credentials_file, PathBuf::from("/etc/ci/uploadrc"));
        assert_eq!(settings.timeout, Duration::from_secs(120));

        let args = Args::parse_from([
            "github-binary-upload",
            "-g",
            "https://ghe.internal/",
            "-c",
            "/tmp/rc",
            "--timeout",
            "5",
            "acme/widget",
            "v1.0.0",
        ]);
        let settings = config.settings_for(&args).unwrap();
        assert_eq!(settings.server, "ghe.internal");
        assert_eq!(settings.credentials_file, PathBuf::from("/tmp/rc"));
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home(Path::new("/abs/rc")), PathBuf::from("/abs/rc"));
        if let Some(dirs) = directories::BaseDirs::new() {
            assert_eq!(
                expand_home(Path::new("~/.github-binary-uploadrc")),
                dirs.home_dir().join(".github-binary-uploadrc")
            );
        }
    }
}
