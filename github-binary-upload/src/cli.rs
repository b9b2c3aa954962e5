use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, Settings};
use crate::credentials::Credentials;
use crate::error::{Result, UploadError};
use crate::publisher::PublishRequest;

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "github-binary-upload",
    version,
    about = "Publish releases from tags with attached files on GitHub",
    long_about = None
)]
pub struct Args {
    /// GitHub server hostname (default: github.com)
    #[clap(short = 'g', long, value_name = "HOST")]
    pub github_server: Option<String>,

    /// Path to a file containing username and password/access token on two
    /// separate lines (default: ~/.github-binary-uploadrc)
    #[clap(short = 'c', long, value_name = "PATH")]
    pub credentials_file: Option<PathBuf>,

    /// Get the latest tag from the GitHub API
    #[clap(short = 'l', long = "latest")]
    pub latest_tag: bool,

    /// Only print which releases would be published
    #[clap(short = 'n', long)]
    pub dry_run: bool,

    /// User account for querying the GitHub API; the password is read from stdin
    #[clap(short = 'u', long = "user", value_name = "USER")]
    pub username: Option<String>,

    /// Timeout for a single API request in seconds (default: 60)
    #[clap(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Configuration file path
    #[clap(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[clap(long)]
    pub verbose: bool,

    /// GitHub project in the format "<user>/<project name>"
    pub project: Option<String>,

    /// Tag that will be published as a release, ignored if '--latest' is given
    pub tag: Option<String>,

    /// Files that will be attached to the release
    pub assets: Vec<PathBuf>,
}

/// Everything needed to run one publish
#[derive(Debug)]
pub struct Invocation {
    pub settings: Settings,
    pub request: PublishRequest,
    pub credentials: Credentials,
}

impl Args {
    /// Validate the arguments and resolve settings and credentials.
    pub fn resolve(&self, config: &Config) -> anyhow::Result<Invocation> {
        let settings = config.settings_for(self)?;
        let request = self.publish_request()?;

        let credentials = match &self.username {
            Some(username) => Credentials::for_user(username)?,
            None => Credentials::from_file(&settings.credentials_file)?,
        };

        Ok(Invocation {
            settings,
            request,
            credentials,
        })
    }

    /// Build the publish request from the positional arguments.
    ///
    /// With `--latest` a given tag positional is really the first asset.
    pub fn publish_request(&self) -> Result<PublishRequest> {
        let project = self.project.clone().ok_or(UploadError::MissingProject)?;
        if !self.latest_tag && self.tag.is_none() {
            return Err(UploadError::MissingTag);
        }

        let mut assets = self.assets.clone();
        let tag = if self.latest_tag {
            if let Some(tag) = &self.tag {
                assets.insert(0, PathBuf::from(tag));
            }
            None
        } else {
            self.tag.clone()
        };

        Ok(PublishRequest {
            project,
            tag,
            assets,
            dry_run: self.dry_run,
        })
    }
}

/// Reduce a server argument to a bare hostname.
///
/// An optional `<scheme>://` prefix and trailing slashes are removed.
pub fn normalize_server(server: &str) -> Result<String> {
    let invalid = || UploadError::InvalidServerName {
        server: server.to_string(),
    };

    let host = match server.split_once("://") {
        Some((scheme, rest)) if !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphabetic()) => rest,
        Some(_) => return Err(invalid()),
        None => server,
    };
    let host = host.trim_end_matches('/');

    if host.is_empty() || host.contains('/') || host.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(host.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_server() {
        assert_eq!(normalize_server("github.com").unwrap(), "github.com");
        assert_eq!(normalize_server("https://github.com").unwrap(), "github.com");
        assert_eq!(normalize_server("https://ghe.internal/").unwrap(), "ghe.internal");
        assert_eq!(normalize_server("ghe.internal:8443").unwrap(), "ghe.internal:8443");
    }

    #[test]
    fn test_normalize_server_rejects_invalid_names() {
        for server in ["", "https://", "/", "1http://github.com", "github.com/api", "git hub.com"] {
            let err = normalize_server(server).unwrap_err();
            assert!(
                matches!(err, UploadError::InvalidServerName { .. }),
                "expected InvalidServerName for {server:?}"
            );
        }
    }

    #[test]
    fn test_timeout_must_be_positive() {
        let result = Args::try_parse_from(["github-binary-upload", "--timeout", "0", "acme/widget", "v1"]);
        assert!(result.is_err());

        let args = Args::try_parse_from(["github-binary-upload", "--timeout", "15", "acme/widget", "v1"]).unwrap();
        assert_eq!(args.timeout, Some(15));
    }

    #[test]
    fn test_latest_flag_moves_tag_to_assets() {
        let args = Args::parse_from(["github-binary-upload", "--latest", "acme/widget", "a.tar.gz", "b.zip"]);
        let request = args.publish_request().unwrap();
        assert_eq!(request.tag, None);
        assert_eq!(
            request.assets,
            vec![PathBuf::from("a.tar.gz"), PathBuf::from("b.zip")]
        );
    }
}
