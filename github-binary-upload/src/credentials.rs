use std::fmt;
use std::io::{self, BufRead, IsTerminal};
use std::path::Path;

use crate::error::{Result, UploadError};

/// Username plus password or personal access token
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read `<username>\n<password>` from a credentials file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            tracing::debug!("Failed to read {}: {}", path.display(), e);
            UploadError::CredentialsRead {
                path: path.to_path_buf(),
            }
        })?;
        Self::parse(&content).ok_or_else(|| UploadError::CredentialsRead {
            path: path.to_path_buf(),
        })
    }

    /// Parse the two-line credentials format. The username line is required.
    pub fn parse(content: &str) -> Option<Self> {
        let mut lines = content.lines().map(str::trim);
        let username = lines.next().filter(|u| !u.is_empty())?;
        let password = lines.next().unwrap_or_default();
        Some(Self::new(username, password))
    }

    /// Pair an explicit username with a password from the terminal or stdin.
    ///
    /// A terminal gets a hidden prompt; piped input contributes its first
    /// line with trailing whitespace removed.
    pub fn for_user(username: &str) -> Result<Self> {
        let stdin = io::stdin();
        let password = if stdin.is_terminal() {
            dialoguer::Password::new()
                .with_prompt("Password")
                .interact()
                .map_err(|e| UploadError::Io(io::Error::other(e)))?
        } else {
            read_password_line(stdin.lock())?
        };
        Ok(Self::new(username, password))
    }
}

fn read_password_line(mut reader: impl BufRead) -> Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line).map_err(UploadError::Io)?;
    Ok(line.trim_end().to_string())
}
