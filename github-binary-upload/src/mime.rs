use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::process::Command;

use crate::error::{Result, UploadError};

const FILE_PROGRAM: &str = "file";

/// How the content type of an asset is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeProbe {
    /// Ask the `file` utility (`file --brief --mime`).
    #[serde(rename = "file")]
    FileCommand,
    /// Look the extension up in a built-in table.
    Extension,
}

impl Default for MimeProbe {
    fn default() -> Self {
        if cfg!(unix) {
            MimeProbe::FileCommand
        } else {
            MimeProbe::Extension
        }
    }
}

impl MimeProbe {
    /// Determine the mime type of a local file.
    ///
    /// The file must be a readable regular file; the probe is only consulted
    /// after that check succeeds.
    pub async fn detect(self, path: &Path) -> Result<String> {
        ensure_readable(path).await?;

        match self {
            MimeProbe::FileCommand => run_mime_program(FILE_PROGRAM, path).await,
            MimeProbe::Extension => Ok(mime_from_extension(path).to_string()),
        }
    }
}

async fn ensure_readable(path: &Path) -> Result<()> {
    let is_file = tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(UploadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match File::open(path).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(UploadError::PermissionDenied {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Run a `file`-compatible program as `<program> --brief --mime <path>`.
pub(crate) async fn run_mime_program(program: &str, path: &Path) -> Result<String> {
    let output = Command::new(program)
        .arg("--brief")
        .arg("--mime")
        .arg(path)
        .output()
        .await
        .map_err(|e| UploadError::MimeDetectionFailed {
            path: path.to_path_buf(),
            reason: format!("could not run the `{program}` command: {e}"),
        })?;

    if !output.status.success() {
        let reason = match output.status.code() {
            Some(code) => format!("the `{program}` command returned with exit code {code}"),
            None => format!("the `{program}` command was terminated by a signal"),
        };
        return Err(UploadError::MimeDetectionFailed {
            path: path.to_path_buf(),
            reason,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    tracing::debug!("`{}` reported \"{}\" for {}", program, stdout.trim(), path.display());
    parse_file_command_output(&stdout)
}

/// Extract the mime type from `file --brief --mime` output such as
/// `text/plain; charset=us-ascii`.
pub fn parse_file_command_output(output: &str) -> Result<String> {
    output
        .split_whitespace()
        .next()
        .map(|token| token.trim_end_matches(';'))
        .filter(|mime| {
            mime.split_once('/')
                .is_some_and(|(kind, sub)| !kind.is_empty() && !sub.is_empty())
        })
        .map(str::to_string)
        .ok_or_else(|| UploadError::InvalidMimeOutput {
            output: output.trim().to_string(),
        })
}

/// Content type by file extension
pub fn mime_from_extension(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "gz" | "tgz" => "application/gzip",
        "zip" => "application/zip",
        "xz" => "application/x-xz",
        "bz2" => "application/x-bzip2",
        "tar" => "application/x-tar",
        "7z" => "application/x-7z-compressed",
        "deb" => "application/vnd.debian.binary-package",
        "rpm" => "application/x-rpm",
        "dmg" => "application/x-apple-diskimage",
        "exe" | "msi" | "dll" => "application/x-msdownload",
        "jar" => "application/java-archive",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "xml" => "application/xml",
        "html" | "htm" => "text/html",
        "md" => "text/markdown",
        "txt" | "log" | "asc" | "sha256" => "text/plain",
        "csv" => "text/csv",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
