use std::path::PathBuf;

use thiserror::Error;

/// Every failure the upload workflow knows how to classify.
///
/// The variant order is the exit-code order: the first variant maps to 3,
/// the next to 4 and so on. Anything outside this enum exits with 1.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Required HTTP client support is unavailable: {0}")]
    MissingDependency(String),

    #[error("The file \"{}\" does not exist or is not a regular file.", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("The file \"{}\" is not readable.", .path.display())]
    PermissionDenied { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not detect the mime type of \"{}\": {reason}", .path.display())]
    MimeDetectionFailed { path: PathBuf, reason: String },

    #[error("The file command output \"{output}\" could not be parsed.")]
    InvalidMimeOutput { output: String },

    #[error("The given repository \"{project}\" has no tags yet.")]
    NoTagsAvailable { project: String },

    #[error("Could not {action}: {reason}")]
    RemoteRequestFailed { action: String, reason: String },

    #[error("Got a malformed response while trying to {action}: {reason}")]
    MalformedResponse { action: String, reason: String },

    #[error("The upload url \"{url}\" is not in the expected format.")]
    MalformedUploadUrl { url: String },

    #[error("\"{server}\" is not a valid server name.")]
    InvalidServerName { server: String },

    #[error("No project is given.")]
    MissingProject,

    #[error("No tag is given.")]
    MissingTag,

    #[error("Could not read credentials file \"{f}\". Either write \"<username>\\n<access token>\" to \"{f}\" or use the \"--user\" option.", f = .path.display())]
    CredentialsRead { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, UploadError>;

/// Exit code for failures that are not an [`UploadError`].
pub const UNCLASSIFIED_EXIT_CODE: u8 = 1;

impl UploadError {
    /// Stable process exit code for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            UploadError::MissingDependency(_) => 3,
            UploadError::FileNotFound { .. }
            | UploadError::PermissionDenied { .. }
            | UploadError::Io(_) => 4,
            UploadError::MimeDetectionFailed { .. } => 5,
            UploadError::InvalidMimeOutput { .. } => 6,
            UploadError::NoTagsAvailable { .. } => 7,
            UploadError::RemoteRequestFailed { .. } => 8,
            UploadError::MalformedResponse { .. } => 9,
            UploadError::MalformedUploadUrl { .. } => 10,
            UploadError::InvalidServerName { .. } => 11,
            UploadError::MissingProject => 12,
            UploadError::MissingTag => 13,
            UploadError::CredentialsRead { .. } => 14,
        }
    }

    pub(crate) fn remote(action: impl Into<String>, reason: impl ToString) -> Self {
        UploadError::RemoteRequestFailed {
            action: action.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn malformed(action: impl Into<String>, reason: impl Into<String>) -> Self {
        UploadError::MalformedResponse {
            action: action.into(),
            reason: reason.into(),
        }
    }
}

/// Map any top-level failure to a process exit code.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<UploadError>())
        .map(UploadError::exit_code)
        .unwrap_or(UNCLASSIFIED_EXIT_CODE)
}
