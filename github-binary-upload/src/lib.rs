//! # github-binary-upload
//!
//! Publish GitHub releases from tags and attach local files to them.
//!
//! ## Overview
//!
//! `github-binary-upload` is meant for release automation in CI pipelines.
//! Given a project, a tag and a list of files it makes sure a release for the
//! tag exists, replaces assets that share a name with one of the files and
//! uploads the files. Running it twice with the same input leaves exactly one
//! release with exactly one asset per file.
//!
//! ## Usage
//!
//! ```bash
//! # Publish v1.0.0 with two attached files
//! github-binary-upload acme/widget v1.0.0 dist/widget.tar.gz dist/notes.txt
//!
//! # Publish the most recent tag
//! github-binary-upload --latest acme/widget dist/widget.tar.gz
//!
//! # Show what would happen on a GitHub Enterprise server
//! github-binary-upload -g ghe.internal --dry-run acme/widget v1.0.0 dist/widget.tar.gz
//! ```
//!
//! ## Credentials
//!
//! Either pass `--user` and provide the password or access token on stdin, or
//! write `<username>\n<access token>` to `~/.github-binary-uploadrc`.
//!
//! ## Configuration
//!
//! Defaults for the server, credentials file, request timeout and mime probe
//! can be set in `github-binary-upload.toml` inside the user configuration
//! directory.
//!
//! ## Exit codes
//!
//! Each [`error::UploadError`] kind has its own exit code starting at 3;
//! unclassified failures exit with 1.

/// Command-line interface definitions and argument resolution
pub mod cli;

/// Configuration file handling and default settings management
pub mod config;

/// Username and password/token resolution
pub mod credentials;

/// Error taxonomy and exit codes
pub mod error;

/// GitHub API client for releases and assets
pub mod github;

/// Content type detection for local files
pub mod mime;

/// Release and asset reconciliation workflow
pub mod publisher;
