use assert_cmd::Command;
use clap::Parser;
use github_binary_upload::cli::Args;
use github_binary_upload::config::Config;
use github_binary_upload::error::UploadError;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn command(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("github-binary-upload").unwrap();
    cmd.arg("--config")
        .arg(config_dir.path().join("absent.toml"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_parse_project_tag_and_assets() {
    let args = Args::parse_from([
        "github-binary-upload",
        "acme/widget",
        "v1.2.3",
        "dist/widget.tar.gz",
        "dist/notes.txt",
    ]);

    let request = args.publish_request().unwrap();
    assert_eq!(request.project, "acme/widget");
    assert_eq!(request.tag, Some("v1.2.3".to_string()));
    assert_eq!(
        request.assets,
        vec![
            PathBuf::from("dist/widget.tar.gz"),
            PathBuf::from("dist/notes.txt")
        ]
    );
    assert!(!request.dry_run);
}

#[test]
fn test_parse_flags() {
    let args = Args::parse_from([
        "github-binary-upload",
        "-g",
        "ghe.internal",
        "-c",
        "/etc/ci/uploadrc",
        "-n",
        "-u",
        "octocat",
        "acme/widget",
        "v1.2.3",
    ]);

    assert_eq!(args.github_server, Some("ghe.internal".to_string()));
    assert_eq!(args.credentials_file, Some(PathBuf::from("/etc/ci/uploadrc")));
    assert_eq!(args.username, Some("octocat".to_string()));
    assert!(args.dry_run);
    assert!(!args.latest_tag);
    assert!(args.publish_request().unwrap().dry_run);
}

#[test]
fn test_missing_project() {
    let args = Args::parse_from(["github-binary-upload"]);
    assert!(matches!(
        args.publish_request().unwrap_err(),
        UploadError::MissingProject
    ));
}

#[test]
fn test_missing_tag() {
    let args = Args::parse_from(["github-binary-upload", "acme/widget"]);
    assert!(matches!(
        args.publish_request().unwrap_err(),
        UploadError::MissingTag
    ));

    let args = Args::parse_from(["github-binary-upload", "--latest", "acme/widget"]);
    let request = args.publish_request().unwrap();
    assert_eq!(request.tag, None);
    assert!(request.assets.is_empty());
}

#[test]
fn test_resolve_reads_credentials_file() {
    let temp_dir = TempDir::new().unwrap();
    let credentials_path = temp_dir.path().join("uploadrc");
    fs::write(&credentials_path, "octocat\nghp_token\n").unwrap();

    let args = Args::parse_from([
        "github-binary-upload",
        "-c",
        credentials_path.to_str().unwrap(),
        "acme/widget",
        "v1.0.0",
    ]);
    let invocation = args.resolve(&Config::default()).unwrap();

    assert_eq!(invocation.settings.server, "github.com");
    assert_eq!(invocation.credentials.username, "octocat");
    assert_eq!(invocation.credentials.password, "ghp_token");
    assert_eq!(invocation.request.tag, Some("v1.0.0".to_string()));
}

#[test]
fn test_exit_code_missing_project() {
    let config_dir = TempDir::new().unwrap();
    command(&config_dir)
        .assert()
        .code(12)
        .stderr(predicate::str::contains("No project is given."));
}

#[test]
fn test_exit_code_missing_tag() {
    let config_dir = TempDir::new().unwrap();
    command(&config_dir)
        .arg("acme/widget")
        .assert()
        .code(13)
        .stderr(predicate::str::contains("No tag is given."));
}

#[test]
fn test_exit_code_invalid_server() {
    let config_dir = TempDir::new().unwrap();
    command(&config_dir)
        .args(["-g", "https://", "acme/widget", "v1.0.0"])
        .assert()
        .code(11);
}

#[test]
fn test_exit_code_unreadable_credentials() {
    let config_dir = TempDir::new().unwrap();
    command(&config_dir)
        .arg("-c")
        .arg(config_dir.path().join("missing-uploadrc"))
        .args(["acme/widget", "v1.0.0", "notes.txt"])
        .assert()
        .code(14)
        .stderr(predicate::str::contains("missing-uploadrc"));
}

#[test]
fn test_exit_code_broken_config_is_unclassified() {
    let config_dir = TempDir::new().unwrap();
    let config_path = config_dir.path().join("broken.toml");
    fs::write(&config_path, "[default\n").unwrap();

    Command::cargo_bin("github-binary-upload")
        .unwrap()
        .arg("--config")
        .arg(&config_path)
        .args(["acme/widget", "v1.0.0"])
        .assert()
        .code(1);
}

#[test]
fn test_dry_run_with_password_from_stdin() {
    let config_dir = TempDir::new().unwrap();
    command(&config_dir)
        .args(["-u", "octocat", "-n", "acme/widget", "v1.0.0", "dist/a.tar.gz", "notes.txt"])
        .write_stdin("ghp_token\n")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Would create the release \"v1.0.0\" in the GitHub repository \"acme/widget\"",
        ))
        .stderr(predicate::str::contains("Would upload the asset \"a.tar.gz\""))
        .stderr(predicate::str::contains("Would upload the asset \"notes.txt\""))
        .stderr(predicate::str::contains("Would delete").not());
}

#[test]
fn test_version() {
    Command::cargo_bin("github-binary-upload")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
