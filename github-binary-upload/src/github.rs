use std::path::Path;
use std::time::Duration;

use reqwest::{header, Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::{json, Value};

use crate::credentials::Credentials;
use crate::error::{Result, UploadError};
use crate::mime::MimeProbe;

pub const DEFAULT_SERVER: &str = "github.com";

/// A release as far as asset publishing is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub id: u64,
    pub tag: String,
    /// Upload endpoint with the `{?name,label}` template already removed
    pub asset_upload_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub id: u64,
    pub name: String,
}

/// Client for the release endpoints of the GitHub REST API.
///
/// Every request is authenticated with basic auth and bounded by the
/// configured timeout. Calls are issued one at a time by the caller.
pub struct ReleaseClient {
    http_client: Client,
    api_root: String,
    credentials: Credentials,
    mime_probe: MimeProbe,
}

impl ReleaseClient {
    /// Build a client talking to `https://api.<server>`.
    pub fn new(server: &str, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::MissingDependency(e.to_string()))?;

        Ok(Self {
            http_client,
            api_root: format!("https://api.{server}"),
            credentials,
            mime_probe: MimeProbe::default(),
        })
    }

    /// Overrides the API root. Used for tests against a mock server.
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_mime_probe(mut self, mime_probe: MimeProbe) -> Self {
        self.mime_probe = mime_probe;
        self
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Fetch the most recent tag of a project
    pub async fn fetch_latest_tag(&self, project: &str) -> Result<String> {
        let action = format!("query the latest tag of the repository \"{project}\"");
        let url = format!("{}/repos/{project}/tags", self.api_root);

        let request = self
            .authorized(self.http_client.get(&url))
            .header(header::ACCEPT, "application/json");
        let response = self.send(request, &action).await?;
        let response = ensure_success(response, &action).await?;
        let tags = read_json(response, &action).await?;

        let tags = tags
            .as_array()
            .ok_or_else(|| UploadError::malformed(&action, "expected a json array of tags"))?;
        let latest = tags.first().ok_or_else(|| UploadError::NoTagsAvailable {
            project: project.to_string(),
        })?;
        let latest_tag = string_field(latest, "name", &action)?;

        tracing::info!(
            "Fetched the latest tag \"{}\" from the GitHub repository \"{}\"",
            latest_tag,
            project
        );
        Ok(latest_tag)
    }

    /// Look up the release of a tag. A missing release is `Ok(None)`.
    pub async fn fetch_release(&self, project: &str, tag: &str) -> Result<Option<Release>> {
        let action = format!("fetch the release \"{tag}\" of the repository \"{project}\"");
        let url = format!("{}/repos/{project}/releases/tags/{tag}", self.api_root);

        let request = self
            .authorized(self.http_client.get(&url))
            .header(header::ACCEPT, "application/json");
        let response = self.send(request, &action).await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("No release \"{}\" exists yet in \"{}\"", tag, project);
            return Ok(None);
        }
        let response = ensure_success(response, &action).await?;
        let release = parse_release(read_json(response, &action).await?, tag, &action)?;

        tracing::info!(
            "Fetched the existing release \"{}\" in the GitHub repository \"{}\"",
            tag,
            project
        );
        Ok(Some(release))
    }

    /// Create a published, non-prerelease release named after its tag
    pub async fn create_release(&self, project: &str, tag: &str) -> Result<Release> {
        let action = format!("create the release \"{tag}\" in the repository \"{project}\"");
        let url = format!("{}/repos/{project}/releases", self.api_root);
        let body = json!({
            "tag_name": tag,
            "name": tag,
            "body": "",
            "draft": false,
            "prerelease": false,
        });

        let request = self.authorized(self.http_client.post(&url)).json(&body);
        let response = self.send(request, &action).await?;
        let response = ensure_success(response, &action).await?;
        let release = parse_release(read_json(response, &action).await?, tag, &action)?;

        tracing::info!(
            "Created the release \"{}\" in the GitHub repository \"{}\"",
            tag,
            project
        );
        Ok(release)
    }

    /// Fetch the release of a tag, creating it when it does not exist.
    /// The flag is `true` when the release was created.
    pub async fn fetch_or_create_release(&self, project: &str, tag: &str) -> Result<(Release, bool)> {
        match self.fetch_release(project, tag).await? {
            Some(release) => Ok((release, false)),
            None => Ok((self.create_release(project, tag).await?, true)),
        }
    }

    pub async fn list_assets(&self, project: &str, release: &Release) -> Result<Vec<Asset>> {
        let action = format!(
            "list the assets of release \"{}\" in the repository \"{project}\"",
            release.tag
        );
        let url = format!("{}/repos/{project}/releases/{}/assets", self.api_root, release.id);

        let response = self.send(self.authorized(self.http_client.get(&url)), &action).await?;
        let response = ensure_success(response, &action).await?;
        let assets = read_json(response, &action).await?;

        assets
            .as_array()
            .ok_or_else(|| UploadError::malformed(&action, "expected a json array of assets"))?
            .iter()
            .map(|asset| -> Result<Asset> {
                Ok(Asset {
                    id: id_field(asset, &action)?,
                    name: string_field(asset, "name", &action)?,
                })
            })
            .collect()
    }

    pub async fn delete_asset(&self, project: &str, release: &Release, asset: &Asset) -> Result<()> {
        let action = format!(
            "delete the asset \"{}\" of release \"{}\" in the repository \"{project}\"",
            asset.name, release.tag
        );
        let url = format!("{}/repos/{project}/releases/assets/{}", self.api_root, asset.id);

        let response = self.send(self.authorized(self.http_client.delete(&url)), &action).await?;
        ensure_success(response, &action).await?;

        tracing::info!(
            "Deleted the asset \"{}\" attached to release \"{}\" of the GitHub repository \"{}\"",
            asset.name,
            release.tag,
            project
        );
        Ok(())
    }

    /// Upload a local file as an asset named after its basename
    pub async fn upload_asset(&self, project: &str, release: &Release, asset_path: &Path) -> Result<()> {
        let asset_name = asset_name(asset_path)?;
        let content_type = self.mime_probe.detect(asset_path).await?;
        let action = format!("upload the asset \"{asset_name}\"");

        let file_content = tokio::fs::read(asset_path).await?;
        tracing::debug!(
            "Uploading {} bytes of {} to {}",
            file_content.len(),
            content_type,
            release.asset_upload_url
        );

        let request = self
            .authorized(self.http_client.post(&release.asset_upload_url))
            .query(&[("name", asset_name.as_str())])
            .header(header::CONTENT_TYPE, content_type)
            .body(file_content);
        let response = self.send(request, &action).await?;
        ensure_success(response, &action).await?;

        tracing::info!(
            "Uploaded the asset \"{}\" attached to release \"{}\" of the GitHub repository \"{}\"",
            asset_name,
            release.tag,
            project
        );
        Ok(())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.credentials.username, Some(&self.credentials.password))
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| UploadError::remote(action, e))?;
        tracing::debug!("{} {} -> {}", action, response.url(), response.status());
        Ok(response)
    }
}

/// Remove the `{...}` template suffix from a server-provided upload url.
///
/// `https://uploads.github.com/repos/o/p/releases/1/assets{?name,label}`
/// becomes `https://uploads.github.com/repos/o/p/releases/1/assets`.
pub fn strip_upload_url(upload_url: &str) -> Result<String> {
    let prefix = upload_url.split('{').next().unwrap_or_default();
    if prefix.is_empty() {
        return Err(UploadError::MalformedUploadUrl {
            url: upload_url.to_string(),
        });
    }
    Ok(prefix.to_string())
}

/// Basename of a local asset, used as the remote asset name
pub fn asset_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| UploadError::FileNotFound {
            path: path.to_path_buf(),
        })
}

async fn ensure_success(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(UploadError::remote(
        action,
        format!("HTTP {status} - {}", error_text.trim()),
    ))
}

async fn read_json(response: Response, action: &str) -> Result<Value> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| UploadError::remote(action, e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| UploadError::malformed(action, format!("got an invalid json string ({e})")))
}

fn parse_release(value: Value, tag: &str, action: &str) -> Result<Release> {
    let id = id_field(&value, action)?;
    let upload_url = value
        .get("upload_url")
        .and_then(Value::as_str)
        .ok_or_else(|| UploadError::MalformedUploadUrl {
            url: value.get("upload_url").map(Value::to_string).unwrap_or_default(),
        })?;
    let asset_upload_url = strip_upload_url(upload_url)?;
    if Url::parse(&asset_upload_url).is_err() {
        return Err(UploadError::MalformedUploadUrl {
            url: upload_url.to_string(),
        });
    }

    Ok(Release {
        id,
        tag: tag.to_string(),
        asset_upload_url,
    })
}

fn id_field(value: &Value, action: &str) -> Result<u64> {
    match value.get("id") {
        Some(id) => id.as_u64().ok_or_else(|| {
            UploadError::malformed(action, format!("the key \"id\" holds {id}, not an integer"))
        }),
        None => Err(missing_key("id", action)),
    }
}

fn string_field(value: &Value, key: &str, action: &str) -> Result<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing_key(key, action))
}

fn missing_key(key: &str, action: &str) -> UploadError {
    UploadError::malformed(
        action,
        format!("got an unexpected json object missing the key \"{key}\""),
    )
}
