use std::path::PathBuf;

use crate::error::Result;
use crate::github::{asset_name, Asset, ReleaseClient};

/// What to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    /// `<owner>/<name>`
    pub project: String,
    /// Resolved to the latest tag when absent
    pub tag: Option<String>,
    pub assets: Vec<PathBuf>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CreateRelease { tag: String },
    DeleteAsset { name: String },
    UploadAsset { name: String },
}

/// The actions a publish performed, or would have performed in a dry run,
/// in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub tag: String,
    pub dry_run: bool,
    pub actions: Vec<Action>,
}

impl PublishReport {
    pub fn uploads(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().filter_map(|action| match action {
            Action::UploadAsset { name } => Some(name.as_str()),
            _ => None,
        })
    }
}

/// Reconciles a release and its assets with a list of local files
pub struct Publisher<'a> {
    client: &'a ReleaseClient,
}

impl<'a> Publisher<'a> {
    pub fn new(client: &'a ReleaseClient) -> Self {
        Self { client }
    }

    /// Publish the release of `request.tag` and attach every asset to it.
    ///
    /// Assets sharing a name with a local file are deleted before that file is
    /// uploaded. The first failure aborts the remaining assets. A dry run only
    /// issues read requests needed to resolve the tag and never enumerates
    /// remote assets, so it reports no deletions.
    pub async fn publish(&self, request: &PublishRequest) -> Result<PublishReport> {
        let project = request.project.as_str();
        let tag = match &request.tag {
            Some(tag) => tag.clone(),
            None => {
                tracing::info!(
                    "No tag given, fetching the latest tag from the GitHub repository \"{}\"",
                    project
                );
                self.client.fetch_latest_tag(project).await?
            }
        };

        let mut report = PublishReport {
            tag: tag.clone(),
            dry_run: request.dry_run,
            actions: Vec::new(),
        };

        let (release, assets) = if request.dry_run {
            tracing::info!(
                "Would create the release \"{}\" in the GitHub repository \"{}\"",
                tag,
                project
            );
            (None, Vec::new())
        } else {
            let (release, created) = self.client.fetch_or_create_release(project, &tag).await?;
            if created {
                report.actions.push(Action::CreateRelease { tag: tag.clone() });
            }
            let assets = self.client.list_assets(project, &release).await?;
            tracing::debug!("Release \"{}\" has {} asset(s)", tag, assets.len());
            (Some(release), assets)
        };

        for asset_path in &request.assets {
            let name = asset_name(asset_path)?;
            let matches: Vec<&Asset> = assets.iter().filter(|asset| asset.name == name).collect();

            match &release {
                Some(release) => {
                    for asset in matches {
                        self.client.delete_asset(project, release, asset).await?;
                        report.actions.push(Action::DeleteAsset {
                            name: asset.name.clone(),
                        });
                    }
                    self.client.upload_asset(project, release, asset_path).await?;
                }
                None => {
                    for asset in matches {
                        tracing::info!(
                            "Would delete the asset \"{}\" attached to release \"{}\" of the GitHub repository \"{}\"",
                            asset.name,
                            tag,
                            project
                        );
                        report.actions.push(Action::DeleteAsset {
                            name: asset.name.clone(),
                        });
                    }
                    tracing::info!(
                        "Would upload the asset \"{}\" attached to release \"{}\" of the GitHub repository \"{}\"",
                        name,
                        tag,
                        project
                    );
                }
            }
            report.actions.push(Action::UploadAsset { name });
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_uploads() {
        let report = PublishReport {
            tag: "v1.0.0".to_string(),
            dry_run: false,
            actions: vec![
                Action::CreateRelease {
                    tag: "v1.0.0".to_string(),
                },
                Action::DeleteAsset {
                    name: "notes.txt".to_string(),
                },
                Action::UploadAsset {
                    name: "notes.txt".to_string(),
                },
                Action::UploadAsset {
                    name: "tool.tar.gz".to_string(),
                },
            ],
        };

        assert_eq!(
            report.uploads().collect::<Vec<_>>(),
            vec!["notes.txt", "tool.tar.gz"]
        );
    }
}
