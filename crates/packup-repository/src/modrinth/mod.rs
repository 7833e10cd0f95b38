use std::time::Duration;

use packup_component::{ServerSupport, Sha1};
use packup_pack::candidate::VersionCandidate;
use reqwest::StatusCode;
use tracing::instrument;
use url::Url;

use crate::source::{Identified, SourceError, VersionSource};

pub mod models;

/// A struct that represents the remote [modrinth](https://modrinth.com) repository.
#[derive(Debug)]
#[must_use]
pub struct ModrinthRepository {
    client: reqwest::blocking::Client,
}

impl ModrinthRepository {
    pub const USER_AGENT: &str = concat!(
        env!("CARGO_PKG_REPOSITORY"),
        '/',
        env!("CARGO_PKG_VERSION"),
        ' ',
        '(',
        env!("CARGO_PKG_AUTHORS"),
        ')',
    );

    pub const API: &str = "https://api.modrinth.com";

    /// Builds a client whose every request gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Fails if the underlying TLS backend can't be initialized.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(Self::USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    fn get<T>(&self, url: &str) -> Result<Option<T>, reqwest::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.client.get(url).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.error_for_status()?.json()?;
        Ok(Some(body))
    }
}

impl VersionSource for ModrinthRepository {
    #[instrument(level = "debug", skip(self))]
    fn list_versions(&self, project_id: &str) -> Result<Vec<VersionCandidate>, SourceError> {
        let url = format!("{api}/v3/project/{project_id}/version", api = Self::API);
        let versions: Vec<models::Version> = self
            .get(&url)?
            .ok_or_else(|| SourceError::unavailable(format!("project {project_id} does not exist")))?;
        tracing::debug!(count = versions.len(), "Fetched versions");
        Ok(versions
            .into_iter()
            .filter_map(models::Version::into_candidate)
            .collect())
    }

    #[instrument(level = "debug", skip(self))]
    fn project_title(&self, project_id: &str) -> Result<Option<String>, SourceError> {
        let url = format!("{api}/v2/project/{project_id}", api = Self::API);
        let project: Option<models::Project> = self.get(&url)?;
        Ok(project.and_then(|project| project.title))
    }

    #[instrument(level = "debug", skip(self))]
    fn server_support(&self, project_id: &str, version_id: &str) -> Result<ServerSupport, SourceError> {
        let url = format!("{api}/v3/version/{version_id}", api = Self::API);
        let from_version = self
            .get::<models::Version>(&url)?
            .and_then(|version| version.environment)
            .map_or(ServerSupport::Unknown, ServerSupport::from);
        if from_version != ServerSupport::Unknown {
            return Ok(from_version);
        }

        let url = format!("{api}/v2/project/{project_id}", api = Self::API);
        let project: Option<models::Project> = self.get(&url)?;
        Ok(project.map_or(ServerSupport::Unknown, |project| project.server_side))
    }

    #[instrument(level = "debug", skip(self, sha1), fields(%sha1))]
    fn identify(&self, sha1: &Sha1) -> Result<Option<Identified>, SourceError> {
        let url = format!("{api}/v2/version_file/{sha1}?algorithm=sha1", api = Self::API);
        let file: Option<models::VersionFile> = self.get(&url)?;
        Ok(file.map(Into::into))
    }

    #[instrument(level = "debug", skip(self, url), fields(%url))]
    fn download(&self, url: &Url) -> Result<Vec<u8>, SourceError> {
        let bytes = self
            .client
            .get(url.clone())
            .send()?
            .error_for_status()?
            .bytes()?;
        Ok(bytes.to_vec())
    }
}
