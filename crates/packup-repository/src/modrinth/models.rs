//! Responses of the [Modrinth API](https://docs.modrinth.com/api/), trimmed
//! down to the fields **packup** reads.

use std::collections::BTreeSet;

use packup_component::{Hashes, ServerSupport};
use packup_pack::candidate::{CandidateFile, VersionCandidate};
use packup_pack::instance::Loader;
use serde::Deserialize;
use url::Url;

use crate::source::Identified;

/// `GET /v3/project/{id}/version` and `GET /v3/version/{id}`.
#[derive(Deserialize, Debug)]
pub struct Version {
    pub id: String,
    pub version_number: String,
    pub game_versions: Vec<String>,
    pub loaders: BTreeSet<Loader>,
    #[serde(default)]
    pub environment: Option<Environment>,
    pub files: Vec<File>,
}

impl Version {
    /// Converts this version into a [`VersionCandidate`], installing its
    /// primary file (or the first one if none is marked as such).
    ///
    /// Versions without any files can't be installed and yield [`None`].
    #[must_use]
    pub fn into_candidate(self) -> Option<VersionCandidate> {
        let index = self.files.iter().position(|file| file.primary).unwrap_or(0);
        let file = self.files.into_iter().nth(index)?;
        Some(VersionCandidate {
            id: self.id,
            version_number: self.version_number,
            loaders: self.loaders,
            game_versions: self.game_versions,
            file: CandidateFile {
                url: file.url,
                file_name: file.name,
                hashes: file.hashes,
                size: file.size,
            },
            server_support: self.environment.map_or(ServerSupport::Unknown, Into::into),
        })
    }
}

#[derive(Deserialize, Debug)]
pub struct File {
    pub hashes: Hashes,
    pub url: Url,
    #[serde(rename = "filename")]
    pub name: String,
    #[serde(default)]
    pub primary: bool,
    pub size: u64,
}

/// Where a version can be loaded, as declared by its author.
#[derive(Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    ClientAndServer,
    ClientOnly,
    ClientOnlyServerOptional,
    SingleplayerOnly,
    ServerOnly,
    ServerOnlyClientOptional,
    DedicatedServerOnly,
    ClientOrServer,
    ClientOrServerPrefersBoth,
    #[serde(other)]
    Unknown,
}

impl From<Environment> for ServerSupport {
    fn from(environment: Environment) -> Self {
        match environment {
            Environment::ClientAndServer
            | Environment::ServerOnly
            | Environment::ServerOnlyClientOptional
            | Environment::DedicatedServerOnly => Self::Required,
            Environment::ClientOnlyServerOptional
            | Environment::ClientOrServer
            | Environment::ClientOrServerPrefersBoth => Self::Optional,
            Environment::ClientOnly | Environment::SingleplayerOnly => Self::Unsupported,
            Environment::Unknown => Self::Unknown,
        }
    }
}

/// `GET /v2/project/{id}`.
#[derive(Deserialize, Debug)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub server_side: ServerSupport,
}

/// `GET /v2/version_file/{hash}`.
#[derive(Deserialize, Debug)]
pub struct VersionFile {
    pub id: String,
    pub project_id: String,
}

impl From<VersionFile> for Identified {
    fn from(file: VersionFile) -> Self {
        Self {
            project_id: file.project_id,
            version_id: file.id,
        }
    }
}
