use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Env, Hashes, Id, RuntimePath};

/// A **mod declared in a pack's index**, pinned to one particular file.
///
/// Entries are read once and never changed. Resolving an entry produces a new
/// value that refers back to it instead.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[must_use]
pub struct ModEntry {
    /// How this mod is referred to in logs and reports.
    pub id: Id,
    /// The hosting service's project ID, if the index lets us know it.
    pub project_id: Option<String>,
    /// The hosting service's ID of the pinned version.
    pub pinned_version: Option<String>,
    pub path: RuntimePath,
    pub hashes: Hashes,
    pub environment: Option<Env>,
    pub downloads: Vec<Url>,
    pub file_size: u64,
}

impl ModEntry {
    /// The instance directory mods are installed to.
    pub const MODS_DIRECTORY: &'static str = "mods";

    /// Creates a [`ModEntry`], recovering the project and version IDs from
    /// the first Modrinth CDN URL among `downloads`.
    pub fn new(
        path: RuntimePath,
        hashes: Hashes,
        environment: Option<Env>,
        downloads: Vec<Url>,
        file_size: u64,
    ) -> Self {
        let ids = downloads.iter().find_map(CdnUrl::parse);
        let (project_id, pinned_version) = ids.map_or((None, None), |CdnUrl { project, version }| {
            (Some(project), Some(version))
        });
        let id = project_id.clone().map_or_else(
            || {
                let file_name = path.file_name();
                let stem = file_name.strip_suffix(".jar").unwrap_or(&file_name);
                Id::from(stem.to_string())
            },
            Id::from,
        );

        Self {
            id,
            project_id,
            pinned_version,
            path,
            hashes,
            environment,
            downloads,
            file_size,
        }
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        self.path.file_name()
    }

    /// Whether this entry was identified with the hosting service yet.
    #[must_use]
    pub const fn is_identified(&self) -> bool {
        self.project_id.is_some()
    }

    /// Returns a copy of this entry with known project and version IDs.
    pub fn identified(&self, project_id: String, version_id: String) -> Self {
        Self {
            id: Id::from(project_id.clone()),
            project_id: Some(project_id),
            pinned_version: Some(version_id),
            ..self.clone()
        }
    }
}

/// The IDs encoded in a [Modrinth](https://modrinth.com) CDN URL:
/// `https://cdn.modrinth.com/data/{project}/versions/{version}/{file}`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CdnUrl {
    pub project: String,
    pub version: String,
}

impl CdnUrl {
    pub const HOST: &'static str = "cdn.modrinth.com";

    #[must_use]
    pub fn parse(url: &Url) -> Option<Self> {
        if url.host_str() != Some(Self::HOST) {
            return None;
        }
        let mut segments = url.path_segments()?;
        match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some("data"), Some(project), Some("versions"), Some(version))
                if !project.is_empty() && !version.is_empty() =>
            {
                Some(Self {
                    project: project.to_string(),
                    version: version.to_string(),
                })
            }
            _ => None,
        }
    }
}
