use packup_component::{ServerSupport, Sha1};
use packup_pack::candidate::VersionCandidate;
use url::Url;

/// A remote service hosting mods and their versions.
///
/// Implementations must be shareable between worker threads. They are not
/// expected to pace themselves: callers decide how often to ask.
pub trait VersionSource: Send + Sync {
    /// Every published version of `project_id`, in the service's own order
    /// (newest first on [Modrinth](https://modrinth.com)).
    fn list_versions(&self, project_id: &str) -> Result<Vec<VersionCandidate>, SourceError>;

    /// The display name of `project_id`, like `Sodium`. Returns [`None`] if
    /// the service doesn't know the project.
    fn project_title(&self, project_id: &str) -> Result<Option<String>, SourceError>;

    /// Whether `version_id` of `project_id` runs on a dedicated server.
    fn server_support(&self, project_id: &str, version_id: &str) -> Result<ServerSupport, SourceError>;

    /// Finds the project and version a file belongs to by its **SHA1** hash.
    /// Returns [`None`] if the service doesn't know the file.
    fn identify(&self, sha1: &Sha1) -> Result<Option<Identified>, SourceError>;

    fn download(&self, url: &Url) -> Result<Vec<u8>, SourceError>;
}

/// The result of [`VersionSource::identify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identified {
    pub project_id: String,
    pub version_id: String,
}

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{reason}")]
    Unavailable { reason: String },
}

impl SourceError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}
