use std::collections::BTreeMap;

use bon::bon;
use overrides::Overrides;
use packup_component::{Env, Hashes, ModEntry, RuntimePath};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::candidate::CandidateFile;
use crate::instance::Instance;

/// Interface for with the `overrides` folder inside of an **`.mrpack`**.
pub mod overrides;

/// [Modrinth's `.mrpack`](https://support.modrinth.com/en/articles/8802351-modrinth-modpack-format-mrpack) index, `modrinth.index.json`.
///
/// Fields are declared (and thus serialized) in a fixed order and the
/// `dependencies` table is sorted, so equal indices serialize to equal bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub dependencies: BTreeMap<String, String>,
    pub files: Vec<File>,
    pub format_version: u8,
    pub game: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub version_id: String,

    #[serde(skip)]
    pub overrides: Overrides,
}

impl Index {
    pub const FILE_NAME: &'static str = "modrinth.index.json";
    pub const GAME_LITERAL: &'static str = "minecraft";
    pub const FORMAT_VERSION: u8 = 1;

    #[must_use]
    pub fn new(
        name: String,
        version_id: String,
        summary: Option<String>,
        instance: &Instance,
        files: Vec<File>,
        overrides: Overrides,
    ) -> Self {
        Self {
            dependencies: instance.index_dependencies(),
            files,
            format_version: Self::FORMAT_VERSION,
            game: Self::GAME_LITERAL.to_string(),
            name,
            summary,
            version_id,
            overrides,
        }
    }

    /// Parses an index from the contents of `modrinth.index.json`.
    ///
    /// # Errors
    ///
    /// Fails if `json` is not a well-formed index.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes this index the way it is stored inside an **`.mrpack`**.
    ///
    /// # Errors
    ///
    /// See [`serde_json::to_string_pretty`].
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// An entry in the `files` array of the [`Index`].
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub path: RuntimePath,
    pub hashes: Hashes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Env>,
    pub downloads: Vec<Url>,
    pub file_size: u64,
}

#[bon]
impl File {
    /// An entry installing a freshly resolved file at `runtime_path`.
    #[builder(finish_fn = build)]
    pub fn from_candidate(
        runtime_path: RuntimePath,
        env: Option<Env>,
        candidate_file: &CandidateFile,
    ) -> Self {
        Self {
            path: runtime_path,
            hashes: candidate_file.hashes.clone(),
            env,
            downloads: vec![candidate_file.url.clone()],
            file_size: candidate_file.size,
        }
    }
}

impl From<&ModEntry> for File {
    fn from(entry: &ModEntry) -> Self {
        Self {
            path: entry.path.clone(),
            hashes: entry.hashes.clone(),
            env: entry.environment,
            downloads: entry.downloads.clone(),
            file_size: entry.file_size,
        }
    }
}
