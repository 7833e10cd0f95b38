//! This crate is a part of **[packup]**.
//!
//! It describes a modpack: the [`Instance`] it targets, the mods it pins, the
//! **`.mrpack`** [`Index`] it is read from and written to, and the versions a
//! hosting service offers for its mods ([`VersionCandidate`](candidate::VersionCandidate)).
//!
//! [packup]: https://github.com/packup-mc/packup

use std::collections::HashSet;
use std::path::PathBuf;

use packup_component::{ModEntry, RuntimePath};
use serde::{Deserialize, Serialize};

use crate::index::{File, Index};
use crate::instance::version::MinecraftVersion;
use crate::instance::{Instance, Loader};

pub mod candidate;
pub mod index;
pub mod instance;
pub mod settings;

/// The top-level **"modpack" entity**, as read from an index.
///
/// A [`Pack`] is validated on creation: it targets a known loader and a game
/// version, and no two of its files share a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Pack {
    pub name: String,
    pub version_id: String,
    pub summary: Option<String>,
    pub instance: Instance,

    /// Mods, in index order.
    pub mods: Vec<ModEntry>,

    /// Every other file of the index (resourcepacks, shaders, ...), in
    /// index order. These are carried over without being resolved.
    pub passthrough: Vec<File>,

    /// The directory holding files to be copied verbatim into the pack.
    pub overrides: Option<PathBuf>,
}

/// Reasons an [`Index`] can't be turned into a [`Pack`].
#[derive(thiserror::Error, Clone, PartialEq, Eq, Debug)]
pub enum IndexError {
    #[error("format version {0} is not supported")]
    UnsupportedFormat(u8),
    #[error("the pack is for {0:?}, not minecraft")]
    UnsupportedGame(String),
    #[error("the index does not declare a minecraft version")]
    MissingGameVersion,
    #[error("the index does not declare a modloader")]
    MissingLoader,
    #[error("modloader {0:?} is not one of fabric, quilt, forge or neoforge")]
    UnsupportedLoader(String),
    #[error("more than one file is installed at {0}")]
    DuplicateDestination(RuntimePath),
}

/// Which flavor of pack to assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Variant {
    Client,
    Server,
}

impl Variant {
    /// Appended to the file name of the pack's archive.
    #[must_use]
    pub const fn file_suffix(self) -> &'static str {
        match self {
            Self::Client => "",
            Self::Server => "-server",
        }
    }

    /// Appended to the display name inside the pack's index.
    #[must_use]
    pub const fn name_suffix(self) -> &'static str {
        match self {
            Self::Client => "",
            Self::Server => " (Server)",
        }
    }
}

impl Pack {
    pub const ARCHIVE_EXTENSION: &'static str = "mrpack";
    pub const FALLBACK_NAME: &'static str = "modpack";

    /// Validates an [`Index`] and splits its files into mods and
    /// passthrough files.
    ///
    /// # Errors
    ///
    /// See [`IndexError`] for the possible causes.
    pub fn from_index(index: Index, overrides: Option<PathBuf>) -> Result<Self, IndexError> {
        if index.format_version != Index::FORMAT_VERSION {
            return Err(IndexError::UnsupportedFormat(index.format_version));
        }
        if index.game != Index::GAME_LITERAL {
            return Err(IndexError::UnsupportedGame(index.game));
        }

        let minecraft_version = index
            .dependencies
            .get(Loader::MINECRAFT_KEY)
            .filter(|version| !version.trim().is_empty())
            .map(MinecraftVersion::from)
            .ok_or(IndexError::MissingGameVersion)?;
        let (loader, loader_version) = Self::loader_dependency(&index)?;
        let instance = Instance::new(minecraft_version, loader, loader_version);

        let mut seen = HashSet::new();
        if let Some(duplicate) = index.files.iter().find(|file| !seen.insert(&file.path)) {
            return Err(IndexError::DuplicateDestination(duplicate.path.clone()));
        }

        let (mods, passthrough): (Vec<_>, Vec<_>) = index
            .files
            .into_iter()
            .partition(|file| file.path.directory() == Some(ModEntry::MODS_DIRECTORY));
        let mods = mods
            .into_iter()
            .map(|file| ModEntry::new(file.path, file.hashes, file.env, file.downloads, file.file_size))
            .collect();

        Ok(Self {
            name: index.name,
            version_id: index.version_id,
            summary: index.summary,
            instance,
            mods,
            passthrough,
            overrides,
        })
    }

    fn loader_dependency(index: &Index) -> Result<(Loader, String), IndexError> {
        let mut loaders = index
            .dependencies
            .iter()
            .filter(|(key, _)| key.as_str() != Loader::MINECRAFT_KEY);
        let (key, version) = loaders.next().ok_or(IndexError::MissingLoader)?;
        let loader = Loader::from_dependency_key(key)
            .ok_or_else(|| IndexError::UnsupportedLoader(key.clone()))?;
        if let Some((second, _)) = loaders.next() {
            return Err(IndexError::UnsupportedLoader(format!("{key} + {second}")));
        }
        Ok((loader, version.clone()))
    }

    /// The pack's name, made safe for use in file names.
    #[must_use]
    pub fn file_stem(&self) -> String {
        let stem: String = self
            .name
            .trim()
            .chars()
            .filter(|char| !matches!(char, '[' | ']' | '/' | '\\'))
            .map(|char| if char.is_whitespace() { '_' } else { char })
            .collect();
        match stem.is_empty() {
            true => Self::FALLBACK_NAME.to_string(),
            false => stem,
        }
    }

    /// The file name of this pack's archive for `variant`.
    #[must_use]
    pub fn archive_file_name(&self, variant: Variant) -> String {
        format!(
            "{stem}{suffix}.{ext}",
            stem = self.file_stem(),
            suffix = variant.file_suffix(),
            ext = Self::ARCHIVE_EXTENSION,
        )
    }

    /// The file name of the changelog written next to the archives.
    #[must_use]
    pub fn changelog_file_name(&self) -> String {
        format!("{}_changelog.md", self.file_stem())
    }
}

#[cfg(test)]
mod tests {
    use indoc::formatdoc;
    use rstest::rstest;

    use super::{IndexError, Pack, Variant};
    use crate::index::Index;
    use crate::instance::Loader;
    use crate::instance::version::MinecraftVersion;

    const SHA1: &str = "a9993e364706816aba3e25717850c26c9cd0d89d";
    const SHA512: &str = "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f";

    fn index_json(dependencies: &str, paths: &[&str]) -> String {
        let files = paths
            .iter()
            .map(|path| {
                format!(
                    r#"{{"path": "{path}", "hashes": {{"sha1": "{SHA1}", "sha512": "{SHA512}"}}, "downloads": ["https://cdn.modrinth.com/data/P/versions/V/f.jar"], "fileSize": 1}}"#
                )
            })
            .collect::<Vec<_>>()
            .join(",");
        formatdoc! {r#"
                {{
                  "formatVersion": 1,
                  "game": "minecraft",
                  "versionId": "1.0.0",
                  "name": "[Cozy] Quilt Pack",
                  "files": [{files}],
                  "dependencies": {dependencies}
                }}
            "#,
            files = files,
            dependencies = dependencies,
        }
    }

    fn load(dependencies: &str, paths: &[&str]) -> Result<Pack, IndexError> {
        let index = Index::from_json(&index_json(dependencies, paths)).unwrap();
        Pack::from_index(index, None)
    }

    #[test]
    fn splits_mods_from_passthrough_files() {
        let pack = load(
            r#"{"minecraft": "1.21.6", "quilt-loader": "0.29.0"}"#,
            &["mods/a.jar", "resourcepacks/b.zip", "mods/c.jar"],
        )
        .unwrap();
        assert_eq!(pack.instance.loader, Loader::Quilt);
        assert_eq!(pack.instance.minecraft_version, MinecraftVersion::from("1.21.6"));
        assert_eq!(pack.mods.len(), 2);
        assert_eq!(pack.mods[1].path.to_string(), "mods/c.jar");
        assert_eq!(pack.passthrough.len(), 1);
    }

    #[rstest]
    #[case(r#"{"minecraft": "1.21.6", "liteloader": "1.0"}"#, IndexError::UnsupportedLoader("liteloader".into()))]
    #[case(r#"{"minecraft": "1.21.6"}"#, IndexError::MissingLoader)]
    #[case(r#"{"fabric-loader": "0.16.14"}"#, IndexError::MissingGameVersion)]
    #[case(r#"{"minecraft": "", "forge": "47.3.22"}"#, IndexError::MissingGameVersion)]
    fn rejects_bad_dependencies(#[case] dependencies: &str, #[case] expected: IndexError) {
        assert_eq!(load(dependencies, &["mods/a.jar"]), Err(expected));
    }

    #[test]
    fn rejects_duplicate_destinations() {
        let result = load(
            r#"{"minecraft": "1.21.6", "fabric-loader": "0.16.14"}"#,
            &["mods/a.jar", "mods/b.jar", "mods/a.jar"],
        );
        assert!(matches!(result, Err(IndexError::DuplicateDestination(path)) if path.to_string() == "mods/a.jar"));
    }

    #[test]
    fn archive_names() {
        let pack = load(r#"{"minecraft": "1.21.6", "neoforge": "21.6.1"}"#, &[]).unwrap();
        assert_eq!(pack.file_stem(), "Cozy_Quilt_Pack");
        assert_eq!(pack.archive_file_name(Variant::Client), "Cozy_Quilt_Pack.mrpack");
        assert_eq!(pack.archive_file_name(Variant::Server), "Cozy_Quilt_Pack-server.mrpack");
        assert_eq!(pack.changelog_file_name(), "Cozy_Quilt_Pack_changelog.md");
    }
}
