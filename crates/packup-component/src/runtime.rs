use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A path relative to the root of a Minecraft instance, like `mods/sodium.jar`.
///
/// Index files are untrusted input, so a [`RuntimePath`] can only be built
/// from a path that stays inside the instance: no root, no drive prefix, no
/// `..` and no `.` components.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[serde(try_from = "PathBuf", into = "PathBuf")]
#[must_use]
pub struct RuntimePath(PathBuf);

#[derive(thiserror::Error, Clone, PartialEq, Eq, Debug)]
pub enum RuntimePathError {
    #[error("the path is empty")]
    Empty,
    #[error("the path {0:?} escapes the instance directory")]
    Escapes(PathBuf),
}

impl RuntimePath {
    /// The first component of the path, like `mods` or `config`.
    #[must_use]
    pub fn directory(&self) -> Option<&str> {
        let mut components = self.0.components();
        let first = components.next()?;
        components.next()?;
        first.as_os_str().to_str()
    }

    /// The last component of the path, lossily converted to UTF-8.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The same directory with another file in it.
    ///
    /// # Errors
    ///
    /// Fails if `file_name` is not a plain file name (contains separators or
    /// `..`), which would let a remote file name pick its own directory.
    pub fn with_file_name(&self, file_name: &str) -> Result<Self, RuntimePathError> {
        let file_name = Path::new(file_name);
        let mut components = file_name.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Self::try_from(self.0.with_file_name(file_name)),
            (None, _) => Err(RuntimePathError::Empty),
            _ => Err(RuntimePathError::Escapes(file_name.to_path_buf())),
        }
    }

    /// Where this path lives under a concrete instance directory.
    #[must_use]
    pub fn under(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl TryFrom<PathBuf> for RuntimePath {
    type Error = RuntimePathError;

    fn try_from(path: PathBuf) -> Result<Self, Self::Error> {
        if path.as_os_str().is_empty() {
            return Err(RuntimePathError::Empty);
        }
        if !path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(RuntimePathError::Escapes(path));
        }
        Ok(Self(path))
    }
}

impl TryFrom<&str> for RuntimePath {
    type Error = RuntimePathError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::try_from(PathBuf::from(path))
    }
}

impl From<RuntimePath> for PathBuf {
    fn from(runtime_path: RuntimePath) -> Self {
        runtime_path.0
    }
}

impl AsRef<Path> for RuntimePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for RuntimePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rstest::rstest;

    use super::{RuntimePath, RuntimePathError};

    #[rstest]
    #[case("mods/sodium.jar")]
    #[case("config/sodium-options.json")]
    #[case("options.txt")]
    fn accepts_instance_relative_paths(#[case] path: &str) {
        let runtime_path = RuntimePath::try_from(path).unwrap();
        assert_eq!(runtime_path.to_string(), path);
    }

    #[rstest]
    #[case("../mods/evil.jar")]
    #[case("mods/../../evil.jar")]
    #[case("/etc/passwd")]
    #[case("./mods/sodium.jar")]
    fn rejects_escaping_paths(#[case] path: &str) {
        assert!(matches!(
            RuntimePath::try_from(path),
            Err(RuntimePathError::Escapes(_))
        ));
    }

    #[test]
    fn directory_and_file_name() {
        let runtime_path = RuntimePath::try_from("mods/sodium.jar").unwrap();
        assert_eq!(runtime_path.directory(), Some("mods"));
        assert_eq!(runtime_path.file_name(), "sodium.jar");
        assert_eq!(RuntimePath::try_from("options.txt").unwrap().directory(), None);
    }

    #[test]
    fn with_file_name() {
        let runtime_path = RuntimePath::try_from("mods/sodium-0.5.jar").unwrap();
        let updated = runtime_path.with_file_name("sodium-0.6.jar").unwrap();
        assert_eq!(updated.to_string(), "mods/sodium-0.6.jar");
        assert!(runtime_path.with_file_name("../sodium.jar").is_err());
        assert!(runtime_path.with_file_name("nested/sodium.jar").is_err());
        assert_eq!(
            updated.under(Path::new("/srv/instance")),
            Path::new("/srv/instance/mods/sodium-0.6.jar")
        );
    }

    #[test]
    fn deserialization_validates() {
        assert!(serde_json::from_str::<RuntimePath>(r#""mods/a.jar""#).is_ok());
        assert!(serde_json::from_str::<RuntimePath>(r#""../a.jar""#).is_err());
    }
}
