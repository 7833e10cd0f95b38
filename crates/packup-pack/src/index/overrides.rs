//! ## Local pack overrides
//!
//! The zip may also contain a directory named `overrides`. Files in this
//! directory will be copied to the root of the Minecraft Instance directory
//! upon installation by the launcher. For example:
//!
//! ```not-rust
//! my_modpack.mrpack/
//!     modrinth.index.json
//!     overrides/
//!         config/
//!             mymod.cfg
//!         options.txt
//! ```
//!
//! When installed, the contents of `overrides` will be copied to the Minecraft
//! Instance directory and end up similar to this:
//!
//! ```not-rust
//! .minecraft/
//!     config/
//!         mymod.cfg
//!     options.txt
//! ```
//!
//! Modrinth also knows `server-overrides` and `client-overrides`, layered on
//! top of `overrides` for one side only. **packup** reads and writes the
//! common folder only.

use std::path::PathBuf;

pub const COMMON_OVERRIDES_FOLDER: &str = "overrides";
pub const SERVER_OVERRIDES_FOLDER: &str = "server-overrides";
pub const CLIENT_OVERRIDES_FOLDER: &str = "client-overrides";

/// The files copied verbatim from a local overrides directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Overrides {
    /// The directory the files are copied from.
    pub source: Option<PathBuf>,
    /// Paths relative to [`source`](Self::source), sorted.
    pub files: Vec<PathBuf>,
}

impl Overrides {
    pub fn new(source: PathBuf, mut files: Vec<PathBuf>) -> Self {
        files.sort();
        Self {
            source: Some(source),
            files,
        }
    }

    /// Where a file ends up inside the archive.
    #[must_use]
    pub fn archive_name(file: &std::path::Path) -> String {
        let mut name = String::from(COMMON_OVERRIDES_FOLDER);
        for component in file.components() {
            name.push('/');
            name.push_str(&component.as_os_str().to_string_lossy());
        }
        name
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
