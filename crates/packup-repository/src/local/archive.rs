//! Zip archives and file swaps on the local filesystem.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    #[error("An I/O error occurred, path at fault: {path:?}")]
    Io { source: io::Error, path: PathBuf },

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error("archive entry {name:?} would be extracted outside of the destination")]
    UnsafeEntry { name: String },
}

impl ArchiveError {
    fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { source, path }
    }
}

/// Contents of an entry to be written by [`create_archive`].
#[derive(Debug, Clone)]
pub enum EntrySource {
    Bytes(Vec<u8>),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// The `/`-separated path of the entry inside the archive.
    pub name: String,
    pub source: EntrySource,
}

/// Extracts every entry of `archive` into `destination`.
///
/// # Errors
///
/// Fails on the first entry whose name would land outside of `destination`
/// (absolute paths, `..` components), leaving whatever was already
/// extracted in place.
pub fn extract_archive(archive: &Path, destination: &Path) -> Result<(), ArchiveError> {
    let file = File::open(archive).map_err(ArchiveError::io(archive))?;
    let mut archive = zip::ZipArchive::new(file)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(ArchiveError::UnsafeEntry {
                name: entry.name().to_string(),
            });
        };
        let target = destination.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(ArchiveError::io(&target))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(ArchiveError::io(parent))?;
        }
        let mut output = File::create(&target).map_err(ArchiveError::io(&target))?;
        io::copy(&mut entry, &mut output).map_err(ArchiveError::io(&target))?;
    }

    Ok(())
}

/// Writes `entries`, in the given order, into a new zip at `path`.
///
/// # Errors
///
/// Fails if `path` can't be created or a [`EntrySource::File`] can't be read.
pub fn create_archive(path: &Path, entries: &[ArchiveEntry]) -> Result<(), ArchiveError> {
    let file = File::create(path).map_err(ArchiveError::io(path))?;
    let mut archive = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for ArchiveEntry { name, source } in entries {
        archive.start_file(name.as_str(), options)?;
        match source {
            EntrySource::Bytes(bytes) => archive.write_all(bytes).map_err(ArchiveError::io(path))?,
            EntrySource::File(source) => {
                let mut input = File::open(source).map_err(ArchiveError::io(source))?;
                io::copy(&mut input, &mut archive).map_err(ArchiveError::io(source))?;
            }
        }
    }

    archive.finish()?;
    Ok(())
}

/// Replaces the contents of `path` with `bytes` so that readers see either
/// the old file or the complete new one.
///
/// The bytes go to a `.part` file next to `path` first, which is then renamed
/// over it. On failure, the temporary file is removed and `path` is left as
/// it was.
///
/// # Errors
///
/// Fails if the temporary file can't be written or renamed.
pub fn atomic_replace(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let part = part_path(path)?;
    let result = fs::write(&part, bytes).and_then(|()| fs::rename(&part, path));
    if result.is_err() {
        let _ = fs::remove_file(&part);
    }
    result
}

fn part_path(path: &Path) -> io::Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    Ok(path.with_file_name(format!(".{}.part", file_name.to_string_lossy())))
}

/// Every file below `directory`, relative to it, sorted.
///
/// # Errors
///
/// Fails if `directory` can't be traversed.
pub fn list_files(directory: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = vec![];
    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(directory) {
            files.push(relative.to_path_buf());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::PathBuf;

    use tempdir::TempDir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    use super::{ArchiveEntry, ArchiveError, EntrySource, atomic_replace, create_archive, extract_archive, list_files};

    #[test]
    fn archive_round_trip() {
        let dir = TempDir::new("packup-archive").unwrap();
        let source = dir.path().join("options.txt");
        fs::write(&source, "fov:90").unwrap();

        let archive = dir.path().join("pack.mrpack");
        let entries = [
            ArchiveEntry {
                name: "modrinth.index.json".into(),
                source: EntrySource::Bytes(b"{}".to_vec()),
            },
            ArchiveEntry {
                name: "overrides/options.txt".into(),
                source: EntrySource::File(source),
            },
        ];
        create_archive(&archive, &entries).unwrap();

        let out = dir.path().join("out");
        extract_archive(&archive, &out).unwrap();
        assert_eq!(fs::read_to_string(out.join("modrinth.index.json")).unwrap(), "{}");
        assert_eq!(fs::read_to_string(out.join("overrides/options.txt")).unwrap(), "fov:90");
        assert_eq!(
            list_files(&out).unwrap(),
            vec![
                PathBuf::from("modrinth.index.json"),
                PathBuf::from("overrides").join("options.txt"),
            ]
        );
    }

    #[test]
    fn traversal_entries_are_rejected() {
        let dir = TempDir::new("packup-archive").unwrap();
        let archive = dir.path().join("evil.mrpack");
        let mut writer = ZipWriter::new(File::create(&archive).unwrap());
        writer.start_file("../escaped.txt", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"gotcha").unwrap();
        writer.finish().unwrap();

        let out = dir.path().join("out");
        let result = extract_archive(&archive, &out);
        assert!(matches!(result, Err(ArchiveError::UnsafeEntry { name }) if name == "../escaped.txt"));
        assert!(!dir.path().join("escaped.txt").exists());
    }

    #[test]
    fn replace_leaves_no_part_file() {
        let dir = TempDir::new("packup-archive").unwrap();
        let path = dir.path().join("sodium.jar");
        fs::write(&path, "old").unwrap();

        atomic_replace(&path, b"new").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
        assert_eq!(list_files(dir.path()).unwrap(), vec![PathBuf::from("sodium.jar")]);
    }

    #[test]
    fn failed_replace_keeps_original() {
        let dir = TempDir::new("packup-archive").unwrap();
        let missing = dir.path().join("missing").join("sodium.jar");
        assert!(atomic_replace(&missing, b"new").is_err());
        assert!(list_files(dir.path()).unwrap().is_empty());
    }
}
