//! Input file discovery.
//!
//! Accepts `.txt` dumps directly and unpacks `.zip` archives of dumps into
//! the shared extraction directory. The extraction directory is shared by
//! every session, so it is only touched while holding [`ExtractionGuard`].

use crate::constants::{TEXT_EXTENSION, ZIP_EXTENSION};
use crate::error::{MerError, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

static EXTRACTION_LOCK: Mutex<()> = Mutex::new(());

/// Exclusive use of the extraction directory.
///
/// The directory is emptied when the guard is taken and again when it
/// is dropped.
pub struct ExtractionGuard {
    dir: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl ExtractionGuard {
    pub fn acquire(dir: &Path) -> Result<Self> {
        let lock = EXTRACTION_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        clear_extraction_dir(dir)?;
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            _lock: lock,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Drop for ExtractionGuard {
    fn drop(&mut self) {
        if let Err(e) = clear_extraction_dir(&self.dir) {
            warn!(
                "Could not clear extraction directory {}: {}",
                self.dir.display(),
                e
            );
        }
    }
}

/// Clear the extraction directory once no session is extracting into it.
///
/// Blocks until the running [`ExtractionGuard`], if any, is dropped.
pub fn release_extraction_dir(dir: &Path) -> Result<()> {
    let _lock = EXTRACTION_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    clear_extraction_dir(dir)
}

/// Remove everything below the extraction directory
pub fn clear_extraction_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {
            debug!("Cleared extraction directory {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Dump files resolved from the user's input paths
pub struct InputSet {
    pub files: Vec<PathBuf>,
    /// Held while any file lives in the extraction directory
    pub extraction: Option<ExtractionGuard>,
}

/// Resolve input paths to dump files, extracting archives.
///
/// Any path that is neither `.txt` nor `.zip` rejects the whole input.
pub fn expand_inputs(paths: &[PathBuf], extraction_dir: &Path) -> Result<InputSet> {
    if let Some(path) = paths.iter().find(|path| !is_valid_input(path)) {
        return Err(MerError::UnsupportedFile { path: path.clone() });
    }

    let mut files = Vec::new();
    let mut extraction = None;

    for (index, path) in paths.iter().enumerate() {
        if has_extension(path, TEXT_EXTENSION) {
            files.push(path.clone());
            continue;
        }

        if extraction.is_none() {
            extraction = Some(ExtractionGuard::acquire(extraction_dir)?);
        }
        if let Some(guard) = &extraction {
            let target = guard.dir().join(format!("{:03}", index));
            let extracted = extract_text_files(path, &target)?;
            debug!(
                "Extracted {} dumps from {}",
                extracted.len(),
                path.display()
            );
            files.extend(extracted);
        }
    }

    Ok(InputSet { files, extraction })
}

/// Write every `.txt` entry of an archive below `target`
pub fn extract_text_files(archive_path: &Path, target: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(target)?;

    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            warn!(
                "Skipping unsafe entry {} in {}",
                entry.name(),
                archive_path.display()
            );
            continue;
        };
        if !has_extension(&relative, TEXT_EXTENSION) {
            continue;
        }

        let out_path = target.join(relative);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        extracted.push(out_path);
    }

    extracted.sort();
    Ok(extracted)
}

/// Every `.txt` and `.zip` file below a directory, sorted by path
pub fn discover_bulk_inputs(source_dir: &Path) -> Result<Vec<PathBuf>> {
    if !source_dir.is_dir() {
        return Err(MerError::Configuration {
            message: format!("{} is not a directory", source_dir.display()),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(source_dir) {
        let entry = entry.map_err(|e| MerError::Io(io::Error::other(e.to_string())))?;
        if entry.file_type().is_file() && is_valid_input(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!(
        "Found {} input files in {}",
        files.len(),
        source_dir.display()
    );
    Ok(files)
}

/// Check if a path is an importable dump or archive
pub fn is_valid_input(path: &Path) -> bool {
    has_extension(path, TEXT_EXTENSION) || has_extension(path, ZIP_EXTENSION)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::{ExtendedFileOptions, FileOptions};

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, content) in entries {
            let options = FileOptions::<ExtendedFileOptions>::default()
                .compression_method(zip::CompressionMethod::Stored);
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_is_valid_input() {
        assert!(is_valid_input(Path::new("a.txt")));
        assert!(is_valid_input(Path::new("/x/b.ZIP")));
        assert!(!is_valid_input(Path::new("c.csv")));
        assert!(!is_valid_input(Path::new("d")));
    }

    #[test]
    fn test_unsupported_file_rejects_input() {
        let temp_dir = TempDir::new().unwrap();
        let paths = vec![PathBuf::from("a.txt"), PathBuf::from("b.mer")];

        match expand_inputs(&paths, &temp_dir.path().join("extract")) {
            Err(MerError::UnsupportedFile { path }) => assert_eq!(path, PathBuf::from("b.mer")),
            _ => panic!("Expected UnsupportedFile error"),
        }
    }

    #[test]
    fn test_zip_inputs_are_extracted_and_cleared() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("mission.zip");
        write_zip(
            &archive,
            &[
                ("sortie/20190305_a.txt", "EVENT NUMBER: 1\n"),
                ("readme.md", "ignored"),
            ],
        );
        let text = temp_dir.path().join("20190306_b.txt");
        fs::write(&text, "EVENT NUMBER: 1\n").unwrap();

        let extract_dir = temp_dir.path().join("extract");
        {
            let inputs = expand_inputs(&[archive, text.clone()], &extract_dir).unwrap();
            assert_eq!(inputs.files.len(), 2);
            assert!(inputs.files[0].starts_with(&extract_dir));
            assert!(inputs.files[0].ends_with("sortie/20190305_a.txt"));
            assert!(inputs.files[0].exists());
            assert_eq!(inputs.files[1], text);
        }

        assert!(!extract_dir.exists());
    }

    #[test]
    fn test_release_waits_for_running_extraction() {
        let temp_dir = TempDir::new().unwrap();
        let extract_dir = temp_dir.path().join("extract");
        let guard = ExtractionGuard::acquire(&extract_dir).unwrap();
        let dump = guard.dir().join("20190305_a.txt");
        fs::write(&dump, "EVENT NUMBER: 1\n").unwrap();

        let (sender, receiver) = std::sync::mpsc::channel();
        let dir = extract_dir.clone();
        let releaser = std::thread::spawn(move || {
            release_extraction_dir(&dir).unwrap();
            sender.send(()).unwrap();
        });

        // The dump stays readable while the guard is held
        assert!(
            receiver
                .recv_timeout(std::time::Duration::from_millis(100))
                .is_err()
        );
        assert!(dump.exists());

        drop(guard);
        receiver.recv().unwrap();
        releaser.join().unwrap();
        assert!(!extract_dir.exists());
    }

    #[test]
    fn test_discover_bulk_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp_dir.path().join("1.txt"), "").unwrap();
        fs::write(nested.join("2.zip"), "").unwrap();
        fs::write(nested.join("3.csv"), "").unwrap();

        let files = discover_bulk_inputs(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| is_valid_input(f)));
    }

    #[test]
    fn test_discover_bulk_inputs_requires_directory() {
        let temp_dir = TempDir::new().unwrap();
        assert!(discover_bulk_inputs(&temp_dir.path().join("missing")).is_err());
    }
}
