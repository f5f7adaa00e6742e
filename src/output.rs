//! File plumbing: atomic writes, output naming, chunked reads/writes with
//! progress, and default data-source discovery.

use crate::errors::EngineError;
use crate::progress::{PhaseProgress, Reporter};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Buffer size for progress-reporting reads and writes.
pub const IO_CHUNK: usize = 8 * 1024;

/// Which kind of data source to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Dictionary,
    PatchTable,
}

impl SourceKind {
    /// Default file names, in lookup order.
    pub fn default_names(self) -> &'static [&'static str] {
        match self {
            SourceKind::Dictionary => &["dictionary.csv", "dictionary.txt"],
            SourceKind::PatchTable => &["patch_data.csv"],
        }
    }
}

/// Find the default data source in `dir`.
pub fn discover_data_source(dir: &Path, kind: SourceKind) -> Result<PathBuf, EngineError> {
    kind.default_names()
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| EngineError::NoDataSource(dir.to_path_buf()))
}

/// `dir/story.txt` -> `dir/story_translated.txt`; the extension is always `.txt`.
pub fn translated_output_path(input: &Path) -> PathBuf {
    with_suffix(input, "_translated", Some("txt"))
}

/// `dir/game.bin` -> `dir/game_patched.bin`; the original extension is kept.
pub fn patched_output_path(input: &Path) -> PathBuf {
    let ext = input.extension().and_then(|e| e.to_str()).map(str::to_string);
    with_suffix(input, "_patched", ext.as_deref())
}

fn with_suffix(input: &Path, suffix: &str, ext: Option<&str>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match ext {
        Some(ext) => format!("{stem}{suffix}.{ext}"),
        None => format!("{stem}{suffix}"),
    };
    input.with_file_name(name)
}

/// Read a whole file, reporting progress every [`IO_CHUNK`] bytes.
pub fn read_with_progress(path: &Path, reporter: &dyn Reporter) -> Result<Vec<u8>, EngineError> {
    let mut file = File::open(path).map_err(|e| EngineError::io(path, e))?;
    let total = file.metadata().map(|m| m.len()).unwrap_or(0);

    let mut progress = PhaseProgress::new(reporter, total);
    let mut content = Vec::with_capacity(total as usize);
    let mut buf = vec![0u8; IO_CHUNK];
    loop {
        let n = file.read(&mut buf).map_err(|e| EngineError::io(path, e))?;
        if n == 0 {
            break;
        }
        content.extend_from_slice(&buf[..n]);
        progress.advance_to(content.len() as u64);
    }
    progress.finish();
    Ok(content)
}

/// Atomically write `content`, reporting progress every [`IO_CHUNK`] bytes.
pub fn write_with_progress(
    path: &Path,
    content: &[u8],
    reporter: &dyn Reporter,
) -> Result<(), EngineError> {
    let mut progress = PhaseProgress::new(reporter, content.len() as u64);
    let mut temp = temp_file_beside(path)?;
    let mut written = 0usize;
    for chunk in content.chunks(IO_CHUNK) {
        temp.write_all(chunk).map_err(|e| EngineError::io(path, e))?;
        written += chunk.len();
        progress.advance_to(written as u64);
    }
    persist(temp, path)?;
    progress.finish();
    Ok(())
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write lands or the previous file is left untouched.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EngineError> {
    let mut temp = temp_file_beside(path)?;
    temp.write_all(content).map_err(|e| EngineError::io(path, e))?;
    persist(temp, path)
}

fn temp_file_beside(path: &Path) -> Result<tempfile::NamedTempFile, EngineError> {
    // Same directory as the target so the rename stays on one filesystem
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    tempfile::NamedTempFile::new_in(parent).map_err(|e| EngineError::io(path, e))
}

fn persist(temp: tempfile::NamedTempFile, path: &Path) -> Result<(), EngineError> {
    temp.as_file()
        .sync_all()
        .map_err(|e| EngineError::io(path, e))?;
    temp.persist(path).map_err(|e| EngineError::io(path, e.error))?;
    Ok(())
}
