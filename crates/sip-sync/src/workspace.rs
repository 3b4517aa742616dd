//! Filesystem staging inside the cloned website repository.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Failed to {action} {}: {source}", .path.display())]
pub struct FsError {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
}

impl FsError {
    fn new(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Remove `dir` with everything in it, then recreate it empty.
pub fn reset_dir(dir: &Path) -> Result<(), FsError> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(FsError::new("remove", dir, e)),
    }
    std::fs::create_dir_all(dir).map_err(|e| FsError::new("create", dir, e))
}

/// Copy every Markdown file directly under `src` into `dst`, unchanged.
///
/// Returns the copied file names in sorted order.
pub fn copy_markdown(src: &Path, dst: &Path) -> Result<Vec<String>, FsError> {
    let entries = std::fs::read_dir(src).map_err(|e| FsError::new("read", src, e))?;

    let mut sources: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| FsError::new("read", src, e))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| FsError::new("inspect", &path, e))?;
        let is_markdown = path.extension().is_some_and(|ext| ext == "md");
        if file_type.is_file() && is_markdown {
            sources.push(path);
        }
    }
    sources.sort();

    let mut copied = Vec::with_capacity(sources.len());
    for source in sources {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = dst.join(name);
        tracing::debug!(
            source = %source.display(),
            target = %target.display(),
            "Copying merged proposal"
        );
        std::fs::copy(&source, &target).map_err(|e| FsError::new("copy", &source, e))?;
        copied.push(name.to_string_lossy().into_owned());
    }

    Ok(copied)
}

/// Write a rendered document as `dir/file_name`.
pub fn write_document(dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf, FsError> {
    let path = dir.join(file_name);
    std::fs::write(&path, contents).map_err(|e| FsError::new("write", &path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_dir_clears_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("out/sips");
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("stale.md"), "old").unwrap();

        reset_dir(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_reset_dir_creates_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a/b/c");
        reset_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_copy_markdown_only_copies_top_level_md() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("content");
        let dst = tmp.path().join("out");
        std::fs::create_dir_all(src.join("drafts")).unwrap();
        std::fs::create_dir_all(&dst).unwrap();
        std::fs::write(src.join("b-proposal.md"), "---\ntitle: B\n---\nbody\n").unwrap();
        std::fs::write(src.join("a-proposal.md"), "A").unwrap();
        std::fs::write(src.join("notes.txt"), "skip").unwrap();
        std::fs::write(src.join("drafts/c.md"), "skip").unwrap();

        let copied = copy_markdown(&src, &dst).unwrap();

        assert_eq!(copied, vec!["a-proposal.md", "b-proposal.md"]);
        assert_eq!(
            std::fs::read_to_string(dst.join("b-proposal.md")).unwrap(),
            "---\ntitle: B\n---\nbody\n"
        );
        assert!(!dst.join("notes.txt").exists());
        assert!(!dst.join("c.md").exists());
    }

    #[test]
    fn test_copy_markdown_missing_source_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = copy_markdown(&tmp.path().join("nope"), tmp.path()).unwrap_err();
        assert!(err.path().ends_with("nope"));
    }
}
