// imgnorm/src/processors/traverser.rs
use crate::core::{ResizeError, Result};
use crate::utils::has_extension;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists files under a root. The batch executor only depends on this trait,
/// so other storage backends can be plugged in next to [`LocalTraverser`].
pub trait Traversal: Send + Sync {
    /// Files under `root` whose extension is in `include` (all files when
    /// empty) and not in `exclude`, sorted. With `relative` the paths are
    /// relative to `root`.
    fn list(
        &self,
        root: &Path,
        include: &[String],
        exclude: &[String],
        relative: bool,
    ) -> Result<Vec<PathBuf>>;
}

#[derive(Debug, Clone, Default)]
pub struct LocalTraverser {
    follow_links: bool,
}

impl LocalTraverser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }
}

impl Traversal for LocalTraverser {
    fn list(
        &self,
        root: &Path,
        include: &[String],
        exclude: &[String],
        relative: bool,
    ) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            log::debug!("{} does not exist, nothing to list", root.display());
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(root).follow_links(self.follow_links) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !include.is_empty() && !has_extension(path, include) {
                continue;
            }
            if has_extension(path, exclude) {
                continue;
            }

            if relative {
                let rel = path.strip_prefix(root).map_err(|e| {
                    ResizeError::Traversal(format!("{}: {}", path.display(), e))
                })?;
                paths.push(rel.to_path_buf());
            } else {
                paths.push(entry.into_path());
            }
        }

        paths.sort();
        log::debug!("Found {} files under {}", paths.len(), root.display());
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lists_relative_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b/two.PNG");
        touch(dir.path(), "a/one.jpg");
        touch(dir.path(), "a/notes.txt");
        touch(dir.path(), "c/skip.gif");

        let found = LocalTraverser::new()
            .list(dir.path(), &strings(&[".jpg", "png", "gif"]), &strings(&["gif"]), true)
            .unwrap();

        assert_eq!(
            found,
            vec![PathBuf::from("a/one.jpg"), PathBuf::from("b/two.PNG")]
        );
    }

    #[test]
    fn absolute_paths_and_no_filter() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "x.txt");
        touch(dir.path(), "y/z.bin");

        let found = LocalTraverser::new().list(dir.path(), &[], &[], false).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.starts_with(dir.path())));
    }

    #[test]
    fn missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let found = LocalTraverser::new()
            .list(&dir.path().join("nope"), &[], &[], true)
            .unwrap();
        assert!(found.is_empty());
    }
}
