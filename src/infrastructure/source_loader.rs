use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::{is_source_file, SKIPPED_DIRS};

pub struct SourceLoader;

impl SourceLoader {
    /// Read explicitly named files. Unreadable files are reported and
    /// skipped so one bad path does not abort a whole run.
    pub fn load_files(paths: &[String]) -> Vec<(String, String)> {
        let mut sources = Vec::new();
        for path in paths {
            match fs::read_to_string(path) {
                Ok(code) => sources.push((path.clone(), code)),
                Err(e) => warn!(path = %path, error = %e, "cannot read input file"),
            }
        }
        sources
    }

    /// Recursively collect every C/C++ source under `dir`.
    /// Returns (file_path, file_content) sorted by path.
    ///
    /// Symlinks are not followed, so a link back to an ancestor cannot
    /// make the scan revisit the tree.
    pub fn load_folder(dir: &str) -> Result<Vec<(String, String)>> {
        let root = Path::new(dir);
        if !root.is_dir() {
            anyhow::bail!("Source folder not found: {}", dir);
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !Self::is_skipped_dir(e));

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_source_file(entry.path()) {
                continue;
            }

            let path = entry.path();
            let bytes = fs::read(path)
                .with_context(|| format!("Failed to read file {}", path.display()))?;
            // Legacy code bases often carry Latin-1 comments.
            let content = String::from_utf8_lossy(&bytes).into_owned();
            files.push((path.display().to_string(), content));
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        files.dedup_by(|a, b| a.0 == b.0);
        debug!(folder = %dir, files = files.len(), "collected sources");

        Ok(files)
    }

    fn is_skipped_dir(entry: &DirEntry) -> bool {
        entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .map_or(false, |name| SKIPPED_DIRS.contains(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_folder_filters_by_extension_and_skips_build() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("build")).unwrap();
        fs::write(root.join("src/a.cpp"), "void a() {}").unwrap();
        fs::write(root.join("src/nested/b.h"), "void b();").unwrap();
        fs::write(root.join("src/readme.md"), "# docs").unwrap();
        fs::write(root.join("build/gen.cpp"), "void gen() {}").unwrap();

        let files = SourceLoader::load_folder(root.to_str().unwrap()).unwrap();
        let names: Vec<&str> = files
            .iter()
            .map(|(p, _)| Path::new(p).file_name().unwrap().to_str().unwrap())
            .collect();

        assert_eq!(names, vec!["a.cpp", "b.h"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_load_folder_does_not_follow_symlink_cycles() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/a.c"), "void a() { b(); }").unwrap();
        std::os::unix::fs::symlink(root, root.join("src/loop")).unwrap();
        std::os::unix::fs::symlink(root.join("src"), root.join("again")).unwrap();

        let files = SourceLoader::load_folder(root.to_str().unwrap()).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].0.ends_with("a.c"));
    }

    #[test]
    fn test_load_folder_missing_dir_is_error() {
        let err = SourceLoader::load_folder("/definitely/not/here").unwrap_err();
        assert!(err.to_string().contains("Source folder not found"));
    }

    #[test]
    fn test_load_files_skips_unreadable() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("ok.c");
        fs::write(&good, "int main(void) { return run(); }").unwrap();

        let paths = vec![
            good.to_str().unwrap().to_string(),
            dir.path().join("missing.c").to_str().unwrap().to_string(),
        ];
        let sources = SourceLoader::load_files(&paths);

        assert_eq!(sources.len(), 1);
        assert!(sources[0].1.contains("run()"));
    }

    #[test]
    fn test_non_utf8_content_is_loaded_lossily() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("latin.c"), b"/* caf\xe9 */ void f() {}").unwrap();

        let files = SourceLoader::load_folder(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].1.contains("void f()"));
    }
}
