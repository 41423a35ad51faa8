//! Selection of the Go files a run looks at.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::patterns::PatternSet;
use crate::config::Config;

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["vendor", "testdata", "node_modules"];

/// Path-based file policy for one run.
pub struct FileFilter {
    excluded: PatternSet,
}

impl FileFilter {
    pub fn new(config: &Config) -> Self {
        Self {
            excluded: PatternSet::new(&config.exclude_file_patterns),
        }
    }

    /// Whether `path` is a non-test Go source file.
    pub fn is_go_source(path: &Path) -> bool {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        name.ends_with(".go") && !name.ends_with("_test.go")
    }

    /// Whether a file at `rel_path` (relative to the root) is checked.
    pub fn accepts(&self, path: &Path, rel_path: &str) -> bool {
        Self::is_go_source(path) && !self.excluded.matches(rel_path)
    }

    fn descend(entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        !name.starts_with('.') && !name.starts_with('_') && !SKIPPED_DIRS.contains(&name.as_ref())
    }
}

/// Collect the Go files under `root` that the run should check.
///
/// Hidden, `vendor` and `testdata` directories are skipped below the
/// root; generated files are filtered later, once parsed.
pub fn collect_files(root: &Path, config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let filter = FileFilter::new(config);
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(FileFilter::descend)
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let rel = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        if filter.accepts(path, &rel) {
            files.push(path.to_path_buf());
        } else {
            tracing::trace!(file = %rel, "skipping file");
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "package x\n").unwrap();
    }

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_collect_files_policy() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "main.go");
        touch(root, "main_test.go");
        touch(root, "README.md");
        touch(root, "models/user.go");
        touch(root, "vendor/dep/dep.go");
        touch(root, ".git/hooks/x.go");
        touch(root, "testdata/fixture.go");
        touch(root, "internal/mocks/mock_user.go");

        let files = collect_files(root, &Config::default()).unwrap();
        assert_eq!(
            relative(root, &files),
            vec!["internal/mocks/mock_user.go", "main.go", "models/user.go"]
        );

        let config = Config {
            exclude_file_patterns: vec!["*/mocks/*".into(), "main.go".into()],
            ..Default::default()
        };
        let files = collect_files(root, &config).unwrap();
        assert_eq!(relative(root, &files), vec!["models/user.go"]);
    }

    #[test]
    fn test_root_named_testdata_is_walked() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("testdata");
        touch(&root, "a.go");
        let files = collect_files(&root, &Config::default()).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_is_go_source() {
        assert!(FileFilter::is_go_source(Path::new("a/b.go")));
        assert!(!FileFilter::is_go_source(Path::new("a/b_test.go")));
        assert!(!FileFilter::is_go_source(Path::new("a/b.rs")));
    }
}
