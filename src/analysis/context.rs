//! Analysis context: loads a set of files into a resolved [`Program`].
//!
//! The context parses files in parallel, lowers them, groups them into
//! packages by directory and builds the type table shared by every
//! converter check in the run.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::resolve::{declare_types, FileScope, Resolver};
use super::types::TypeTable;
use super::{get_analyzer, SourceFile};

/// A lowered file plus where it sits in the run.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub source: SourceFile,
    /// Path relative to the analysis root, `/`-separated.
    pub rel_path: String,
    /// Package key: directory relative to the analysis root.
    pub package_dir: String,
}

/// Every file of a run with types resolved across packages.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub files: Vec<LoadedFile>,
    pub table: TypeTable,
    resolver: Resolver,
}

impl Program {
    /// Resolution scope for one of this program's files.
    pub fn scope<'a>(&'a self, file: &'a LoadedFile) -> FileScope<'a> {
        self.resolver.scope(&file.package_dir, &file.source)
    }
}

/// Analysis context for a set of files.
pub struct AnalysisContext {
    /// Base directory for relative path resolution.
    base_dir: PathBuf,
}

impl AnalysisContext {
    /// Create a new analysis context.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Get the base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.base_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }

    /// Parse and lower a single file.
    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<SourceFile> {
        let path = path.as_ref();
        let abs_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };

        let ext = abs_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let analyzer = get_analyzer(ext)
            .ok_or_else(|| anyhow::anyhow!("unsupported file type: {}", abs_path.display()))?;

        tracing::trace!(file = %abs_path.display(), language = analyzer.language_id(), "analyzing");
        let source = fs::read(&abs_path)?;
        let parsed = analyzer.parse(&abs_path, &source)?;
        if parsed.has_syntax_errors() {
            tracing::debug!(file = %abs_path.display(), "source contains syntax errors");
        }
        let mut file = analyzer.lower(&parsed)?;
        file.path = abs_path;
        Ok(file)
    }

    /// Analyze files in parallel.
    ///
    /// Files that cannot be read or lowered are logged and skipped.
    /// Results are sorted by path.
    pub fn analyze_files_parallel(&self, paths: &[PathBuf]) -> Vec<SourceFile> {
        let results: Vec<_> = paths
            .par_iter()
            .map(|p| (p, self.analyze_file(p)))
            .collect();

        let mut files = Vec::new();
        for (path, result) in results {
            match result {
                Ok(file) => files.push(file),
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "failed to analyze file");
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Load files and resolve their types into a [`Program`].
    pub fn load(&self, paths: &[PathBuf]) -> Program {
        let sources = self.analyze_files_parallel(paths);

        let files: Vec<LoadedFile> = sources
            .into_iter()
            .map(|source| {
                let rel = self.relative(&source.path);
                let package_dir = rel
                    .parent()
                    .map(slash_path)
                    .unwrap_or_default();
                LoadedFile {
                    rel_path: slash_path(&rel),
                    package_dir,
                    source,
                }
            })
            .collect();

        let resolver = Resolver::new(
            find_module_path(&self.base_dir),
            files.iter().map(|f| f.package_dir.clone()).collect(),
        );

        let mut table = TypeTable::new();
        for file in &files {
            let scope = resolver.scope(&file.package_dir, &file.source);
            declare_types(&mut table, &scope, &file.source);
        }

        tracing::debug!(
            files = files.len(),
            types = table.len(),
            "loaded program"
        );

        Program {
            files,
            table,
            resolver,
        }
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Module path from the nearest `go.mod` at or above `dir`.
fn find_module_path(dir: &Path) -> Option<String> {
    dir.ancestors().find_map(|d| {
        let content = fs::read_to_string(d.join("go.mod")).ok()?;
        let module = content
            .lines()
            .find_map(|l| l.trim().strip_prefix("module "))?
            .trim()
            .trim_matches('"')
            .to_string();
        // Paths under the analysis root are relative to the module root.
        let offset = dir.strip_prefix(d).ok().map(slash_path).unwrap_or_default();
        Some(if offset.is_empty() {
            module
        } else {
            format!("{}/{}", module, offset)
        })
    })
}
