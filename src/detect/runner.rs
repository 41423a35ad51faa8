//! Detection runner that checks every converter of a run.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::analysis::{AnalysisContext, FuncDecl, LoadedFile, Program};
use crate::config::Config;

use super::classify::classify;
use super::patterns::PatternSet;
use super::suppress::suppression_for;
use super::types::{DetectionResult, Finding, SuppressedFinding};
use super::validate::validate_converter;

/// Executes converter checks against a set of files.
pub struct Runner {
    base_dir: PathBuf,
}

/// Per-run function filters.
struct FunctionFilter {
    excluded: PatternSet,
}

impl FunctionFilter {
    fn new(config: &Config) -> Self {
        Self {
            excluded: PatternSet::new(&config.exclude_converter_patterns),
        }
    }

    /// Whether `decl` is skipped before classification.
    fn skips(&self, decl: &FuncDecl) -> bool {
        if decl.body.is_none() {
            return true;
        }
        // Constructors build values from parts, not from a model.
        if decl.name.starts_with("New") {
            return true;
        }
        self.excluded.matches(&decl.name) || self.excluded.matches(&decl.qualified_name())
    }
}

impl Runner {
    /// Create a new detection runner rooted at `base_dir`.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Load `files` and check every converter in them.
    pub fn run(&self, files: &[PathBuf], config: &Config) -> anyhow::Result<DetectionResult> {
        let ctx = AnalysisContext::new(&self.base_dir);
        let program = ctx.load(files);
        Ok(check_program(&program, config))
    }
}

/// Check every file of an already loaded program.
pub fn check_program(program: &Program, config: &Config) -> DetectionResult {
    let filter = FunctionFilter::new(config);

    let mut result = program
        .files
        .par_iter()
        .map(|file| check_file(program, file, &filter, config))
        .reduce(DetectionResult::new, |mut acc, r| {
            acc.merge(r);
            acc
        });
    result.sort();

    info!(
        files = result.scanned,
        converters = result.converters_checked,
        findings = result.findings.len(),
        suppressed = result.suppressed_count(),
        "detection complete"
    );
    result
}

fn check_file(program: &Program, file: &LoadedFile, filter: &FunctionFilter, config: &Config) -> DetectionResult {
    let mut result = DetectionResult::new();
    if file.source.generated && !config.include_generated_files {
        debug!(file = %file.rel_path, "skipping generated file");
        return result;
    }
    result.scanned = 1;

    let scope = program.scope(file);
    for decl in &file.source.functions {
        if filter.skips(decl) {
            continue;
        }

        let sig = match scope.signature(decl) {
            Ok(sig) => sig,
            Err(e) => {
                debug!(file = %file.rel_path, error = %e, "skipping declaration");
                continue;
            }
        };
        if classify(decl, &sig.params, &sig.results, &program.table, config).is_none() {
            continue;
        }
        result.converters_checked += 1;

        let verdict = match validate_converter(decl, &sig, &program.table, config) {
            Ok(v) => v,
            Err(e) => {
                debug!(file = %file.rel_path, error = %e, "skipping converter");
                continue;
            }
        };
        if verdict.valid {
            continue;
        }

        let finding = Finding {
            file: file.rel_path.clone(),
            line: decl.name_span.start_line,
            column: decl.name_span.start_col,
            function: decl.qualified_name(),
            verdict,
        };
        match suppression_for(decl) {
            Some(s) => result.suppressed.push(SuppressedFinding {
                finding,
                reason: s.reason,
            }),
            None => result.add_finding(finding),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MODELS: &str = r#"package models

type User struct {
	ID    string
	Email string
}

type UserDTO struct {
	ID    string
	Email string
}
"#;

    fn project(files: &[(&str, &str)]) -> (TempDir, Vec<PathBuf>) {
        let temp = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for (name, content) in files {
            let path = temp.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, content).unwrap();
            paths.push(path);
        }
        (temp, paths)
    }

    #[test]
    fn test_runner_basic() {
        let (temp, files) = project(&[
            ("models/models.go", MODELS),
            (
                "models/convert.go",
                r#"package models

func ToDTO(u User) UserDTO {
	return UserDTO{ID: u.ID}
}

func NewUserDTO(u User) UserDTO {
	return UserDTO{}
}
"#,
            ),
        ]);

        let result = Runner::new(temp.path()).run(&files, &Config::default()).unwrap();
        assert_eq!(result.scanned, 2);
        assert_eq!(result.converters_checked, 1);
        assert_eq!(result.findings.len(), 1);

        let f = &result.findings[0];
        assert_eq!(f.file, "models/convert.go");
        assert_eq!((f.line, f.column), (3, 6));
        assert_eq!(
            f.message(),
            "ToDTO: incomplete converter with missing fields: u.Email, Email"
        );
    }

    #[test]
    fn test_runner_with_suppression_and_exclusions() {
        let (temp, files) = project(&[
            ("models/models.go", MODELS),
            (
                "models/convert.go",
                r#"package models

//lostfield:ignore - Email is filled in later
func ToDTO(u User) UserDTO {
	return UserDTO{ID: u.ID}
}

func toDTOFast(u User) UserDTO {
	return UserDTO{ID: u.ID}
}
"#,
            ),
        ]);

        let config = Config {
            exclude_converter_patterns: vec!["*Fast".into()],
            ..Default::default()
        };
        let result = Runner::new(temp.path()).run(&files, &config).unwrap();
        assert!(result.findings.is_empty());
        assert_eq!(result.suppressed.len(), 1);
        assert_eq!(result.suppressed[0].reason, "Email is filled in later");
    }

    #[test]
    fn test_generated_files_are_skipped_by_default() {
        let generated = format!("// Code generated by hand. DO NOT EDIT.\n\n{}\nfunc ToDTO(u User) UserDTO {{\n\treturn UserDTO{{}}\n}}\n", MODELS);
        let (temp, files) = project(&[("models/models.go", &generated)]);

        let result = Runner::new(temp.path()).run(&files, &Config::default()).unwrap();
        assert_eq!(result.scanned, 0);
        assert!(result.findings.is_empty());

        let config = Config {
            include_generated_files: true,
            ..Default::default()
        };
        let result = Runner::new(temp.path()).run(&files, &config).unwrap();
        assert_eq!(result.findings.len(), 1);
    }

    #[test]
    fn test_unparsable_file_does_not_abort() {
        let (temp, mut files) = project(&[("models/models.go", MODELS)]);
        files.push(temp.path().join("models/missing.go"));
        let result = Runner::new(temp.path()).run(&files, &Config::default()).unwrap();
        assert_eq!(result.scanned, 1);
    }
}
