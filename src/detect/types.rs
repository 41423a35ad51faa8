//! Core types for detection results.

use serde::Serialize;

use super::validate::ValidationVerdict;

/// An incomplete converter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    /// Path relative to the analysis root.
    pub file: String,
    pub line: usize,
    pub column: usize,
    /// Function name, `Recv.Name` for methods.
    pub function: String,
    #[serde(flatten)]
    pub verdict: ValidationVerdict,
}

impl Finding {
    /// One-line message, without the position prefix.
    pub fn message(&self) -> String {
        let missing: Vec<&str> = self.verdict.missing_fields().collect();
        if missing.is_empty() {
            format!("{}: incomplete converter", self.function)
        } else {
            format!(
                "{}: incomplete converter with missing fields: {}",
                self.function,
                missing.join(", ")
            )
        }
    }

    /// Sort key: file, then line, then function.
    fn sort_key(&self) -> (&str, usize, &str) {
        (&self.file, self.line, &self.function)
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}: {}", self.file, self.line, self.column, self.message())
    }
}

/// A finding silenced by a `lostfield:ignore` directive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuppressedFinding {
    pub finding: Finding,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

/// Results of running detection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectionResult {
    pub findings: Vec<Finding>,
    /// Findings silenced by directives.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<SuppressedFinding>,
    /// Number of files scanned.
    pub scanned: usize,
    /// Number of functions classified as converters.
    pub converters_checked: usize,
}

impl DetectionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge another result into this one.
    pub fn merge(&mut self, other: DetectionResult) {
        self.findings.extend(other.findings);
        self.suppressed.extend(other.suppressed);
        self.scanned += other.scanned;
        self.converters_checked += other.converters_checked;
    }

    pub fn add_finding(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Order findings by file, line and function.
    pub fn sort(&mut self) {
        self.findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        self.suppressed
            .sort_by(|a, b| a.finding.sort_key().cmp(&b.finding.sort_key()));
    }

    pub fn suppressed_count(&self) -> usize {
        self.suppressed.len()
    }

    /// Whether any converter is incomplete.
    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }
}
