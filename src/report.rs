//! Output formatting for lostfield results.
//!
//! Supports three output formats:
//! - Default: one vet-style line per finding
//! - Pretty: colored source excerpt with a field table per finding
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::detect::{DetectionResult, Finding, SuppressedFinding, ValidationVerdict};

// =============================================================================
// Default Format
// =============================================================================

/// Write one `file:line:col: message` line per finding.
pub fn write_default<W: Write>(w: &mut W, result: &DetectionResult) -> io::Result<()> {
    for finding in &result.findings {
        writeln!(w, "{}", finding)?;
    }
    Ok(())
}

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub version: &'static str,
    pub path: &'a str,
    pub files_scanned: usize,
    pub converters_checked: usize,
    pub findings: &'a [Finding],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub suppressed: &'a [SuppressedFinding],
    pub suppressed_count: usize,
}

impl<'a> JsonReport<'a> {
    pub fn new(path: &'a str, result: &'a DetectionResult) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            path,
            files_scanned: result.scanned,
            converters_checked: result.converters_checked,
            findings: &result.findings,
            suppressed: &result.suppressed,
            suppressed_count: result.suppressed.len(),
        }
    }
}

/// Write results as pretty-printed JSON.
pub fn write_json<W: Write>(w: &mut W, path: &str, result: &DetectionResult) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&JsonReport::new(path, result))?;
    writeln!(w, "{}", json)?;
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

const MAX_LINE_WIDTH: usize = 120;
/// Gap between the gutter and the excerpt.
const MIN_SPACING: usize = 4;
/// Above this many misses on one side (and none on the other) the table
/// collapses to a single row.
const COLLAPSE_THRESHOLD: usize = 5;

/// The `= note: missing fields:` block, one entry per line.
pub fn note_lines(verdict: &ValidationVerdict) -> Vec<String> {
    let input = &verdict.missing_source_fields;
    let output = &verdict.missing_destination_fields;
    let mut lines = vec!["= note: missing fields:".to_string()];

    if input.is_empty() && output.is_empty() {
        return lines;
    }
    if input.is_empty() && output.len() > COLLAPSE_THRESHOLD {
        lines.push("  ??  → all output fields".to_string());
        return lines;
    }
    if output.is_empty() && input.len() > COLLAPSE_THRESHOLD {
        lines.push("  all input fields → ??".to_string());
        return lines;
    }

    let width = input
        .iter()
        .chain(output)
        .map(|f| f.chars().count())
        .max()
        .unwrap_or(0)
        .max(1);

    for field in input {
        let pad = " ".repeat(width - field.chars().count() + 1);
        lines.push(format!("  {}{}→ ??", field, pad));
    }
    for field in output {
        let pad = " ".repeat(width.saturating_sub(2) + 1);
        lines.push(format!("  ??{}→ {}", pad, field));
    }
    lines
}

/// Cut `line` to at most `max_width` characters, ending in `…` if cut.
pub fn shorten_line(line: &str, max_width: usize) -> String {
    if line.chars().count() <= max_width {
        return line.to_string();
    }
    let kept: String = line.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Lazily read source files for excerpts.
struct SourceCache {
    base: PathBuf,
    files: HashMap<String, Option<Vec<String>>>,
}

impl SourceCache {
    fn new(base: &Path) -> Self {
        Self {
            base: base.to_path_buf(),
            files: HashMap::new(),
        }
    }

    fn line(&mut self, file: &str, line: usize) -> Option<&str> {
        let base = &self.base;
        let lines = self.files.entry(file.to_string()).or_insert_with(|| {
            let path = if base.is_file() { base.clone() } else { base.join(file) };
            fs::read_to_string(path)
                .ok()
                .map(|s| s.lines().map(String::from).collect())
        });
        lines
            .as_ref()?
            .get(line.checked_sub(1)?)
            .map(String::as_str)
    }
}

/// Character offset of a 1-based byte column within `line`.
fn caret_offset(line: &str, column: usize) -> usize {
    let byte = column.saturating_sub(1).min(line.len());
    line.get(..byte)
        .map(|prefix| prefix.chars().count())
        .unwrap_or(byte)
}

fn write_excerpt<W: Write>(w: &mut W, finding: &Finding, source: Option<&str>) -> io::Result<()> {
    let source = source
        .filter(|l| !l.is_empty())
        .unwrap_or("<source unavailable>");
    let short = shorten_line(source, MAX_LINE_WIDTH);
    let caret = caret_offset(source, finding.column).min(short.chars().count());

    let line_no = finding.line.to_string();
    let gutter = " ".repeat(line_no.len());
    let name = finding
        .function
        .rsplit('.')
        .next()
        .unwrap_or(&finding.function);

    writeln!(w, "{} {}", gutter, "|".blue())?;
    writeln!(
        w,
        "{}{}  {}{}",
        line_no.blue(),
        " |".blue(),
        " ".repeat(MIN_SPACING),
        short
    )?;
    writeln!(
        w,
        "{} {}  {}{}{}",
        gutter,
        "|".blue(),
        " ".repeat(caret + MIN_SPACING),
        "^".repeat(name.chars().count()).yellow(),
        format!(" detected as {}", finding.verdict.converter_kind).yellow()
    )?;
    writeln!(w, "{} {}", gutter, "|".blue())?;

    for (i, line) in note_lines(&finding.verdict).iter().enumerate() {
        match line.strip_prefix('=') {
            Some(rest) if i == 0 => writeln!(w, "{} {}{}", gutter, "=".blue(), rest.red())?,
            _ => writeln!(w, "{} {}", gutter, line.red())?,
        }
    }
    Ok(())
}

/// Write results in pretty (human-readable) format.
///
/// `base` is the analysed root; finding paths are resolved against it to
/// show the offending source line.
pub fn write_pretty<W: Write>(
    w: &mut W,
    base: &Path,
    result: &DetectionResult,
    show_suppressed: bool,
) -> io::Result<()> {
    let mut sources = SourceCache::new(base);

    for finding in &result.findings {
        writeln!(
            w,
            "{}: {}",
            format!("{}:{}:{}", finding.file, finding.line, finding.column).bold(),
            finding.message().bold()
        )?;
        let source = sources.line(&finding.file, finding.line);
        write_excerpt(w, finding, source)?;
        writeln!(w)?;
    }

    if !result.suppressed.is_empty() {
        write_suppressed_summary(w, &result.suppressed, show_suppressed)?;
        writeln!(w)?;
    }

    write_final_status(w, result)
}

fn write_suppressed_summary<W: Write>(
    w: &mut W,
    suppressed: &[SuppressedFinding],
    show_details: bool,
) -> io::Result<()> {
    writeln!(w, "{} ({}):", "Suppressed".dimmed(), suppressed.len())?;
    if !show_details {
        return writeln!(w, "  {}", "(use --show-suppressed to see details)".dimmed());
    }
    for s in suppressed {
        let f = &s.finding;
        writeln!(
            w,
            "  {}{} {}",
            f.file.blue(),
            format!(":{}", f.line).dimmed(),
            f.function
        )?;
        if !s.reason.is_empty() {
            writeln!(w, "      {}", format!("reason: {:?}", s.reason).dimmed())?;
        }
    }
    Ok(())
}

fn write_final_status<W: Write>(w: &mut W, result: &DetectionResult) -> io::Result<()> {
    let summary = format!(
        "{} files scanned, {} converters checked",
        result.scanned, result.converters_checked
    );
    if result.has_findings() {
        let plural = if result.findings.len() != 1 { "s" } else { "" };
        writeln!(
            w,
            "{}  {}",
            format!("✗ {} incomplete converter{}", result.findings.len(), plural).red(),
            summary.dimmed()
        )
    } else {
        writeln!(w, "{}  {}", "✓ all converters complete".green(), summary.dimmed())
    }
}
