//! The frontend seam: one analyzer per source language.

use std::path::{Path, PathBuf};

use super::SourceFile;

/// A tree-sitter tree together with the bytes it was parsed from.
pub struct ParsedFile {
    pub tree: tree_sitter::Tree,
    pub source: Vec<u8>,
    pub path: PathBuf,
}

impl ParsedFile {
    /// Source text of `node`; empty when the bytes are not UTF-8.
    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }

    /// Source lines, lossily decoded.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        std::str::from_utf8(&self.source).unwrap_or("").lines()
    }

    /// Whether tree-sitter had to recover from syntax errors.
    pub fn has_syntax_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

/// Language-specific frontend.
///
/// Implementations parse a file with tree-sitter and lower the tree into
/// [`SourceFile`], the owned syntax model the detection engine consumes.
/// `tree_sitter::Parser` is not `Sync`, so a parser is created per call.
pub trait LanguageAnalyzer: Send + Sync {
    /// Language identifier, e.g. "go".
    fn language_id(&self) -> &'static str;

    /// File extensions handled, without the dot.
    fn file_extensions(&self) -> &'static [&'static str];

    /// Parse a source file. Recoverable syntax errors still yield a tree.
    fn parse(&self, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile>;

    /// Lower a parsed file into the syntax model.
    fn lower(&self, parsed: &ParsedFile) -> anyhow::Result<SourceFile>;

    fn handles_extension(&self, ext: &str) -> bool {
        self.file_extensions().contains(&ext)
    }
}
