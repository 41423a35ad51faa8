//! Language-specific analyzer implementations.

mod go;

pub use go::GoAnalyzer;

use super::LanguageAnalyzer;
use once_cell::sync::OnceCell;

/// Static storage for Go analyzer.
static GO_ANALYZER: OnceCell<GoAnalyzer> = OnceCell::new();

/// Register all available language analyzers.
///
/// Idempotent; safe to call more than once and from several threads.
pub fn register_analyzers() {
    GO_ANALYZER.get_or_init(GoAnalyzer::new);
}

/// Get an analyzer for the given file extension.
///
/// Returns None if no analyzer is registered for the extension.
pub fn get_analyzer(ext: &str) -> Option<&'static dyn LanguageAnalyzer> {
    register_analyzers();

    GO_ANALYZER
        .get()
        .filter(|a| a.handles_extension(ext))
        .map(|a| a as &'static dyn LanguageAnalyzer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_analyzer() {
        let go = get_analyzer("go").expect("go analyzer registered");
        assert_eq!(go.language_id(), "go");
        assert!(go.handles_extension("go"));
        assert!(get_analyzer("rs").is_none());
    }
}
