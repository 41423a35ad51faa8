//! Glob matching for file, converter and field name exclusions.
//!
//! Patterns without `/` match the base name only; patterns with `/` match
//! the whole path. `*/segment/*` is special-cased to "path contains
//! `/segment/`" so it works at any depth.

use globset::{GlobBuilder, GlobMatcher};

/// One compiled exclusion pattern.
#[derive(Debug, Clone)]
pub enum PatternMatcher {
    /// `*/segment/*`: substring match on `/segment/`.
    Contains(String),
    /// Matched against the full path.
    Path(GlobMatcher),
    /// Matched against the last path component.
    Base(GlobMatcher),
}

impl PatternMatcher {
    pub fn is_match(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        let name = name.replace('\\', "/");
        match self {
            PatternMatcher::Contains(segment) => name.contains(segment.as_str()),
            PatternMatcher::Path(glob) => glob.is_match(&name),
            PatternMatcher::Base(glob) => glob.is_match(base_name(&name)),
        }
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Compile a single pattern.
pub fn compile_pattern(pattern: &str) -> Result<PatternMatcher, globset::Error> {
    if pattern.len() > 3 && pattern.starts_with("*/") && pattern.ends_with("/*") {
        return Ok(PatternMatcher::Contains(pattern[1..pattern.len() - 1].to_string()));
    }

    // `*` must not cross `/`, as in Go's filepath.Match.
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .backslash_escape(true)
        .build()?
        .compile_matcher();

    if pattern.contains('/') {
        Ok(PatternMatcher::Path(glob))
    } else {
        Ok(PatternMatcher::Base(glob))
    }
}

/// A list of compiled patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    matchers: Vec<PatternMatcher>,
}

impl PatternSet {
    /// Compile `patterns`, dropping (and logging) any that are invalid.
    ///
    /// Configs are validated up front, so invalid entries only reach this
    /// point through the library API.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let matchers = patterns
            .iter()
            .filter_map(|p| match compile_pattern(p.as_ref()) {
                Ok(m) => Some(m),
                Err(e) => {
                    tracing::warn!(pattern = p.as_ref(), error = %e, "ignoring invalid pattern");
                    None
                }
            })
            .collect();
        Self { matchers }
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Whether any pattern matches `name`.
    pub fn matches(&self, name: &str) -> bool {
        self.matchers.iter().any(|m| m.is_match(name))
    }
}

/// Whether `name` matches any of `patterns`.
pub fn matches_any<S: AsRef<str>>(name: &str, patterns: &[S]) -> bool {
    PatternSet::new(patterns).matches(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_patterns() {
        let cases: &[(&str, &[&str], bool)] = &[
            ("GetUser", &["Get*"], true),
            ("toDTO", &["to*"], true),
            ("ConvertHelper", &["*Helper"], true),
            ("MapUser", &["Get*", "Map*", "to*"], true),
            ("ConvertUser", &["Get*", "Map*", "to*"], false),
            ("GetUser", &[], false),
            ("GetUser", &["GetUser"], true),
            ("GetA", &["Get?"], true),
            ("GetAB", &["Get?"], false),
            ("ConvertUserToDTO", &["Convert*ToDTO"], true),
            ("", &["*"], false),
        ];
        for (name, patterns, want) in cases {
            assert_eq!(matches_any(name, *patterns), *want, "{} vs {:?}", name, patterns);
        }
    }

    #[test]
    fn test_file_patterns() {
        let defaults = ["*.pb.go", "*_test.go", "*/vendor/*"];
        assert!(matches_any("/home/user/project/api/proto/v1/service.pb.go", &defaults));
        assert!(matches_any("/home/user/project/internal/domain/converter_test.go", &defaults));
        assert!(matches_any("/home/user/project/vendor/github.com/lib/module.go", &defaults));
        assert!(!matches_any("/home/user/project/internal/domain/converter.go", &defaults));

        assert!(!matches_any("/path/to/test_file.go", &["*_test.go"]));
        assert!(matches_any("/path/to/mock_service_test.go", &["mock_*.go"]));
        assert!(matches_any("convert_user_to_dto.go", &["convert_*_to_*.go"]));
        assert!(!matches_any("convert_user_dto.go", &["convert_*_to_*.go"]));
    }

    #[test]
    fn test_segment_patterns() {
        assert!(matches_any("/project/internal/generated/models/user.go", &["*/generated/*"]));
        assert!(matches_any("/project/internal/service/mocks/mock_service.go", &["*/mocks/*"]));
        assert!(!matches_any("/project/internal/vendordata/file.go", &["*/vendor/*"]));
    }

    #[test]
    fn test_path_patterns_do_not_cross_separators() {
        assert!(matches_any("internal/api/user.go", &["internal/*/user.go"]));
        assert!(!matches_any("internal/api/v1/user.go", &["internal/*/user.go"]));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(compile_pattern("[unclosed").is_err());
        assert!(PatternSet::new(&["[unclosed"]).is_empty());
    }
}
