//! Inline suppression of findings via doc comments.
//!
//! A converter is skipped when its doc comment carries one of:
//! - `//lostfield:ignore - <reason>`
//! - `//nolint:lostfield` (also inside a list, `//nolint:errcheck,lostfield`)
//! - `//nolint` / `//nolint:all`

use regex::Regex;

use crate::analysis::FuncDecl;

lazy_static::lazy_static! {
    static ref IGNORE_DIRECTIVE: Regex =
        Regex::new(r"^\s*lostfield:ignore\b\s*(?:-\s*(.*))?$").unwrap();
    static ref NOLINT_DIRECTIVE: Regex =
        Regex::new(r"^\s*nolint(?::([\w,\s-]+))?(?:\s*//.*)?$").unwrap();
}

/// A suppression found on a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suppression {
    /// Human-readable reason, possibly empty.
    pub reason: String,
}

fn parse_line(line: &str) -> Option<Suppression> {
    if let Some(caps) = IGNORE_DIRECTIVE.captures(line) {
        let reason = caps
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        return Some(Suppression { reason });
    }

    let caps = NOLINT_DIRECTIVE.captures(line)?;
    let linters = match caps.get(1) {
        None => return Some(Suppression { reason: String::new() }),
        Some(list) => list.as_str(),
    };
    linters
        .split(',')
        .map(str::trim)
        .any(|l| l == "lostfield" || l == "all")
        .then(|| Suppression {
            reason: "nolint".to_string(),
        })
}

/// Suppression directive in `decl`'s doc comment, if any.
pub fn suppression_for(decl: &FuncDecl) -> Option<Suppression> {
    decl.doc.iter().find_map(|line| parse_line(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignore_directive() {
        assert_eq!(
            parse_line("lostfield:ignore - legacy fields are dropped on purpose"),
            Some(Suppression {
                reason: "legacy fields are dropped on purpose".into()
            })
        );
        assert_eq!(parse_line(" lostfield:ignore"), Some(Suppression { reason: String::new() }));
        assert_eq!(parse_line("lostfield:ignored"), None);
        assert_eq!(parse_line("see lostfield:ignore for details"), None);
    }

    #[test]
    fn test_nolint_directive() {
        assert!(parse_line("nolint").is_some());
        assert!(parse_line("nolint:lostfield").is_some());
        assert!(parse_line("nolint:errcheck, lostfield").is_some());
        assert!(parse_line("nolint:all").is_some());
        assert!(parse_line("nolint:errcheck").is_none());
        assert!(parse_line("ToDTO converts a user.").is_none());
    }

    #[test]
    fn test_suppression_from_doc() {
        use crate::analysis::get_analyzer;
        use std::path::Path;

        let src = r#"package c

// ToDTO converts a user.
//
//lostfield:ignore - wire format drops Password
func ToDTO(u User) UserDTO {
	return UserDTO{}
}

// FromDTO is checked.
func FromDTO(d UserDTO) User {
	return User{}
}
"#;
        let go = get_analyzer("go").unwrap();
        let parsed = go.parse(Path::new("c.go"), src.as_bytes()).unwrap();
        let file = go.lower(&parsed).unwrap();

        let reason = suppression_for(&file.functions[0]).map(|s| s.reason);
        assert_eq!(reason.as_deref(), Some("wire format drops Password"));
        assert!(suppression_for(&file.functions[1]).is_none());
    }
}
