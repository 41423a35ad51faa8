//! Per-function validation: sequences classification, delegation, usage
//! collection and field reconciliation into a verdict.

use serde::Serialize;

use super::candidate::ContainerShape;
use super::classify::{classify, find_candidate_param, CandidateParam, ConversionKind, ConverterKind, ConverterPair};
use super::delegation::{is_delegating, range_element};
use super::fields::{FieldValidator, Side};
use super::output::collect_output_fields;
use super::usage::{collect_usage, VariableUsage};
use crate::analysis::{Block, FuncDecl, Signature, TypeTable};
use crate::config::Config;
use crate::error::{AnalysisError, AnalysisResult};

/// Outcome of validating one converter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationVerdict {
    pub valid: bool,
    pub converter_kind: ConverterKind,
    /// Validation was skipped because the function forwards each element.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub delegating: bool,
    /// Source fields never read, as `var.Field` (nested: `var.A.B`).
    pub missing_source_fields: Vec<String>,
    /// Destination fields never set; qualified only for named results.
    pub missing_destination_fields: Vec<String>,
}

impl ValidationVerdict {
    fn valid(kind: ConverterKind, delegating: bool) -> Self {
        Self {
            valid: true,
            converter_kind: kind,
            delegating,
            missing_source_fields: Vec::new(),
            missing_destination_fields: Vec::new(),
        }
    }

    /// Source misses followed by destination misses.
    pub fn missing_fields(&self) -> impl Iterator<Item = &str> {
        self.missing_source_fields
            .iter()
            .chain(&self.missing_destination_fields)
            .map(String::as_str)
    }
}

/// Source and destination to validate: the converter pair when the
/// signature classifies, otherwise the first candidates on each side.
fn select_pair(
    decl: &FuncDecl,
    sig: &Signature,
    table: &TypeTable,
    config: &Config,
) -> AnalysisResult<ConverterPair> {
    if let Some(pair) = classify(decl, &sig.params, &sig.results, table, config) {
        return Ok(pair);
    }

    let source = find_candidate_param(&decl.params, &sig.params, table)
        .ok_or_else(|| AnalysisError::NoInputCandidate(decl.qualified_name()))?;
    let dest = find_candidate_param(&decl.results, &sig.results, table)
        .ok_or_else(|| AnalysisError::NoOutputCandidate(decl.qualified_name()))?;
    let kind = ConverterKind {
        conversion: ConversionKind::of(source.candidate.shape, dest.candidate.shape),
        method: decl.is_method(),
    };
    Ok(ConverterPair { source, dest, kind })
}

/// Usage of the source, including the element variable of a range over it.
fn source_usage(body: &Block, source: &CandidateParam, var: &str) -> VariableUsage {
    let mut usage = collect_usage(body, var);
    if matches!(
        source.candidate.shape,
        ContainerShape::Sequence | ContainerShape::Mapping
    ) {
        if let Some(element) = range_element(body, var) {
            usage.merge(collect_usage(body, element));
        }
    }
    usage
}

fn qualify(prefix: Option<&str>, paths: Vec<String>) -> Vec<String> {
    match prefix {
        Some(p) => paths.into_iter().map(|f| format!("{}.{}", p, f)).collect(),
        None => paths,
    }
}

/// Validate `decl` as a converter.
///
/// Fails only when the declaration cannot be validated at all: no
/// parameters or results, no struct candidate on one side, or a source
/// parameter without a usable name (`User` or `_ User`).
pub fn validate_converter(
    decl: &FuncDecl,
    sig: &Signature,
    table: &TypeTable,
    config: &Config,
) -> AnalysisResult<ValidationVerdict> {
    if sig.params.is_empty() || sig.results.is_empty() {
        return Err(AnalysisError::MissingParamsOrResults(decl.qualified_name()));
    }

    let ConverterPair { source, dest, kind } = select_pair(decl, sig, table, config)?;
    let source_var = match source.name.as_deref() {
        Some(name) if name != "_" => name,
        _ => return Err(AnalysisError::UnnamedSource(decl.qualified_name())),
    };

    let Some(body) = &decl.body else {
        return Ok(ValidationVerdict::valid(kind, false));
    };

    if is_delegating(body, &source.candidate, &dest.candidate, source_var) {
        return Ok(ValidationVerdict::valid(kind, true));
    }

    let input = source_usage(body, &source, source_var);
    let output = collect_output_fields(body, dest.name.as_deref(), &dest.candidate.name);

    let validator = FieldValidator::new(config, table);
    let missing_source = validator.missing_fields(
        &source.candidate.fields,
        &input.tree,
        Side::Source,
        &dest.candidate.fields,
    );
    let missing_dest = validator.missing_fields(
        &dest.candidate.fields,
        &output.usage.tree,
        Side::Destination,
        &source.candidate.fields,
    );

    Ok(ValidationVerdict {
        valid: missing_source.is_empty() && missing_dest.is_empty(),
        converter_kind: kind,
        delegating: false,
        missing_source_fields: qualify(Some(source_var), missing_source),
        missing_destination_fields: qualify(dest.name.as_deref(), missing_dest),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{declare_types, get_analyzer, Resolver, SourceFile};
    use std::path::Path;

    fn load(src: &str) -> (SourceFile, TypeTable, Resolver) {
        let go = get_analyzer("go").unwrap();
        let parsed = go.parse(Path::new("c.go"), src.as_bytes()).unwrap();
        let file = go.lower(&parsed).unwrap();
        let resolver = Resolver::new(None, vec![String::new()]);
        let mut table = TypeTable::new();
        declare_types(&mut table, &resolver.scope("", &file), &file);
        (file, table, resolver)
    }

    fn verdict(src: &str, func: &str, config: &Config) -> AnalysisResult<ValidationVerdict> {
        let (file, table, resolver) = load(src);
        let scope = resolver.scope("", &file);
        let decl = file.functions.iter().find(|f| f.name == func).unwrap();
        let sig = scope.signature(decl)?;
        validate_converter(decl, &sig, &table, config)
    }

    const MODELS: &str = r#"package c

type User struct {
	ID       string
	Username string
	Email    string
}

type UserDTO struct {
	ID       string
	Username string
	Email    string
}
"#;

    #[test]
    fn test_incomplete_converter() {
        let src = format!(
            "{}{}",
            MODELS,
            r#"
func ToDTO(user User) UserDTO {
	return UserDTO{ID: user.ID, Username: user.Username}
}
"#
        );
        let v = verdict(&src, "ToDTO", &Config::default()).unwrap();
        assert!(!v.valid);
        assert_eq!(v.converter_kind.to_string(), "value converter");
        assert_eq!(v.missing_source_fields, vec!["user.Email"]);
        assert_eq!(v.missing_destination_fields, vec!["Email"]);
        assert_eq!(v.missing_fields().collect::<Vec<_>>(), vec!["user.Email", "Email"]);
    }

    #[test]
    fn test_ignore_acknowledgment() {
        let src = format!(
            "{}{}",
            MODELS,
            r#"
func ToDTO(user User) (dto UserDTO) {
	_ = user.Email
	dto.ID = user.ID
	dto.Username = user.Username
	return
}
"#
        );
        let v = verdict(&src, "ToDTO", &Config::default()).unwrap();
        assert!(v.missing_source_fields.is_empty());
        assert_eq!(v.missing_destination_fields, vec!["dto.Email"]);
    }

    #[test]
    fn test_delegating_batch_is_valid() {
        let src = format!(
            "{}{}",
            MODELS,
            r#"
func ToDTO(user User) UserDTO {
	return UserDTO{ID: user.ID}
}

func ToDTOs(users []User) []UserDTO {
	out := make([]UserDTO, 0, len(users))
	for _, u := range users {
		out = append(out, ToDTO(u))
	}
	return out
}
"#
        );
        let v = verdict(&src, "ToDTOs", &Config::default()).unwrap();
        assert!(v.valid);
        assert!(v.delegating);
        assert_eq!(v.converter_kind.to_string(), "slice converter");

        let inner = verdict(&src, "ToDTO", &Config::default()).unwrap();
        assert!(!inner.valid);
    }

    #[test]
    fn test_batch_with_inline_construction_uses_element_var() {
        let src = format!(
            "{}{}",
            MODELS,
            r#"
func ToDTOs(users []User) []UserDTO {
	var out []UserDTO
	for _, u := range users {
		out = append(out, UserDTO{ID: u.ID, Username: u.Username, Email: u.Email})
	}
	return out
}
"#
        );
        let v = verdict(&src, "ToDTOs", &Config::default()).unwrap();
        assert!(v.valid, "{:?}", v);
    }

    #[test]
    fn test_malformed_requests() {
        let src = format!(
            "{}{}",
            MODELS,
            r#"
func Consume(user User) {}

func Format(user User) string {
	return user.ID
}
"#
        );
        assert_eq!(
            verdict(&src, "Consume", &Config::default()),
            Err(AnalysisError::MissingParamsOrResults("Consume".into()))
        );
        assert_eq!(
            verdict(&src, "Format", &Config::default()),
            Err(AnalysisError::NoOutputCandidate("Format".into()))
        );
    }

    #[test]
    fn test_idempotent() {
        let src = format!(
            "{}{}",
            MODELS,
            r#"
func ToDTO(user *User) *UserDTO {
	dto := &UserDTO{ID: user.ID}
	dto.Email = user.Email
	return dto
}
"#
        );
        let first = verdict(&src, "ToDTO", &Config::default()).unwrap();
        let second = verdict(&src, "ToDTO", &Config::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.missing_source_fields, vec!["user.Username"]);
        assert_eq!(first.missing_destination_fields, vec!["Username"]);
    }

    #[test]
    fn test_unnamed_source_is_rejected() {
        let src = format!(
            "{}{}",
            MODELS,
            r#"
func ToDTO(User) UserDTO {
	return UserDTO{ID: "x"}
}

func ToDTOBlank(_ User) UserDTO {
	return UserDTO{ID: "x"}
}
"#
        );
        assert_eq!(
            verdict(&src, "ToDTO", &Config::default()),
            Err(AnalysisError::UnnamedSource("ToDTO".into()))
        );
        assert_eq!(
            verdict(&src, "ToDTOBlank", &Config::default()),
            Err(AnalysisError::UnnamedSource("ToDTOBlank".into()))
        );
    }

    #[test]
    fn test_tagged_field_is_exempt() {
        let src = r#"package c

type User struct {
	ID     string
	Secret string `lostfield:"ignore"`
	Token  string `json:"-" lostfield:"ignore"`
}

type UserDTO struct {
	ID string
}

func ToDTO(u User) UserDTO {
	return UserDTO{ID: u.ID}
}
"#;
        let v = verdict(src, "ToDTO", &Config::default()).unwrap();
        assert_eq!(v.missing_source_fields, vec!["u.Secret", "u.Token"]);

        for tag in ["lostfield", r#"lostfield:"ignore""#] {
            let config = Config {
                ignore_field_tags: vec![tag.to_string()],
                ..Default::default()
            };
            let v = verdict(src, "ToDTO", &config).unwrap();
            assert!(v.missing_source_fields.is_empty(), "{}: {:?}", tag, v);
            assert!(v.valid);
        }
    }
}
