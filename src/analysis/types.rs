//! Resolved type model.
//!
//! Types are keyed by [`TypeKey`] (package directory + name), which is the
//! identity used everywhere two types are compared. Two structs that share
//! a name but live in different packages are different types.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    /// `key:"value"` pairs in a struct tag.
    static ref TAG_PAIR: Regex = Regex::new(r#"([A-Za-z0-9_.\-]+):"((?:[^"\\]|\\.)*)""#).unwrap();
}

/// Identity of a named type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeKey {
    /// Package directory relative to the analysis root, or an import path
    /// for packages outside it.
    pub package: String,
    pub name: String,
}

impl TypeKey {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.package, self.name)
        }
    }
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Named(TypeKey),
    /// Predeclared type (`string`, `int`, `error`, ...).
    Basic(String),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Chan(Box<Type>),
    Func,
    Interface,
    UnsafePointer,
    /// Anonymous struct.
    Struct(Vec<FieldDef>),
    Unresolved,
}

impl Type {
    /// Whether values of this type cannot cross a serialization boundary.
    pub fn is_non_serializable(&self) -> bool {
        matches!(self, Type::Func | Type::Chan(_) | Type::UnsafePointer)
    }
}

/// A declared struct field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub exported: bool,
    pub embedded: bool,
    /// Tag entries as `key:"value"` strings.
    pub tags: BTreeSet<String>,
    pub deprecated: bool,
    pub ty: Type,
}

/// What a named type is defined as.
#[derive(Debug, Clone, PartialEq)]
pub enum Underlying {
    Struct(Vec<FieldDef>),
    /// Defined over (or aliased to) another type.
    Defined(Type),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedType {
    pub key: TypeKey,
    pub alias: bool,
    pub underlying: Underlying,
}

/// All named types known to one run.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: HashMap<TypeKey, NamedType>,
}

/// Bound on alias/definition chains (`type A B; type B C; ...`).
const MAX_DEFINITION_DEPTH: usize = 8;

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, named: NamedType) {
        self.types.insert(named.key.clone(), named);
    }

    pub fn get(&self, key: &TypeKey) -> Option<&NamedType> {
        self.types.get(key)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Follow aliases to the key that identifies the type.
    pub fn identity<'a>(&'a self, key: &'a TypeKey) -> &'a TypeKey {
        let mut current = key;
        for _ in 0..MAX_DEFINITION_DEPTH {
            match self.types.get(current) {
                Some(NamedType {
                    alias: true,
                    underlying: Underlying::Defined(Type::Named(next)),
                    ..
                }) => current = next,
                _ => break,
            }
        }
        current
    }

    /// Fields of a named struct type, following definitions over other
    /// named types.
    pub fn struct_fields(&self, key: &TypeKey) -> Option<&[FieldDef]> {
        let mut current = key;
        for _ in 0..MAX_DEFINITION_DEPTH {
            match &self.types.get(current)?.underlying {
                Underlying::Struct(fields) => return Some(fields),
                Underlying::Defined(Type::Named(next)) => current = next,
                Underlying::Defined(_) => return None,
            }
        }
        None
    }
}

/// Resolved parameter and result types of a function, one per declared name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
}

/// Split a raw struct tag into `key:"value"` entries.
pub fn parse_tags(raw: &str) -> BTreeSet<String> {
    TAG_PAIR
        .captures_iter(raw)
        .map(|c| format!("{}:\"{}\"", &c[1], &c[2]))
        .collect()
}

/// Go visibility rule: exported names start with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().map_or(false, char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> FieldDef {
        FieldDef {
            name: name.to_string(),
            exported: is_exported(name),
            embedded: false,
            tags: BTreeSet::new(),
            deprecated: false,
            ty: Type::Basic("string".into()),
        }
    }

    #[test]
    fn test_parse_tags() {
        let tags = parse_tags(r#"json:"id,omitempty" lostfield:"ignore""#);
        assert_eq!(tags.len(), 2);
        assert!(tags.contains(r#"json:"id,omitempty""#));
        assert!(tags.contains(r#"lostfield:"ignore""#));
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn test_is_exported() {
        assert!(is_exported("Email"));
        assert!(!is_exported("password"));
        assert!(!is_exported("_"));
        assert!(!is_exported(""));
    }

    #[test]
    fn test_struct_fields_follow_definitions() {
        let mut table = TypeTable::new();
        let base = TypeKey::new("models", "User");
        let defined = TypeKey::new("models", "Admin");
        table.insert(NamedType {
            key: base.clone(),
            alias: false,
            underlying: Underlying::Struct(vec![field("ID"), field("Email")]),
        });
        table.insert(NamedType {
            key: defined.clone(),
            alias: false,
            underlying: Underlying::Defined(Type::Named(base.clone())),
        });

        let fields = table.struct_fields(&defined).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(table.identity(&defined), &defined);
    }

    #[test]
    fn test_identity_follows_aliases() {
        let mut table = TypeTable::new();
        let base = TypeKey::new("models", "User");
        let alias = TypeKey::new("dto", "User");
        table.insert(NamedType {
            key: alias.clone(),
            alias: true,
            underlying: Underlying::Defined(Type::Named(base.clone())),
        });
        assert_eq!(table.identity(&alias), &base);
    }

    #[test]
    fn test_same_name_different_package_is_distinct() {
        assert_ne!(TypeKey::new("models", "Sample"), TypeKey::new("dbmodel", "Sample"));
        assert_eq!(TypeKey::new("dbmodel", "Sample").to_string(), "dbmodel.Sample");
    }
}
