//! Structured-value candidates extracted from signature types.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::analysis::{FieldDef, Type, TypeKey, TypeTable};

/// Container around a candidate struct. Outermost container wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerShape {
    /// Bare struct value.
    None,
    Pointer,
    /// Slice or array.
    Sequence,
    /// Map valued by the struct.
    Mapping,
}

impl ContainerShape {
    /// `None` or `Pointer`: a single struct value.
    pub fn is_single(&self) -> bool {
        matches!(self, ContainerShape::None | ContainerShape::Pointer)
    }
}

impl fmt::Display for ContainerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContainerShape::None => "value",
            ContainerShape::Pointer => "pointer",
            ContainerShape::Sequence => "slice",
            ContainerShape::Mapping => "map",
        };
        write!(f, "{}", s)
    }
}

/// A struct field as seen by validation.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub exported: bool,
    pub tags: BTreeSet<String>,
    pub deprecated: bool,
    pub ty: Type,
    /// Name of the embedded struct this field was promoted from.
    pub promoted_from: Option<String>,
}

/// A parameter or result recognized as a struct eligible for conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Type name without package.
    pub name: String,
    pub shape: ContainerShape,
    pub fields: Vec<FieldDescriptor>,
    pub identity: TypeKey,
}

impl Candidate {
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

/// Bound on embedding depth when flattening promoted fields.
const MAX_EMBED_DEPTH: usize = 4;

/// Classify `ty` as a struct candidate.
///
/// Unwraps at most one container and then at most one pointer; the result
/// must be a named struct type known to `table`.
pub fn extract_candidate(ty: &Type, table: &TypeTable) -> Option<Candidate> {
    let (mut shape, inner) = match ty {
        Type::Slice(elem) | Type::Array(elem) => (ContainerShape::Sequence, elem.as_ref()),
        Type::Map(_, value) => (ContainerShape::Mapping, value.as_ref()),
        other => (ContainerShape::None, other),
    };

    let inner = match inner {
        Type::Pointer(pointee) => {
            if shape == ContainerShape::None {
                shape = ContainerShape::Pointer;
            }
            pointee.as_ref()
        }
        other => other,
    };

    let Type::Named(key) = inner else {
        return None;
    };
    let fields = table.struct_fields(key)?;

    Some(Candidate {
        name: key.name.clone(),
        shape,
        fields: flatten_fields(fields, table, None, 0),
        identity: table.identity(key).clone(),
    })
}

fn flatten_fields(
    fields: &[FieldDef],
    table: &TypeTable,
    promoted_from: Option<&str>,
    depth: usize,
) -> Vec<FieldDescriptor> {
    let mut out = Vec::with_capacity(fields.len());
    for field in fields {
        if field.embedded && depth < MAX_EMBED_DEPTH {
            if let Some(embedded) = embedded_struct(&field.ty, table) {
                let origin = promoted_from.unwrap_or(&field.name);
                out.extend(flatten_fields(embedded, table, Some(origin), depth + 1));
                continue;
            }
        }
        out.push(FieldDescriptor {
            name: field.name.clone(),
            exported: field.exported,
            tags: field.tags.clone(),
            deprecated: field.deprecated,
            ty: field.ty.clone(),
            promoted_from: promoted_from.map(String::from),
        });
    }
    out
}

fn embedded_struct<'t>(ty: &Type, table: &'t TypeTable) -> Option<&'t [FieldDef]> {
    match ty {
        Type::Named(key) => table.struct_fields(key),
        Type::Pointer(inner) => match inner.as_ref() {
            Type::Named(key) => table.struct_fields(key),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::types::is_exported;
    use crate::analysis::{NamedType, Underlying};

    pub(crate) fn field(name: &str, ty: Type) -> FieldDef {
        FieldDef {
            name: name.to_string(),
            exported: is_exported(name),
            embedded: false,
            tags: BTreeSet::new(),
            deprecated: false,
            ty,
        }
    }

    pub(crate) fn string_field(name: &str) -> FieldDef {
        field(name, Type::Basic("string".into()))
    }

    pub(crate) fn declare(table: &mut TypeTable, pkg: &str, name: &str, fields: Vec<FieldDef>) -> TypeKey {
        let key = TypeKey::new(pkg, name);
        table.insert(NamedType {
            key: key.clone(),
            alias: false,
            underlying: Underlying::Struct(fields),
        });
        key
    }

    fn named(key: &TypeKey) -> Type {
        Type::Named(key.clone())
    }

    #[test]
    fn test_shapes() {
        let mut table = TypeTable::new();
        let user = declare(&mut table, "models", "User", vec![string_field("ID")]);

        let cases = [
            (named(&user), ContainerShape::None),
            (Type::Pointer(Box::new(named(&user))), ContainerShape::Pointer),
            (Type::Slice(Box::new(named(&user))), ContainerShape::Sequence),
            (
                Type::Slice(Box::new(Type::Pointer(Box::new(named(&user))))),
                ContainerShape::Sequence,
            ),
            (Type::Array(Box::new(named(&user))), ContainerShape::Sequence),
            (
                Type::Map(Box::new(Type::Basic("string".into())), Box::new(named(&user))),
                ContainerShape::Mapping,
            ),
        ];

        for (ty, shape) in cases {
            let candidate = extract_candidate(&ty, &table).unwrap();
            assert_eq!(candidate.shape, shape, "{:?}", ty);
            assert_eq!(candidate.name, "User");
            assert_eq!(candidate.identity, user);
        }
    }

    #[test]
    fn test_rejects_non_structs() {
        let mut table = TypeTable::new();
        let user = declare(&mut table, "models", "User", vec![string_field("ID")]);

        assert!(extract_candidate(&Type::Basic("string".into()), &table).is_none());
        assert!(extract_candidate(&Type::Basic("error".into()), &table).is_none());
        assert!(extract_candidate(&named(&TypeKey::new("models", "Unknown")), &table).is_none());
        // Two pointer layers are more than one unwrap.
        let double = Type::Pointer(Box::new(Type::Pointer(Box::new(named(&user)))));
        assert!(extract_candidate(&double, &table).is_none());
        // Slice of slices is not a batch of structs.
        let nested = Type::Slice(Box::new(Type::Slice(Box::new(named(&user)))));
        assert!(extract_candidate(&nested, &table).is_none());
    }

    #[test]
    fn test_embedded_fields_are_promoted() {
        let mut table = TypeTable::new();
        let base = declare(
            &mut table,
            "models",
            "Base",
            vec![string_field("ID"), string_field("CreatedAt")],
        );
        let mut embedded = field("Base", named(&base));
        embedded.embedded = true;
        let user = declare(
            &mut table,
            "models",
            "User",
            vec![embedded, string_field("Email")],
        );

        let candidate = extract_candidate(&named(&user), &table).unwrap();
        let names: Vec<_> = candidate.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["ID", "CreatedAt", "Email"]);
        assert_eq!(candidate.fields[0].promoted_from.as_deref(), Some("Base"));
        assert_eq!(candidate.fields[2].promoted_from, None);
    }
}
