//! Type resolution across the packages of one run.
//!
//! Packages are identified by their directory relative to the analysis
//! root. Qualified references (`dto.User`) go through the file's imports:
//! the import path is mapped to a loaded directory using the module path
//! from `go.mod` when known, otherwise by longest path suffix.

use std::collections::HashMap;

use phf::phf_set;

use super::types::{is_exported, parse_tags, FieldDef, NamedType, Signature, Type, TypeKey, TypeTable, Underlying};
use super::{FuncDecl, SourceFile, StructField, TypeExpr};
use crate::error::{AnalysisError, AnalysisResult};

/// Predeclared Go type names.
static BUILTIN_TYPES: phf::Set<&'static str> = phf_set! {
    "any", "bool", "byte", "comparable", "complex64", "complex128", "error",
    "float32", "float64", "int", "int8", "int16", "int32", "int64", "rune",
    "string", "uint", "uint8", "uint16", "uint32", "uint64", "uintptr",
};

/// Maps import paths onto loaded package directories.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    module_path: Option<String>,
    package_dirs: Vec<String>,
}

impl Resolver {
    pub fn new(module_path: Option<String>, mut package_dirs: Vec<String>) -> Self {
        package_dirs.sort();
        package_dirs.dedup();
        Self {
            module_path,
            package_dirs,
        }
    }

    /// Package key for an import path.
    pub fn package_for_import(&self, import_path: &str) -> String {
        if let Some(module) = &self.module_path {
            if import_path == module {
                return String::new();
            }
            if let Some(rest) = import_path.strip_prefix(&format!("{}/", module)) {
                if self.package_dirs.iter().any(|d| d == rest) {
                    return rest.to_string();
                }
            }
        }

        self.package_dirs
            .iter()
            .filter(|dir| !dir.is_empty())
            .filter(|dir| import_path == dir.as_str() || import_path.ends_with(&format!("/{}", dir)))
            .max_by_key(|dir| dir.len())
            .cloned()
            .unwrap_or_else(|| import_path.to_string())
    }

    /// Lexical scope of one file.
    pub fn scope<'a>(&'a self, package_dir: &'a str, file: &'a SourceFile) -> FileScope<'a> {
        let imports = file
            .imports
            .iter()
            .map(|i| (i.local_name(), i.path.as_str()))
            .collect();
        FileScope {
            resolver: self,
            package_dir,
            imports,
        }
    }
}

/// Everything needed to resolve a type expression written in one file.
#[derive(Debug, Clone)]
pub struct FileScope<'a> {
    resolver: &'a Resolver,
    package_dir: &'a str,
    imports: HashMap<&'a str, &'a str>,
}

impl<'a> FileScope<'a> {
    pub fn package_dir(&self) -> &str {
        self.package_dir
    }

    pub fn resolve(&self, expr: &TypeExpr) -> Type {
        match expr {
            TypeExpr::Named {
                package: None,
                name,
            } => {
                if BUILTIN_TYPES.contains(name.as_str()) {
                    Type::Basic(name.clone())
                } else {
                    Type::Named(TypeKey::new(self.package_dir, name.as_str()))
                }
            }
            TypeExpr::Named {
                package: Some(pkg),
                name,
            } => {
                if pkg == "unsafe" && name == "Pointer" {
                    return Type::UnsafePointer;
                }
                let package = match self.imports.get(pkg.as_str()) {
                    Some(path) => self.resolver.package_for_import(path),
                    None => pkg.clone(),
                };
                Type::Named(TypeKey::new(package, name.as_str()))
            }
            TypeExpr::Pointer(inner) => Type::Pointer(Box::new(self.resolve(inner))),
            TypeExpr::Slice(inner) => Type::Slice(Box::new(self.resolve(inner))),
            TypeExpr::Array(inner) => Type::Array(Box::new(self.resolve(inner))),
            TypeExpr::Map(key, value) => {
                Type::Map(Box::new(self.resolve(key)), Box::new(self.resolve(value)))
            }
            TypeExpr::Chan(inner) => Type::Chan(Box::new(self.resolve(inner))),
            TypeExpr::Func => Type::Func,
            TypeExpr::Interface => Type::Interface,
            TypeExpr::Struct(fields) => Type::Struct(self.fields(fields)),
            TypeExpr::Generic(_) | TypeExpr::Other => Type::Unresolved,
        }
    }

    pub fn fields(&self, fields: &[StructField]) -> Vec<FieldDef> {
        fields
            .iter()
            .map(|f| FieldDef {
                name: f.name.clone(),
                exported: is_exported(&f.name),
                embedded: f.embedded,
                tags: f.tag.as_deref().map(parse_tags).unwrap_or_default(),
                deprecated: f.deprecated,
                ty: self.resolve(&f.ty),
            })
            .collect()
    }

    /// Resolve the parameter and result types of a declaration.
    ///
    /// Generic functions have no single signature to check and are
    /// reported as unresolved.
    pub fn signature(&self, decl: &FuncDecl) -> AnalysisResult<Signature> {
        if !decl.type_params.is_empty() {
            return Err(AnalysisError::UnresolvedSignature(decl.qualified_name()));
        }
        Ok(Signature {
            params: decl.params.iter().map(|p| self.resolve(&p.ty)).collect(),
            results: decl.results.iter().map(|p| self.resolve(&p.ty)).collect(),
        })
    }
}

/// Register every type declared in `file` under its package key.
pub fn declare_types(table: &mut TypeTable, scope: &FileScope, file: &SourceFile) {
    for decl in &file.types {
        let underlying = if decl.generic {
            Underlying::Defined(Type::Unresolved)
        } else {
            match &decl.ty {
                TypeExpr::Struct(fields) => Underlying::Struct(scope.fields(fields)),
                other => Underlying::Defined(scope.resolve(other)),
            }
        };
        table.insert(NamedType {
            key: TypeKey::new(scope.package_dir(), decl.name.as_str()),
            alias: decl.alias,
            underlying,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Import, Param, Span};

    fn named(package: Option<&str>, name: &str) -> TypeExpr {
        TypeExpr::Named {
            package: package.map(String::from),
            name: name.to_string(),
        }
    }

    fn file_with_imports(imports: &[(&str, Option<&str>)]) -> SourceFile {
        SourceFile {
            imports: imports
                .iter()
                .map(|(path, alias)| Import {
                    path: path.to_string(),
                    alias: alias.map(String::from),
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_package_for_import_by_suffix() {
        let resolver = Resolver::new(
            None,
            vec!["models/dto".into(), "dto".into(), "clean".into()],
        );
        assert_eq!(
            resolver.package_for_import("converters/12-nested/models/dto"),
            "models/dto"
        );
        assert_eq!(resolver.package_for_import("time"), "time");
    }

    #[test]
    fn test_package_for_import_by_module_path() {
        let resolver = Resolver::new(Some("example.com/app".into()), vec!["".into(), "dto".into()]);
        assert_eq!(resolver.package_for_import("example.com/app/dto"), "dto");
        assert_eq!(resolver.package_for_import("example.com/app"), "");
    }

    #[test]
    fn test_resolve_named_types() {
        let resolver = Resolver::new(None, vec!["convert".into(), "models".into()]);
        let file = file_with_imports(&[("app/models", None), ("unsafe", None)]);
        let scope = resolver.scope("convert", &file);

        assert_eq!(
            scope.resolve(&named(Some("models"), "User")),
            Type::Named(TypeKey::new("models", "User"))
        );
        assert_eq!(
            scope.resolve(&named(None, "Local")),
            Type::Named(TypeKey::new("convert", "Local"))
        );
        assert_eq!(scope.resolve(&named(None, "error")), Type::Basic("error".into()));
        assert_eq!(scope.resolve(&named(Some("unsafe"), "Pointer")), Type::UnsafePointer);
    }

    #[test]
    fn test_generic_signature_is_unresolved() {
        let resolver = Resolver::new(None, vec![]);
        let file = SourceFile::default();
        let scope = resolver.scope("", &file);
        let decl = FuncDecl {
            name: "Map".into(),
            receiver: None,
            type_params: vec!["T".into()],
            params: vec![Param {
                name: Some("in".into()),
                ty: TypeExpr::Slice(Box::new(named(None, "T"))),
            }],
            results: vec![],
            body: None,
            span: Span::default(),
            name_span: Span::default(),
            doc: vec![],
        };
        assert_eq!(
            scope.signature(&decl),
            Err(AnalysisError::UnresolvedSignature("Map".into()))
        );
    }
}
