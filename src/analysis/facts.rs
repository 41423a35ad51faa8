//! Syntax facts lowered from a tree-sitter parse.
//!
//! The detection engine never touches tree-sitter nodes directly. Each
//! language analyzer lowers its parse tree into the owned structures below,
//! which keep only what converter analysis needs: declarations, types,
//! and a statement/expression tree for function bodies.

use std::fmt;
use std::path::PathBuf;

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed).
    pub start_col: usize,
    /// End line (1-indexed).
    pub end_line: usize,
    /// End column (1-indexed).
    pub end_col: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: start.row + 1, // tree-sitter is 0-indexed
            start_col: start.column + 1,
            end_line: end.row + 1,
            end_col: end.column + 1,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Everything extracted from one source file.
#[derive(Debug, Clone, Default)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Declared package name.
    pub package: String,
    pub imports: Vec<Import>,
    pub types: Vec<TypeDecl>,
    pub functions: Vec<FuncDecl>,
    /// Whether the file carries a `Code generated ... DO NOT EDIT.` header.
    pub generated: bool,
}

/// An import spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Import path without quotes.
    pub path: String,
    /// Explicit alias (`_` and `.` included), if any.
    pub alias: Option<String>,
}

impl Import {
    /// Name the imported package is referred to by inside the file.
    ///
    /// Falls back to the last path segment, skipping a trailing major
    /// version segment such as `v2`.
    pub fn local_name(&self) -> &str {
        if let Some(alias) = &self.alias {
            return alias;
        }
        let mut segments = self.path.rsplit('/');
        let last = segments.next().unwrap_or(&self.path);
        let is_version = last.len() > 1
            && last.starts_with('v')
            && last[1..].chars().all(|c| c.is_ascii_digit());
        if is_version {
            segments.next().unwrap_or(last)
        } else {
            last
        }
    }
}

/// A top-level `type` declaration.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    /// `type A = B` rather than `type A B`.
    pub alias: bool,
    /// Declared with type parameters.
    pub generic: bool,
    pub ty: TypeExpr,
    pub span: Span,
}

/// Unresolved, syntactic type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `Name` or `pkg.Name`.
    Named {
        package: Option<String>,
        name: String,
    },
    /// Instantiated generic type such as `Page[T]`.
    Generic(Box<TypeExpr>),
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Chan(Box<TypeExpr>),
    Func,
    Interface,
    Struct(Vec<StructField>),
    Other,
}

impl TypeExpr {
    /// Name of the named type at the core of this expression, looking
    /// through one pointer.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Named { name, .. } => Some(name),
            TypeExpr::Pointer(inner) => match inner.as_ref() {
                TypeExpr::Named { name, .. } => Some(name),
                _ => None,
            },
            _ => None,
        }
    }
}

/// A field inside a struct type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub embedded: bool,
    pub ty: TypeExpr,
    /// Raw tag text without the surrounding quotes.
    pub tag: Option<String>,
    /// Preceded by a `Deprecated:` doc comment.
    pub deprecated: bool,
}

/// A parameter, result or receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// `None` for unnamed results and `_`-less anonymous parameters.
    pub name: Option<String>,
    pub ty: TypeExpr,
}

/// A function or method declaration.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    pub receiver: Option<Param>,
    pub type_params: Vec<String>,
    /// One entry per declared name, in order.
    pub params: Vec<Param>,
    /// One entry per declared name (or type, when unnamed), in order.
    pub results: Vec<Param>,
    pub body: Option<Block>,
    /// Span of the whole declaration.
    pub span: Span,
    /// Span of the function name.
    pub name_span: Span,
    /// Lines of the preceding doc comment, without comment markers.
    pub doc: Vec<String>,
}

impl FuncDecl {
    /// Whether this declaration is a method.
    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }

    /// Qualified display name (`Recv.Name` for methods).
    pub fn qualified_name(&self) -> String {
        match self.receiver.as_ref().and_then(|r| r.ty.base_name()) {
            Some(recv) => format!("{}.{}", recv, self.name),
            None => self.name.clone(),
        }
    }
}

/// A braced statement list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

/// Assignment token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `:=`
    Define,
    /// `=`
    Assign,
    /// `+=`, `|=`, ...
    Compound,
}

/// One `case`/`default` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseClause {
    pub exprs: Vec<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Assign {
        lhs: Vec<Expr>,
        op: AssignOp,
        rhs: Vec<Expr>,
    },
    VarDecl {
        names: Vec<String>,
        ty: Option<TypeExpr>,
        values: Vec<Expr>,
    },
    Return(Vec<Expr>),
    Block(Block),
    If {
        init: Option<Box<Stmt>>,
        cond: Expr,
        then: Block,
        otherwise: Option<Box<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        define: bool,
        over: Expr,
        body: Block,
    },
    Switch {
        init: Option<Box<Stmt>>,
        tag: Option<Expr>,
        cases: Vec<CaseClause>,
    },
    Go(Expr),
    Defer(Expr),
    IncDec(Expr),
    Send {
        channel: Expr,
        value: Expr,
    },
    Labeled(Box<Stmt>),
    Other,
}

/// Key of a keyed composite element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKey {
    /// Struct field name.
    Field(String),
    /// Map key or array index expression.
    Expr(Expr),
}

/// One element of a composite literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub key: Option<ElementKey>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    Selector {
        base: Box<Expr>,
        field: String,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        base: Box<Expr>,
        index: Vec<Expr>,
    },
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    Binary {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Paren(Box<Expr>),
    /// `T{...}`; `ty` is `None` for elided nested literals.
    Composite {
        ty: Option<TypeExpr>,
        elements: Vec<Element>,
    },
    FuncLit(Block),
    TypeAssert {
        base: Box<Expr>,
        ty: Option<TypeExpr>,
    },
    /// A type in expression position (`make([]T, n)`).
    Type(TypeExpr),
    Literal(String),
    Other,
}

impl Expr {
    /// Strip any number of parentheses.
    pub fn unparen(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Paren(inner) = expr {
            expr = inner;
        }
        expr
    }

    /// Identifier name, if this is a bare identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Whether this is a call to the identifier `name`.
    pub fn is_call_to(&self, name: &str) -> bool {
        matches!(self, Expr::Call { func, .. } if func.as_ident() == Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_local_name() {
        let plain = Import {
            path: "converters/models/dto".to_string(),
            alias: None,
        };
        assert_eq!(plain.local_name(), "dto");

        let aliased = Import {
            path: "converters/3-delegate/models".to_string(),
            alias: Some("sampleDelegate".to_string()),
        };
        assert_eq!(aliased.local_name(), "sampleDelegate");

        let versioned = Import {
            path: "github.com/acme/api/v2".to_string(),
            alias: None,
        };
        assert_eq!(versioned.local_name(), "api");
    }

    #[test]
    fn test_unparen() {
        let expr = Expr::Paren(Box::new(Expr::Paren(Box::new(Expr::Ident("x".into())))));
        assert_eq!(expr.unparen().as_ident(), Some("x"));
    }

    #[test]
    fn test_qualified_name() {
        let decl = FuncDecl {
            name: "ToDTO".to_string(),
            receiver: Some(Param {
                name: Some("u".to_string()),
                ty: TypeExpr::Pointer(Box::new(TypeExpr::Named {
                    package: None,
                    name: "User".to_string(),
                })),
            }),
            type_params: vec![],
            params: vec![],
            results: vec![],
            body: None,
            span: Span::default(),
            name_span: Span::default(),
            doc: vec![],
        };
        assert!(decl.is_method());
        assert_eq!(decl.qualified_name(), "User.ToDTO");
    }
}
