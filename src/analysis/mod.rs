//! AST-backed code analysis module.
//!
//! This module turns Go source into the owned facts the converter checks
//! run on:
//! - Declarations (functions, methods, named types)
//! - Imports, used to resolve qualified type names across packages
//! - Function bodies, lowered to a small statement/expression tree
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ Source Files    │────▶│ GoAnalyzer   │────▶│ SourceFile    │
//! └─────────────────┘     │ (tree-sitter)│     │ (Types, Funcs,│
//!                         └──────────────┘     │  Bodies)      │
//!                                              └───────────────┘
//!                                                      │
//!                                                      ▼
//!                         ┌──────────────┐     ┌───────────────┐
//!                         │ Converter    │◀────│ Program       │
//!                         │ Checks       │     │ (TypeTable)   │
//!                         └──────────────┘     └───────────────┘
//! ```

mod context;
mod facts;
mod languages;
mod resolve;
mod traits;
pub mod types;
pub mod walk;

pub use context::{AnalysisContext, LoadedFile, Program};
pub use facts::{
    AssignOp, Block, CaseClause, Element, ElementKey, Expr, FuncDecl, Import, Param, SourceFile,
    Span, Stmt, StructField, TypeDecl, TypeExpr,
};
pub use languages::{get_analyzer, register_analyzers, GoAnalyzer};
pub use resolve::{declare_types, FileScope, Resolver};
pub use traits::{LanguageAnalyzer, ParsedFile};
pub use types::{FieldDef, NamedType, Signature, Type, TypeKey, TypeTable, Underlying};
