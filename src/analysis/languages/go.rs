//! Go language analyzer using tree-sitter.
//!
//! Lowers a Go file into [`SourceFile`]:
//! - package clause and imports (via queries)
//! - type declarations, including struct fields with tags and
//!   `Deprecated:` doc markers
//! - function and method declarations with full bodies

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use crate::analysis::{
    AssignOp, Block, CaseClause, Element, ElementKey, Expr, FuncDecl, Import, LanguageAnalyzer,
    Param, ParsedFile, SourceFile, Span, Stmt, StructField, TypeDecl, TypeExpr,
};

/// Tree-sitter query for extracting imports.
const IMPORT_QUERY: &str = r#"
(import_declaration
  (import_spec
    name: (_)? @alias
    path: (interpreted_string_literal) @path
  )
)

(import_declaration
  (import_spec_list
    (import_spec
      name: (_)? @alias
      path: (interpreted_string_literal) @path
    )
  )
)
"#;

/// Tree-sitter query for package declaration.
const PACKAGE_QUERY: &str = r#"
(package_clause
  (package_identifier) @package_name
)
"#;

lazy_static! {
    /// Go's convention for marking generated files.
    static ref GENERATED_HEADER: Regex =
        Regex::new(r"^// Code generated .* DO NOT EDIT\.$").unwrap();
}

/// Node kinds that denote a type when they appear in expression position.
const TYPE_KINDS: &[&str] = &[
    "array_type",
    "channel_type",
    "function_type",
    "generic_type",
    "implicit_length_array_type",
    "interface_type",
    "map_type",
    "pointer_type",
    "qualified_type",
    "slice_type",
    "struct_type",
];

const LITERAL_KINDS: &[&str] = &[
    "interpreted_string_literal",
    "raw_string_literal",
    "int_literal",
    "float_literal",
    "imaginary_literal",
    "rune_literal",
    "true",
    "false",
    "nil",
    "iota",
];

/// Go language analyzer.
pub struct GoAnalyzer {
    language: Language,
}

impl GoAnalyzer {
    /// Create a new Go analyzer.
    pub fn new() -> Self {
        Self {
            language: tree_sitter_go::LANGUAGE.into(),
        }
    }

    /// Create a new parser for this thread.
    fn create_parser(&self) -> anyhow::Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    /// Extract the package name from a parsed file.
    fn extract_package(&self, parsed: &ParsedFile) -> Option<String> {
        let query = Query::new(&self.language, PACKAGE_QUERY).ok()?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.tree.root_node(), &parsed.source[..]);

        if let Some(m) = matches.next() {
            for capture in m.captures {
                let name = query.capture_names()[capture.index as usize];
                if name == "package_name" {
                    return Some(parsed.node_text(capture.node).to_string());
                }
            }
        }
        None
    }

    /// Extract imports from a parsed file.
    fn extract_imports(&self, parsed: &ParsedFile) -> anyhow::Result<Vec<Import>> {
        let query = Query::new(&self.language, IMPORT_QUERY)?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.tree.root_node(), &parsed.source[..]);

        let mut imports = Vec::new();
        let mut seen_paths = std::collections::HashSet::new();

        while let Some(m) = matches.next() {
            let mut path = String::new();
            let mut alias = None;

            for capture in m.captures {
                let name = query.capture_names()[capture.index as usize];
                match name {
                    "path" => {
                        let raw = parsed.node_text(capture.node);
                        path = raw.trim_matches('"').to_string();
                    }
                    "alias" => {
                        alias = Some(parsed.node_text(capture.node).to_string());
                    }
                    _ => {}
                }
            }

            if !path.is_empty() && seen_paths.insert(path.clone()) {
                imports.push(Import { path, alias });
            }
        }

        Ok(imports)
    }

    /// Whether the file header marks it as generated.
    fn is_generated(&self, parsed: &ParsedFile) -> bool {
        for line in parsed.lines() {
            let line = line.trim_end();
            if line.starts_with("package ") {
                break;
            }
            if GENERATED_HEADER.is_match(line) {
                return true;
            }
        }
        false
    }
}

impl Default for GoAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for GoAnalyzer {
    fn language_id(&self) -> &'static str {
        "go"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn parse(&self, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile> {
        let mut parser = self.create_parser()?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("failed to parse Go source: {}", path.display()))?;

        Ok(ParsedFile {
            tree,
            source: source.to_vec(),
            path: path.to_path_buf(),
        })
    }

    fn lower(&self, parsed: &ParsedFile) -> anyhow::Result<SourceFile> {
        let package = self
            .extract_package(parsed)
            .ok_or_else(|| anyhow::anyhow!("missing package clause: {}", parsed.path.display()))?;
        let imports = self.extract_imports(parsed)?;

        let lowerer = Lowerer { parsed };
        let (types, functions) = lowerer.declarations(parsed.tree.root_node());

        Ok(SourceFile {
            path: parsed.path.clone(),
            package,
            imports,
            types,
            functions,
            generated: self.is_generated(parsed),
        })
    }
}

/// Children of `node` paired with their field names.
fn fielded_children<'t>(node: Node<'t>) -> Vec<(Option<&'static str>, Node<'t>)> {
    let mut cursor = node.walk();
    let mut out = Vec::new();
    if cursor.goto_first_child() {
        loop {
            out.push((cursor.field_name(), cursor.node()));
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();
    children
}

fn fields_named<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children = node.children_by_field_name(field, &mut cursor).collect();
    children
}

/// Turns tree-sitter nodes into the owned syntax model.
struct Lowerer<'a> {
    parsed: &'a ParsedFile,
}

impl<'a> Lowerer<'a> {
    fn text(&self, node: Node) -> String {
        self.parsed.node_text(node).to_string()
    }

    /// Strip comment markers, yielding one entry per line.
    fn comment_lines(&self, node: Node) -> Vec<String> {
        let text = self.parsed.node_text(node);
        if let Some(line) = text.strip_prefix("//") {
            return vec![line.trim().to_string()];
        }
        text.trim_start_matches("/*")
            .trim_end_matches("*/")
            .lines()
            .map(|l| l.trim().trim_start_matches('*').trim().to_string())
            .collect()
    }

    /// Walk top-level declarations, attaching doc comments to functions.
    fn declarations(&self, root: Node) -> (Vec<TypeDecl>, Vec<FuncDecl>) {
        let mut types = Vec::new();
        let mut functions = Vec::new();
        let mut doc: Vec<Node> = Vec::new();

        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            if node.kind() == "comment" {
                let adjacent = doc
                    .last()
                    .map(|prev| prev.end_position().row + 1 >= node.start_position().row)
                    .unwrap_or(true);
                if !adjacent {
                    doc.clear();
                }
                doc.push(node);
                continue;
            }

            let attached = doc
                .last()
                .map(|prev| prev.end_position().row + 1 == node.start_position().row)
                .unwrap_or(false);
            let doc_lines: Vec<String> = if attached {
                doc.iter().flat_map(|c| self.comment_lines(*c)).collect()
            } else {
                Vec::new()
            };
            doc.clear();

            match node.kind() {
                "function_declaration" | "method_declaration" => {
                    functions.push(self.func_decl(node, doc_lines));
                }
                "type_declaration" => types.extend(self.type_decls(node)),
                _ => {}
            }
        }

        (types, functions)
    }

    fn type_decls(&self, node: Node) -> Vec<TypeDecl> {
        let mut out = Vec::new();
        for spec in named_children(node) {
            let alias = match spec.kind() {
                "type_spec" => false,
                "type_alias" => true,
                _ => continue,
            };
            let (Some(name), Some(ty)) = (
                spec.child_by_field_name("name"),
                spec.child_by_field_name("type"),
            ) else {
                continue;
            };
            out.push(TypeDecl {
                name: self.text(name),
                alias,
                generic: spec.child_by_field_name("type_parameters").is_some(),
                ty: self.type_expr(ty),
                span: Span::from_node(spec),
            });
        }
        out
    }

    fn func_decl(&self, node: Node, doc: Vec<String>) -> FuncDecl {
        let name_node = node.child_by_field_name("name");
        let receiver = node
            .child_by_field_name("receiver")
            .and_then(|r| self.params(r).into_iter().next());
        let type_params = node
            .child_by_field_name("type_parameters")
            .map(|tp| {
                named_children(tp)
                    .into_iter()
                    .flat_map(|decl| fields_named(decl, "name"))
                    .map(|n| self.text(n))
                    .collect()
            })
            .unwrap_or_default();
        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.params(p))
            .unwrap_or_default();
        let results = match node.child_by_field_name("result") {
            Some(r) if r.kind() == "parameter_list" => self.params(r),
            Some(r) => vec![Param {
                name: None,
                ty: self.type_expr(r),
            }],
            None => Vec::new(),
        };

        FuncDecl {
            name: name_node.map(|n| self.text(n)).unwrap_or_default(),
            receiver,
            type_params,
            params,
            results,
            body: node.child_by_field_name("body").map(|b| self.block(b)),
            span: Span::from_node(node),
            name_span: name_node.map(Span::from_node).unwrap_or_else(|| Span::from_node(node)),
            doc,
        }
    }

    /// Flatten a parameter list into one entry per declared name.
    fn params(&self, list: Node) -> Vec<Param> {
        let mut out = Vec::new();
        for decl in named_children(list) {
            let variadic = decl.kind() == "variadic_parameter_declaration";
            if decl.kind() != "parameter_declaration" && !variadic {
                continue;
            }
            let mut ty = decl
                .child_by_field_name("type")
                .map(|t| self.type_expr(t))
                .unwrap_or(TypeExpr::Other);
            if variadic {
                ty = TypeExpr::Slice(Box::new(ty));
            }
            let names = fields_named(decl, "name");
            if names.is_empty() {
                out.push(Param { name: None, ty });
            } else {
                for n in names {
                    out.push(Param {
                        name: Some(self.text(n)),
                        ty: ty.clone(),
                    });
                }
            }
        }
        out
    }

    fn type_expr(&self, node: Node) -> TypeExpr {
        let child = |field: &str| {
            node.child_by_field_name(field)
                .map(|n| Box::new(self.type_expr(n)))
                .unwrap_or_else(|| Box::new(TypeExpr::Other))
        };
        match node.kind() {
            "type_identifier" | "identifier" => TypeExpr::Named {
                package: None,
                name: self.text(node),
            },
            "qualified_type" => TypeExpr::Named {
                package: node.child_by_field_name("package").map(|p| self.text(p)),
                name: node
                    .child_by_field_name("name")
                    .map(|n| self.text(n))
                    .unwrap_or_default(),
            },
            "pointer_type" => match named_children(node).first() {
                Some(inner) => TypeExpr::Pointer(Box::new(self.type_expr(*inner))),
                None => TypeExpr::Other,
            },
            "slice_type" => TypeExpr::Slice(child("element")),
            "array_type" | "implicit_length_array_type" => TypeExpr::Array(child("element")),
            "map_type" => TypeExpr::Map(child("key"), child("value")),
            "channel_type" => TypeExpr::Chan(child("value")),
            "function_type" => TypeExpr::Func,
            "interface_type" => TypeExpr::Interface,
            "struct_type" => TypeExpr::Struct(self.struct_fields(node)),
            "generic_type" => TypeExpr::Generic(child("type")),
            "parenthesized_type" => match named_children(node).first() {
                Some(inner) => self.type_expr(*inner),
                None => TypeExpr::Other,
            },
            _ => TypeExpr::Other,
        }
    }

    fn struct_fields(&self, struct_node: Node) -> Vec<StructField> {
        let Some(list) = named_children(struct_node)
            .into_iter()
            .find(|n| n.kind() == "field_declaration_list")
        else {
            return Vec::new();
        };

        let mut fields = Vec::new();
        let mut doc: Vec<Node> = Vec::new();
        let mut prev_end_row = list.start_position().row;

        let mut cursor = list.walk();
        for node in list.named_children(&mut cursor) {
            if node.kind() == "comment" {
                // Trailing comments belong to the previous field.
                if node.start_position().row > prev_end_row {
                    doc.push(node);
                }
                continue;
            }
            if node.kind() != "field_declaration" {
                continue;
            }

            let deprecated = doc
                .last()
                .filter(|c| c.end_position().row + 1 == node.start_position().row)
                .is_some()
                && doc
                    .iter()
                    .flat_map(|c| self.comment_lines(*c))
                    .any(|l| l.starts_with("Deprecated:"));
            doc.clear();
            prev_end_row = node.end_position().row;

            fields.extend(self.field_decl(node, deprecated));
        }
        fields
    }

    fn field_decl(&self, node: Node, deprecated: bool) -> Vec<StructField> {
        let tag = node
            .child_by_field_name("tag")
            .map(|t| tag_literal(self.parsed.node_text(t)));
        let Some(type_node) = node.child_by_field_name("type") else {
            return Vec::new();
        };
        let mut ty = self.type_expr(type_node);

        let names = fields_named(node, "name");
        if names.is_empty() {
            // Embedded field: `Base`, `*Base`, `pkg.Base`.
            let pointer = fielded_children(node).iter().any(|(_, n)| n.kind() == "*");
            let name = match &ty {
                TypeExpr::Named { name, .. } => name.clone(),
                TypeExpr::Generic(inner) => inner.base_name().unwrap_or_default().to_string(),
                TypeExpr::Pointer(inner) => inner.base_name().unwrap_or_default().to_string(),
                _ => String::new(),
            };
            if pointer {
                ty = TypeExpr::Pointer(Box::new(ty));
            }
            return vec![StructField {
                name,
                embedded: true,
                ty,
                tag,
                deprecated,
            }];
        }

        names
            .into_iter()
            .map(|n| StructField {
                name: self.text(n),
                embedded: false,
                ty: ty.clone(),
                tag: tag.clone(),
                deprecated,
            })
            .collect()
    }

    fn block(&self, node: Node) -> Block {
        Block {
            stmts: self.stmt_list(node),
        }
    }

    /// Statements directly under `node`, looking through `statement_list`.
    fn stmt_list(&self, node: Node) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        for child in named_children(node) {
            if child.kind() == "statement_list" {
                stmts.extend(self.stmt_list(child));
            } else if let Some(stmt) = self.stmt(child) {
                stmts.push(stmt);
            }
        }
        stmts
    }

    fn boxed_stmt(&self, node: Option<Node>) -> Option<Box<Stmt>> {
        node.and_then(|n| self.stmt(n)).map(Box::new)
    }

    fn stmt(&self, node: Node) -> Option<Stmt> {
        let field = |name: &str| node.child_by_field_name(name);
        let stmt = match node.kind() {
            "comment" | "empty_statement" => return None,
            "expression_statement" => Stmt::Expr(self.first_expr(node)),
            "short_var_declaration" => Stmt::Assign {
                lhs: self.expr_list(field("left")),
                op: AssignOp::Define,
                rhs: self.expr_list(field("right")),
            },
            "assignment_statement" => {
                let op = match field("operator").map(|o| self.parsed.node_text(o)) {
                    Some("=") => AssignOp::Assign,
                    _ => AssignOp::Compound,
                };
                Stmt::Assign {
                    lhs: self.expr_list(field("left")),
                    op,
                    rhs: self.expr_list(field("right")),
                }
            }
            "var_declaration" => {
                let mut specs = Vec::new();
                self.var_specs(node, &mut specs);
                if specs.len() == 1 {
                    specs.remove(0)
                } else {
                    Stmt::Block(Block { stmts: specs })
                }
            }
            "return_statement" => Stmt::Return(
                named_children(node)
                    .first()
                    .map(|n| self.expr_list(Some(*n)))
                    .unwrap_or_default(),
            ),
            "block" => Stmt::Block(self.block(node)),
            "if_statement" => Stmt::If {
                init: self.boxed_stmt(field("initializer")),
                cond: field("condition")
                    .map(|c| self.expr(c))
                    .unwrap_or(Expr::Other),
                then: field("consequence")
                    .map(|b| self.block(b))
                    .unwrap_or_default(),
                otherwise: self.boxed_stmt(field("alternative")),
            },
            "for_statement" => self.for_stmt(node),
            "expression_switch_statement" | "type_switch_statement" | "select_statement" => {
                self.switch_stmt(node)
            }
            "go_statement" => Stmt::Go(self.first_expr(node)),
            "defer_statement" => Stmt::Defer(self.first_expr(node)),
            "inc_statement" | "dec_statement" => Stmt::IncDec(self.first_expr(node)),
            "send_statement" => Stmt::Send {
                channel: field("channel").map(|c| self.expr(c)).unwrap_or(Expr::Other),
                value: field("value").map(|v| self.expr(v)).unwrap_or(Expr::Other),
            },
            "receive_statement" => match field("left") {
                Some(left) => Stmt::Assign {
                    lhs: self.expr_list(Some(left)),
                    op: AssignOp::Define,
                    rhs: field("right").map(|r| vec![self.expr(r)]).unwrap_or_default(),
                },
                None => Stmt::Expr(field("right").map(|r| self.expr(r)).unwrap_or(Expr::Other)),
            },
            "labeled_statement" => {
                let inner = named_children(node)
                    .into_iter()
                    .filter(|n| n.kind() != "label_name")
                    .find_map(|n| self.stmt(n))
                    .unwrap_or(Stmt::Other);
                Stmt::Labeled(Box::new(inner))
            }
            _ => Stmt::Other,
        };
        Some(stmt)
    }

    fn var_specs(&self, node: Node, out: &mut Vec<Stmt>) {
        for spec in named_children(node) {
            match spec.kind() {
                "var_spec_list" => self.var_specs(spec, out),
                "var_spec" => out.push(Stmt::VarDecl {
                    names: fields_named(spec, "name")
                        .into_iter()
                        .map(|n| self.text(n))
                        .collect(),
                    ty: spec.child_by_field_name("type").map(|t| self.type_expr(t)),
                    values: self.expr_list(spec.child_by_field_name("value")),
                }),
                _ => {}
            }
        }
    }

    fn for_stmt(&self, node: Node) -> Stmt {
        let body = node
            .child_by_field_name("body")
            .map(|b| self.block(b))
            .unwrap_or_default();
        let header = named_children(node)
            .into_iter()
            .find(|n| n.kind() != "block");

        match header {
            Some(h) if h.kind() == "range_clause" => {
                let left = self.expr_list(h.child_by_field_name("left"));
                let define = fielded_children(h).iter().any(|(_, n)| n.kind() == ":=");
                let mut left = left.into_iter();
                Stmt::Range {
                    key: left.next(),
                    value: left.next(),
                    define,
                    over: h
                        .child_by_field_name("right")
                        .map(|r| self.expr(r))
                        .unwrap_or(Expr::Other),
                    body,
                }
            }
            Some(h) if h.kind() == "for_clause" => Stmt::For {
                init: self.boxed_stmt(h.child_by_field_name("initializer")),
                cond: h.child_by_field_name("condition").map(|c| self.expr(c)),
                post: self.boxed_stmt(h.child_by_field_name("update")),
                body,
            },
            Some(cond) => Stmt::For {
                init: None,
                cond: Some(self.expr(cond)),
                post: None,
                body,
            },
            None => Stmt::For {
                init: None,
                cond: None,
                post: None,
                body,
            },
        }
    }

    fn switch_stmt(&self, node: Node) -> Stmt {
        let init = self.boxed_stmt(node.child_by_field_name("initializer"));
        let tag = node.child_by_field_name("value").map(|v| self.expr(v));

        let mut cases = Vec::new();
        for case in named_children(node) {
            if !matches!(
                case.kind(),
                "expression_case" | "type_case" | "default_case" | "communication_case"
            ) {
                continue;
            }
            let mut exprs = Vec::new();
            let mut body = Vec::new();
            for (field, child) in fielded_children(case) {
                if !child.is_named() || child.kind() == "comment" {
                    continue;
                }
                match field {
                    Some("value") => exprs.extend(self.expr_list(Some(child))),
                    Some("type") => {}
                    Some("communication") => body.extend(self.stmt(child)),
                    _ if child.kind() == "statement_list" => body.extend(self.stmt_list(child)),
                    _ => body.extend(self.stmt(child)),
                }
            }
            cases.push(CaseClause { exprs, body });
        }

        Stmt::Switch { init, tag, cases }
    }

    fn first_expr(&self, node: Node) -> Expr {
        named_children(node)
            .first()
            .map(|n| self.expr(*n))
            .unwrap_or(Expr::Other)
    }

    fn expr_list(&self, node: Option<Node>) -> Vec<Expr> {
        match node {
            Some(n) if n.kind() == "expression_list" => {
                named_children(n).into_iter().map(|e| self.expr(e)).collect()
            }
            Some(n) => vec![self.expr(n)],
            None => Vec::new(),
        }
    }

    fn boxed_expr(&self, node: Option<Node>) -> Box<Expr> {
        Box::new(node.map(|n| self.expr(n)).unwrap_or(Expr::Other))
    }

    fn expr(&self, node: Node) -> Expr {
        let field = |name: &str| node.child_by_field_name(name);
        match node.kind() {
            "identifier" | "field_identifier" | "package_identifier" | "type_identifier" => {
                Expr::Ident(self.text(node))
            }
            "selector_expression" => Expr::Selector {
                base: self.boxed_expr(field("operand")),
                field: field("field").map(|f| self.text(f)).unwrap_or_default(),
            },
            "call_expression" => Expr::Call {
                func: self.boxed_expr(field("function")),
                args: field("arguments")
                    .map(|a| self.args(a))
                    .unwrap_or_default(),
            },
            "index_expression" => Expr::Index {
                base: self.boxed_expr(field("operand")),
                index: field("index").map(|i| vec![self.expr(i)]).unwrap_or_default(),
            },
            "slice_expression" => Expr::Index {
                base: self.boxed_expr(field("operand")),
                index: ["start", "end", "capacity"]
                    .iter()
                    .filter_map(|f| field(*f))
                    .map(|n| self.expr(n))
                    .collect(),
            },
            "unary_expression" => Expr::Unary {
                op: field("operator").map(|o| self.text(o)).unwrap_or_default(),
                operand: self.boxed_expr(field("operand")),
            },
            "binary_expression" => Expr::Binary {
                op: field("operator").map(|o| self.text(o)).unwrap_or_default(),
                left: self.boxed_expr(field("left")),
                right: self.boxed_expr(field("right")),
            },
            "parenthesized_expression" => Expr::Paren(Box::new(self.first_expr(node))),
            "composite_literal" => Expr::Composite {
                ty: field("type").map(|t| self.type_expr(t)),
                elements: field("body")
                    .map(|b| self.elements(b))
                    .unwrap_or_default(),
            },
            "literal_value" => Expr::Composite {
                ty: None,
                elements: self.elements(node),
            },
            "literal_element" | "variadic_argument" => self.first_expr(node),
            "func_literal" => Expr::FuncLit(
                field("body")
                    .map(|b| self.block(b))
                    .unwrap_or_default(),
            ),
            "type_assertion_expression" => Expr::TypeAssert {
                base: self.boxed_expr(field("operand")),
                ty: field("type").map(|t| self.type_expr(t)),
            },
            "type_conversion_expression" => Expr::Call {
                func: Box::new(
                    field("type")
                        .map(|t| Expr::Type(self.type_expr(t)))
                        .unwrap_or(Expr::Other),
                ),
                args: vec![*self.boxed_expr(field("operand"))],
            },
            kind if LITERAL_KINDS.contains(&kind) => Expr::Literal(self.text(node)),
            kind if TYPE_KINDS.contains(&kind) => Expr::Type(self.type_expr(node)),
            _ => Expr::Other,
        }
    }

    fn args(&self, list: Node) -> Vec<Expr> {
        named_children(list)
            .into_iter()
            .map(|a| self.expr(a))
            .collect()
    }

    fn elements(&self, literal: Node) -> Vec<Element> {
        named_children(literal)
            .into_iter()
            .map(|el| {
                if el.kind() != "keyed_element" {
                    return Element {
                        key: None,
                        value: self.element_value(el),
                    };
                }
                let parts = named_children(el);
                let key = parts.first().map(|k| self.element_key(*k));
                let value = parts
                    .last()
                    .filter(|_| parts.len() > 1)
                    .map(|v| self.element_value(*v))
                    .unwrap_or(Expr::Other);
                Element { key, value }
            })
            .collect()
    }

    fn unwrap_literal_element<'t>(&self, node: Node<'t>) -> Node<'t> {
        if node.kind() == "literal_element" {
            if let Some(inner) = named_children(node).into_iter().next() {
                return inner;
            }
        }
        node
    }

    fn element_key(&self, node: Node) -> ElementKey {
        let node = self.unwrap_literal_element(node);
        match node.kind() {
            "identifier" | "field_identifier" => ElementKey::Field(self.text(node)),
            _ => ElementKey::Expr(self.expr(node)),
        }
    }

    fn element_value(&self, node: Node) -> Expr {
        self.expr(self.unwrap_literal_element(node))
    }
}

/// Contents of a struct tag literal.
///
/// Raw tags lose their backticks; interpreted tags are unquoted and their
/// escapes resolved, so both spellings yield `key:"value"` pairs.
fn tag_literal(raw: &str) -> String {
    if let Some(inner) = raw.strip_prefix('`').and_then(|r| r.strip_suffix('`')) {
        return inner.to_string();
    }
    let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) else {
        return raw.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
