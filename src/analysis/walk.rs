//! Parent-aware traversal over lowered function bodies.
//!
//! The walker keeps an explicit ancestor stack: a node is pushed before its
//! children are visited and popped afterwards, so every callback sees the
//! exact chain of enclosing statements and expressions.

use super::facts::{Block, ElementKey, Expr, Stmt};

/// A borrowed statement or expression.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

impl<'a> NodeRef<'a> {
    pub fn as_expr(&self) -> Option<&'a Expr> {
        match self {
            NodeRef::Expr(e) => Some(e),
            NodeRef::Stmt(_) => None,
        }
    }

    pub fn as_stmt(&self) -> Option<&'a Stmt> {
        match self {
            NodeRef::Stmt(s) => Some(s),
            NodeRef::Expr(_) => None,
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        let mut out = Vec::new();
        match *self {
            NodeRef::Stmt(stmt) => stmt_children(stmt, &mut out),
            NodeRef::Expr(expr) => expr_children(expr, &mut out),
        }
        out
    }
}

fn push_block<'a>(block: &'a Block, out: &mut Vec<NodeRef<'a>>) {
    out.extend(block.stmts.iter().map(NodeRef::Stmt));
}

fn push_exprs<'a>(exprs: &'a [Expr], out: &mut Vec<NodeRef<'a>>) {
    out.extend(exprs.iter().map(NodeRef::Expr));
}

fn stmt_children<'a>(stmt: &'a Stmt, out: &mut Vec<NodeRef<'a>>) {
    match stmt {
        Stmt::Expr(e) | Stmt::Go(e) | Stmt::Defer(e) | Stmt::IncDec(e) => {
            out.push(NodeRef::Expr(e))
        }
        Stmt::Assign { lhs, rhs, .. } => {
            push_exprs(lhs, out);
            push_exprs(rhs, out);
        }
        Stmt::VarDecl { values, .. } => push_exprs(values, out),
        Stmt::Return(values) => push_exprs(values, out),
        Stmt::Block(block) => push_block(block, out),
        Stmt::If {
            init,
            cond,
            then,
            otherwise,
        } => {
            if let Some(init) = init {
                out.push(NodeRef::Stmt(init));
            }
            out.push(NodeRef::Expr(cond));
            push_block(then, out);
            if let Some(otherwise) = otherwise {
                out.push(NodeRef::Stmt(otherwise));
            }
        }
        Stmt::For {
            init,
            cond,
            post,
            body,
        } => {
            if let Some(init) = init {
                out.push(NodeRef::Stmt(init));
            }
            if let Some(cond) = cond {
                out.push(NodeRef::Expr(cond));
            }
            if let Some(post) = post {
                out.push(NodeRef::Stmt(post));
            }
            push_block(body, out);
        }
        Stmt::Range {
            key,
            value,
            over,
            body,
            ..
        } => {
            if let Some(key) = key {
                out.push(NodeRef::Expr(key));
            }
            if let Some(value) = value {
                out.push(NodeRef::Expr(value));
            }
            out.push(NodeRef::Expr(over));
            push_block(body, out);
        }
        Stmt::Switch { init, tag, cases } => {
            if let Some(init) = init {
                out.push(NodeRef::Stmt(init));
            }
            if let Some(tag) = tag {
                out.push(NodeRef::Expr(tag));
            }
            for case in cases {
                push_exprs(&case.exprs, out);
                out.extend(case.body.iter().map(NodeRef::Stmt));
            }
        }
        Stmt::Send { channel, value } => {
            out.push(NodeRef::Expr(channel));
            out.push(NodeRef::Expr(value));
        }
        Stmt::Labeled(inner) => out.push(NodeRef::Stmt(inner)),
        Stmt::Other => {}
    }
}

fn expr_children<'a>(expr: &'a Expr, out: &mut Vec<NodeRef<'a>>) {
    match expr {
        Expr::Selector { base, .. } => out.push(NodeRef::Expr(base)),
        Expr::Call { func, args } => {
            out.push(NodeRef::Expr(func));
            push_exprs(args, out);
        }
        Expr::Index { base, index } => {
            out.push(NodeRef::Expr(base));
            push_exprs(index, out);
        }
        Expr::Unary { operand, .. } => out.push(NodeRef::Expr(operand)),
        Expr::Binary { left, right, .. } => {
            out.push(NodeRef::Expr(left));
            out.push(NodeRef::Expr(right));
        }
        Expr::Paren(inner) => out.push(NodeRef::Expr(inner)),
        Expr::Composite { elements, .. } => {
            for element in elements {
                if let Some(ElementKey::Expr(key)) = &element.key {
                    out.push(NodeRef::Expr(key));
                }
                out.push(NodeRef::Expr(&element.value));
            }
        }
        Expr::FuncLit(body) => push_block(body, out),
        Expr::TypeAssert { base, .. } => out.push(NodeRef::Expr(base)),
        Expr::Ident(_) | Expr::Type(_) | Expr::Literal(_) | Expr::Other => {}
    }
}

/// Visit every node under `block` depth-first.
///
/// The callback receives the node and its ancestors, innermost last, and
/// returns whether to descend into the node's children.
pub fn walk_block<'a, F>(block: &'a Block, visit: &mut F)
where
    F: FnMut(NodeRef<'a>, &[NodeRef<'a>]) -> bool,
{
    let mut stack = Vec::new();
    for stmt in &block.stmts {
        walk_node(NodeRef::Stmt(stmt), &mut stack, visit);
    }
}

fn walk_node<'a, F>(node: NodeRef<'a>, stack: &mut Vec<NodeRef<'a>>, visit: &mut F)
where
    F: FnMut(NodeRef<'a>, &[NodeRef<'a>]) -> bool,
{
    if !visit(node, stack) {
        return;
    }
    stack.push(node);
    for child in node.children() {
        walk_node(child, stack, visit);
    }
    stack.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::facts::AssignOp;

    fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_string())
    }

    fn select(base: Expr, field: &str) -> Expr {
        Expr::Selector {
            base: Box::new(base),
            field: field.to_string(),
        }
    }

    #[test]
    fn test_ancestors_are_innermost_last() {
        let block = Block {
            stmts: vec![Stmt::Assign {
                lhs: vec![ident("_")],
                op: AssignOp::Assign,
                rhs: vec![select(ident("user"), "Email")],
            }],
        };

        let mut depth_of_user = None;
        walk_block(&block, &mut |node, ancestors| {
            if let Some(Expr::Ident(name)) = node.as_expr() {
                if name == "user" {
                    depth_of_user = Some(ancestors.len());
                    assert!(matches!(ancestors[0], NodeRef::Stmt(Stmt::Assign { .. })));
                    assert!(matches!(
                        ancestors[1],
                        NodeRef::Expr(Expr::Selector { .. })
                    ));
                }
            }
            true
        });
        assert_eq!(depth_of_user, Some(2));
    }

    #[test]
    fn test_pruning_skips_children() {
        let block = Block {
            stmts: vec![Stmt::Expr(Expr::FuncLit(Block {
                stmts: vec![Stmt::Expr(ident("inner"))],
            }))],
        };

        let mut seen_inner = false;
        walk_block(&block, &mut |node, _| {
            if let Some(Expr::Ident(_)) = node.as_expr() {
                seen_inner = true;
            }
            !matches!(node.as_expr(), Some(Expr::FuncLit(_)))
        });
        assert!(!seen_inner);
    }
}
