//! Recognition of batch converters that forward each element to another
//! converter.
//!
//! ```go
//! func ToDTOs(in []User) []UserDTO {
//!     out := make([]UserDTO, 0, len(in))
//!     for _, u := range in {
//!         out = append(out, ToDTO(u))
//!     }
//!     return out
//! }
//! ```
//!
//! The inner converter is checked on its own when the runner reaches it.

use std::collections::HashSet;

use super::candidate::{Candidate, ContainerShape};
use crate::analysis::walk::walk_block;
use crate::analysis::{Block, Expr, Stmt};

/// Strip parentheses, `&` and `*` around a value.
fn unwrap_value(expr: &Expr) -> &Expr {
    let mut expr = expr.unparen();
    while let Expr::Unary { op, operand } = expr {
        if op != "&" && op != "*" {
            break;
        }
        expr = operand.unparen();
    }
    expr
}

fn is_call(expr: &Expr) -> bool {
    matches!(unwrap_value(expr), Expr::Call { .. })
}

/// Element binding of a `range` over `source_var`, if any.
pub(crate) fn range_element<'a>(body: &'a Block, source_var: &str) -> Option<&'a str> {
    let mut element = None;
    walk_block(body, &mut |node, _| {
        if element.is_some() {
            return false;
        }
        if let Some(Stmt::Range {
            value: Some(value),
            over,
            ..
        }) = node.as_stmt()
        {
            if over.unparen().as_ident() == Some(source_var) {
                element = value.as_ident().filter(|v| *v != "_");
            }
        }
        true
    });
    element
}

/// Identifiers assigned from a call result anywhere in `body`.
fn call_bound_idents(body: &Block) -> HashSet<&str> {
    let mut bound = HashSet::new();
    walk_block(body, &mut |node, _| {
        match node.as_stmt() {
            Some(Stmt::Assign { lhs, rhs, .. }) if rhs.len() == 1 && is_call(&rhs[0]) => {
                bound.extend(lhs.iter().filter_map(Expr::as_ident));
            }
            Some(Stmt::VarDecl { names, values, .. }) if values.len() == 1 && is_call(&values[0]) => {
                bound.extend(names.iter().map(String::as_str));
            }
            _ => {}
        }
        true
    });
    bound
}

/// Whether validation of a batch converter can be skipped because each
/// element is handed to another function.
///
/// Only `Sequence` to `Sequence` converters qualify.
pub fn is_delegating(body: &Block, source: &Candidate, dest: &Candidate, source_var: &str) -> bool {
    if source.shape != ContainerShape::Sequence || dest.shape != ContainerShape::Sequence {
        return false;
    }
    if range_element(body, source_var).is_none() {
        return false;
    }

    let bound = call_bound_idents(body);
    let forwards = |arg: &Expr| {
        is_call(arg)
            || unwrap_value(arg)
                .as_ident()
                .map_or(false, |name| bound.contains(name))
    };

    let mut delegating = false;
    walk_block(body, &mut |node, _| {
        if delegating {
            return false;
        }
        if let Some(call @ Expr::Call { args, .. }) = node.as_expr() {
            if call.is_call_to("append") && args.len() >= 2 {
                delegating = args[1..].iter().any(|a| forwards(a));
            }
        } else if let Some(Stmt::Assign { lhs, rhs, .. }) = node.as_stmt() {
            // out[i] = Convert(elem)
            delegating = matches!(lhs.first(), Some(Expr::Index { .. }))
                && rhs.first().map_or(false, is_call);
        }
        true
    });
    delegating
}
