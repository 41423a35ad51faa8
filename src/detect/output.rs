//! Fields supplied to the value a converter returns.
//!
//! Two passes are unioned: selections on the output variable
//! (`out.Name = ...`) and keyed fields of every construction of the
//! destination type found in assignments, declarations and returns,
//! including `(&T{...}).WithX(...)` chains and `append(out, T{...})`.

use super::usage::{collect_usage, composite_usage, unwrap_address, UsageNode, VariableUsage};
use crate::analysis::walk::walk_block;
use crate::analysis::{AssignOp, Block, Expr, Stmt, TypeExpr};

/// What the function body supplies to its result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputUsage {
    /// Output variable, named or inferred.
    pub var: Option<String>,
    pub usage: VariableUsage,
}

fn type_matches(ty: &TypeExpr, type_name: &str) -> bool {
    ty.base_name()
        .map_or(false, |name| name.eq_ignore_ascii_case(type_name))
}

/// Whether `expr` builds a value of `type_name` (`T{}`, `&T{}` or `new(T)`).
fn is_construction(expr: &Expr, type_name: &str) -> bool {
    match unwrap_address(expr) {
        Expr::Composite { ty: Some(ty), .. } => type_matches(ty, type_name),
        Expr::Call { func, args } if func.as_ident() == Some("new") && args.len() == 1 => {
            match &args[0] {
                Expr::Ident(name) => name.eq_ignore_ascii_case(type_name),
                Expr::Type(ty) => type_matches(ty, type_name),
                _ => false,
            }
        }
        _ => false,
    }
}

/// Local variable holding the result, from `x := T{...}`, `x := &T{}`,
/// `x := new(T)` or `var x T`.
pub fn infer_output_var(body: &Block, type_name: &str) -> Option<String> {
    let mut found = None;
    walk_block(body, &mut |node, _| {
        if found.is_some() {
            return false;
        }
        match node.as_stmt() {
            Some(Stmt::Assign {
                lhs,
                op: AssignOp::Define,
                rhs,
            }) if lhs.len() == rhs.len() => {
                found = lhs
                    .iter()
                    .zip(rhs)
                    .find(|(_, value)| is_construction(value, type_name))
                    .and_then(|(name, _)| name.as_ident())
                    .map(String::from);
            }
            Some(Stmt::VarDecl { names, ty, values }) => {
                if values.is_empty() {
                    if ty.as_ref().map_or(false, |t| type_matches(t, type_name)) {
                        found = names.first().cloned();
                    }
                } else {
                    found = names
                        .iter()
                        .zip(values)
                        .find(|(_, value)| is_construction(value, type_name))
                        .map(|(name, _)| name.clone());
                }
            }
            _ => {}
        }
        true
    });
    found.filter(|name| name != "_")
}

/// Composite literal of `type_name` behind `expr`, looking through `&`,
/// parentheses and chained method calls on the literal.
fn construction_usage(expr: &Expr, type_name: &str) -> Option<UsageNode> {
    let mut current = unwrap_address(expr);
    loop {
        match current {
            Expr::Composite { ty: Some(ty), .. } => {
                return if type_matches(ty, type_name) {
                    composite_usage(current)
                } else {
                    None
                };
            }
            Expr::Call { func, .. } => match func.unparen() {
                Expr::Selector { base, .. } => current = unwrap_address(base),
                _ => return None,
            },
            _ => return None,
        }
    }
}

/// Values a statement hands over: assignment right sides, initializers,
/// returned values and appended elements.
fn produced_values(stmt: &Stmt) -> Vec<&Expr> {
    let values: &[Expr] = match stmt {
        Stmt::Assign { rhs, .. } => rhs,
        Stmt::VarDecl { values, .. } => values,
        Stmt::Return(values) => values,
        _ => return Vec::new(),
    };

    let mut out = Vec::with_capacity(values.len());
    for value in values {
        match value.unparen() {
            Expr::Call { func, args } if func.as_ident() == Some("append") && !args.is_empty() => {
                out.extend(&args[1..]);
            }
            other => out.push(other),
        }
    }
    out
}

/// Collect the fields supplied to the destination value.
///
/// `out_var` is the named result, if there is one; otherwise the variable
/// is inferred from the body.
pub fn collect_output_fields(body: &Block, out_var: Option<&str>, type_name: &str) -> OutputUsage {
    let var = out_var
        .filter(|v| *v != "_")
        .map(String::from)
        .or_else(|| infer_output_var(body, type_name));

    let mut usage = match &var {
        Some(v) => collect_usage(body, v),
        None => VariableUsage::default(),
    };

    let mut constructed = UsageNode::new();
    walk_block(body, &mut |node, _| {
        if let Some(stmt) = node.as_stmt() {
            for value in produced_values(stmt) {
                if let Some(keys) = construction_usage(value, type_name) {
                    constructed.merge(keys);
                }
            }
        }
        true
    });

    for name in constructed.children.keys() {
        usage.fields.insert(name.as_str());
    }
    usage.tree.merge(constructed);

    OutputUsage { var, usage }
}
