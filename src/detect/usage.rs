//! Field and method usage of one variable inside a function body.
//!
//! Selector chains are read at their outermost selector, so
//! `src.User.Role.Name` records the path `User -> Role -> Name` once
//! instead of three overlapping one-level selections. Each classification
//! (method call, ignore acknowledgment, assignment target) is decided from
//! the ancestor chain the walker hands to the visitor.

use std::collections::{BTreeMap, BTreeSet};

use crate::analysis::walk::{walk_block, NodeRef};
use crate::analysis::{Block, ElementKey, Expr, Stmt};

/// Membership-only set of field or method names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageSet(BTreeSet<String>);

impl UsageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.0.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn union(&self, other: &UsageSet) -> UsageSet {
        UsageSet(self.0.union(&other.0).cloned().collect())
    }

    pub fn extend(&mut self, other: &UsageSet) {
        self.0.extend(other.0.iter().cloned());
    }
}

impl<S: Into<String>> FromIterator<S> for UsageSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        UsageSet(iter.into_iter().map(Into::into).collect())
    }
}

/// Usage of the value at one field path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageNode {
    /// Sub-fields used below this path.
    pub children: BTreeMap<String, UsageNode>,
    /// Methods invoked on the value at this path.
    pub methods: UsageSet,
    /// The value was consumed as a unit; its sub-fields need no checking.
    pub whole: bool,
}

impl UsageNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node consumed as a unit.
    pub fn whole() -> Self {
        Self {
            whole: true,
            ..Self::default()
        }
    }

    pub fn child(&self, name: &str) -> Option<&UsageNode> {
        self.children.get(name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Names of the direct sub-fields used.
    pub fn field_names(&self) -> UsageSet {
        self.children.keys().cloned().collect()
    }

    /// Node at `path` below this one, created on demand.
    pub fn node_mut(&mut self, path: &[&str]) -> &mut UsageNode {
        let mut node = self;
        for segment in path {
            node = node.children.entry((*segment).to_string()).or_default();
        }
        node
    }

    /// Record `usage` at `path`.
    pub fn attach(&mut self, path: &[&str], usage: UsageNode) {
        self.node_mut(path).merge(usage);
    }

    /// Union `other` into this node.
    pub fn merge(&mut self, other: UsageNode) {
        self.whole |= other.whole;
        self.methods.extend(&other.methods);
        for (name, child) in other.children {
            self.children.entry(name).or_default().merge(child);
        }
    }
}

/// Everything collected for one variable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableUsage {
    /// Direct fields read or written (excluding method calls).
    pub fields: UsageSet,
    /// Methods called directly on the variable.
    pub methods: UsageSet,
    /// Direct fields discarded with `_ = v.Field`.
    pub ignored: UsageSet,
    /// Nested paths, including ignored ones.
    pub tree: UsageNode,
}

impl VariableUsage {
    /// Fields that count as handled: read, written or acknowledged.
    pub fn handled(&self) -> UsageSet {
        self.fields.union(&self.ignored)
    }

    /// Union `other` into this usage.
    pub fn merge(&mut self, other: VariableUsage) {
        self.fields.extend(&other.fields);
        self.methods.extend(&other.methods);
        self.ignored.extend(&other.ignored);
        self.tree.merge(other.tree);
    }
}

/// Strip parentheses and one address-of.
pub(crate) fn unwrap_address(expr: &Expr) -> &Expr {
    match expr.unparen() {
        Expr::Unary { op, operand } if op == "&" => operand.unparen(),
        other => other,
    }
}

/// Keyed fields supplied by a composite literal, as a usage tree.
///
/// Returns `None` when `expr` is not a composite literal (optionally
/// behind `&`). Positional literals set every field and are whole.
pub fn composite_usage(expr: &Expr) -> Option<UsageNode> {
    let Expr::Composite { elements, .. } = unwrap_address(expr) else {
        return None;
    };

    let mut node = UsageNode::new();
    for element in elements {
        match &element.key {
            Some(ElementKey::Field(name)) => {
                let value = composite_usage(&element.value).unwrap_or_else(UsageNode::whole);
                node.attach(&[name.as_str()], value);
            }
            Some(ElementKey::Expr(_)) => {}
            None => node.whole = true,
        }
    }
    Some(node)
}

/// Usage recorded for a value assigned to a field path.
pub(crate) fn assigned_usage(value: &Expr) -> UsageNode {
    composite_usage(value).unwrap_or_else(UsageNode::whole)
}

/// Whether `expr` is the direct child `parent` continues a selector chain
/// through (`base` of a selector, index, deref or parenthesis).
fn continues_chain(parent: &Expr, expr: &Expr) -> Option<bool> {
    match parent {
        Expr::Selector { base, .. } if std::ptr::eq(base.as_ref(), expr) => Some(true),
        Expr::Index { base, .. } if std::ptr::eq(base.as_ref(), expr) => Some(false),
        Expr::Paren(inner) if std::ptr::eq(inner.as_ref(), expr) => Some(false),
        Expr::Unary { op, operand } if op == "*" && std::ptr::eq(operand.as_ref(), expr) => Some(false),
        _ => None,
    }
}

/// Whether the selector `expr` is an inner link of a longer chain.
fn is_inner_selector(expr: &Expr, ancestors: &[NodeRef]) -> bool {
    let mut child = expr;
    for ancestor in ancestors.iter().rev() {
        let Some(parent) = ancestor.as_expr() else {
            return false;
        };
        match continues_chain(parent, child) {
            Some(true) => return true,
            Some(false) => child = parent,
            None => return false,
        }
    }
    false
}

/// Root identifier and field path of a selector chain.
fn flatten_chain(expr: &Expr) -> Option<(&str, Vec<&str>)> {
    let mut path = Vec::new();
    let mut current = expr;
    loop {
        match current {
            Expr::Selector { base, field } => {
                path.push(field.as_str());
                current = base.as_ref();
            }
            Expr::Index { base, .. } => current = base.as_ref(),
            Expr::Paren(inner) => current = inner.as_ref(),
            Expr::Unary { op, operand } if op == "*" || op == "&" => current = operand.as_ref(),
            Expr::Ident(name) => {
                path.reverse();
                return Some((name.as_str(), path));
            }
            _ => return None,
        }
    }
}

/// How the outermost selector of a chain is used by its parent.
enum Context<'a> {
    Read,
    MethodCall,
    Ignored,
    AssignedFrom(&'a Expr),
}

fn context_of<'a>(expr: &Expr, parent: Option<NodeRef<'a>>) -> Context<'a> {
    match parent {
        Some(NodeRef::Expr(Expr::Call { func, .. })) if std::ptr::eq(func.as_ref(), expr) => {
            Context::MethodCall
        }
        Some(NodeRef::Stmt(Stmt::Assign { lhs, rhs, .. })) => {
            if let Some(i) = rhs.iter().position(|r| std::ptr::eq(r, expr)) {
                let target = if lhs.len() == rhs.len() { lhs.get(i) } else { lhs.first() };
                if target.and_then(Expr::as_ident) == Some("_") {
                    return Context::Ignored;
                }
            } else if let Some(i) = lhs.iter().position(|l| std::ptr::eq(l, expr)) {
                if lhs.len() == rhs.len() {
                    return Context::AssignedFrom(&rhs[i]);
                }
            }
            Context::Read
        }
        _ => Context::Read,
    }
}

/// Collect how `var` is used anywhere in `body`.
pub fn collect_usage(body: &Block, var: &str) -> VariableUsage {
    let mut usage = VariableUsage::default();

    walk_block(body, &mut |node, ancestors| {
        let Some(expr @ Expr::Selector { .. }) = node.as_expr() else {
            return true;
        };
        if is_inner_selector(expr, ancestors) {
            return true;
        }
        let Some((root, path)) = flatten_chain(expr) else {
            return true;
        };
        if root != var || path.is_empty() {
            return true;
        }

        match context_of(expr, ancestors.last().copied()) {
            Context::MethodCall => {
                if let Some((method, receiver)) = path.split_last() {
                    if receiver.is_empty() {
                        usage.methods.insert(*method);
                        usage.tree.methods.insert(*method);
                    } else {
                        usage.fields.insert(receiver[0]);
                        let node = usage.tree.node_mut(receiver);
                        node.methods.insert(*method);
                        node.whole = true;
                    }
                }
            }
            Context::Ignored => {
                usage.ignored.insert(path[0]);
                usage.tree.attach(&path, UsageNode::whole());
            }
            Context::AssignedFrom(value) => {
                usage.fields.insert(path[0]);
                usage.tree.attach(&path, assigned_usage(value));
            }
            Context::Read => {
                usage.fields.insert(path[0]);
                usage.tree.attach(&path, UsageNode::whole());
            }
        }
        true
    });

    usage
}
