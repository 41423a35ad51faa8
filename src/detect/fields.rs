//! Reconciles declared struct fields against collected usage.

use super::candidate::{extract_candidate, FieldDescriptor};
use super::patterns::PatternSet;
use super::similarity::similarity_ratio;
use super::usage::UsageNode;
use crate::analysis::TypeTable;
use crate::config::{Config, NonSerializableHandling};

/// Which end of the conversion a field list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Fields must be read.
    Source,
    /// Fields must be written.
    Destination,
}

/// Field policy for one run.
pub struct FieldValidator<'a> {
    config: &'a Config,
    table: &'a TypeTable,
    excluded_names: PatternSet,
}

impl<'a> FieldValidator<'a> {
    pub fn new(config: &'a Config, table: &'a TypeTable) -> Self {
        Self {
            config,
            table,
            excluded_names: PatternSet::new(&config.exclude_field_patterns),
        }
    }

    fn tag_ignored(&self, field: &FieldDescriptor) -> bool {
        self.config.ignore_field_tags.iter().any(|ignore| {
            if ignore.contains(':') {
                field.tags.contains(ignore.as_str())
            } else {
                let prefix = format!("{}:", ignore);
                field.tags.iter().any(|t| t.starts_with(&prefix))
            }
        })
    }

    /// Fields exempt from validation regardless of usage.
    fn is_exempt(&self, field: &FieldDescriptor, counterpart: &[FieldDescriptor]) -> bool {
        if !field.exported && !self.config.include_private_fields {
            return true;
        }
        if self.tag_ignored(field) || self.excluded_names.matches(&field.name) {
            return true;
        }
        if field.deprecated && self.config.ignore_deprecated_fields {
            return true;
        }
        if field.ty.is_non_serializable() {
            return match self.config.non_serializable_fields {
                NonSerializableHandling::Ignore => true,
                NonSerializableHandling::Adaptive => {
                    !counterpart.iter().any(|c| c.name == field.name)
                }
                NonSerializableHandling::Strict => false,
            };
        }
        false
    }

    fn handled_by_name(&self, field: &FieldDescriptor, usage: &UsageNode, side: Side) -> bool {
        if usage.has_child(&field.name) {
            return true;
        }
        if let Some(embedded) = field.promoted_from.as_deref().and_then(|e| usage.child(e)) {
            if embedded.whole || embedded.has_child(&field.name) {
                return true;
            }
        }
        if side == Side::Source
            && self.config.allow_getter_fallback
            && usage.methods.contains(&format!("Get{}", field.name))
        {
            return true;
        }
        let threshold = self.config.min_name_similarity;
        threshold > 0.0
            && usage
                .children
                .keys()
                .any(|used| similarity_ratio(used, &field.name) > threshold)
    }

    /// Fields of `counterpart` one level below `name`, when that field is
    /// itself a struct.
    fn nested_counterpart(&self, counterpart: &[FieldDescriptor], name: &str) -> Vec<FieldDescriptor> {
        counterpart
            .iter()
            .find(|c| c.name == name)
            .and_then(|c| extract_candidate(&c.ty, self.table))
            .filter(|c| c.shape.is_single())
            .map(|c| c.fields)
            .unwrap_or_default()
    }

    /// Missing field paths, in declaration order.
    ///
    /// A handled field whose usage is partial (not consumed whole, with
    /// sub-field usage) and whose type is a struct is checked recursively;
    /// its misses are reported as `Field.Sub`.
    pub fn missing_fields(
        &self,
        fields: &[FieldDescriptor],
        usage: &UsageNode,
        side: Side,
        counterpart: &[FieldDescriptor],
    ) -> Vec<String> {
        let mut missing = Vec::new();

        for field in fields {
            if self.is_exempt(field, counterpart) {
                continue;
            }
            if !self.handled_by_name(field, usage, side) {
                missing.push(field.name.clone());
                continue;
            }

            let Some(node) = usage.child(&field.name) else {
                continue;
            };
            if node.whole || node.children.is_empty() {
                continue;
            }
            let Some(nested) = extract_candidate(&field.ty, self.table) else {
                continue;
            };
            if !nested.shape.is_single() {
                continue;
            }

            let nested_counterpart = self.nested_counterpart(counterpart, &field.name);
            missing.extend(
                self.missing_fields(&nested.fields, node, side, &nested_counterpart)
                    .into_iter()
                    .map(|sub| format!("{}.{}", field.name, sub)),
            );
        }

        missing
    }
}

/// One-shot form of [`FieldValidator::missing_fields`].
pub fn missing_fields(
    fields: &[FieldDescriptor],
    usage: &UsageNode,
    side: Side,
    counterpart: &[FieldDescriptor],
    table: &TypeTable,
    config: &Config,
) -> Vec<String> {
    FieldValidator::new(config, table).missing_fields(fields, usage, side, counterpart)
}
