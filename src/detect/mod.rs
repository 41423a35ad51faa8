//! Converter detection: classifies functions from their signatures and
//! checks that every source field is read and every destination field is
//! set.
//!
//! Per function the flow is one way:
//! candidates → classification → delegation check → usage collection
//! (source reads, destination writes) → field reconciliation → verdict.

mod candidate;
mod classify;
mod delegation;
mod fields;
mod files;
mod output;
mod patterns;
mod runner;
mod similarity;
mod suppress;
mod types;
mod usage;
mod validate;

pub use candidate::{extract_candidate, Candidate, ContainerShape, FieldDescriptor};
pub use classify::{
    classify, find_candidate_param, is_possible_converter, CandidateParam, ConversionKind,
    ConverterKind, ConverterPair,
};
pub use delegation::is_delegating;
pub use fields::{missing_fields, FieldValidator, Side};
pub use files::{collect_files, FileFilter};
pub use output::{collect_output_fields, infer_output_var, OutputUsage};
pub use patterns::{compile_pattern, matches_any, PatternMatcher, PatternSet};
pub use runner::{check_program, Runner};
pub use similarity::{names_related, similarity_ratio};
pub use suppress::{suppression_for, Suppression};
pub use types::{DetectionResult, Finding, SuppressedFinding};
pub use usage::{collect_usage, composite_usage, UsageNode, UsageSet, VariableUsage};
pub use validate::{validate_converter, ValidationVerdict};
