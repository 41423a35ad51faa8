//! Converter classification from a function signature.
//!
//! A function is a converter when some struct parameter and some struct
//! result are distinct types with compatible container shapes and related
//! names (`User` -> `UserDTO`). Everything here looks at the signature
//! only; the body is never inspected.

use std::fmt;

use serde::{Serialize, Serializer};

use super::candidate::{extract_candidate, Candidate, ContainerShape};
use super::similarity::{names_related, similarity_ratio};
use crate::analysis::{FuncDecl, Param, Type, TypeTable};
use crate::config::Config;

/// How values flow through a converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    Value,
    Pointer,
    Slice,
    Map,
    /// Slice source reduced to a single struct.
    Aggregating,
}

impl ConversionKind {
    pub(crate) fn of(source: ContainerShape, dest: ContainerShape) -> Self {
        match (source, dest) {
            (ContainerShape::Sequence, ContainerShape::Sequence) => ConversionKind::Slice,
            (ContainerShape::Mapping, ContainerShape::Mapping) => ConversionKind::Map,
            (ContainerShape::Sequence, _) => ConversionKind::Aggregating,
            (ContainerShape::None, ContainerShape::None) => ConversionKind::Value,
            _ => ConversionKind::Pointer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionKind::Value => "value",
            ConversionKind::Pointer => "pointer",
            ConversionKind::Slice => "slice",
            ConversionKind::Map => "map",
            ConversionKind::Aggregating => "aggregating",
        }
    }
}

/// Label shown next to a finding, e.g. "slice converter".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConverterKind {
    pub conversion: ConversionKind,
    pub method: bool,
}

impl fmt::Display for ConverterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.method {
            write!(f, "{} method converter", self.conversion.as_str())
        } else {
            write!(f, "{} converter", self.conversion.as_str())
        }
    }
}

impl Serialize for ConverterKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A signature position holding a candidate.
#[derive(Debug, Clone)]
pub struct CandidateParam {
    pub index: usize,
    /// Declared name; `None` for unnamed results.
    pub name: Option<String>,
    pub candidate: Candidate,
}

/// The qualifying (source, destination) pair of a converter.
#[derive(Debug, Clone)]
pub struct ConverterPair {
    pub source: CandidateParam,
    pub dest: CandidateParam,
    pub kind: ConverterKind,
}

fn shapes_compatible(source: ContainerShape, dest: ContainerShape, config: &Config) -> bool {
    match source {
        ContainerShape::Sequence | ContainerShape::Mapping if source == dest => true,
        ContainerShape::Sequence => config.allow_aggregating_converters && dest.is_single(),
        ContainerShape::Mapping => false,
        ContainerShape::None | ContainerShape::Pointer => dest.is_single(),
    }
}

fn type_names_match(source: &str, dest: &str, config: &Config) -> bool {
    if names_related(source, dest) {
        return true;
    }
    config.min_name_similarity > 0.0 && similarity_ratio(source, dest) > config.min_name_similarity
}

fn candidates(params: &[Param], types: &[Type], table: &TypeTable) -> Vec<CandidateParam> {
    params
        .iter()
        .zip(types)
        .enumerate()
        .filter_map(|(index, (param, ty))| {
            extract_candidate(ty, table).map(|candidate| CandidateParam {
                index,
                name: param.name.clone().filter(|n| n != "_"),
                candidate,
            })
        })
        .collect()
}

/// Find the converter pair of `decl`, if it is a converter.
pub fn classify(
    decl: &FuncDecl,
    params: &[Type],
    results: &[Type],
    table: &TypeTable,
    config: &Config,
) -> Option<ConverterPair> {
    if decl.is_method() && !config.include_member_functions {
        return None;
    }
    if params.is_empty() || results.is_empty() {
        return None;
    }

    let sources = candidates(&decl.params, params, table);
    let dests = candidates(&decl.results, results, table);
    if sources.is_empty() || dests.is_empty() {
        return None;
    }

    for source in &sources {
        for dest in &dests {
            let (s, d) = (&source.candidate, &dest.candidate);
            if s.identity == d.identity {
                continue;
            }
            if !shapes_compatible(s.shape, d.shape, config) {
                continue;
            }
            if type_names_match(&s.name, &d.name, config) {
                return Some(ConverterPair {
                    kind: ConverterKind {
                        conversion: ConversionKind::of(s.shape, d.shape),
                        method: decl.is_method(),
                    },
                    source: source.clone(),
                    dest: dest.clone(),
                });
            }
        }
    }

    None
}

/// Whether `decl` plausibly converts one struct into another.
pub fn is_possible_converter(
    decl: &FuncDecl,
    params: &[Type],
    results: &[Type],
    table: &TypeTable,
    config: &Config,
) -> bool {
    classify(decl, params, results, table, config).is_some()
}

/// First parameter (or result) that is a struct candidate.
pub fn find_candidate_param(params: &[Param], types: &[Type], table: &TypeTable) -> Option<CandidateParam> {
    candidates(params, types, table).into_iter().next()
}
