//! Lostfield - finds fields silently dropped by converter functions.
//!
//! Codebases with parallel model families (domain, DTO, wire) are full of
//! hand-written converters. When a field is added to one side and the
//! converter is not updated, the value is dropped without any compiler
//! error. Lostfield classifies converters from their signatures and checks
//! that every source field is read and every destination field is set.
//!
//! # Architecture
//!
//! - `analysis`: tree-sitter Go frontend, lowered syntax facts and the
//!   resolved type table
//! - `detect`: converter classification, usage collection, field
//!   validation and the run driver
//! - `config`: YAML configuration and policy knobs
//! - `report`: output formatting (default, pretty, JSON)
//! - `cli`: command-line entry points

pub mod analysis;
pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod report;

pub use analysis::{register_analyzers, AnalysisContext, GoAnalyzer, LanguageAnalyzer, Program};
pub use config::Config;
pub use detect::{DetectionResult, Finding, Runner, ValidationVerdict};
pub use error::{AnalysisError, AnalysisResult};

/// Initialize all subsystems.
///
/// Call this once at startup.
pub fn init() {
    register_analyzers();
}
