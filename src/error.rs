//! Errors raised while analyzing a single declaration.
//!
//! None of these abort a run: the detection runner logs them and moves on
//! to the next declaration.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("function {0:?} does not have a resolvable signature")]
    UnresolvedSignature(String),

    #[error("function {0:?} must have at least one parameter and one result")]
    MissingParamsOrResults(String),

    #[error("cannot determine candidate input parameter for function {0:?}")]
    NoInputCandidate(String),

    #[error("cannot determine candidate output parameter for function {0:?}")]
    NoOutputCandidate(String),

    #[error("input parameter of function {0:?} is unnamed, so its field reads cannot be traced")]
    UnnamedSource(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
