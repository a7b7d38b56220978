use thiserror::Error;

use crate::automaton::CodePoint;

/// Errors produced by parsing, construction and matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A transition interval with `min > max`.
    #[error("invalid transition interval: min {min:#06x} exceeds max {max:#06x}")]
    InvalidInterval { min: CodePoint, max: CodePoint },

    /// The pattern string could not be parsed.
    #[error("parse error at position {pos}: {message}")]
    Parse { pos: usize, message: String },

    /// An operation outside the supported subset of the grammar.
    #[error("{0} is not supported")]
    Unsupported(&'static str),

    /// `start()` or `end()` was queried without a successful `find()`.
    #[error("no match available")]
    NoMatch,
}

impl Error {
    pub(crate) fn parse(pos: usize, message: impl Into<String>) -> Error {
        Error::Parse {
            pos,
            message: message.into(),
        }
    }
}
