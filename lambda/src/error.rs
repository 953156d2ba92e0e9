use thiserror::Error;

use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Empty input")]
    Empty,
    #[error("Unrecognized character `{found}` at {}", .span.start)]
    InvalidCharacter { found: char, span: Span },
    #[error("Invalid parameter name `{found}` at {}", .span.start)]
    InvalidParameter { found: String, span: Span },
    #[error("Unexpected `{found}` at {}, expected {expected}", .span.start)]
    UnexpectedToken {
        found: String,
        expected: String,
        span: Span,
    },
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: String, span: Span },
    #[error("Unconsumed input starting with `{found}` at {}", .span.start)]
    TrailingInput { found: String, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::Empty => None,
            ParseError::InvalidCharacter { span, .. }
            | ParseError::InvalidParameter { span, .. }
            | ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEnd { span, .. }
            | ParseError::TrailingInput { span, .. } => Some(span.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReductionError {
    #[error("Term nesting exceeds {limit} levels")]
    DepthExceeded { limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutError {
    #[error("Found a free variable `{name}`")]
    FreeVariable { name: String },
    #[error("Term nesting exceeds {limit} levels")]
    DepthExceeded { limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("`{0}` is not a valid name")]
    InvalidName(String),
    #[error("`{0}` is already defined")]
    Duplicate(String),
    #[error("`{name}` refers to itself through `{via}`")]
    Cyclic { name: String, via: String },
    #[error("Definition of `{name}` does not parse: {source}")]
    Unparsable { name: String, source: ParseError },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
}
