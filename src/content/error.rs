//! Parse errors

use thiserror::Error;

/// Errors raised while turning source text into a [`ContentRecord`](super::ContentRecord)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed metadata: {message}")]
    MalformedMetadata { message: String },

    #[error("Malformed code block annotation at line {line}: {message}")]
    MalformedCodeBlockAnnotation { line: usize, message: String },

    #[error("Unresolved component reference at line {line}: <{name}> has no known schema")]
    UnresolvedComponentReference { line: usize, name: String },

    #[error("Invalid props for <{name}> at line {line}: {message}")]
    InvalidComponentProps {
        line: usize,
        name: String,
        message: String,
    },
}

impl ParseError {
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::MalformedMetadata {
            message: message.into(),
        }
    }

    pub fn annotation(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedCodeBlockAnnotation {
            line,
            message: message.into(),
        }
    }

    pub fn props(line: usize, name: &str, message: impl Into<String>) -> Self {
        Self::InvalidComponentProps {
            line,
            name: name.to_string(),
            message: message.into(),
        }
    }
}
