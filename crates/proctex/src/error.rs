//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid configuration, rejected graph edits, cyclic graphs under strict scheduling,
//! image decoding, IO, and generic errors. The evaluation path itself never fails; these
//! errors only surface from editing, configuration, and decoder seams.
use thiserror::Error;

use crate::texgraph::NodeId;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid link: {0}")]
    InvalidLink(String),

    #[error("unknown node {id}")]
    UnknownNode { id: NodeId },

    #[error("graph contains a cycle through nodes {nodes:?}")]
    Cycle { nodes: Vec<NodeId> },

    #[error("failed to decode image '{path}': {message}")]
    Decode { path: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn cycle_message_lists_nodes() {
        let err = Error::Cycle { nodes: vec![3, 4] };
        assert_eq!(err.to_string(), "graph contains a cycle through nodes [3, 4]");
    }

    #[test]
    fn decode_message_names_path() {
        let err = Error::Decode {
            path: "rock.png".into(),
            message: "truncated".into(),
        };
        assert!(err.to_string().contains("rock.png"));
    }
}
