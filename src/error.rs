//! Error types for layout operations.

use thiserror::Error;

/// The main error type for force layout operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("link {link} joins nodes {from}->{to} but only {nodes} nodes exist")]
    LinkOutOfRange {
        link: usize,
        from: usize,
        to: usize,
        nodes: usize,
    },

    #[error("node index {index} out of range ({nodes} nodes)")]
    NodeOutOfRange { index: usize, nodes: usize },

    #[error("link index {index} out of range ({links} links)")]
    LinkIndexOutOfRange { index: usize, links: usize },

    #[error("unknown event type: {0}")]
    UnknownEvent(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("configuration could not be read: {0}")]
    Config(String),
}
