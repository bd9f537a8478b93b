//! Structural errors returned by the graph API.
//!
//! Geometric non-existence is not an error: it is `None` geometry.

use thiserror::Error;

use crate::graph::{ElementClass, NodeId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("unknown or removed node {0:?}")]
    UnknownNode(NodeId),
    #[error("{kind} expects {expected} parents, got {got}")]
    Arity {
        kind: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{kind}: parent {index} is a {found:?}, expected {expected}")]
    ParentType {
        kind: &'static str,
        index: usize,
        found: ElementClass,
        expected: &'static str,
    },
    #[error("branch {i}/{j} out of range: the pair has {count} branches")]
    BranchOutOfRange { i: usize, j: usize, count: usize },
    /// A dependency cycle passes through `at`.
    #[error("dependency cycle through {at:?}")]
    Cycle { at: NodeId },
    #[error("{0:?} is not a free element")]
    NotFree(NodeId),
    #[error("invalid parameter: {0}")]
    InvalidParam(String),
}
