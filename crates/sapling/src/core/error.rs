use std::result::Result as StdResult;

use thiserror::Error;

use crate::core::{flags::Flags, id::NodeId};

/// Result type for sapling operations.
pub type Result<T> = StdResult<T, Error>;

/// Core error type.
///
/// Every variant except [`Error::Layout`] and [`Error::Config`] reports a
/// caller bug: these are never corrected silently.
#[derive(PartialEq, Eq, Error, Debug, Clone)]
pub enum Error {
    #[error("node {0:?} is disposed")]
    /// The node was disposed, or the id never named a live node.
    Disposed(NodeId),
    #[error("node {0:?} was already disposed")]
    /// A node was disposed twice.
    AlreadyDisposed(NodeId),
    #[error("node {0:?} is already active")]
    /// Activate was called on an active node.
    AlreadyActive(NodeId),
    #[error("node {0:?} is not active")]
    /// Deactivate was called on an inactive node.
    NotActive(NodeId),
    #[error("node {0:?} already has a parent; remove it first")]
    /// The child is attached to another container.
    AlreadyParented(NodeId),
    #[error("node {0:?} must be removed from its parent before disposing")]
    /// Dispose was called on a node that is still attached.
    StillAttached(NodeId),
    #[error("adding {child:?} to {parent:?} would create a cycle")]
    /// The child is the parent or one of its ancestors.
    WouldCreateCycle {
        /// The receiving container.
        parent: NodeId,
        /// The offending child.
        child: NodeId,
    },
    #[error("node {0:?} is not a container")]
    /// A child operation was attempted on a leaf node.
    NotAContainer(NodeId),
    #[error("child index {index} out of bounds for {len} children")]
    /// A child index was outside the valid range.
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Number of children.
        len: usize,
    },
    #[error("node {0:?}: size may not be NaN")]
    /// A size was set to, or measured as, NaN.
    NanSize(NodeId),
    #[error("invalid validation flag {0:#x}")]
    /// A validation flag was not a single bit, or was registered twice.
    InvalidFlag(Flags),
    #[error("cyclic validation dependency on flag {0:#x}")]
    /// Registering a validation node would create a cycle.
    CyclicDependency(Flags),
    #[error("validation of {0:#x} did not settle")]
    /// Validators kept invalidating each other past the step limit.
    ValidationOverflow(Flags),
    #[error("widget for node {0:?} is already borrowed")]
    /// A widget hook re-entered its own node in a way that needs the widget.
    ReentrantWidgetBorrow(NodeId),
    #[error("layout: {0}")]
    /// Layout failure.
    Layout(String),
    #[error("config: {0}")]
    /// Configuration could not be parsed.
    Config(String),
    #[error("invalid: {0}")]
    /// Invalid input error.
    Invalid(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}
