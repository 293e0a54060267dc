//! Error types for the behavior toolkit.

use std::fmt;
use std::path::PathBuf;

use crate::registry::SubscriptionId;

/// Result type alias for behavior operations.
pub type Result<T> = std::result::Result<T, BehaviorError>;

/// Result type for tree construction.
pub type TreeResult<T> = std::result::Result<T, TreeError>;

/// The main error type for the behavior toolkit.
#[derive(Debug, thiserror::Error)]
pub enum BehaviorError {
    /// An observer failed while being notified. Remaining observers were skipped.
    #[error("Observer {subscription:?} failed: {source}")]
    Notify {
        /// The subscription whose observer failed.
        subscription: SubscriptionId,
        /// The failure reported by the observer.
        #[source]
        source: NotifyError,
    },

    /// A state machine was asked for a transition its table does not define.
    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),

    /// Tree construction error.
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BehaviorError {
    /// Returns true if this error came from an observer during fan-out.
    pub fn is_notify(&self) -> bool {
        matches!(self, Self::Notify { .. })
    }

    /// Returns true if this is an undefined-transition error.
    pub fn is_transition(&self) -> bool {
        matches!(self, Self::Transition(_))
    }
}

/// Failure reported by an observer from [`Observer::notify`](crate::Observer::notify).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct NotifyError {
    message: String,
}

impl NotifyError {
    /// Create a notification error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors from rule-table lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// No rule matches the (state, trigger) pair.
    #[error("No transition from '{state}' on trigger '{trigger}'")]
    Undefined {
        /// Diagnostic label of the current state.
        state: String,
        /// Diagnostic label of the rejected trigger.
        trigger: String,
    },
}

impl TransitionError {
    /// Create an undefined-transition error from the state and trigger labels.
    pub fn undefined(state: impl fmt::Debug, trigger: impl fmt::Debug) -> Self {
        Self::Undefined {
            state: format!("{state:?}"),
            trigger: format!("{trigger:?}"),
        }
    }
}

/// Errors raised while linking tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The node ID does not belong to this tree.
    #[error("Invalid node ID")]
    InvalidNode,
    /// The node already has a parent or is the tree's root.
    #[error("Node is already attached to the tree")]
    AlreadyAttached,
    /// The same node was given as both left and right child.
    #[error("A node cannot be both the left and the right child")]
    DuplicateChild,
    /// Only parentless nodes can become the root.
    #[error("Node has a parent and cannot be the root")]
    NotARoot,
}

/// Errors that occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The TOML document was malformed or did not match the expected shape.
    #[error("Failed to parse transition table: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("Failed to read '{}': {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an I/O error for a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
