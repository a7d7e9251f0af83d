use thiserror::Error;

use flowsim_core::InvalidDeadlineError;

use crate::flow::node::NodeId;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("invalid edge {producer} -> {consumer}: {reason}")]
    InvalidEdge {
        producer: NodeId,
        consumer: NodeId,
        reason: String,
    },

    #[error("edge {producer} -> {consumer} does not exist")]
    NoSuchEdge { producer: NodeId, consumer: NodeId },

    #[error("node {0} is not a sink")]
    NotASink(NodeId),

    /// An internal invariant (capacity bound, demand bound or
    /// multiplexer conservation) failed after a recomputation. Never
    /// auto-corrected: results past this point would be untrustworthy.
    #[error("flow graph inconsistency: {0}")]
    GraphInconsistency(String),

    #[error(transparent)]
    InvalidDeadline(#[from] InvalidDeadlineError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}
