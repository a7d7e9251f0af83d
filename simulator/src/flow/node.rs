//! Flow graph nodes and edges.
//!
//! Nodes and edges live in dense arenas owned by the graph; all
//! cross-references are plain indices, so multiplexer fan-in/fan-out
//! never creates ownership cycles.

use serde::{Deserialize, Serialize};

use flowsim_core::{Instant, EPSILON};

use crate::flow::trace::FragmentQueue;

/// Index of a node in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Index of an edge in the graph arena. Ids grow monotonically, so the
/// edge id order is the arrival order of connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EdgeId(pub(crate) usize);

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// How a multiplexer divides pooled capacity among its consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SharingDiscipline {
    /// Progressive filling: no consumer's share can grow without
    /// shrinking an equal-or-smaller one.
    #[default]
    MaxMinFair,
    /// Space sharing: one consumer owns the whole pool until it
    /// detaches; the rest wait in arrival order.
    Exclusive,
}

/// What drives a sink's demand.
#[derive(Debug)]
pub(crate) enum SinkInput {
    /// Externally pushed rate, held until the next push.
    Manual { rate: f64 },
    /// A queue of bounded-work fragments advanced by the engine.
    Trace(FragmentQueue),
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Source {
        base_capacity: f64,
        /// Capacity bound applied by the scaling driver; starts at the
        /// hardware ceiling.
        effective_capacity: f64,
    },
    Sink {
        input: SinkInput,
        /// Instant up to which fragment progress has been accounted.
        last_update: Instant,
    },
    Multiplexer {
        discipline: SharingDiscipline,
        /// The output edge currently owning the pool (exclusive only).
        active_output: Option<EdgeId>,
    },
}

pub(crate) struct FlowNode {
    pub name: String,
    pub kind: NodeKind,
    pub capacity: f64,
    pub demand: f64,
    pub allocated: f64,
    pub in_edges: Vec<EdgeId>,
    pub out_edges: Vec<EdgeId>,
}

impl FlowNode {
    pub fn new(name: &str, kind: NodeKind) -> Self {
        let capacity = match &kind {
            NodeKind::Source { base_capacity, .. } => *base_capacity,
            // a sink is only ever bounded by its own demand
            NodeKind::Sink { .. } => f64::INFINITY,
            NodeKind::Multiplexer { .. } => 0.0,
        };
        // a source is always willing to supply up to its capacity
        let demand = match &kind {
            NodeKind::Source { .. } => capacity,
            _ => 0.0,
        };
        Self {
            name: name.to_owned(),
            kind,
            capacity,
            demand,
            allocated: 0.0,
            in_edges: Vec::new(),
            out_edges: Vec::new(),
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self.kind, NodeKind::Source { .. })
    }

    pub fn is_sink(&self) -> bool {
        matches!(self.kind, NodeKind::Sink { .. })
    }

    pub fn is_multiplexer(&self) -> bool {
        matches!(self.kind, NodeKind::Multiplexer { .. })
    }

    pub fn view(&self) -> NodeView {
        NodeView {
            capacity: self.capacity,
            demand: self.demand,
            allocated: self.allocated,
        }
    }
}

/// Read-only snapshot of one node, the interface scheduling policies
/// and telemetry consume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeView {
    pub capacity: f64,
    pub demand: f64,
    pub allocated: f64,
}

impl NodeView {
    pub fn utilization(&self) -> f64 {
        if self.capacity <= EPSILON {
            0.0
        } else {
            self.allocated / self.capacity
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Edge {
    pub producer: NodeId,
    pub consumer: NodeId,
}
