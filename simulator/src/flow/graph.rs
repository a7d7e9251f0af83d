//! Arena-owned topology: nodes, edges, connected components.

use crate::error::FlowError;
use crate::flow::node::{Edge, EdgeId, FlowNode, NodeId};

#[derive(Default)]
pub(crate) struct FlowGraph {
    nodes: Vec<FlowNode>,
    /// Tombstoned on disconnect so edge ids stay stable.
    edges: Vec<Option<Edge>>,
}

impl FlowGraph {
    pub fn add_node(&mut self, node: FlowNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> Result<&FlowNode, FlowError> {
        self.nodes.get(id.0).ok_or(FlowError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut FlowNode, FlowError> {
        self.nodes.get_mut(id.0).ok_or(FlowError::UnknownNode(id))
    }

    pub fn edge(&self, id: EdgeId) -> Option<Edge> {
        self.edges.get(id.0).copied().flatten()
    }

    pub fn connect(&mut self, producer: NodeId, consumer: NodeId) -> Result<EdgeId, FlowError> {
        let invalid = |reason: &str| FlowError::InvalidEdge {
            producer,
            consumer,
            reason: reason.to_owned(),
        };

        {
            let from = self.node(producer)?;
            let to = self.node(consumer)?;
            let source_to_mux = from.is_source() && to.is_multiplexer();
            let mux_to_sink = from.is_multiplexer() && to.is_sink();
            if !source_to_mux && !mux_to_sink {
                return Err(invalid(
                    "edges must run source -> multiplexer or multiplexer -> sink",
                ));
            }
            if from.is_source() && !from.out_edges.is_empty() {
                return Err(invalid("source already feeds a multiplexer"));
            }
            if to.is_sink() && !to.in_edges.is_empty() {
                return Err(invalid("sink already fed by a multiplexer"));
            }
        }
        if self.find_edge(producer, consumer).is_some() {
            return Err(invalid("edge already exists"));
        }

        let id = EdgeId(self.edges.len());
        self.edges.push(Some(Edge { producer, consumer }));
        self.nodes[producer.0].out_edges.push(id);
        self.nodes[consumer.0].in_edges.push(id);
        Ok(id)
    }

    pub fn disconnect(&mut self, producer: NodeId, consumer: NodeId) -> Result<EdgeId, FlowError> {
        self.node(producer)?;
        self.node(consumer)?;
        let id = self
            .find_edge(producer, consumer)
            .ok_or(FlowError::NoSuchEdge { producer, consumer })?;
        self.edges[id.0] = None;
        self.nodes[producer.0].out_edges.retain(|&e| e != id);
        self.nodes[consumer.0].in_edges.retain(|&e| e != id);
        Ok(id)
    }

    fn find_edge(&self, producer: NodeId, consumer: NodeId) -> Option<EdgeId> {
        self.nodes[producer.0]
            .out_edges
            .iter()
            .copied()
            .find(|&e| matches!(self.edge(e), Some(edge) if edge.consumer == consumer))
    }

    /// All nodes reachable from `seed` over live edges in either
    /// direction, sorted by id for deterministic iteration.
    pub fn component_of(&self, seed: NodeId) -> Result<Vec<NodeId>, FlowError> {
        self.node(seed)?;
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![seed];
        let mut members = Vec::new();
        visited[seed.0] = true;
        while let Some(id) = stack.pop() {
            members.push(id);
            let node = &self.nodes[id.0];
            for &edge_id in node.in_edges.iter().chain(node.out_edges.iter()) {
                if let Some(edge) = self.edge(edge_id) {
                    for next in [edge.producer, edge.consumer] {
                        if !visited[next.0] {
                            visited[next.0] = true;
                            stack.push(next);
                        }
                    }
                }
            }
        }
        members.sort();
        Ok(members)
    }

    /// Stable key of the component containing `id`: its smallest member.
    pub fn component_rep(&self, id: NodeId) -> Result<NodeId, FlowError> {
        let members = self.component_of(id)?;
        Ok(members[0])
    }
}
