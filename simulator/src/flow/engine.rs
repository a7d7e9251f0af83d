//! The flow graph engine.
//!
//! Owns the node/edge arenas and keeps every connected component's
//! `allocated` rates consistent with its current demands and capacities.
//! Recomputation is event-driven: it runs when the topology or a demand
//! changes, and at the single pre-computed instant where a sink's
//! bounded work runs out. Between those instants nothing happens, so
//! simulation cost scales with the number of state changes, not with
//! simulated duration.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::Serialize;

use flowsim_core::time::NANOS_PER_SEC;
use flowsim_core::{
    cast, log_debug, Event, EventHandler, Id, Instant, Receipt, SimulationContext, EPSILON,
};

use crate::cpufreq::{ScalingContext, ScalingDriver};
use crate::error::FlowError;
use crate::flow::discipline::max_min_fair;
use crate::flow::graph::FlowGraph;
use crate::flow::node::{
    EdgeId, FlowNode, NodeId, NodeKind, NodeView, SharingDiscipline, SinkInput,
};
use crate::flow::trace::{FlowFragment, FragmentQueue};
use crate::monitoring::Monitoring;

/// Tolerance for the post-recompute invariant checks; wider than the
/// rate epsilon to absorb accumulated float error in large components.
const CHECK_EPSILON: f64 = 1e-6;

/// Self-addressed timer: the component keyed by `component` has reached
/// the instant where some sink's bounded work runs out.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentWakeUp {
    pub component: NodeId,
}

pub struct FlowEngine {
    ctx: SimulationContext,
    graph: FlowGraph,
    drivers: FxHashMap<NodeId, ScalingDriver>,
    /// Exactly one outstanding wake-up timer per component, keyed by the
    /// component representative.
    wakeups: FxHashMap<NodeId, Receipt>,
    monitoring: Option<Rc<RefCell<Monitoring>>>,
}

impl FlowEngine {
    pub fn new(ctx: SimulationContext) -> Self {
        Self {
            ctx,
            graph: FlowGraph::default(),
            drivers: FxHashMap::default(),
            wakeups: FxHashMap::default(),
            monitoring: None,
        }
    }

    pub fn with_monitoring(ctx: SimulationContext, monitoring: Rc<RefCell<Monitoring>>) -> Self {
        let mut engine = Self::new(ctx);
        engine.monitoring = Some(monitoring);
        engine
    }

    pub fn id(&self) -> Id {
        self.ctx.id()
    }

    pub fn add_source(&mut self, name: &str, capacity: f64) -> NodeId {
        self.graph.add_node(FlowNode::new(
            name,
            NodeKind::Source {
                base_capacity: capacity,
                effective_capacity: capacity,
            },
        ))
    }

    /// A source whose effective capacity is governed by a scaling driver.
    pub fn add_scaled_source(&mut self, name: &str, capacity: f64, driver: ScalingDriver) -> NodeId {
        let id = self.add_source(name, capacity);
        self.drivers.insert(id, driver);
        id
    }

    pub fn add_sink(&mut self, name: &str) -> NodeId {
        self.graph.add_node(FlowNode::new(
            name,
            NodeKind::Sink {
                input: SinkInput::Trace(FragmentQueue::default()),
                last_update: self.ctx.time(),
            },
        ))
    }

    pub fn add_multiplexer(&mut self, name: &str, discipline: SharingDiscipline) -> NodeId {
        self.graph.add_node(FlowNode::new(
            name,
            NodeKind::Multiplexer {
                discipline,
                active_output: None,
            },
        ))
    }

    pub fn node(&self, id: NodeId) -> Result<NodeView, FlowError> {
        Ok(self.graph.node(id)?.view())
    }

    pub fn utilization(&self, id: NodeId) -> Result<f64, FlowError> {
        Ok(self.node(id)?.utilization())
    }

    pub fn scaling_context(&self, id: NodeId) -> Option<ScalingContext> {
        self.drivers.get(&id).map(|d| d.context())
    }

    /// Whether the sink has neither queued fragments nor a manual rate.
    pub fn sink_exhausted(&self, id: NodeId) -> Result<bool, FlowError> {
        match &self.graph.node(id)?.kind {
            NodeKind::Sink { input, .. } => Ok(match input {
                SinkInput::Manual { rate } => *rate <= EPSILON,
                SinkInput::Trace(queue) => queue.is_exhausted(),
            }),
            _ => Err(FlowError::NotASink(id)),
        }
    }

    pub fn connect(&mut self, producer: NodeId, consumer: NodeId) -> Result<(), FlowError> {
        let rep_producer = self.graph.component_rep(producer)?;
        let rep_consumer = self.graph.component_rep(consumer)?;
        self.graph.connect(producer, consumer)?;
        log_debug!(self.ctx, "connect {} -> {}", producer, consumer);
        self.cancel_wakeup(rep_producer);
        self.cancel_wakeup(rep_consumer);
        self.recompute_component(producer)
    }

    pub fn disconnect(&mut self, producer: NodeId, consumer: NodeId) -> Result<(), FlowError> {
        let rep = self.graph.component_rep(producer)?;
        self.graph.disconnect(producer, consumer)?;
        log_debug!(self.ctx, "disconnect {} -> {}", producer, consumer);
        self.cancel_wakeup(rep);
        self.recompute_component(producer)?;
        // the split may have left the consumer in a component of its own
        if self.graph.component_rep(consumer)? != self.graph.component_rep(producer)? {
            self.recompute_component(consumer)?;
        }
        Ok(())
    }

    /// Set a sink's demand to a constant rate, replacing whatever drove
    /// it before. Progress of a replaced fragment trace is accounted up
    /// to the current instant first.
    pub fn push_demand(&mut self, sink: NodeId, rate: f64) -> Result<(), FlowError> {
        let now = self.ctx.time();
        let rate = rate.max(0.0);
        {
            let node = self.graph.node_mut(sink)?;
            if !node.is_sink() {
                return Err(FlowError::NotASink(sink));
            }
            Self::advance_sink(node, now);
            if let NodeKind::Sink { input, .. } = &mut node.kind {
                *input = SinkInput::Manual { rate };
            }
        }
        let rep = self.graph.component_rep(sink)?;
        self.cancel_wakeup(rep);
        self.recompute_component(sink)
    }

    /// Append workload fragments to a sink. A sink previously driven by
    /// a manual rate switches to trace mode.
    pub fn push_fragments(
        &mut self,
        sink: NodeId,
        fragments: Vec<FlowFragment>,
    ) -> Result<(), FlowError> {
        let now = self.ctx.time();
        {
            let node = self.graph.node_mut(sink)?;
            if !node.is_sink() {
                return Err(FlowError::NotASink(sink));
            }
            Self::advance_sink(node, now);
            if let NodeKind::Sink { input, .. } = &mut node.kind {
                if !matches!(input, SinkInput::Trace(_)) {
                    *input = SinkInput::Trace(FragmentQueue::default());
                }
                if let SinkInput::Trace(queue) = input {
                    for fragment in fragments {
                        queue.push(fragment);
                    }
                }
            }
        }
        let rep = self.graph.component_rep(sink)?;
        self.cancel_wakeup(rep);
        self.recompute_component(sink)
    }

    fn cancel_wakeup(&mut self, rep: NodeId) {
        if let Some(receipt) = self.wakeups.remove(&rep) {
            receipt.cancel();
        }
    }

    fn advance_sink(node: &mut FlowNode, now: Instant) {
        let allocated = node.allocated;
        if let NodeKind::Sink { input, last_update } = &mut node.kind {
            if let Some(elapsed) = now.duration_since(*last_update) {
                if elapsed > 0 {
                    if let SinkInput::Trace(queue) = input {
                        queue.advance(elapsed as f64 / NANOS_PER_SEC as f64, allocated);
                    }
                }
            }
            *last_update = now;
        }
    }

    /// Recompute the component containing `seed`: account elapsed sink
    /// progress, refresh demands and capacities, run each multiplexer's
    /// discipline, verify invariants and schedule the next wake-up.
    fn recompute_component(&mut self, seed: NodeId) -> Result<(), FlowError> {
        let now = self.ctx.time();
        let members = self.graph.component_of(seed)?;
        let rep = members[0];
        self.cancel_wakeup(rep);

        for &id in &members {
            let node = self.graph.node_mut(id)?;
            Self::advance_sink(node, now);
            let mut refreshed = None;
            match &node.kind {
                NodeKind::Sink { input, .. } => {
                    refreshed = Some(match input {
                        SinkInput::Manual { rate } => *rate,
                        SinkInput::Trace(queue) => queue.demand(),
                    });
                }
                NodeKind::Source {
                    effective_capacity, ..
                } => {
                    node.capacity = *effective_capacity;
                    refreshed = Some(*effective_capacity);
                }
                NodeKind::Multiplexer { .. } => {}
            }
            if let Some(demand) = refreshed {
                node.demand = demand;
                // a node left without a multiplexer keeps nothing; the
                // resolve pass below re-fills every attached node
                node.allocated = 0.0;
            }
        }

        for &id in &members {
            if self.graph.node(id)?.is_multiplexer() {
                self.resolve_multiplexer(id)?;
            }
        }

        self.check_invariants(&members)?;
        self.run_scaling_cycle(&members, now)?;
        self.schedule_wakeup(&members, rep, now)?;
        Ok(())
    }

    fn resolve_multiplexer(&mut self, mux_id: NodeId) -> Result<(), FlowError> {
        let (in_edges, out_edges, discipline, previous_active) = {
            let mux = self.graph.node(mux_id)?;
            match &mux.kind {
                NodeKind::Multiplexer {
                    discipline,
                    active_output,
                } => (
                    mux.in_edges.clone(),
                    mux.out_edges.clone(),
                    *discipline,
                    *active_output,
                ),
                _ => return Ok(()),
            }
        };

        let mut pool = 0.0;
        for &edge_id in &in_edges {
            if let Some(edge) = self.graph.edge(edge_id) {
                pool += self.graph.node(edge.producer)?.capacity;
            }
        }

        let mut consumers: Vec<(EdgeId, NodeId, f64)> = Vec::with_capacity(out_edges.len());
        for &edge_id in &out_edges {
            if let Some(edge) = self.graph.edge(edge_id) {
                let demand = self.graph.node(edge.consumer)?.demand;
                consumers.push((edge_id, edge.consumer, demand));
            }
        }
        let demands: Vec<f64> = consumers.iter().map(|&(_, _, d)| d).collect();

        let mut active = None;
        let allocations = match discipline {
            SharingDiscipline::MaxMinFair => max_min_fair(pool, &demands),
            SharingDiscipline::Exclusive => {
                // the current owner keeps the pool while attached and
                // demanding; otherwise the longest-queued demander takes over
                let owner = previous_active
                    .and_then(|e| consumers.iter().position(|&(id, _, d)| id == e && d > EPSILON))
                    .or_else(|| consumers.iter().position(|&(_, _, d)| d > EPSILON));
                active = owner.map(|i| consumers[i].0);
                let mut allocations = vec![0.0; consumers.len()];
                if let Some(i) = owner {
                    allocations[i] = demands[i].min(pool);
                }
                allocations
            }
        };

        let mut total_out = 0.0;
        for (&(_, consumer, _), &allocation) in consumers.iter().zip(allocations.iter()) {
            self.graph.node_mut(consumer)?.allocated = allocation;
            total_out += allocation;
        }

        // charge inputs in arrival order until the drawn rate is covered
        let mut remaining = total_out;
        for &edge_id in &in_edges {
            if let Some(edge) = self.graph.edge(edge_id) {
                let producer = self.graph.node_mut(edge.producer)?;
                let take = remaining.min(producer.capacity);
                producer.allocated = take;
                remaining -= take;
            }
        }

        let mux = self.graph.node_mut(mux_id)?;
        mux.capacity = pool;
        mux.demand = demands.iter().sum();
        mux.allocated = total_out;
        if let NodeKind::Multiplexer { active_output, .. } = &mut mux.kind {
            *active_output = active;
        }
        Ok(())
    }

    fn check_invariants(&self, members: &[NodeId]) -> Result<(), FlowError> {
        for &id in members {
            let node = self.graph.node(id)?;
            let bound = node.capacity.min(node.demand);
            if node.allocated < -CHECK_EPSILON || node.allocated > bound + CHECK_EPSILON {
                return Err(FlowError::GraphInconsistency(format!(
                    "node {} ({}): allocated {} outside [0, min(capacity {}, demand {})]",
                    id, node.name, node.allocated, node.capacity, node.demand,
                )));
            }
            if node.is_multiplexer() {
                let mut total_in = 0.0;
                for &edge_id in &node.in_edges {
                    if let Some(edge) = self.graph.edge(edge_id) {
                        total_in += self.graph.node(edge.producer)?.allocated;
                    }
                }
                let mut total_out = 0.0;
                for &edge_id in &node.out_edges {
                    if let Some(edge) = self.graph.edge(edge_id) {
                        total_out += self.graph.node(edge.consumer)?.allocated;
                    }
                }
                if total_out > total_in + CHECK_EPSILON || total_in > node.capacity + CHECK_EPSILON
                {
                    return Err(FlowError::GraphInconsistency(format!(
                        "multiplexer {} ({}): out {} / in {} / capacity {}",
                        id, node.name, total_out, total_in, node.capacity,
                    )));
                }
            }
        }
        Ok(())
    }

    fn run_scaling_cycle(&mut self, members: &[NodeId], now: Instant) -> Result<(), FlowError> {
        for &id in members {
            let (name, view, base) = {
                let node = self.graph.node(id)?;
                let base = match node.kind {
                    NodeKind::Source { base_capacity, .. } => Some(base_capacity),
                    _ => None,
                };
                (node.name.clone(), node.view(), base)
            };
            match base {
                Some(base_capacity) => {
                    let utilization = view.utilization();
                    let sample = match self.drivers.get_mut(&id) {
                        Some(driver) => {
                            let (target, sample) = driver.update(utilization, base_capacity);
                            if let NodeKind::Source {
                                effective_capacity, ..
                            } = &mut self.graph.node_mut(id)?.kind
                            {
                                *effective_capacity = target;
                            }
                            Some(sample)
                        }
                        None => None,
                    };
                    if let Some(monitoring) = &self.monitoring {
                        monitoring.borrow_mut().record(
                            now,
                            &name,
                            view.allocated,
                            utilization,
                            sample,
                        );
                    }
                }
                None => {
                    let node = self.graph.node(id)?;
                    if node.is_sink() {
                        // a sink's interesting ratio is how much of its
                        // demand is being served
                        let service = if view.demand > EPSILON {
                            view.allocated / view.demand
                        } else {
                            0.0
                        };
                        if let Some(monitoring) = &self.monitoring {
                            monitoring
                                .borrow_mut()
                                .record(now, &name, view.allocated, service, None);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn schedule_wakeup(
        &mut self,
        members: &[NodeId],
        rep: NodeId,
        now: Instant,
    ) -> Result<(), FlowError> {
        let mut next: Option<f64> = None;
        for &id in members {
            let node = self.graph.node(id)?;
            if let NodeKind::Sink {
                input: SinkInput::Trace(queue),
                ..
            } = &node.kind
            {
                if let Some(secs) = queue.next_boundary(node.allocated) {
                    next = Some(next.map_or(secs, |m: f64| m.min(secs)));
                }
            }
        }
        if let Some(secs) = next {
            let delay = ((secs * NANOS_PER_SEC as f64).ceil() as u64).max(1);
            let receipt = self
                .ctx
                .schedule_self(ComponentWakeUp { component: rep }, delay);
            self.wakeups.insert(rep, receipt);
            log_debug!(
                self.ctx,
                "component {} sleeps until {}",
                rep,
                now.advance(delay),
            );
        }
        Ok(())
    }
}

impl EventHandler for FlowEngine {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            ComponentWakeUp { component } => {
                self.wakeups.remove(&component);
                if let Err(error) = self.recompute_component(component) {
                    // an inconsistent graph would silently corrupt every
                    // result from here on
                    panic!("flow engine: {}", error);
                }
            }
        });
    }
}
