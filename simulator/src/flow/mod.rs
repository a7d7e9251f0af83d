//! Flow graph: producers, consumers and multiplexers of continuous
//! resource rates, with event-driven recomputation.

mod discipline;
pub mod engine;
mod graph;
pub mod node;
pub mod trace;

pub use engine::{ComponentWakeUp, FlowEngine};
pub use node::{NodeId, NodeView, SharingDiscipline};
pub use trace::{FlowFragment, FragmentQueue};
