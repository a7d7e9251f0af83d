//! Simulation component identifier.

/// Identifier of a simulation component, assigned by
/// [`Simulation::create_context`](crate::Simulation::create_context).
pub type Id = u32;
