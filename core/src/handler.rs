//! Event handler trait and the `cast!` dispatch macro.

use crate::event::Event;

/// A component that consumes events addressed to it.
///
/// Handlers are registered with
/// [`Simulation::add_handler`](crate::Simulation::add_handler) under the
/// same name as their [`SimulationContext`](crate::SimulationContext) and
/// are invoked synchronously by the drain loop, one event at a time.
pub trait EventHandler {
    fn on(&mut self, event: Event);
}

/// Dispatch an owned event payload by concrete type.
///
/// ```ignore
/// cast!(match event.data {
///     DemandChanged { node, rate } => {
///         self.on_demand_changed(node, rate);
///     }
///     WakeUp {} => {
///         self.on_wake_up();
///     }
/// });
/// ```
///
/// A payload matching none of the listed types is logged and dropped.
#[macro_export]
macro_rules! cast {
    ( match $event:ident.data { $( $type:ident { $($tt:tt)* } => { $($expr:tt)* } )+ } ) => {
        $(
            if $event.data.is::<$type>() {
                if let Ok(__value) = $event.data.downcast::<$type>() {
                    let $type { $($tt)* } = *__value;
                    $($expr)*
                }
            } else
        )*
        {
            $crate::log::log_unhandled_event(&$event);
        }
    };
}
