//! Caller-facing request bookkeeping and the slot-wide attach dispatcher.

mod dispatch;
mod registry;

pub use dispatch::{DispatchState, DispatchStateMachine};
pub use registry::{select_top_priority_slot, RequestInfo, RequestRegistry};
