//! The boundary to the modem's packet-data HAL: a narrow capability trait
//! (two concrete implementations exist outside this crate — a vendor HAL
//! binding and a test simulator) plus the per-transport binding that keeps
//! it bound, re-binds on restart, and correlates calls with their
//! completions.

mod binding;
mod facade;

pub use binding::DataServiceBinding;
pub use facade::{RadioError, RadioFacade, RadioResultCode};
