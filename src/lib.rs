//! dcplane - transport selection and request-dispatch engine for a mobile
//! data control plane.
//!
//! A platform integrator supplies a [`radio::RadioFacade`] per transport and
//! a [`transport::QualifiedNetworksOracle`] for handover decisions, then
//! drives requests for packet data through an [`engine::Engine`]. Everything
//! in between - connection retry, slot-wide attach arbitration, request
//! ref-counting, and WWAN/WLAN handover - is this crate's job.

/// Shared reactive primitives used across modules.
pub mod common;

/// Core data types: identifiers, APN profiles, data call results, transports.
pub mod model;

/// Parsing and serializing the APN database line format.
pub mod apndb;

/// The platform-supplied radio facade boundary and its binding lifecycle.
pub mod radio;

/// Per-session network attachment bookkeeping handed to connectivity consumers.
pub mod agent;

/// The per-session data connection state machine and its controller.
pub mod connection;

/// Transport selection and WWAN/WLAN handover arbitration.
pub mod transport;

/// Outstanding-request tracking and the slot-wide attach dispatch state machine.
pub mod request;

/// The four-input data-enabled AND gate.
pub mod settings;

/// Reactive, file-backed engine configuration.
pub mod config;

/// Top-level wiring: one engine per process, one `SlotEngine` per SIM slot.
pub mod engine;

/// Tracing subscriber initialization.
pub mod telemetry;

/// `dctl`, the read-only inspection CLI.
pub mod cli;
