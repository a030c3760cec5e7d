#![forbid(unsafe_code)]

//! PROSIM Runtime
//!
//! Game sessions, decision-log replay, in-memory snapshots and drift
//! detection on top of the weekly engine.
//!
//! No game rules live here. Every week is delegated to
//! `prosim_engine::Simulation`.

pub mod error;
pub mod replay;
pub mod snapshot;
pub mod session;
pub mod drift;

pub use error::{RuntimeError, RuntimeResult};
