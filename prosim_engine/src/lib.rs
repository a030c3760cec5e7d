#![forbid(unsafe_code)]

//! Weekly simulation engine for the PROSIM production-management game.

/// Bumped whenever a rule change alters report hashes for the same inputs.
pub const ENGINE_VERSION: u32 = 1;

pub mod arithmetic;
pub mod error;
pub mod config;
pub mod domain;
pub mod decisions;
pub mod report;
pub mod state;
pub mod validation;
pub mod workforce;
pub mod production;
pub mod inventory;
pub mod demand;
pub mod repairs;
pub mod costs;
pub mod invariants;
pub mod hashing;
pub mod engine;

pub use config::SimulationConfig;
pub use decisions::{Decisions, MachineDecision};
pub use domain::Company;
pub use engine::Simulation;
pub use error::{SimError, SimResult};
pub use report::WeeklyReport;
