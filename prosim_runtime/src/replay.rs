//! Replay: rebuild a company from its decision log.
//!
//! Every week goes back through the engine with the seed it was first
//! played with, so a replay is exact. Recorded report hashes are checked
//! as the replay goes.

use serde::{Deserialize, Serialize};

use prosim_engine::hashing::{canonical_company_hash, canonical_report_hash};
use prosim_engine::{Company, Decisions, Simulation, SimulationConfig};

use crate::error::{RuntimeError, RuntimeResult};

/// One played week in a session's decision log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeekRecord {
    pub week: u32,
    pub decisions: Decisions,
    pub seed: u64,
    pub report_hash: String,
}

/// Continue `company` through `records`, checking each report hash.
pub fn replay_from(sim: &Simulation, mut company: Company, records: &[WeekRecord]) -> RuntimeResult<Company> {
    for record in records {
        let (report, next) = sim.process_week(company, &record.decisions, Some(record.seed))?;
        let hash = canonical_report_hash(&report)?;
        if hash != record.report_hash {
            return Err(RuntimeError::Drift(format!(
                "week {} replayed to {} but was recorded as {}",
                record.week, hash, record.report_hash
            )));
        }
        company = next;
    }
    Ok(company)
}

/// Rebuild the company for `company_id` from scratch.
///
/// Returns `(company, canonical_company_hash)`.
pub fn rebuild_company(
    config: &SimulationConfig,
    company_id: u32,
    records: &[WeekRecord],
) -> RuntimeResult<(Company, String)> {
    let sim = Simulation::new(config.clone())?;
    let company = replay_from(&sim, sim.create_company(company_id), records)?;
    let hash = canonical_company_hash(&company)?;
    log::debug!("rebuilt company {} through week {}: {}", company_id, company.current_week(), hash);
    Ok((company, hash))
}

/// Rebuild and return only the company hash.
pub fn rebuild_hash(config: &SimulationConfig, company_id: u32, records: &[WeekRecord]) -> RuntimeResult<String> {
    rebuild_company(config, company_id, records).map(|(_, hash)| hash)
}
