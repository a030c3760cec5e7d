//! Drift detection: determinism verification and company comparison.

use std::collections::BTreeSet;

use prosim_engine::domain::Pool;
use prosim_engine::{Company, SimulationConfig};

use crate::error::{RuntimeError, RuntimeResult};
use crate::replay::{self, WeekRecord};

/// Replay the same log twice and require identical hashes.
///
/// Returns the agreed hash.
pub fn verify_determinism(config: &SimulationConfig, company_id: u32, records: &[WeekRecord]) -> RuntimeResult<String> {
    let hash1 = replay::rebuild_hash(config, company_id, records)?;
    let hash2 = replay::rebuild_hash(config, company_id, records)?;

    if hash1 != hash2 {
        return Err(RuntimeError::Drift(format!(
            "DETERMINISM FAILURE: two replays produced different hashes.\n\
             Run 1: {}\n\
             Run 2: {}",
            hash1, hash2
        )));
    }
    Ok(hash1)
}

/// Structured comparison of two companies.
pub fn compare_companies(a: &Company, b: &Company) -> DriftReport {
    let ids_a: BTreeSet<u32> = a.workforce().ids().into_iter().collect();
    let ids_b: BTreeSet<u32> = b.workforce().ids().into_iter().collect();

    let hired: Vec<u32> = ids_b.difference(&ids_a).copied().collect();
    let departed: Vec<u32> = ids_a.difference(&ids_b).copied().collect();

    // Level changes for operators present in both
    let mut level_changes = Vec::new();
    for id in ids_a.intersection(&ids_b) {
        if let (Some(before), Some(after)) = (a.workforce().get(*id), b.workforce().get(*id)) {
            if before.training_level != after.training_level {
                level_changes.push(LevelChange {
                    operator_id: *id,
                    from: before.training_level,
                    to: after.training_level,
                });
            }
        }
    }

    let inventory = Pool::ALL
        .iter()
        .map(|&pool| {
            let (qa, qb) = (a.inventory().get(pool), b.inventory().get(pool));
            PoolDelta {
                pool: pool.label().to_string(),
                a: qa,
                b: qb,
                delta: qb - qa,
            }
        })
        .collect();

    let headcount_a = a.workforce().len() as i64;
    let headcount_b = b.workforce().len() as i64;

    DriftReport {
        week_a: a.current_week(),
        week_b: b.current_week(),
        week_delta: i64::from(b.current_week()) - i64::from(a.current_week()),
        headcount_a,
        headcount_b,
        headcount_delta: headcount_b - headcount_a,
        total_costs_a: a.total_costs,
        total_costs_b: b.total_costs,
        total_costs_delta: b.total_costs - a.total_costs,
        inventory,
        hired_operators: hired,
        departed_operators: departed,
        level_changes,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolDelta {
    pub pool: String,
    pub a: f64,
    pub b: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelChange {
    pub operator_id: u32,
    pub from: u8,
    pub to: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriftReport {
    pub week_a: u32,
    pub week_b: u32,
    pub week_delta: i64,
    pub headcount_a: i64,
    pub headcount_b: i64,
    pub headcount_delta: i64,
    pub total_costs_a: f64,
    pub total_costs_b: f64,
    pub total_costs_delta: f64,
    pub inventory: Vec<PoolDelta>,
    pub hired_operators: Vec<u32>,
    pub departed_operators: Vec<u32>,
    pub level_changes: Vec<LevelChange>,
}

impl DriftReport {
    /// True when nothing compared differs.
    pub fn is_empty(&self) -> bool {
        self.week_delta == 0
            && self.headcount_delta == 0
            && self.total_costs_delta == 0.0
            && self.inventory.iter().all(|p| p.delta == 0.0)
            && self.hired_operators.is_empty()
            && self.departed_operators.is_empty()
            && self.level_changes.is_empty()
    }
}
