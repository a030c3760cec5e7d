/// Prosim Engine - Invariant Checks
///
/// Hard-fail validation run after every week. A failure is an engine
/// defect, returned as `SimError::Consistency` naming the check, and the
/// week that produced it is discarded.

use std::collections::BTreeSet;

use crate::arithmetic::{approx_eq, EPSILON};
use crate::config::{MAX_COMBINED_EFFICIENCY, MAX_TRAINING_LEVEL, QUALITY_TIERS};
use crate::domain::{Company, Pool};
use crate::error::{SimError, SimResult};
use crate::report::WeeklyReport;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Every check that relates a finished week to the company it started from.
pub fn check_week(prior: &Company, next: &Company, report: &WeeklyReport) -> SimResult<()> {
    check_conservation(next, report)?;
    try_validate_company(next)?;
    check_tiers_unchanged(prior, next)?;
    check_levels_never_regress(prior, next)?;
    check_cumulative_monotonic(prior, next)?;
    check_efficiency_bounds(report)?;
    Ok(())
}

/// Structural checks on a single company. Used after each week and when
/// restoring a snapshot.
pub fn try_validate_company(company: &Company) -> SimResult<()> {
    check_non_negative_pools(company)?;
    check_unique_operator_ids(company)?;
    check_operator_ranges(company)?;
    check_machine_staffing(company)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

fn check_conservation(next: &Company, report: &WeeklyReport) -> SimResult<()> {
    for pool in Pool::ALL {
        let flow = report.inventory.flow(pool).ok_or_else(|| {
            SimError::consistency("conservation", format!("{} missing from the ledger", pool.label()))
        })?;
        if !flow.balances() {
            return Err(SimError::consistency(
                "conservation",
                format!(
                    "{}: ending {:.6} but flows give {:.6}",
                    pool.label(),
                    flow.ending,
                    flow.expected_ending()
                ),
            ));
        }
        if !approx_eq(flow.ending, next.inventory.get(pool)) {
            return Err(SimError::consistency(
                "conservation",
                format!(
                    "{}: ledger ends at {:.6}, inventory holds {:.6}",
                    pool.label(),
                    flow.ending,
                    next.inventory.get(pool)
                ),
            ));
        }
    }
    Ok(())
}

fn check_non_negative_pools(company: &Company) -> SimResult<()> {
    for pool in Pool::ALL {
        let value = company.inventory.get(pool);
        if !value.is_finite() || value < -EPSILON {
            return Err(SimError::consistency(
                "non_negative_pool",
                format!("{} holds {}", pool.label(), value),
            ));
        }
    }
    Ok(())
}

fn check_unique_operator_ids(company: &Company) -> SimResult<()> {
    let mut seen = BTreeSet::new();
    for op in &company.workforce.operators {
        if !seen.insert(op.id) {
            return Err(SimError::consistency(
                "unique_operator_ids",
                format!("operator {} appears more than once", op.id),
            ));
        }
        if op.id >= company.workforce.next_operator_id {
            return Err(SimError::consistency(
                "unique_operator_ids",
                format!(
                    "operator {} is not below the next id {}",
                    op.id, company.workforce.next_operator_id
                ),
            ));
        }
    }
    Ok(())
}

fn check_operator_ranges(company: &Company) -> SimResult<()> {
    for op in &company.workforce.operators {
        if op.training_level > MAX_TRAINING_LEVEL || usize::from(op.quality_tier) >= QUALITY_TIERS {
            return Err(SimError::consistency(
                "operator_ranges",
                format!(
                    "operator {} has level {} tier {}",
                    op.id, op.training_level, op.quality_tier
                ),
            ));
        }
    }
    Ok(())
}

fn check_machine_staffing(company: &Company) -> SimResult<()> {
    let mut staffed = BTreeSet::new();
    for machine in &company.machines.machines {
        let Some(id) = machine.operator_id else { continue };
        if !company.workforce.contains(id) {
            return Err(SimError::consistency(
                "machine_staffing",
                format!("machine {} names missing operator {}", machine.id, id),
            ));
        }
        if !staffed.insert(id) {
            return Err(SimError::consistency(
                "machine_staffing",
                format!("operator {} staffs more than one machine", id),
            ));
        }
    }
    Ok(())
}

fn check_tiers_unchanged(prior: &Company, next: &Company) -> SimResult<()> {
    for op in &next.workforce.operators {
        if let Some(before) = prior.workforce.get(op.id) {
            if before.quality_tier != op.quality_tier || before.proficiency != op.proficiency {
                return Err(SimError::consistency(
                    "immutable_quality_tier",
                    format!("operator {} changed tier or proficiency", op.id),
                ));
            }
        }
    }
    Ok(())
}

fn check_levels_never_regress(prior: &Company, next: &Company) -> SimResult<()> {
    for op in &next.workforce.operators {
        if let Some(before) = prior.workforce.get(op.id) {
            if op.training_level < before.training_level {
                return Err(SimError::consistency(
                    "training_level_regressed",
                    format!(
                        "operator {} fell from level {} to {}",
                        op.id, before.training_level, op.training_level
                    ),
                ));
            }
        }
    }
    Ok(())
}

fn check_cumulative_monotonic(prior: &Company, next: &Company) -> SimResult<()> {
    let before = prior.cumulative_costs.flatten();
    let after = next.cumulative_costs.flatten();
    for ((name, old), (_, new)) in before.iter().zip(after.iter()) {
        if *new < *old - EPSILON {
            return Err(SimError::consistency(
                "cumulative_monotonic",
                format!("{} dropped from {:.2} to {:.2}", name, old, new),
            ));
        }
    }
    if next.total_costs < prior.total_costs - EPSILON {
        return Err(SimError::consistency(
            "cumulative_monotonic",
            "total costs decreased".to_string(),
        ));
    }
    Ok(())
}

fn check_efficiency_bounds(report: &WeeklyReport) -> SimResult<()> {
    let rows = report
        .production
        .parts
        .machines
        .iter()
        .chain(report.production.assembly.machines.iter());
    for row in rows {
        if !(0.0..=MAX_COMBINED_EFFICIENCY + EPSILON).contains(&row.efficiency) {
            return Err(SimError::consistency(
                "efficiency_bounds",
                format!("machine {} ran at efficiency {}", row.machine_id, row.efficiency),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::state::create_company;

    fn company() -> Company {
        create_company(&SimulationConfig::default(), 1)
    }

    #[test]
    fn test_fresh_company_is_valid() {
        assert!(try_validate_company(&company()).is_ok());
    }

    #[test]
    fn test_negative_pool_detected() {
        let mut c = company();
        c.inventory.parts.y = -3.0;
        let err = try_validate_company(&c).unwrap_err();
        assert!(matches!(err, SimError::Consistency { check: "non_negative_pool", .. }));
    }

    #[test]
    fn test_duplicate_operator_detected() {
        let mut c = company();
        let dup = c.workforce.operators[0].clone();
        c.workforce.operators.push(dup);
        let err = try_validate_company(&c).unwrap_err();
        assert!(matches!(err, SimError::Consistency { check: "unique_operator_ids", .. }));
    }

    #[test]
    fn test_dangling_machine_operator_detected() {
        let mut c = company();
        c.workforce.operators.retain(|op| op.id != 4);
        let err = try_validate_company(&c).unwrap_err();
        assert!(matches!(err, SimError::Consistency { check: "machine_staffing", .. }));
    }

    #[test]
    fn test_tier_change_detected() {
        let prior = company();
        let mut next = prior.clone();
        next.workforce.operators[2].quality_tier = 0;
        let err = check_tiers_unchanged(&prior, &next).unwrap_err();
        assert!(matches!(err, SimError::Consistency { check: "immutable_quality_tier", .. }));
    }

    #[test]
    fn test_cumulative_decrease_detected() {
        let mut prior = company();
        prior.cumulative_costs.x.labor = 100.0;
        let next = company();
        let err = check_cumulative_monotonic(&prior, &next).unwrap_err();
        assert!(matches!(err, SimError::Consistency { check: "cumulative_monotonic", .. }));
    }
}
