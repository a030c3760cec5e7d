/// Prosim Engine - Workforce
///
/// Operator efficiency, training, hiring, termination and the
/// unscheduled-week bookkeeping that drives layoff charges.
///
/// Week-start order: assign machines, complete last week's training,
/// terminate idle operators, hire for unstaffed machines, send the
/// flagged operators to training, count unscheduled operators.
/// Level progression runs at the end of the week.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::config::{WorkforceConfig, MAX_COMBINED_EFFICIENCY, MAX_TRAINING_LEVEL};
use crate::decisions::Decisions;
use crate::domain::{Company, Machine, MachineFloor, Operator, TrainingStatus};
use crate::error::{SimError, SimResult};
use crate::report::WorkforceSummary;

// ---------------------------------------------------------------------------
// Efficiency
// ---------------------------------------------------------------------------

/// Combined efficiency of `operator`: zero while training, otherwise the
/// time-efficiency entry for (level, tier) scaled by proficiency.
pub fn operator_efficiency(operator: &Operator, train_flag: bool, config: &WorkforceConfig) -> f64 {
    if train_flag || operator.is_in_training() {
        return 0.0;
    }
    let level = usize::from(operator.training_level.min(MAX_TRAINING_LEVEL));
    let tier = usize::from(operator.quality_tier).min(config.time_efficiency[level].len() - 1);
    f64::from(config.time_efficiency[level][tier]) / 100.0 * operator.proficiency
}

/// Efficiency for the operator staffing `machine` this week. Jitter is
/// drawn only when configured, so a zero jitter consumes no randomness.
pub fn machine_efficiency<R: Rng>(
    company: &Company,
    machine: &Machine,
    config: &WorkforceConfig,
    rng: &mut R,
) -> f64 {
    let Some(operator) = machine.operator_id.and_then(|id| company.workforce.get(id)) else {
        return 0.0;
    };
    let base = operator_efficiency(operator, machine.operator_in_training, config);
    if base == 0.0 || config.efficiency_jitter <= 0.0 {
        return base;
    }
    let noise = rng.gen_range(-config.efficiency_jitter..=config.efficiency_jitter);
    (base + noise).clamp(0.0, MAX_COMBINED_EFFICIENCY)
}

// ---------------------------------------------------------------------------
// Week start
// ---------------------------------------------------------------------------

/// Copy this week's machine instructions onto the floor.
pub fn assign_machines(floor: &mut MachineFloor, decisions: &Decisions) {
    for machine in &mut floor.machines {
        match decisions.machine(machine.id) {
            Some(md) => {
                machine.assignment = md.line();
                machine.operator_in_training = md.send_for_training;
                machine.scheduled_hours = if md.send_for_training {
                    0.0
                } else {
                    md.scheduled_hours
                };
            }
            None => {
                machine.assignment = None;
                machine.operator_in_training = false;
                machine.scheduled_hours = 0.0;
            }
        }
    }
}

/// Operators who trained last week come back one level up.
pub fn complete_training(company: &mut Company) -> Vec<u32> {
    let mut completed = Vec::new();
    for op in &mut company.workforce.operators {
        if op.is_in_training() {
            op.status = TrainingStatus::Trained;
            op.training_level = (op.training_level + 1).min(MAX_TRAINING_LEVEL);
            op.weeks_at_level = 0;
            completed.push(op.id);
        }
    }
    completed
}

/// Remove operators left unscheduled for `termination_threshold`
/// consecutive weeks and free their machines.
pub fn terminate_idle(company: &mut Company, config: &WorkforceConfig) -> Vec<u32> {
    let terminated: Vec<u32> = company
        .workforce
        .operators
        .iter()
        .filter(|op| op.weeks_unscheduled >= config.termination_threshold)
        .map(|op| op.id)
        .collect();

    if terminated.is_empty() {
        return terminated;
    }
    company
        .workforce
        .operators
        .retain(|op| !terminated.contains(&op.id));
    for machine in &mut company.machines.machines {
        if machine.operator_id.is_some_and(|id| terminated.contains(&id)) {
            machine.operator_id = None;
        }
    }
    log::debug!("terminated operators {:?}", terminated);
    terminated
}

/// Hire a new operator for every machine that needs one this week.
pub fn hire_for_open_machines<R: Rng>(
    company: &mut Company,
    decisions: &Decisions,
    config: &WorkforceConfig,
    rng: &mut R,
) -> SimResult<Vec<u32>> {
    let open: Vec<u32> = company
        .machines
        .machines
        .iter()
        .filter(|m| m.operator_id.is_none())
        .filter(|m| decisions.machine(m.id).is_some_and(|md| md.needs_operator()))
        .map(|m| m.id)
        .collect();
    if open.is_empty() {
        return Ok(Vec::new());
    }

    let tiers = WeightedIndex::new(config.hire_tier_weights.iter().copied())
        .map_err(|e| SimError::configuration(format!("hire_tier_weights: {}", e)))?;

    let mut hired = Vec::with_capacity(open.len());
    for machine_id in open {
        let id = company.workforce.next_operator_id;
        company.workforce.next_operator_id += 1;

        let tier = tiers.sample(rng);
        let operator = Operator::new_hire(id, tier as u8, config.tier_proficiency[tier]);
        log::debug!(
            "hired operator {} (tier {}) for machine {}",
            id,
            operator.quality_tier,
            machine_id
        );
        company.workforce.operators.push(operator);
        if let Some(machine) = company.machines.get_mut(machine_id) {
            machine.operator_id = Some(id);
        }
        hired.push(id);
    }
    Ok(hired)
}

/// Mark training and unscheduled operators for the week.
/// Returns `(sent_to_training, unscheduled)`.
pub fn record_schedules(company: &mut Company) -> (Vec<u32>, Vec<u32>) {
    let mut training = Vec::new();
    let mut unscheduled = Vec::new();

    for op in &mut company.workforce.operators {
        match company.machines.machine_of_operator(op.id) {
            Some(m) if m.operator_in_training => {
                op.status = TrainingStatus::InTraining;
                op.weeks_unscheduled = 0;
                training.push(op.id);
            }
            Some(m) if m.scheduled_hours > 0.0 => {
                op.weeks_unscheduled = 0;
            }
            _ => {
                op.weeks_unscheduled += 1;
                unscheduled.push(op.id);
            }
        }
    }
    (training, unscheduled)
}

/// The whole week-start workforce stage. Machine assignments must
/// already reflect `decisions`.
pub fn process_workforce<R: Rng>(
    company: &mut Company,
    decisions: &Decisions,
    config: &WorkforceConfig,
    rng: &mut R,
) -> SimResult<WorkforceSummary> {
    let completed_training = complete_training(company);
    let terminated = terminate_idle(company, config);
    let hired = hire_for_open_machines(company, decisions, config, rng)?;
    let (sent_to_training, unscheduled) = record_schedules(company);

    Ok(WorkforceSummary {
        headcount: company.workforce.len(),
        hired,
        terminated,
        sent_to_training,
        completed_training,
        unscheduled,
        level_ups: Vec::new(),
    })
}

// ---------------------------------------------------------------------------
// Week end
// ---------------------------------------------------------------------------

/// Credit a week of work to every operator who ran a machine and level
/// up those who have done `weeks_per_level` weeks at their level.
/// Levels never go down.
pub fn advance_levels(company: &mut Company, config: &WorkforceConfig) -> Vec<u32> {
    let worked: Vec<u32> = company
        .machines
        .machines
        .iter()
        .filter(|m| m.scheduled_hours > 0.0 && !m.operator_in_training)
        .filter_map(|m| m.operator_id)
        .collect();

    let mut level_ups = Vec::new();
    for op in &mut company.workforce.operators {
        if !worked.contains(&op.id) {
            continue;
        }
        op.weeks_at_level += 1;
        if op.weeks_at_level < config.weeks_per_level {
            continue;
        }
        op.weeks_at_level = 0;
        let cap = match op.status {
            TrainingStatus::Trained => MAX_TRAINING_LEVEL,
            _ => config.untrained_level_cap.min(MAX_TRAINING_LEVEL),
        };
        if op.training_level < cap {
            op.training_level += 1;
            level_ups.push(op.id);
        }
    }
    level_ups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::domain::ProductLine;
    use crate::state::create_company;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (SimulationConfig, Company) {
        let config = SimulationConfig::default();
        let company = create_company(&config, 1);
        (config, company)
    }

    #[test]
    fn test_efficiency_from_table_and_proficiency() {
        let (config, company) = setup();
        let op = company.workforce.get(3).unwrap();
        let expected = f64::from(config.workforce.time_efficiency[8][9]) / 100.0 * 1.122;
        let eff = operator_efficiency(op, false, &config.workforce);
        assert!((eff - expected).abs() < 1e-12);
        assert_eq!(operator_efficiency(op, true, &config.workforce), 0.0);
    }

    #[test]
    fn test_efficiency_bounded_over_table() {
        let config = SimulationConfig::default();
        for level in 0..=MAX_TRAINING_LEVEL {
            for tier in 0..10u8 {
                let mut op = Operator::new_hire(1, tier, config.workforce.tier_proficiency[tier as usize]);
                op.training_level = level;
                let eff = operator_efficiency(&op, false, &config.workforce);
                assert!((0.0..=MAX_COMBINED_EFFICIENCY).contains(&eff), "{} {}", level, tier);
            }
        }
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let (mut config, mut company) = setup();
        config.workforce.efficiency_jitter = 0.5;
        company.machines.get_mut(3).unwrap().scheduled_hours = 40.0;
        let machine = company.machines.get(3).unwrap().clone();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let eff = machine_efficiency(&company, &machine, &config.workforce, &mut rng);
            assert!((0.0..=MAX_COMBINED_EFFICIENCY).contains(&eff));
        }
    }

    #[test]
    fn test_idle_operator_terminated_after_threshold() {
        let (config, mut company) = setup();
        let idle = Decisions::idle(1, 1, 9);
        for _ in 0..2 {
            assign_machines(&mut company.machines, &idle);
            let (_, unscheduled) = record_schedules(&mut company);
            assert_eq!(unscheduled.len(), 9);
        }
        let terminated = terminate_idle(&mut company, &config.workforce);
        assert_eq!(terminated.len(), 9);
        assert!(company.workforce.is_empty());
        assert!(company.machines.machines.iter().all(|m| m.operator_id.is_none()));
    }

    #[test]
    fn test_scheduling_resets_counter() {
        let (_, mut company) = setup();
        assign_machines(&mut company.machines, &Decisions::idle(1, 1, 9));
        record_schedules(&mut company);
        let d = Decisions::idle(2, 1, 9).schedule(1, ProductLine::X, 40.0).train(2);
        assign_machines(&mut company.machines, &d);
        let (training, unscheduled) = record_schedules(&mut company);
        assert_eq!(training, vec![2]);
        assert!(!unscheduled.contains(&1));
        assert_eq!(company.workforce.get(1).unwrap().weeks_unscheduled, 0);
        assert_eq!(company.workforce.get(2).unwrap().weeks_unscheduled, 0);
        assert_eq!(company.workforce.get(4).unwrap().weeks_unscheduled, 2);
    }

    #[test]
    fn test_hire_fills_open_machine() {
        let (config, mut company) = setup();
        company.workforce.operators.retain(|op| op.id != 9);
        company.machines.get_mut(9).unwrap().operator_id = None;

        let d = Decisions::idle(1, 1, 9).schedule(9, ProductLine::Z, 40.0);
        let mut rng = StdRng::seed_from_u64(1);
        let hired = hire_for_open_machines(&mut company, &d, &config.workforce, &mut rng).unwrap();
        assert_eq!(hired, vec![10]);
        let op = company.workforce.get(10).unwrap();
        assert_eq!(op.training_level, 0);
        assert_eq!(op.status, TrainingStatus::Untrained);
        assert_eq!(op.proficiency, config.workforce.tier_proficiency[op.quality_tier as usize]);
        assert_eq!(company.machines.get(9).unwrap().operator_id, Some(10));
        assert_eq!(company.workforce.next_operator_id, 11);
    }

    #[test]
    fn test_training_completes_next_week() {
        let (config, mut company) = setup();
        let mut rng = StdRng::seed_from_u64(3);
        let d = Decisions::idle(1, 1, 9).train(4);
        assign_machines(&mut company.machines, &d);
        let summary = process_workforce(&mut company, &d, &config.workforce, &mut rng).unwrap();
        assert_eq!(summary.sent_to_training, vec![4]);
        assert!(company.workforce.get(4).unwrap().is_in_training());

        let completed = complete_training(&mut company);
        assert_eq!(completed, vec![4]);
        let op = company.workforce.get(4).unwrap();
        assert!(op.is_trained());
        assert_eq!(op.training_level, 9);
    }

    #[test]
    fn test_level_progression_respects_caps() {
        let (config, mut company) = setup();
        let d = Decisions::idle(1, 1, 9).schedule(1, ProductLine::X, 40.0);
        assign_machines(&mut company.machines, &d);
        assert_eq!(advance_levels(&mut company, &config.workforce), vec![1]);
        assert_eq!(advance_levels(&mut company, &config.workforce), vec![1]);
        assert!(advance_levels(&mut company, &config.workforce).is_empty());
        assert_eq!(company.workforce.get(1).unwrap().training_level, 10);

        let op = company.workforce.get_mut(1).unwrap();
        op.status = TrainingStatus::Untrained;
        op.training_level = 4;
        assert!(advance_levels(&mut company, &config.workforce).is_empty());
        assert_eq!(company.workforce.get(1).unwrap().training_level, 4);
    }
}
