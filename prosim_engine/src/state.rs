/// Prosim Engine - Company Construction
///
/// Builds the week-0 company from configuration: opening inventory,
/// the fixed starting roster, and the machine floor with operator `i`
/// staffing machine `i`.

use crate::config::SimulationConfig;
use crate::domain::{
    Company, DemandSchedule, Department, Inventory, Machine, MachineFloor, Operator,
    OrderBook, PerformanceTotals, TrainingStatus, Workforce,
};
use crate::report::CostReport;

/// Create a fresh company for `company_id`. The demand schedule is left
/// empty; the first processed week opens it with that week's random source.
pub fn create_company(config: &SimulationConfig, company_id: u32) -> Company {
    let w = &config.workforce;

    let operators: Vec<Operator> = w
        .starting_roster
        .iter()
        .map(|entry| Operator {
            id: entry.id,
            status: if w.starting_trained {
                TrainingStatus::Trained
            } else {
                TrainingStatus::Untrained
            },
            training_level: w.starting_training_level,
            quality_tier: entry.quality_tier,
            proficiency: entry.proficiency,
            weeks_unscheduled: 0,
            weeks_at_level: 0,
        })
        .collect();
    let next_operator_id = operators.iter().map(|op| op.id).max().unwrap_or(0) + 1;

    let machine_count = config.game.machine_count();
    let machines = (1..=machine_count)
        .map(|id| Machine {
            id,
            department: if id <= config.game.parts_machines {
                Department::Parts
            } else {
                Department::Assembly
            },
            operator_id: operators.iter().any(|op| op.id == id).then_some(id),
            assignment: None,
            scheduled_hours: 0.0,
            operator_in_training: false,
            last_part_type: None,
        })
        .collect();

    Company {
        company_id,
        current_week: 0,
        inventory: Inventory {
            raw_materials: config.initial.raw_materials,
            parts: config.initial.parts,
            products: config.initial.products,
        },
        workforce: Workforce {
            operators,
            next_operator_id,
        },
        machines: MachineFloor { machines },
        orders: OrderBook::default(),
        demand: DemandSchedule::default(),
        cumulative_costs: CostReport::default(),
        total_costs: 0.0,
        performance: PerformanceTotals::default(),
        last_report: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_company_layout() {
        let config = SimulationConfig::default();
        let company = create_company(&config, 3);

        assert_eq!(company.company_id, 3);
        assert_eq!(company.current_week(), 0);
        assert_eq!(company.machines.machines.len(), 9);
        assert_eq!(company.machines.in_department(Department::Parts).count(), 4);
        assert_eq!(company.machines.in_department(Department::Assembly).count(), 5);
        assert_eq!(company.workforce.len(), 9);
        assert_eq!(company.workforce.next_operator_id, 10);
        assert_eq!(company.inventory.raw_materials, 4000.0);
        assert!(company.latest_report().is_none());
        assert!(!company.demand.is_initialized());
    }

    #[test]
    fn test_starting_roster_uses_fixed_profiles() {
        let company = create_company(&SimulationConfig::default(), 1);
        let expert = company.workforce.get(3).unwrap();
        assert_eq!(expert.quality_tier, 9);
        assert_eq!(expert.proficiency, 1.122);
        assert!(expert.is_trained());
        for machine in &company.machines.machines {
            assert_eq!(machine.operator_id, Some(machine.id));
            assert_eq!(machine.last_part_type, None);
        }
    }
}
