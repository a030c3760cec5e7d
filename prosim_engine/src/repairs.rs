/// Prosim Engine - Stochastic Repairs
///
/// Each machine that ran this week breaks down independently with the
/// configured probability, optionally lowered by the maintenance budget.

use rand::Rng;

use crate::config::RepairConfig;
use crate::report::{ProductionReport, RepairIncident};

/// Breakdown probability after the maintenance reduction.
pub fn breakdown_probability(maintenance_budget: f64, config: &RepairConfig) -> f64 {
    let reduction = config.maintenance_reduction_per_1000 * maintenance_budget.max(0.0) / 1000.0;
    (config.probability_per_machine_week - reduction).clamp(0.0, 1.0)
}

/// One draw per running machine, Parts first, in floor order.
pub fn generate_repairs<R: Rng>(
    production: &ProductionReport,
    maintenance_budget: f64,
    config: &RepairConfig,
    rng: &mut R,
) -> Vec<RepairIncident> {
    let p = breakdown_probability(maintenance_budget, config);
    let mut incidents = Vec::new();
    let rows = production
        .parts
        .machines
        .iter()
        .chain(production.assembly.machines.iter());
    for row in rows {
        let Some(line) = row.line else { continue };
        if row.operator_id.is_none() || row.operator_in_training || row.scheduled_hours <= 0.0 {
            continue;
        }
        if rng.gen::<f64>() < p {
            log::debug!("machine {} broke down running {}", row.machine_id, line.product_label());
            incidents.push(RepairIncident {
                machine_id: row.machine_id,
                line,
                cost: config.cost_per_repair,
            });
        }
    }
    incidents
}
