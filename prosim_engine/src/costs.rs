/// Prosim Engine - Costs and Performance
///
/// Pure aggregation over the week's activity. Nothing here mutates the
/// company; the orchestrator folds the result into the running totals.

use crate::config::SimulationConfig;
use crate::decisions::Decisions;
use crate::domain::{Department, Inventory, PerLine, PerformanceTotals, ProductLine};
use crate::inventory::{OrdersPlaced, Receipts};
use crate::report::{
    CostReport, MachineProduction, OverheadCosts, PerformanceMetrics, ProductionReport,
    RepairIncident, WorkforceSummary,
};

/// Everything the cost pass reads.
#[derive(Debug, Clone, Copy)]
pub struct CostInputs<'a> {
    pub decisions: &'a Decisions,
    pub production: &'a ProductionReport,
    pub receipts: &'a Receipts,
    pub raw_materials_consumed: PerLine,
    pub ending: &'a Inventory,
    pub short: PerLine,
    pub repairs: &'a [RepairIncident],
    pub workforce: &'a WorkforceSummary,
    pub orders: OrdersPlaced,
}

// ---------------------------------------------------------------------------
// Weekly cost report
// ---------------------------------------------------------------------------

/// Labor for one machine: productive hours at the base rate, with the
/// overtime premium on the share of scheduled hours past regular time.
pub fn labor_cost(row: &MachineProduction, config: &SimulationConfig) -> f64 {
    if row.productive_hours <= 0.0 || row.scheduled_hours <= 0.0 {
        return 0.0;
    }
    let overtime = (row.scheduled_hours - config.game.regular_hours).max(0.0);
    let overtime_share = overtime / row.scheduled_hours;
    let premium = (config.costs.overtime_multiplier - 1.0) * overtime_share;
    row.productive_hours * config.costs.labor_rate * (1.0 + premium)
}

fn equipment_rate(config: &SimulationConfig, department: Department) -> f64 {
    match department {
        Department::Parts => config.costs.equipment_rate_parts,
        Department::Assembly => config.costs.equipment_rate_assembly,
    }
}

pub fn calculate_costs(inputs: &CostInputs<'_>, config: &SimulationConfig) -> CostReport {
    let c = &config.costs;
    let mut report = CostReport::default();

    let rows = inputs
        .production
        .parts
        .machines
        .iter()
        .chain(inputs.production.assembly.machines.iter());
    for row in rows {
        let Some(line) = row.line else { continue };
        let costs = report.product_mut(line);
        costs.labor += labor_cost(row, config);
        costs.machine_setup += row.setup_hours * c.setup_cost_per_hour;
        costs.equipment_usage += row.productive_hours * equipment_rate(config, row.department);
    }

    for incident in inputs.repairs {
        report.product_mut(incident.line).machine_repair += incident.cost;
    }

    for line in ProductLine::ALL {
        let costs = report.product_mut(line);
        costs.raw_materials = inputs.raw_materials_consumed.get(line) * c.raw_material_unit_cost;
        costs.purchased_parts =
            inputs.receipts.purchased_parts.get(line) * c.purchased_part_prices.get(line);
        costs.parts_carrying = inputs.ending.parts.get(line) * c.carrying.parts;
        costs.products_carrying = inputs.ending.products.get(line) * c.carrying.products;
        costs.demand_penalty = inputs.short.get(line) * c.demand_penalty_per_unit;
    }

    let w = inputs.workforce;
    report.overhead = OverheadCosts {
        quality_planning: inputs.decisions.quality_budget,
        plant_maintenance: inputs.decisions.maintenance_budget,
        training: w.sent_to_training.len() as f64 * c.training_per_session,
        hiring: w.hired.len() as f64 * c.hiring,
        layoff_firing: w.unscheduled.len() as f64 * c.layoff_per_week
            + w.terminated.len() as f64 * c.termination,
        raw_materials_carrying: inputs.ending.raw_materials * c.carrying.raw_materials,
        ordering: f64::from(inputs.orders.orders) * c.ordering_cost
            + f64::from(inputs.orders.expedited) * c.expedite_premium,
        fixed_expense: c.fixed_expense,
    };
    report
}

// ---------------------------------------------------------------------------
// Standard costs and performance
// ---------------------------------------------------------------------------

/// Standard cost per unit at each stage, at full efficiency with no
/// setup or rejects: `(part, assembly step)`.
pub fn standard_unit_costs(config: &SimulationConfig) -> (PerLine, PerLine) {
    let c = &config.costs;
    let p = &config.production;
    let part = PerLine::default().map(|line, _| {
        (c.labor_rate + c.equipment_rate_parts) / p.parts_rates.get(line)
            + c.raw_material_unit_cost * p.raw_materials_per_part.get(line)
    });
    let assembly = PerLine::default()
        .map(|line, _| (c.labor_rate + c.equipment_rate_assembly) / p.assembly_rates.get(line));
    (part, assembly)
}

/// Standard cost of this week's good output.
pub fn standard_costs(production: &ProductionReport, config: &SimulationConfig) -> f64 {
    let (part, assembly) = standard_unit_costs(config);
    ProductLine::ALL
        .iter()
        .map(|&line| {
            production.parts.net.get(line) * part.get(line)
                + production.assembly.net.get(line) * assembly.get(line)
        })
        .sum()
}

/// Efficiency, variance and delivery figures from raw totals.
pub fn performance_metrics(
    standard: f64,
    actual: f64,
    net_units: f64,
    demanded: f64,
    shipped: f64,
    delivery_due: bool,
) -> PerformanceMetrics {
    let percent_efficiency = if actual > 0.0 {
        standard / actual * 100.0
    } else {
        100.0
    };
    let variance_per_unit = if net_units > 0.0 {
        (actual - standard) / net_units
    } else {
        0.0
    };
    let on_time_delivery = delivery_due.then(|| {
        if demanded > 0.0 {
            shipped / demanded * 100.0
        } else {
            100.0
        }
    });
    PerformanceMetrics {
        standard_costs: standard,
        actual_costs: actual,
        percent_efficiency,
        variance_per_unit,
        on_time_delivery,
    }
}

/// Cumulative metrics from the running totals.
pub fn cumulative_metrics(totals: &PerformanceTotals) -> PerformanceMetrics {
    performance_metrics(
        totals.standard_costs,
        totals.actual_costs,
        totals.net_units,
        totals.units_demanded,
        totals.units_shipped,
        totals.units_demanded > 0.0,
    )
}
