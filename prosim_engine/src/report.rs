/// Prosim Engine - Weekly Report
///
/// Everything an external writer needs to render the weekly report.
/// No formatting or column layout lives here.

use serde::{Deserialize, Serialize};

use crate::arithmetic::approx_eq;
use crate::domain::{Department, OrderKind, PerLine, Pool, ProductLine};

// ── Costs ──────────────────────────────────────────────────────────

/// The nine cost categories charged to one product line.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductCosts {
    pub labor: f64,
    pub machine_setup: f64,
    pub machine_repair: f64,
    pub raw_materials: f64,
    pub purchased_parts: f64,
    pub equipment_usage: f64,
    pub parts_carrying: f64,
    pub products_carrying: f64,
    pub demand_penalty: f64,
}

impl ProductCosts {
    pub fn total(&self) -> f64 {
        self.labor
            + self.machine_setup
            + self.machine_repair
            + self.raw_materials
            + self.purchased_parts
            + self.equipment_usage
            + self.parts_carrying
            + self.products_carrying
            + self.demand_penalty
    }

    pub fn categories(&self) -> [(&'static str, f64); 9] {
        [
            ("labor", self.labor),
            ("machine_setup", self.machine_setup),
            ("machine_repair", self.machine_repair),
            ("raw_materials", self.raw_materials),
            ("purchased_parts", self.purchased_parts),
            ("equipment_usage", self.equipment_usage),
            ("parts_carrying", self.parts_carrying),
            ("products_carrying", self.products_carrying),
            ("demand_penalty", self.demand_penalty),
        ]
    }

    fn accumulate(&mut self, other: &ProductCosts) {
        self.labor += other.labor;
        self.machine_setup += other.machine_setup;
        self.machine_repair += other.machine_repair;
        self.raw_materials += other.raw_materials;
        self.purchased_parts += other.purchased_parts;
        self.equipment_usage += other.equipment_usage;
        self.parts_carrying += other.parts_carrying;
        self.products_carrying += other.products_carrying;
        self.demand_penalty += other.demand_penalty;
    }
}

/// The eight company-wide cost categories.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverheadCosts {
    pub quality_planning: f64,
    pub plant_maintenance: f64,
    pub training: f64,
    pub hiring: f64,
    pub layoff_firing: f64,
    pub raw_materials_carrying: f64,
    pub ordering: f64,
    pub fixed_expense: f64,
}

impl OverheadCosts {
    pub fn total(&self) -> f64 {
        self.quality_planning
            + self.plant_maintenance
            + self.training
            + self.hiring
            + self.layoff_firing
            + self.raw_materials_carrying
            + self.ordering
            + self.fixed_expense
    }

    pub fn categories(&self) -> [(&'static str, f64); 8] {
        [
            ("quality_planning", self.quality_planning),
            ("plant_maintenance", self.plant_maintenance),
            ("training", self.training),
            ("hiring", self.hiring),
            ("layoff_firing", self.layoff_firing),
            ("raw_materials_carrying", self.raw_materials_carrying),
            ("ordering", self.ordering),
            ("fixed_expense", self.fixed_expense),
        ]
    }

    fn accumulate(&mut self, other: &OverheadCosts) {
        self.quality_planning += other.quality_planning;
        self.plant_maintenance += other.plant_maintenance;
        self.training += other.training;
        self.hiring += other.hiring;
        self.layoff_firing += other.layoff_firing;
        self.raw_materials_carrying += other.raw_materials_carrying;
        self.ordering += other.ordering;
        self.fixed_expense += other.fixed_expense;
    }
}

/// 9 categories x 3 products plus 8 overhead categories.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CostReport {
    pub x: ProductCosts,
    pub y: ProductCosts,
    pub z: ProductCosts,
    pub overhead: OverheadCosts,
}

impl CostReport {
    pub fn product(&self, line: ProductLine) -> &ProductCosts {
        match line {
            ProductLine::X => &self.x,
            ProductLine::Y => &self.y,
            ProductLine::Z => &self.z,
        }
    }

    pub fn product_mut(&mut self, line: ProductLine) -> &mut ProductCosts {
        match line {
            ProductLine::X => &mut self.x,
            ProductLine::Y => &mut self.y,
            ProductLine::Z => &mut self.z,
        }
    }

    pub fn product_subtotal(&self) -> f64 {
        self.x.total() + self.y.total() + self.z.total()
    }

    pub fn overhead_subtotal(&self) -> f64 {
        self.overhead.total()
    }

    pub fn total(&self) -> f64 {
        self.product_subtotal() + self.overhead_subtotal()
    }

    /// Running-sum update: `self += week`.
    pub fn accumulate(&mut self, week: &CostReport) {
        self.x.accumulate(&week.x);
        self.y.accumulate(&week.y);
        self.z.accumulate(&week.z);
        self.overhead.accumulate(&week.overhead);
    }

    /// Every category value, products first, in a fixed order.
    pub fn flatten(&self) -> Vec<(String, f64)> {
        let mut out = Vec::with_capacity(35);
        for line in ProductLine::ALL {
            for (name, value) in self.product(line).categories() {
                out.push((format!("{}.{}", line.product_label(), name), value));
            }
        }
        for (name, value) in self.overhead.categories() {
            out.push((format!("overhead.{}", name), value));
        }
        out
    }
}

// ── Production ─────────────────────────────────────────────────────

/// One machine's week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineProduction {
    pub machine_id: u32,
    pub department: Department,
    pub operator_id: Option<u32>,
    pub line: Option<ProductLine>,
    pub operator_in_training: bool,
    pub scheduled_hours: f64,
    pub setup_hours: f64,
    pub productive_hours: f64,
    pub efficiency: f64,
    pub gross_units: f64,
    pub rejects: f64,
    pub net_units: f64,
    /// Gross units lost because input stock ran short.
    pub shortage_units: f64,
}

impl MachineProduction {
    pub fn produced(&self) -> bool {
        self.gross_units > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepartmentProduction {
    pub machines: Vec<MachineProduction>,
    pub scheduled_hours: PerLine,
    pub setup_hours: PerLine,
    pub productive_hours: PerLine,
    pub gross: PerLine,
    pub rejects: PerLine,
    pub net: PerLine,
    pub shortage: PerLine,
}

impl DepartmentProduction {
    /// Recompute per-line subtotals from the machine rows.
    pub fn recompute_totals(&mut self) {
        let mut totals = DepartmentProduction {
            machines: Vec::new(),
            ..Default::default()
        };
        for m in &self.machines {
            if let Some(line) = m.line {
                totals.scheduled_hours.add(line, m.scheduled_hours);
                totals.setup_hours.add(line, m.setup_hours);
                totals.productive_hours.add(line, m.productive_hours);
                totals.gross.add(line, m.gross_units);
                totals.rejects.add(line, m.rejects);
                totals.net.add(line, m.net_units);
                totals.shortage.add(line, m.shortage_units);
            }
        }
        self.scheduled_hours = totals.scheduled_hours;
        self.setup_hours = totals.setup_hours;
        self.productive_hours = totals.productive_hours;
        self.gross = totals.gross;
        self.rejects = totals.rejects;
        self.net = totals.net;
        self.shortage = totals.shortage;
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductionReport {
    pub reject_rate: f64,
    pub parts: DepartmentProduction,
    pub assembly: DepartmentProduction,
}

impl ProductionReport {
    pub fn department(&self, department: Department) -> &DepartmentProduction {
        match department {
            Department::Parts => &self.parts,
            Department::Assembly => &self.assembly,
        }
    }

    pub fn machine(&self, machine_id: u32) -> Option<&MachineProduction> {
        self.parts
            .machines
            .iter()
            .chain(self.assembly.machines.iter())
            .find(|m| m.machine_id == machine_id)
    }

    pub fn total_net_units(&self) -> f64 {
        self.parts.net.total() + self.assembly.net.total()
    }
}

// ── Inventory ──────────────────────────────────────────────────────

/// One pool's flows for the week.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolFlow {
    pub pool: Pool,
    pub beginning: f64,
    pub received: f64,
    pub produced: f64,
    pub consumed: f64,
    pub shipped: f64,
    pub ending: f64,
}

impl PoolFlow {
    pub fn opening(pool: Pool, beginning: f64) -> Self {
        Self {
            pool,
            beginning,
            received: 0.0,
            produced: 0.0,
            consumed: 0.0,
            shipped: 0.0,
            ending: beginning,
        }
    }

    /// `beginning + received + produced - consumed - shipped`.
    pub fn expected_ending(&self) -> f64 {
        self.beginning + self.received + self.produced - self.consumed - self.shipped
    }

    pub fn balances(&self) -> bool {
        approx_eq(self.ending, self.expected_ending())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventoryReport {
    pub pools: Vec<PoolFlow>,
}

impl InventoryReport {
    pub fn flow(&self, pool: Pool) -> Option<&PoolFlow> {
        self.pools.iter().find(|f| f.pool == pool)
    }
}

// ── Orders, demand, workforce ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PendingOrderLine {
    pub description: String,
    pub kind: OrderKind,
    pub due_week: u32,
    pub quantity: f64,
}

/// Demand outlook for the next shipping period of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemandLine {
    pub product: ProductLine,
    pub shipping_week: u32,
    pub weeks_until_shipping: u32,
    pub estimated_demand: f64,
    pub std_dev: f64,
    pub carryover: f64,
    pub total_demand: f64,
}

/// Fulfillment of one product on a shipping week.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShipmentLine {
    pub product: ProductLine,
    pub actual_demand: f64,
    pub carryover_in: f64,
    pub total_demand: f64,
    pub shipped: f64,
    pub short: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkforceSummary {
    pub headcount: usize,
    pub hired: Vec<u32>,
    pub terminated: Vec<u32>,
    pub sent_to_training: Vec<u32>,
    pub completed_training: Vec<u32>,
    pub unscheduled: Vec<u32>,
    pub level_ups: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepairIncident {
    pub machine_id: u32,
    pub line: ProductLine,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerformanceMetrics {
    pub standard_costs: f64,
    pub actual_costs: f64,
    pub percent_efficiency: f64,
    pub variance_per_unit: f64,
    /// Shipped / demanded, percent. `None` when nothing was due.
    pub on_time_delivery: Option<f64>,
}

// ── Report ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeeklyReport {
    pub week: u32,
    pub company_id: u32,
    pub weekly_costs: CostReport,
    pub cumulative_costs: CostReport,
    pub production: ProductionReport,
    pub inventory: InventoryReport,
    pub pending_orders: Vec<PendingOrderLine>,
    pub demand: Vec<DemandLine>,
    pub shipments: Option<Vec<ShipmentLine>>,
    pub workforce: WorkforceSummary,
    pub repairs: Vec<RepairIncident>,
    pub weekly_performance: PerformanceMetrics,
    pub cumulative_performance: PerformanceMetrics,
    pub warnings: Vec<String>,
}

impl WeeklyReport {
    pub fn is_shipping_week(&self) -> bool {
        self.shipments.is_some()
    }

    pub fn demand_for(&self, product: ProductLine) -> Option<&DemandLine> {
        self.demand.iter().find(|d| d.product == product)
    }

    pub fn shipment_for(&self, product: ProductLine) -> Option<&ShipmentLine> {
        self.shipments
            .as_ref()
            .and_then(|lines| lines.iter().find(|s| s.product == product))
    }
}
