/// Prosim Engine - Core Domain Types
///
/// Pure data plus small lookups. The weekly rules live in the
/// calculation modules; nothing here draws randomness or charges cost.

use serde::{Deserialize, Serialize};

use crate::report::{CostReport, WeeklyReport};

// ── Product lines and departments ──────────────────────────────────

/// One of the three product lines. On the Parts floor the same line
/// names the intermediate part (X', Y', Z').
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProductLine {
    X,
    Y,
    Z,
}

impl ProductLine {
    pub const ALL: [ProductLine; 3] = [ProductLine::X, ProductLine::Y, ProductLine::Z];

    /// Decision-file code: 1 = X, 2 = Y, 3 = Z.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ProductLine::X),
            2 => Some(ProductLine::Y),
            3 => Some(ProductLine::Z),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ProductLine::X => 1,
            ProductLine::Y => 2,
            ProductLine::Z => 3,
        }
    }

    pub fn part_label(self) -> &'static str {
        match self {
            ProductLine::X => "X'",
            ProductLine::Y => "Y'",
            ProductLine::Z => "Z'",
        }
    }

    pub fn product_label(self) -> &'static str {
        match self {
            ProductLine::X => "X",
            ProductLine::Y => "Y",
            ProductLine::Z => "Z",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Department {
    Parts,
    Assembly,
}

impl Department {
    /// Label of what this department makes for `line`.
    pub fn output_label(self, line: ProductLine) -> &'static str {
        match self {
            Department::Parts => line.part_label(),
            Department::Assembly => line.product_label(),
        }
    }
}

/// One `f64` per product line.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerLine {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PerLine {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn get(&self, line: ProductLine) -> f64 {
        match line {
            ProductLine::X => self.x,
            ProductLine::Y => self.y,
            ProductLine::Z => self.z,
        }
    }

    pub fn get_mut(&mut self, line: ProductLine) -> &mut f64 {
        match line {
            ProductLine::X => &mut self.x,
            ProductLine::Y => &mut self.y,
            ProductLine::Z => &mut self.z,
        }
    }

    pub fn add(&mut self, line: ProductLine, amount: f64) {
        *self.get_mut(line) += amount;
    }

    pub fn total(&self) -> f64 {
        self.x + self.y + self.z
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProductLine, f64)> + '_ {
        ProductLine::ALL.into_iter().map(move |line| (line, self.get(line)))
    }

    pub fn map(&self, mut f: impl FnMut(ProductLine, f64) -> f64) -> PerLine {
        PerLine::new(
            f(ProductLine::X, self.x),
            f(ProductLine::Y, self.y),
            f(ProductLine::Z, self.z),
        )
    }
}

// ── Inventory ──────────────────────────────────────────────────────

/// The seven inventory counters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Inventory {
    pub raw_materials: f64,
    pub parts: PerLine,
    pub products: PerLine,
}

/// Names one inventory counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pool {
    RawMaterials,
    Part(ProductLine),
    Product(ProductLine),
}

impl Pool {
    pub const ALL: [Pool; 7] = [
        Pool::RawMaterials,
        Pool::Part(ProductLine::X),
        Pool::Part(ProductLine::Y),
        Pool::Part(ProductLine::Z),
        Pool::Product(ProductLine::X),
        Pool::Product(ProductLine::Y),
        Pool::Product(ProductLine::Z),
    ];

    /// Position of this pool in `Pool::ALL`.
    pub fn index(self) -> usize {
        match self {
            Pool::RawMaterials => 0,
            Pool::Part(line) => usize::from(line.code()),
            Pool::Product(line) => 3 + usize::from(line.code()),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Pool::RawMaterials => "Raw Materials",
            Pool::Part(line) => line.part_label(),
            Pool::Product(line) => line.product_label(),
        }
    }
}

impl Inventory {
    pub fn get(&self, pool: Pool) -> f64 {
        match pool {
            Pool::RawMaterials => self.raw_materials,
            Pool::Part(line) => self.parts.get(line),
            Pool::Product(line) => self.products.get(line),
        }
    }

    pub fn get_mut(&mut self, pool: Pool) -> &mut f64 {
        match pool {
            Pool::RawMaterials => &mut self.raw_materials,
            Pool::Part(line) => self.parts.get_mut(line),
            Pool::Product(line) => self.products.get_mut(line),
        }
    }
}

// ── Workforce ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingStatus {
    Untrained,
    InTraining,
    Trained,
}

/// A single operator. `quality_tier` and `proficiency` are fixed at hire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Operator {
    pub id: u32,
    pub status: TrainingStatus,
    pub training_level: u8, // 0..=10
    pub quality_tier: u8,   // 0..=9
    pub proficiency: f64,
    pub weeks_unscheduled: u32,
    pub weeks_at_level: u32,
}

impl Operator {
    /// A freshly hired operator: untrained, level 0.
    pub fn new_hire(id: u32, quality_tier: u8, proficiency: f64) -> Self {
        Self {
            id,
            status: TrainingStatus::Untrained,
            training_level: 0,
            quality_tier,
            proficiency,
            weeks_unscheduled: 0,
            weeks_at_level: 0,
        }
    }

    pub fn is_in_training(&self) -> bool {
        self.status == TrainingStatus::InTraining
    }

    pub fn is_trained(&self) -> bool {
        self.status == TrainingStatus::Trained
    }
}

/// Operators in hire order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Workforce {
    pub operators: Vec<Operator>,
    pub next_operator_id: u32,
}

impl Workforce {
    pub fn get(&self, id: u32) -> Option<&Operator> {
        self.operators.iter().find(|op| op.id == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Operator> {
        self.operators.iter_mut().find(|op| op.id == id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.operators.iter().map(|op| op.id).collect()
    }
}

// ── Machine floor ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Machine {
    pub id: u32,
    pub department: Department,
    pub operator_id: Option<u32>,
    pub assignment: Option<ProductLine>,
    pub scheduled_hours: f64,
    pub operator_in_training: bool,
    /// Line produced the last time this machine ran. Drives setup time.
    pub last_part_type: Option<ProductLine>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineFloor {
    pub machines: Vec<Machine>,
}

impl MachineFloor {
    pub fn get(&self, id: u32) -> Option<&Machine> {
        self.machines.iter().find(|m| m.id == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Machine> {
        self.machines.iter_mut().find(|m| m.id == id)
    }

    pub fn in_department(&self, department: Department) -> impl Iterator<Item = &Machine> {
        self.machines.iter().filter(move |m| m.department == department)
    }

    /// Machine currently staffed by `operator_id`, if any.
    pub fn machine_of_operator(&self, operator_id: u32) -> Option<&Machine> {
        self.machines.iter().find(|m| m.operator_id == Some(operator_id))
    }
}

// ── Orders ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OrderKind {
    RawMaterialsRegular,
    RawMaterialsExpedited,
    PurchasedPart(ProductLine),
}

impl OrderKind {
    pub fn description(self) -> &'static str {
        match self {
            OrderKind::RawMaterialsRegular => "Raw Materials (Reg)",
            OrderKind::RawMaterialsExpedited => "Raw Materials (Exp)",
            OrderKind::PurchasedPart(ProductLine::X) => "Finished Part X'",
            OrderKind::PurchasedPart(ProductLine::Y) => "Finished Part Y'",
            OrderKind::PurchasedPart(ProductLine::Z) => "Finished Part Z'",
        }
    }

    /// Pool the order lands in.
    pub fn destination(self) -> Pool {
        match self {
            OrderKind::RawMaterialsRegular | OrderKind::RawMaterialsExpedited => Pool::RawMaterials,
            OrderKind::PurchasedPart(line) => Pool::Part(line),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PendingOrder {
    pub kind: OrderKind,
    pub quantity: f64,
    pub placed_week: u32,
    pub due_week: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderBook {
    pub orders: Vec<PendingOrder>,
}

impl OrderBook {
    pub fn due_in(&self, week: u32) -> impl Iterator<Item = &PendingOrder> {
        self.orders.iter().filter(move |o| o.due_week == week)
    }

    pub fn outstanding(&self, kind: OrderKind) -> f64 {
        self.orders
            .iter()
            .filter(|o| o.kind == kind)
            .map(|o| o.quantity)
            .sum()
    }
}

// ── Demand ─────────────────────────────────────────────────────────

/// Forecast for one product in one shipping period.
///
/// The actual demand is drawn when the period opens and stays hidden
/// until the shipping week; the estimate converges on it as the
/// standard deviation shrinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemandForecast {
    pub product: ProductLine,
    pub shipping_week: u32,
    pub mean: f64,
    pub std_dev: f64,
    pub weeks_until_shipping: u32,
    pub estimate: f64,
    pub revealed: bool,
    pub(crate) actual: f64,
}

impl DemandForecast {
    /// Actual demand, once revealed at the shipping week.
    pub fn actual_demand(&self) -> Option<f64> {
        self.revealed.then_some(self.actual)
    }

    /// What the player sees: the actual once revealed, else the estimate.
    pub fn visible_demand(&self) -> f64 {
        if self.revealed {
            self.actual
        } else {
            self.estimate
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemandSchedule {
    pub forecasts: Vec<DemandForecast>,
    /// Unmet demand waiting for the next shipping period.
    pub carryover: PerLine,
}

impl DemandSchedule {
    pub fn forecast(&self, product: ProductLine, shipping_week: u32) -> Option<&DemandForecast> {
        self.forecasts
            .iter()
            .find(|f| f.product == product && f.shipping_week == shipping_week)
    }

    pub fn shipping_weeks(&self) -> Vec<u32> {
        let mut weeks: Vec<u32> = self.forecasts.iter().map(|f| f.shipping_week).collect();
        weeks.sort_unstable();
        weeks.dedup();
        weeks
    }

    pub fn is_initialized(&self) -> bool {
        !self.forecasts.is_empty()
    }
}

// ── Company ────────────────────────────────────────────────────────

/// Running totals behind the cumulative performance metrics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerformanceTotals {
    pub standard_costs: f64,
    pub actual_costs: f64,
    pub net_units: f64,
    pub units_demanded: f64,
    pub units_shipped: f64,
}

/// Root aggregate. `current_week` is the last completed week (0 before
/// the first week is played).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Company {
    pub company_id: u32,
    pub current_week: u32,
    pub inventory: Inventory,
    pub workforce: Workforce,
    pub machines: MachineFloor,
    pub orders: OrderBook,
    pub demand: DemandSchedule,
    pub cumulative_costs: CostReport,
    pub total_costs: f64,
    pub performance: PerformanceTotals,
    pub last_report: Option<WeeklyReport>,
}

impl Company {
    pub fn current_week(&self) -> u32 {
        self.current_week
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn workforce(&self) -> &Workforce {
        &self.workforce
    }

    pub fn machines(&self) -> &MachineFloor {
        &self.machines
    }

    pub fn orders(&self) -> &OrderBook {
        &self.orders
    }

    pub fn latest_report(&self) -> Option<&WeeklyReport> {
        self.last_report.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_codes_round_trip() {
        for line in ProductLine::ALL {
            assert_eq!(ProductLine::from_code(line.code()), Some(line));
        }
        assert_eq!(ProductLine::from_code(0), None);
        assert_eq!(ProductLine::from_code(4), None);
    }

    #[test]
    fn per_line_accessors() {
        let mut amounts = PerLine::new(1.0, 2.0, 3.0);
        amounts.add(ProductLine::Y, 5.0);
        assert_eq!(amounts.get(ProductLine::Y), 7.0);
        assert_eq!(amounts.total(), 11.0);
        let doubled = amounts.map(|_, v| v * 2.0);
        assert_eq!(doubled, PerLine::new(2.0, 14.0, 6.0));
    }

    #[test]
    fn pool_index_matches_all_order() {
        for (i, pool) in Pool::ALL.iter().enumerate() {
            assert_eq!(pool.index(), i, "{:?}", pool);
        }
    }

    #[test]
    fn inventory_pool_lookup() {
        let mut inv = Inventory::default();
        *inv.get_mut(Pool::Part(ProductLine::Z)) = 40.0;
        *inv.get_mut(Pool::RawMaterials) = 10.0;
        assert_eq!(inv.parts.z, 40.0);
        assert_eq!(inv.get(Pool::RawMaterials), 10.0);
        assert_eq!(inv.get(Pool::Product(ProductLine::X)), 0.0);
    }

    #[test]
    fn hidden_demand_is_not_visible_until_revealed() {
        let mut forecast = DemandForecast {
            product: ProductLine::X,
            shipping_week: 4,
            mean: 600.0,
            std_dev: 300.0,
            weeks_until_shipping: 3,
            estimate: 550.0,
            revealed: false,
            actual: 700.0,
        };
        assert_eq!(forecast.actual_demand(), None);
        assert_eq!(forecast.visible_demand(), 550.0);
        forecast.revealed = true;
        assert_eq!(forecast.actual_demand(), Some(700.0));
    }

    #[test]
    fn order_kind_destinations() {
        assert_eq!(OrderKind::RawMaterialsExpedited.destination(), Pool::RawMaterials);
        assert_eq!(
            OrderKind::PurchasedPart(ProductLine::Y).destination(),
            Pool::Part(ProductLine::Y)
        );
    }
}
