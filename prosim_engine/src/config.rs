/// Prosim Engine - Configuration
///
/// Every tunable constant of the simulated economy, grouped by section.
/// Values marked "estimate" were never verified against historical
/// reports and are expected to be swapped by configuration, not code.
///
/// A configuration is checked as a whole by [`SimulationConfig::validate`]
/// before a `Simulation` accepts it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::arithmetic::EPSILON;
use crate::domain::PerLine;
use crate::error::{SimError, SimResult};

/// Upper bound on `time_efficiency x proficiency` for any operator.
pub const MAX_COMBINED_EFFICIENCY: f64 = 1.35;

pub const TRAINING_LEVELS: usize = 11;
pub const QUALITY_TIERS: usize = 10;
pub const MAX_TRAINING_LEVEL: u8 = 10;

/// Time efficiency in percent, indexed `[training_level][quality_tier]`.
/// Estimate: shaped to match the observed 20%..120% range.
pub const DEFAULT_TIME_EFFICIENCY: [[u8; QUALITY_TIERS]; TRAINING_LEVELS] = [
    [20, 22, 24, 26, 28, 30, 32, 34, 36, 38],
    [28, 30, 32, 34, 36, 38, 40, 42, 44, 46],
    [36, 38, 40, 42, 44, 46, 48, 50, 52, 54],
    [45, 47, 49, 51, 53, 55, 57, 59, 61, 63],
    [53, 55, 57, 59, 61, 63, 65, 67, 69, 71],
    [61, 63, 65, 67, 69, 71, 73, 75, 77, 79],
    [69, 71, 73, 75, 77, 79, 81, 83, 85, 87],
    [77, 79, 81, 83, 85, 87, 89, 91, 93, 95],
    [86, 88, 90, 92, 94, 96, 98, 100, 102, 104],
    [94, 96, 98, 100, 102, 104, 106, 108, 110, 112],
    [102, 104, 106, 108, 110, 112, 114, 116, 118, 120],
];

/// Proficiency multiplier for each quality tier, within the observed
/// 0.83..1.12 band.
pub const DEFAULT_TIER_PROFICIENCY: [f64; QUALITY_TIERS] = [
    0.833, 0.843, 0.878, 0.881, 0.891, 0.926, 0.989, 1.052, 1.109, 1.122,
];

// ── Sections ───────────────────────────────────────────────────────

/// Game structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub max_weeks: u32,
    pub shipping_frequency: u32,
    pub parts_machines: u32,
    pub assembly_machines: u32,
    /// Shipping periods kept open in the demand schedule.
    pub forecast_periods_ahead: u32,
    pub max_scheduled_hours: f64,
    pub regular_hours: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_weeks: 15,
            shipping_frequency: 4,
            parts_machines: 4,
            assembly_machines: 5,
            forecast_periods_ahead: 2,
            max_scheduled_hours: 50.0,
            regular_hours: 40.0,
        }
    }
}

impl GameConfig {
    pub fn machine_count(&self) -> u32 {
        self.parts_machines + self.assembly_machines
    }
}

/// Standard rates, setup time and bill of materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProductionConfig {
    /// Parts per productive hour (X', Y', Z').
    pub parts_rates: PerLine,
    /// Products per productive hour (X, Y, Z).
    pub assembly_rates: PerLine,
    pub setup_hours_parts: f64,
    pub setup_hours_assembly: f64,
    pub raw_materials_per_part: PerLine,
    pub parts_per_product: PerLine,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            parts_rates: PerLine::new(60.0, 50.0, 40.0),
            assembly_rates: PerLine::new(40.0, 30.0, 20.0),
            setup_hours_parts: 2.0,
            setup_hours_assembly: 2.0,
            raw_materials_per_part: PerLine::new(1.0, 1.0, 1.0),
            parts_per_product: PerLine::new(1.0, 1.0, 1.0),
        }
    }
}

/// `reject_rate(b) = clamp(intercept - slope * ln(b), floor, ceiling)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityConfig {
    pub reject_intercept: f64,
    pub reject_slope: f64,
    pub reject_floor: f64,
    pub reject_ceiling: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            reject_intercept: 0.904,
            reject_slope: 0.114,
            reject_floor: 0.015,
            reject_ceiling: 0.30,
        }
    }
}

/// An operator present when the game starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RosterEntry {
    pub id: u32,
    pub quality_tier: u8,
    pub proficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkforceConfig {
    pub time_efficiency: [[u8; QUALITY_TIERS]; TRAINING_LEVELS],
    pub tier_proficiency: [f64; QUALITY_TIERS],
    /// Relative odds of each tier for a new hire. Estimate: uniform.
    pub hire_tier_weights: [f64; QUALITY_TIERS],
    /// Fixed, documented profiles for the starting operators.
    pub starting_roster: Vec<RosterEntry>,
    pub starting_training_level: u8,
    pub starting_trained: bool,
    /// Consecutive worked weeks needed to gain one level. Estimate.
    pub weeks_per_level: u32,
    /// Highest level reachable on the job without formal training.
    pub untrained_level_cap: u8,
    /// Consecutive unscheduled weeks before termination.
    pub termination_threshold: u32,
    /// Half-width of uniform noise on combined efficiency; 0 disables it.
    pub efficiency_jitter: f64,
}

impl Default for WorkforceConfig {
    fn default() -> Self {
        let roster = [
            (1, 7, 1.039),
            (2, 8, 1.097),
            (3, 9, 1.122),
            (4, 8, 1.093),
            (5, 7, 1.028),
            (6, 1, 0.836),
            (7, 5, 0.934),
            (8, 1, 0.850),
            (9, 4, 0.900),
        ];
        Self {
            time_efficiency: DEFAULT_TIME_EFFICIENCY,
            tier_proficiency: DEFAULT_TIER_PROFICIENCY,
            hire_tier_weights: [1.0; QUALITY_TIERS],
            starting_roster: roster
                .iter()
                .map(|&(id, quality_tier, proficiency)| RosterEntry {
                    id,
                    quality_tier,
                    proficiency,
                })
                .collect(),
            starting_training_level: 8,
            starting_trained: true,
            weeks_per_level: 1,
            untrained_level_cap: 4,
            termination_threshold: 2,
            efficiency_jitter: 0.0,
        }
    }
}

/// Per-unit, per-week carrying rates. Estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CarryingRates {
    pub raw_materials: f64,
    pub parts: f64,
    pub products: f64,
}

impl Default for CarryingRates {
    fn default() -> Self {
        Self {
            raw_materials: 0.01,
            parts: 0.05,
            products: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostConfig {
    pub labor_rate: f64,
    pub overtime_multiplier: f64,
    pub setup_cost_per_hour: f64,
    pub equipment_rate_parts: f64,
    pub equipment_rate_assembly: f64,
    pub raw_material_unit_cost: f64,
    pub purchased_part_prices: PerLine,
    pub hiring: f64,
    pub layoff_per_week: f64,
    pub termination: f64,
    /// Per training session. Estimate.
    pub training_per_session: f64,
    pub fixed_expense: f64,
    pub ordering_cost: f64,
    pub expedite_premium: f64,
    pub demand_penalty_per_unit: f64,
    pub carrying: CarryingRates,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            labor_rate: 10.0,
            overtime_multiplier: 1.5,
            setup_cost_per_hour: 40.0,
            equipment_rate_parts: 100.0,
            equipment_rate_assembly: 80.0,
            raw_material_unit_cost: 1.0,
            purchased_part_prices: PerLine::new(4.25, 6.20, 8.06),
            hiring: 2700.0,
            layoff_per_week: 200.0,
            termination: 400.0,
            training_per_session: 1000.0,
            fixed_expense: 1500.0,
            ordering_cost: 100.0,
            expedite_premium: 1200.0,
            demand_penalty_per_unit: 10.0,
            carrying: CarryingRates::default(),
        }
    }
}

/// Lead times in weeks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogisticsConfig {
    pub raw_materials_regular: u32,
    pub raw_materials_expedited: u32,
    pub purchased_parts: u32,
}

impl Default for LogisticsConfig {
    fn default() -> Self {
        Self {
            raw_materials_regular: 3,
            raw_materials_expedited: 1,
            purchased_parts: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemandConfig {
    pub base_demand: PerLine,
    /// Forecast standard deviation indexed by weeks until shipping.
    /// Horizons past the end reuse the last entry.
    pub std_dev_by_weeks_out: Vec<f64>,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            base_demand: PerLine::new(600.0, 400.0, 200.0),
            std_dev_by_weeks_out: vec![0.0, 100.0, 200.0, 300.0, 300.0],
        }
    }
}

impl DemandConfig {
    pub fn std_dev(&self, weeks_out: u32) -> f64 {
        let idx = (weeks_out as usize).min(self.std_dev_by_weeks_out.len().saturating_sub(1));
        self.std_dev_by_weeks_out.get(idx).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepairConfig {
    /// Estimate.
    pub probability_per_machine_week: f64,
    pub cost_per_repair: f64,
    /// Probability removed per $1000 of maintenance budget. Estimate: 0,
    /// i.e. maintenance spending does not change breakdowns.
    pub maintenance_reduction_per_1000: f64,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            probability_per_machine_week: 0.10,
            cost_per_repair: 400.0,
            maintenance_reduction_per_1000: 0.0,
        }
    }
}

/// Bounds applied to decisions. Exceeding a `*_limit` is an error,
/// exceeding a `*_warning` threshold only warns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecisionLimits {
    pub budget_limit: f64,
    pub budget_warning: f64,
    pub parts_order_warning: f64,
    pub training_warning: usize,
}

impl Default for DecisionLimits {
    fn default() -> Self {
        Self {
            budget_limit: 100_000.0,
            budget_warning: 10_000.0,
            parts_order_warning: 1_000.0,
            training_warning: 3,
        }
    }
}

/// Opening inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InitialStateConfig {
    pub raw_materials: f64,
    pub parts: PerLine,
    pub products: PerLine,
}

impl Default for InitialStateConfig {
    fn default() -> Self {
        Self {
            raw_materials: 4000.0,
            parts: PerLine::new(600.0, 400.0, 200.0),
            products: PerLine::default(),
        }
    }
}

// ── Root ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub game: GameConfig,
    pub production: ProductionConfig,
    pub quality: QualityConfig,
    pub workforce: WorkforceConfig,
    pub costs: CostConfig,
    pub logistics: LogisticsConfig,
    pub demand: DemandConfig,
    pub repair: RepairConfig,
    pub limits: DecisionLimits,
    pub initial: InitialStateConfig,
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_game(mut self, game: GameConfig) -> Self {
        self.game = game;
        self
    }

    pub fn with_production(mut self, production: ProductionConfig) -> Self {
        self.production = production;
        self
    }

    pub fn with_quality(mut self, quality: QualityConfig) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_workforce(mut self, workforce: WorkforceConfig) -> Self {
        self.workforce = workforce;
        self
    }

    pub fn with_costs(mut self, costs: CostConfig) -> Self {
        self.costs = costs;
        self
    }

    pub fn with_logistics(mut self, logistics: LogisticsConfig) -> Self {
        self.logistics = logistics;
        self
    }

    pub fn with_demand(mut self, demand: DemandConfig) -> Self {
        self.demand = demand;
        self
    }

    pub fn with_repair(mut self, repair: RepairConfig) -> Self {
        self.repair = repair;
        self
    }

    pub fn with_limits(mut self, limits: DecisionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_initial_state(mut self, initial: InitialStateConfig) -> Self {
        self.initial = initial;
        self
    }

    /// Parse a (possibly partial) JSON document; omitted fields keep
    /// their defaults. The result is validated.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let partial: Value = serde_json::from_str(json)
            .map_err(|e| SimError::configuration(format!("malformed JSON: {}", e)))?;
        Self::default().merge_json(&partial)
    }

    /// Deep-merge `partial` over this configuration and validate the result.
    /// Objects merge key by key; any other value replaces wholesale.
    pub fn merge_json(&self, partial: &Value) -> SimResult<Self> {
        if !partial.is_object() {
            return Err(SimError::configuration("override must be a JSON object"));
        }
        let mut base = serde_json::to_value(self)
            .map_err(|e| SimError::configuration(format!("cannot serialize base: {}", e)))?;
        merge_values(&mut base, partial);
        let merged: SimulationConfig = serde_json::from_value(base)
            .map_err(|e| SimError::configuration(e.to_string()))?;
        merged.validate()?;
        Ok(merged)
    }

    /// Check the configuration as a whole.
    pub fn validate(&self) -> SimResult<()> {
        self.validate_game()?;
        self.validate_production()?;
        self.validate_quality()?;
        self.validate_workforce()?;
        self.validate_costs()?;
        self.validate_logistics()?;
        self.validate_demand()?;
        Ok(())
    }

    fn validate_game(&self) -> SimResult<()> {
        let g = &self.game;
        if g.max_weeks == 0 {
            return Err(SimError::configuration("game.max_weeks must be at least 1"));
        }
        if g.shipping_frequency == 0 {
            return Err(SimError::configuration("game.shipping_frequency must be at least 1"));
        }
        if g.parts_machines == 0 || g.assembly_machines == 0 {
            return Err(SimError::configuration(
                "each department needs at least one machine",
            ));
        }
        if g.forecast_periods_ahead == 0 {
            return Err(SimError::configuration(
                "game.forecast_periods_ahead must be at least 1",
            ));
        }
        if !(g.max_scheduled_hours > 0.0) || !(g.regular_hours > 0.0) {
            return Err(SimError::configuration("hour limits must be positive"));
        }
        if g.regular_hours > g.max_scheduled_hours {
            return Err(SimError::configuration(
                "game.regular_hours exceeds game.max_scheduled_hours",
            ));
        }
        Ok(())
    }

    fn validate_production(&self) -> SimResult<()> {
        let p = &self.production;
        for (name, rates) in [
            ("production.parts_rates", &p.parts_rates),
            ("production.assembly_rates", &p.assembly_rates),
            ("production.raw_materials_per_part", &p.raw_materials_per_part),
            ("production.parts_per_product", &p.parts_per_product),
        ] {
            for (line, rate) in rates.iter() {
                if !(rate > 0.0) || !rate.is_finite() {
                    return Err(SimError::configuration(format!(
                        "{} is missing a positive rate for {:?}",
                        name, line
                    )));
                }
            }
        }
        if p.setup_hours_parts < 0.0 || p.setup_hours_assembly < 0.0 {
            return Err(SimError::configuration("setup hours cannot be negative"));
        }
        Ok(())
    }

    fn validate_quality(&self) -> SimResult<()> {
        let q = &self.quality;
        if !(0.0..=1.0).contains(&q.reject_floor) || !(0.0..=1.0).contains(&q.reject_ceiling) {
            return Err(SimError::configuration(
                "reject floor and ceiling must lie in [0, 1]",
            ));
        }
        if q.reject_floor > q.reject_ceiling {
            return Err(SimError::configuration(format!(
                "reject floor {} is above ceiling {}",
                q.reject_floor, q.reject_ceiling
            )));
        }
        if q.reject_slope < 0.0 {
            return Err(SimError::configuration(
                "quality.reject_slope must be non-negative",
            ));
        }
        Ok(())
    }

    fn validate_workforce(&self) -> SimResult<()> {
        let w = &self.workforce;
        for level in 0..TRAINING_LEVELS {
            for tier in 0..QUALITY_TIERS {
                let pct = w.time_efficiency[level][tier];
                if level > 0 && pct < w.time_efficiency[level - 1][tier] {
                    return Err(SimError::configuration(format!(
                        "time efficiency drops from level {} to {} at tier {}",
                        level - 1,
                        level,
                        tier
                    )));
                }
            }
        }
        if w.tier_proficiency.iter().any(|p| !(*p > 0.0)) {
            return Err(SimError::configuration(
                "every tier needs a positive proficiency",
            ));
        }
        if w.hire_tier_weights.iter().any(|wt| *wt < 0.0)
            || w.hire_tier_weights.iter().sum::<f64>() <= 0.0
        {
            return Err(SimError::configuration(
                "hire tier weights must be non-negative with a positive sum",
            ));
        }

        let max_pct = w
            .time_efficiency
            .iter()
            .flat_map(|row| row.iter())
            .copied()
            .max()
            .unwrap_or(0) as f64;
        let max_prof = w
            .tier_proficiency
            .iter()
            .copied()
            .chain(w.starting_roster.iter().map(|r| r.proficiency))
            .fold(0.0, f64::max);
        if max_pct / 100.0 * max_prof > MAX_COMBINED_EFFICIENCY + EPSILON {
            return Err(SimError::configuration(format!(
                "combined efficiency can reach {:.3}, above {}",
                max_pct / 100.0 * max_prof,
                MAX_COMBINED_EFFICIENCY
            )));
        }

        let mut seen = Vec::new();
        for entry in &w.starting_roster {
            if entry.id == 0 || seen.contains(&entry.id) {
                return Err(SimError::configuration(format!(
                    "starting roster id {} is zero or duplicated",
                    entry.id
                )));
            }
            if entry.quality_tier as usize >= QUALITY_TIERS || !(entry.proficiency > 0.0) {
                return Err(SimError::configuration(format!(
                    "starting operator {} has an invalid profile",
                    entry.id
                )));
            }
            seen.push(entry.id);
        }
        if w.starting_training_level > MAX_TRAINING_LEVEL
            || w.untrained_level_cap > MAX_TRAINING_LEVEL
        {
            return Err(SimError::configuration("training levels stop at 10"));
        }
        if w.weeks_per_level == 0 || w.termination_threshold == 0 {
            return Err(SimError::configuration(
                "weeks_per_level and termination_threshold must be at least 1",
            ));
        }
        if !(0.0..=0.5).contains(&w.efficiency_jitter) {
            return Err(SimError::configuration(
                "workforce.efficiency_jitter must lie in [0, 0.5]",
            ));
        }
        Ok(())
    }

    fn validate_costs(&self) -> SimResult<()> {
        let c = &self.costs;
        let rates = [
            ("labor_rate", c.labor_rate),
            ("setup_cost_per_hour", c.setup_cost_per_hour),
            ("equipment_rate_parts", c.equipment_rate_parts),
            ("equipment_rate_assembly", c.equipment_rate_assembly),
            ("raw_material_unit_cost", c.raw_material_unit_cost),
            ("hiring", c.hiring),
            ("layoff_per_week", c.layoff_per_week),
            ("termination", c.termination),
            ("training_per_session", c.training_per_session),
            ("fixed_expense", c.fixed_expense),
            ("ordering_cost", c.ordering_cost),
            ("expedite_premium", c.expedite_premium),
            ("demand_penalty_per_unit", c.demand_penalty_per_unit),
            ("carrying.raw_materials", c.carrying.raw_materials),
            ("carrying.parts", c.carrying.parts),
            ("carrying.products", c.carrying.products),
            ("repair.cost_per_repair", self.repair.cost_per_repair),
        ];
        for (name, value) in rates {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(SimError::configuration(format!(
                    "costs.{} must be a non-negative number",
                    name
                )));
            }
        }
        if c.purchased_part_prices.iter().any(|(_, p)| !(p >= 0.0)) {
            return Err(SimError::configuration(
                "costs.purchased_part_prices must be non-negative",
            ));
        }
        if c.overtime_multiplier < 1.0 {
            return Err(SimError::configuration(
                "costs.overtime_multiplier must be at least 1",
            ));
        }
        let r = &self.repair;
        if !(0.0..=1.0).contains(&r.probability_per_machine_week)
            || r.maintenance_reduction_per_1000 < 0.0
        {
            return Err(SimError::configuration(
                "repair probability must lie in [0, 1]",
            ));
        }
        Ok(())
    }

    fn validate_logistics(&self) -> SimResult<()> {
        let l = &self.logistics;
        if l.raw_materials_regular == 0 || l.raw_materials_expedited == 0 || l.purchased_parts == 0 {
            return Err(SimError::configuration(
                "lead times must be at least one week",
            ));
        }
        Ok(())
    }

    fn validate_demand(&self) -> SimResult<()> {
        let d = &self.demand;
        if d.std_dev_by_weeks_out.is_empty() {
            return Err(SimError::configuration(
                "demand.std_dev_by_weeks_out needs at least one entry",
            ));
        }
        if d.std_dev_by_weeks_out.iter().any(|s| !(*s >= 0.0)) {
            return Err(SimError::configuration(
                "demand standard deviations must be non-negative",
            ));
        }
        if d.base_demand.iter().any(|(_, m)| !(m >= 0.0)) {
            return Err(SimError::configuration("base demand must be non-negative"));
        }
        let i = &self.initial;
        if !(i.raw_materials >= 0.0)
            || i.parts.iter().any(|(_, v)| !(v >= 0.0))
            || i.products.iter().any(|(_, v)| !(v >= 0.0))
        {
            return Err(SimError::configuration(
                "initial inventory must be non-negative",
            ));
        }
        Ok(())
    }
}

fn merge_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}
