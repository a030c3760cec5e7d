/// Prosim Engine - Weekly Orchestrator
///
/// Runs one week against a cloned company:
///
///   ApplyDecisions -> ProcessWorkforce -> ReceiveOrders ->
///   CalculateProduction -> UpdateInventory -> ProcessDemand ->
///   GenerateStochasticRepairs -> CalculateCosts -> AdvanceWeek ->
///   BuildReport
///
/// Decisions are validated before anything changes and invariants are
/// checked before the new company is handed back. All randomness for the
/// week comes from one `StdRng`.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::SimulationConfig;
use crate::costs::{calculate_costs, cumulative_metrics, performance_metrics, standard_costs, CostInputs};
use crate::decisions::Decisions;
use crate::demand::{
    apply_shipping_outcome, demand_lines, initialize_schedule, is_shipping_week, process_shipping_week,
    refresh_forecasts, ShippingOutcome,
};
use crate::domain::{Company, Department, PerLine, Pool, ProductLine};
use crate::error::{SimError, SimResult};
use crate::inventory::{available, pending_order_lines, place_orders, receive_due_orders, InventoryLedger};
use crate::invariants::check_week;
use crate::production::{constrain_assembly, constrain_parts, plan_department, record_last_part_types, reject_rate};
use crate::repairs::generate_repairs;
use crate::report::{ProductionReport, WeeklyReport};
use crate::state::create_company;
use crate::validation::{validate_decisions, ValidationReport};
use crate::workforce::{advance_levels, assign_machines, process_workforce};

/// Seed for `week` derived from a game's base seed. Stable across runs
/// and platforms.
pub fn week_seed(base_seed: u64, week: u32) -> u64 {
    let mut z = base_seed ^ u64::from(week).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Stateless weekly engine bound to one validated configuration.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn create_company(&self, company_id: u32) -> Company {
        create_company(&self.config, company_id)
    }

    /// Dry-run validation with no state change.
    pub fn validate(&self, company: &Company, decisions: &Decisions) -> ValidationReport {
        validate_decisions(decisions, company, &self.config)
    }

    pub fn is_game_over(&self, company: &Company) -> bool {
        company.current_week >= self.config.game.max_weeks
    }

    /// Process one week. `seed = None` draws from OS entropy.
    ///
    /// Fails with `GameOver` past the last week, `Validation` before any
    /// change, or `Consistency` if the finished week breaks an invariant.
    pub fn process_week(
        &self,
        company: Company,
        decisions: &Decisions,
        seed: Option<u64>,
    ) -> SimResult<(WeeklyReport, Company)> {
        if self.is_game_over(&company) {
            return Err(SimError::GameOver {
                max_weeks: self.config.game.max_weeks,
            });
        }

        let validation = validate_decisions(decisions, &company, &self.config);
        for issue in &validation.warnings {
            log::warn!("company {} week {}: {}", company.company_id, decisions.week, issue);
        }
        let warnings = validation.into_result()?;

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.run_week(company, decisions, warnings, &mut rng)
    }

    /// Play `schedule` from `company`, seeding week `w` with
    /// `week_seed(base_seed, w)`.
    pub fn play(
        &self,
        mut company: Company,
        schedule: &[Decisions],
        base_seed: u64,
    ) -> SimResult<(Vec<WeeklyReport>, Company)> {
        let mut reports = Vec::with_capacity(schedule.len());
        for decisions in schedule {
            let (report, next) =
                self.process_week(company, decisions, Some(week_seed(base_seed, decisions.week)))?;
            reports.push(report);
            company = next;
        }
        Ok((reports, company))
    }

    fn run_week(
        &self,
        prior: Company,
        decisions: &Decisions,
        mut warnings: Vec<String>,
        rng: &mut StdRng,
    ) -> SimResult<(WeeklyReport, Company)> {
        let cfg = &self.config;
        let week = prior.current_week + 1;
        let mut next = prior.clone();

        // -- ApplyDecisions --
        assign_machines(&mut next.machines, decisions);
        initialize_schedule(&mut next.demand, week, &cfg.game, &cfg.demand, rng)?;

        // -- ProcessWorkforce --
        let mut workforce = process_workforce(&mut next, decisions, &cfg.workforce, rng)?;
        log::debug!(
            "week {}: hired {:?}, terminated {:?}, training {:?}",
            week,
            workforce.hired,
            workforce.terminated,
            workforce.sent_to_training
        );

        // -- ReceiveOrders --
        let mut ledger = InventoryLedger::open(&next.inventory);
        let receipts = receive_due_orders(&mut next.inventory, &mut next.orders, &mut ledger, week)?;
        let orders = place_orders(&mut next.orders, decisions, week, &cfg.logistics);

        // -- CalculateProduction / UpdateInventory --
        let rate = reject_rate(decisions.quality_budget, &cfg.quality);
        let mut parts = plan_department(&next, Department::Parts, cfg, rate, rng);
        let raw_used = constrain_parts(
            &mut parts,
            available(&next.inventory, Pool::RawMaterials),
            &cfg.production,
        );
        ledger.consume(&mut next.inventory, Pool::RawMaterials, raw_used.total())?;
        for line in ProductLine::ALL {
            ledger.produce(&mut next.inventory, Pool::Part(line), parts.net.get(line))?;
        }

        let mut assembly = plan_department(&next, Department::Assembly, cfg, rate, rng);
        let parts_used = constrain_assembly(&mut assembly, next.inventory.parts, &cfg.production);
        for line in ProductLine::ALL {
            ledger.consume(&mut next.inventory, Pool::Part(line), parts_used.get(line))?;
            ledger.produce(&mut next.inventory, Pool::Product(line), assembly.net.get(line))?;
        }

        let production = ProductionReport {
            reject_rate: rate,
            parts,
            assembly,
        };
        record_last_part_types(&mut next.machines, &production);
        warnings.extend(shortage_warnings(&production));

        // -- ProcessDemand --
        refresh_forecasts(&mut next.demand, week, &cfg.demand, rng)?;
        let shipping = if is_shipping_week(week, cfg.game.shipping_frequency) {
            let outcome = process_shipping_week(&next.demand, week, next.inventory.products)?;
            for line in &outcome.lines {
                ledger.ship(&mut next.inventory, line.product, line.shipped)?;
            }
            apply_shipping_outcome(&mut next.demand, &outcome, &cfg.game, &cfg.demand, rng)?;
            Some(outcome)
        } else {
            None
        };

        // -- GenerateStochasticRepairs --
        let repairs = generate_repairs(&production, decisions.maintenance_budget, &cfg.repair, rng);

        // -- CalculateCosts --
        let short = shipping.as_ref().map(ShippingOutcome::short).unwrap_or_default();
        let weekly_costs = calculate_costs(
            &CostInputs {
                decisions,
                production: &production,
                receipts: &receipts,
                raw_materials_consumed: raw_used,
                ending: &next.inventory,
                short,
                repairs: &repairs,
                workforce: &workforce,
                orders,
            },
            cfg,
        );
        next.cumulative_costs.accumulate(&weekly_costs);
        next.total_costs += weekly_costs.total();

        let standard = standard_costs(&production, cfg);
        let net_units = production.total_net_units();
        let (demanded, shipped, actual_demand) = shipping
            .as_ref()
            .map(|o| {
                let actual: f64 = o.lines.iter().map(|l| l.actual_demand).sum();
                (o.total_demand(), o.total_shipped(), actual)
            })
            .unwrap_or((0.0, 0.0, 0.0));
        let weekly_performance = performance_metrics(
            standard,
            weekly_costs.total(),
            net_units,
            demanded,
            shipped,
            shipping.is_some(),
        );
        next.performance.standard_costs += standard;
        next.performance.actual_costs += weekly_costs.total();
        next.performance.net_units += net_units;
        next.performance.units_demanded += actual_demand;
        next.performance.units_shipped += shipped;

        // -- AdvanceWeek --
        workforce.level_ups = advance_levels(&mut next, &cfg.workforce);
        workforce.headcount = next.workforce.len();
        next.current_week = week;

        // -- BuildReport --
        let report = WeeklyReport {
            week,
            company_id: next.company_id,
            weekly_costs,
            cumulative_costs: next.cumulative_costs,
            production,
            inventory: ledger.close(&next.inventory),
            pending_orders: pending_order_lines(&next.orders),
            demand: demand_lines(&next.demand),
            shipments: shipping.map(|o| o.lines),
            workforce,
            repairs,
            weekly_performance,
            cumulative_performance: cumulative_metrics(&next.performance),
            warnings,
        };

        check_week(&prior, &next, &report)?;
        next.last_report = Some(report.clone());

        log::info!(
            "company {} week {}: cost {:.2} (cumulative {:.2}), net units {:.0}, efficiency {:.1}%",
            next.company_id,
            week,
            report.weekly_costs.total(),
            next.total_costs,
            net_units,
            report.weekly_performance.percent_efficiency
        );
        Ok((report, next))
    }
}

fn shortage_warnings(production: &ProductionReport) -> Vec<String> {
    let mut out = Vec::new();
    let short = |dept: PerLine| dept.iter().filter(|(_, v)| *v > 0.0).collect::<Vec<_>>();
    for (line, units) in short(production.parts.shortage) {
        out.push(format!(
            "raw materials ran short: {:.0} units of {} not produced",
            units,
            line.part_label()
        ));
    }
    for (line, units) in short(production.assembly.shortage) {
        out.push(format!(
            "parts ran short: {:.0} units of {} not assembled",
            units,
            line.product_label()
        ));
    }
    out
}
