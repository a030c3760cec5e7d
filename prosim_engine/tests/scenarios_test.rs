/// Scenario tests: small hand-checked games exercising one rule each.

use prosim_engine::demand::process_shipping_week;
use prosim_engine::domain::{DemandSchedule, PerLine, ProductLine, TrainingStatus};
use prosim_engine::engine::week_seed;
use prosim_engine::{Company, Decisions, SimError, Simulation, SimulationConfig, WeeklyReport};

fn simulation() -> Simulation {
    Simulation::new(SimulationConfig::default()).unwrap()
}

fn run(sim: &Simulation, company: Company, decisions: &Decisions) -> (WeeklyReport, Company) {
    sim.process_week(company, decisions, Some(week_seed(77, decisions.week)))
        .unwrap_or_else(|e| panic!("week {} failed: {}", decisions.week, e))
}

/// Machines 1..=8 busy; machine 9 left idle.
fn all_but_nine(week: u32) -> Decisions {
    let mut d = Decisions::idle(week, 1, 9).with_raw_material_orders(8000.0, 2000.0);
    for (id, line) in (1..=8).zip(ProductLine::ALL.iter().cycle()) {
        d = d.schedule(id, *line, 40.0);
    }
    d
}

#[test]
fn quality_budget_sets_uniform_reject_rate() {
    let sim = simulation();
    let d = Decisions::idle(1, 1, 9)
        .schedule(1, ProductLine::X, 40.0)
        .schedule(3, ProductLine::Z, 40.0)
        .schedule(5, ProductLine::X, 40.0)
        .with_budgets(750.0, 0.0);
    let (report, _) = run(&sim, sim.create_company(1), &d);

    let rate = report.production.reject_rate;
    assert!((0.14..=0.18).contains(&rate), "reject rate {}", rate);
    let producing: Vec<_> = report
        .production
        .parts
        .machines
        .iter()
        .chain(report.production.assembly.machines.iter())
        .filter(|m| m.produced())
        .collect();
    assert_eq!(producing.len(), 3);
    for row in producing {
        assert!((row.rejects / row.gross_units - rate).abs() < 1e-9);
    }
    assert_eq!(report.weekly_costs.overhead.quality_planning, 750.0);
}

#[test]
fn changing_part_type_costs_setup_once() {
    let sim = simulation();
    let company = sim.create_company(1);
    let week1 = Decisions::idle(1, 1, 9).schedule(1, ProductLine::X, 40.0);
    let (r1, company) = run(&sim, company, &week1);
    assert_eq!(r1.production.machine(1).unwrap().setup_hours, 0.0);
    assert_eq!(r1.weekly_costs.x.machine_setup, 0.0);

    let week2 = Decisions::idle(2, 1, 9).schedule(1, ProductLine::Y, 40.0);
    let (r2, company) = run(&sim, company, &week2);
    assert_eq!(r2.production.machine(1).unwrap().setup_hours, 2.0);
    assert_eq!(r2.weekly_costs.y.machine_setup, 80.0);

    let week3 = Decisions::idle(3, 1, 9).schedule(1, ProductLine::Y, 40.0);
    let (r3, _) = run(&sim, company, &week3);
    assert_eq!(r3.production.machine(1).unwrap().setup_hours, 0.0);
}

#[test]
fn switch_with_no_output_still_counts_as_set_up() {
    let sim = simulation();
    let company = sim.create_company(1);
    let on = |week: u32, line: ProductLine, hours: f64| {
        Decisions::idle(week, 1, 9).schedule(1, line, hours).with_budgets(750.0, 0.0)
    };

    let (_, company) = run(&sim, company, &on(1, ProductLine::X, 40.0));

    // Two hours is all setup: the switch is paid for but nothing is made.
    let (r2, company) = run(&sim, company, &on(2, ProductLine::Y, 2.0));
    let row = r2.production.machine(1).unwrap();
    assert_eq!(row.setup_hours, 2.0);
    assert_eq!(row.gross_units, 0.0);
    assert_eq!(r2.weekly_costs.y.machine_setup, 80.0);
    assert_eq!(company.machines().get(1).unwrap().last_part_type, Some(ProductLine::Y));

    let (r3, _) = run(&sim, company, &on(3, ProductLine::Y, 40.0));
    assert_eq!(r3.production.machine(1).unwrap().setup_hours, 0.0);
    assert_eq!(r3.weekly_costs.y.machine_setup, 0.0);
    assert!(r3.production.machine(1).unwrap().produced());
}

#[test]
fn starved_week_warns_balances_and_keeps_setup() {
    let sim = simulation();
    let week1 = Decisions::idle(1, 1, 9).schedule(1, ProductLine::X, 40.0).with_budgets(750.0, 0.0);
    let (_, mut company) = run(&sim, sim.create_company(1), &week1);
    company.inventory.raw_materials = 0.0;

    // Switch lines with no raw materials; an expedited order lands next week.
    let week2 = Decisions::idle(2, 1, 9)
        .schedule(1, ProductLine::Y, 40.0)
        .with_budgets(750.0, 0.0)
        .with_raw_material_orders(3000.0, 5000.0);
    let (r2, company) = run(&sim, company, &week2);
    let row = r2.production.machine(1).unwrap();
    assert_eq!(row.setup_hours, 2.0);
    assert_eq!(row.gross_units, 0.0);
    assert!(row.shortage_units > 0.0);
    assert_eq!(r2.weekly_costs.y.machine_setup, 80.0);
    assert!(
        r2.warnings.iter().any(|w| w.contains("raw materials ran short")),
        "{:?}",
        r2.warnings
    );
    for flow in &r2.inventory.pools {
        assert!(flow.balances(), "{:?} does not balance", flow.pool);
    }
    assert_eq!(company.inventory().raw_materials, 0.0);

    let week3 = Decisions::idle(3, 1, 9).schedule(1, ProductLine::Y, 40.0).with_budgets(750.0, 0.0);
    let (r3, company) = run(&sim, company, &week3);
    let row = r3.production.machine(1).unwrap();
    assert_eq!(row.setup_hours, 0.0);
    assert!(row.produced());
    assert_eq!(r3.weekly_costs.y.machine_setup, 0.0);
    assert!(company.inventory().raw_materials < 5000.0);
}

#[test]
fn zero_quality_budget_caps_rejects() {
    let sim = simulation();
    let d = Decisions::idle(1, 1, 9).schedule(1, ProductLine::X, 40.0);
    let (report, _) = run(&sim, sim.create_company(1), &d);
    assert_eq!(report.production.reject_rate, 0.30);
    let row = report.production.machine(1).unwrap();
    assert!(row.net_units > 0.0);
    assert!((row.net_units - row.gross_units * 0.70).abs() < 1e-9);
    assert!(report.warnings.iter().any(|w| w.starts_with("quality_budget")));
}

#[test]
fn idle_operator_is_terminated_in_week_three_then_replaced() {
    let sim = simulation();
    let mut company = sim.create_company(1);

    for week in 1..=2 {
        let (report, next) = run(&sim, company, &all_but_nine(week));
        assert_eq!(report.workforce.unscheduled, vec![9]);
        assert_eq!(report.weekly_costs.overhead.layoff_firing, 200.0);
        company = next;
    }
    assert_eq!(company.workforce().get(9).unwrap().weeks_unscheduled, 2);

    let (r3, company) = run(&sim, company, &all_but_nine(3));
    assert_eq!(r3.workforce.terminated, vec![9]);
    assert!(r3.workforce.unscheduled.is_empty());
    assert_eq!(r3.weekly_costs.overhead.layoff_firing, 400.0);
    assert!(company.workforce().get(9).is_none());
    assert_eq!(company.machines().get(9).unwrap().operator_id, None);
    assert_eq!(r3.workforce.headcount, 8);

    // Scheduling the empty machine hires a level-0 operator the same week.
    let week4 = all_but_nine(4).schedule(9, ProductLine::Z, 40.0);
    let (r4, company) = run(&sim, company, &week4);
    assert_eq!(r4.workforce.hired, vec![10]);
    assert_eq!(r4.weekly_costs.overhead.hiring, 2700.0);

    let config = sim.config();
    let hire = company.workforce().get(10).unwrap();
    assert_eq!(hire.status, TrainingStatus::Untrained);
    let row = r4.production.machine(9).unwrap();
    assert_eq!(row.operator_id, Some(10));
    let level0 = f64::from(config.workforce.time_efficiency[0][hire.quality_tier as usize]) / 100.0
        * hire.proficiency;
    assert!((row.efficiency - level0).abs() < 1e-12);
    // One week of work moves the new hire to level 1.
    assert!(r4.workforce.level_ups.contains(&10));
    assert_eq!(hire.training_level, 1);
}

#[test]
fn unmet_demand_carries_over() {
    let forecast = |product: &str, actual: f64| {
        serde_json::json!({
            "product": product, "shipping_week": 4, "mean": actual, "std_dev": 0.0,
            "weeks_until_shipping": 0, "estimate": actual, "revealed": true, "actual": actual
        })
    };
    let schedule: DemandSchedule = serde_json::from_value(serde_json::json!({
        "forecasts": [forecast("X", 700.0), forecast("Y", 400.0), forecast("Z", 200.0)],
        "carryover": {"x": 0.0, "y": 0.0, "z": 0.0}
    }))
    .unwrap();

    let outcome = process_shipping_week(&schedule, 4, PerLine::new(650.0, 400.0, 500.0)).unwrap();
    let x = outcome.lines.iter().find(|l| l.product == ProductLine::X).unwrap();
    assert_eq!(x.shipped, 650.0);
    assert_eq!(x.short, 50.0);
    assert_eq!(outcome.short(), PerLine::new(50.0, 0.0, 0.0));
    assert_eq!(outcome.shipped().z, 200.0);
}

#[test]
fn shipping_week_moves_stock_and_carries_shortfall() {
    let sim = simulation();
    let mut company = sim.create_company(1);
    let mut last = None;
    for week in 1..=4 {
        let (report, next) = run(&sim, company, &Decisions::idle(week, 1, 9));
        company = next;
        last = Some(report);
    }
    let report = last.unwrap();
    let shipments = report.shipments.as_ref().unwrap();
    for line in shipments {
        // No assembly ran, so nothing could ship.
        assert_eq!(line.shipped, 0.0);
        assert_eq!(line.short, line.total_demand);
        assert_eq!(report.demand_for(line.product).unwrap().carryover, line.short);
    }
    let penalty: f64 = shipments.iter().map(|l| l.short * 10.0).sum();
    let charged: f64 = ProductLine::ALL
        .iter()
        .map(|&l| report.weekly_costs.product(l).demand_penalty)
        .sum();
    assert!((penalty - charged).abs() < 1e-6);
    let demanded: f64 = shipments.iter().map(|l| l.total_demand).sum();
    let expected = if demanded > 0.0 { 0.0 } else { 100.0 };
    assert_eq!(report.weekly_performance.on_time_delivery, Some(expected));
}

#[test]
fn invalid_decisions_leave_company_untouched() {
    let sim = simulation();
    let company = sim.create_company(1);
    let mut bad = Decisions::idle(1, 1, 9);
    bad.machines[0].scheduled_hours = 60.0;
    bad.machines[1].part_type = 0;

    let report = sim.validate(&company, &bad);
    assert_eq!(report.errors.len(), 2);

    let err = sim.process_week(company.clone(), &bad, Some(1)).unwrap_err();
    match err {
        SimError::Validation(messages) => assert_eq!(messages.len(), 2),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(company, sim.create_company(1));
    assert_eq!(company.current_week(), 0);
}

#[test]
fn training_week_produces_nothing_and_levels_up() {
    let sim = simulation();
    let company = sim.create_company(1);
    let d = Decisions::idle(1, 1, 9).train(2).schedule(1, ProductLine::X, 40.0);
    let (r1, company) = run(&sim, company, &d);
    assert_eq!(r1.workforce.sent_to_training, vec![2]);
    assert_eq!(r1.weekly_costs.overhead.training, 1000.0);
    assert!(!r1.production.machine(2).unwrap().produced());
    assert_eq!(company.workforce().get(2).unwrap().status, TrainingStatus::InTraining);

    let (r2, company) = run(&sim, company, &Decisions::idle(2, 1, 9).schedule(1, ProductLine::X, 40.0));
    assert_eq!(r2.workforce.completed_training, vec![2]);
    let op = company.workforce().get(2).unwrap();
    assert_eq!(op.status, TrainingStatus::Trained);
    assert_eq!(op.training_level, 9);
}
