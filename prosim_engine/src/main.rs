/// Prosim Engine - Determinism Harness
///
/// Plays a full game twice from the same base seed and compares the
/// weekly report hashes.
///
/// Usage: prosim_engine [DECISIONS.json] [--seed N] [--config CONFIG.json]
///
/// DECISIONS.json is a JSON array of weekly decision records. Without it
/// a steady schedule is generated for every week of the game.

use std::fs;
use std::process;

use prosim_engine::domain::ProductLine;
use prosim_engine::hashing::canonical_report_hash;
use prosim_engine::{Decisions, SimResult, Simulation, SimulationConfig, WeeklyReport};

struct Args {
    decisions_path: Option<String>,
    config_path: Option<String>,
    seed: u64,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        decisions_path: None,
        config_path: None,
        seed: 2024,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--seed" => {
                let value = iter.next().ok_or("--seed needs a value")?;
                args.seed = value
                    .parse()
                    .map_err(|e| format!("bad --seed {:?}: {}", value, e))?;
            }
            "--config" => {
                args.config_path = Some(iter.next().ok_or("--config needs a path")?);
            }
            other if other.starts_with("--") => return Err(format!("unknown flag {}", other)),
            path => args.decisions_path = Some(path.to_string()),
        }
    }
    Ok(args)
}

/// Every machine on a fixed line at 40 hours, with raw materials
/// reordered each week.
fn steady_schedule(config: &SimulationConfig, company_id: u32) -> Vec<Decisions> {
    let machines = config.game.machine_count();
    (1..=config.game.max_weeks)
        .map(|week| {
            let mut d = Decisions::idle(week, company_id, machines)
                .with_budgets(750.0, 500.0)
                .with_raw_material_orders(6000.0, 0.0);
            for id in 1..=machines {
                let line = ProductLine::ALL[((id - 1) % 3) as usize];
                d = d.schedule(id, line, 40.0);
            }
            d
        })
        .collect()
}

fn play_hashes(sim: &Simulation, schedule: &[Decisions], seed: u64) -> SimResult<Vec<(WeeklyReport, String)>> {
    let company_id = schedule.first().map(|d| d.company_id).unwrap_or(1);
    let (reports, _) = sim.play(sim.create_company(company_id), schedule, seed)?;
    reports
        .into_iter()
        .map(|r| {
            let hash = canonical_report_hash(&r)?;
            Ok((r, hash))
        })
        .collect()
}

fn run() -> Result<bool, String> {
    let args = parse_args()?;

    let config = match &args.config_path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
            SimulationConfig::from_json_str(&text).map_err(|e| e.to_string())?
        }
        None => SimulationConfig::default(),
    };
    let sim = Simulation::new(config).map_err(|e| e.to_string())?;

    let schedule = match &args.decisions_path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
            serde_json::from_str::<Vec<Decisions>>(&text).map_err(|e| format!("{}: {}", path, e))?
        }
        None => steady_schedule(sim.config(), 1),
    };

    let first = play_hashes(&sim, &schedule, args.seed).map_err(|e| e.to_string())?;
    let second = play_hashes(&sim, &schedule, args.seed).map_err(|e| e.to_string())?;

    for (report, hash) in &first {
        println!(
            "week {:>2}  cost {:>12.2}  cumulative {:>12.2}  {}",
            report.week,
            report.weekly_costs.total(),
            report.cumulative_costs.total(),
            hash
        );
    }

    let deterministic = first.iter().map(|(_, h)| h).eq(second.iter().map(|(_, h)| h));
    if deterministic {
        println!("[OK] {} weeks replayed with identical hashes (seed {})", first.len(), args.seed);
    } else {
        println!("[FAIL] replay hashes differ (seed {})", args.seed);
    }
    Ok(deterministic)
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(message) => {
            eprintln!("error: {}", message);
            process::exit(2);
        }
    }
}
