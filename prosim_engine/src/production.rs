/// Prosim Engine - Production
///
/// Per-machine output for one department, the reject-rate curve, and the
/// stock constraint that scales a line down when its inputs run short.

use rand::Rng;

use crate::arithmetic::{snap_zero, EPSILON};
use crate::config::{ProductionConfig, QualityConfig, SimulationConfig};
use crate::domain::{Company, Department, Machine, MachineFloor, PerLine, ProductLine};
use crate::report::{DepartmentProduction, MachineProduction, ProductionReport};
use crate::workforce::machine_efficiency;

// ── Quality ────────────────────────────────────────────────────────

/// Reject fraction for a quality budget:
/// `clamp(intercept - slope * ln(budget), floor, ceiling)`.
/// A non-positive budget gets the ceiling without touching `ln`.
pub fn reject_rate(quality_budget: f64, config: &QualityConfig) -> f64 {
    if quality_budget.is_nan() || quality_budget <= 0.0 {
        return config.reject_ceiling;
    }
    let raw = config.reject_intercept - config.reject_slope * quality_budget.ln();
    raw.clamp(config.reject_floor, config.reject_ceiling)
}

// ── Machines ───────────────────────────────────────────────────────

fn standard_rate(config: &ProductionConfig, department: Department, line: ProductLine) -> f64 {
    match department {
        Department::Parts => config.parts_rates.get(line),
        Department::Assembly => config.assembly_rates.get(line),
    }
}

/// Setup is charged only when the machine switches from a different line.
pub fn setup_hours(machine: &Machine, line: ProductLine, config: &ProductionConfig) -> f64 {
    match machine.last_part_type {
        Some(previous) if previous != line => match machine.department {
            Department::Parts => config.setup_hours_parts,
            Department::Assembly => config.setup_hours_assembly,
        },
        _ => 0.0,
    }
}

fn idle_row(machine: &Machine) -> MachineProduction {
    MachineProduction {
        machine_id: machine.id,
        department: machine.department,
        operator_id: machine.operator_id,
        line: machine.assignment,
        operator_in_training: machine.operator_in_training,
        scheduled_hours: machine.scheduled_hours,
        setup_hours: 0.0,
        productive_hours: 0.0,
        efficiency: 0.0,
        gross_units: 0.0,
        rejects: 0.0,
        net_units: 0.0,
        shortage_units: 0.0,
    }
}

/// One machine's unconstrained week.
pub fn machine_output<R: Rng>(
    company: &Company,
    machine: &Machine,
    config: &SimulationConfig,
    reject_rate: f64,
    rng: &mut R,
) -> MachineProduction {
    let mut row = idle_row(machine);
    let Some(line) = machine.assignment else {
        return row;
    };
    if machine.operator_id.is_none() || machine.operator_in_training || machine.scheduled_hours <= 0.0 {
        return row;
    }

    let efficiency = machine_efficiency(company, machine, &config.workforce, rng);
    let setup = setup_hours(machine, line, &config.production);
    let available = (machine.scheduled_hours - setup).max(0.0);
    let productive = available * efficiency;
    let gross = productive * standard_rate(&config.production, machine.department, line);
    let rejects = gross * reject_rate;

    row.setup_hours = setup.min(machine.scheduled_hours);
    row.efficiency = efficiency;
    row.productive_hours = productive;
    row.gross_units = gross;
    row.rejects = rejects;
    row.net_units = gross - rejects;
    row
}

/// Unconstrained output for every machine in `department`.
pub fn plan_department<R: Rng>(
    company: &Company,
    department: Department,
    config: &SimulationConfig,
    reject_rate: f64,
    rng: &mut R,
) -> DepartmentProduction {
    let mut dept = DepartmentProduction {
        machines: company
            .machines
            .in_department(department)
            .map(|m| machine_output(company, m, config, reject_rate, &mut *rng))
            .collect(),
        ..Default::default()
    };
    dept.recompute_totals();
    dept
}

// ── Stock constraint ───────────────────────────────────────────────

/// Scale every machine on `line` by `scale` and record the lost gross.
fn scale_line(dept: &mut DepartmentProduction, line: ProductLine, scale: f64) {
    for row in dept.machines.iter_mut().filter(|r| r.line == Some(line)) {
        if row.gross_units <= 0.0 {
            continue;
        }
        let before = row.gross_units;
        row.gross_units *= scale;
        row.rejects *= scale;
        row.net_units = row.gross_units - row.rejects;
        row.productive_hours *= scale;
        row.shortage_units += snap_zero(before - row.gross_units);
    }
}

/// Fraction of `required` that `available` covers.
fn coverage(required: f64, available: f64) -> f64 {
    if required <= EPSILON || available >= required {
        1.0
    } else {
        (available.max(0.0) / required).clamp(0.0, 1.0)
    }
}

/// Fit Parts output to the raw materials on hand, allocating X then Y
/// then Z. Returns raw materials consumed per line.
pub fn constrain_parts(dept: &mut DepartmentProduction, raw_available: f64, config: &ProductionConfig) -> PerLine {
    let mut remaining = raw_available.max(0.0);
    let mut consumed = PerLine::default();
    for line in ProductLine::ALL {
        let required = dept.gross.get(line) * config.raw_materials_per_part.get(line);
        let scale = coverage(required, remaining);
        if scale < 1.0 {
            log::warn!(
                "raw materials short for {}: need {:.1}, have {:.1}",
                line.part_label(),
                required,
                remaining
            );
            scale_line(dept, line, scale);
        }
        let used = (required * scale).min(remaining);
        remaining -= used;
        *consumed.get_mut(line) = used;
    }
    dept.recompute_totals();
    consumed
}

/// Fit Assembly output to the parts on hand. Returns parts consumed.
pub fn constrain_assembly(
    dept: &mut DepartmentProduction,
    parts_available: PerLine,
    config: &ProductionConfig,
) -> PerLine {
    let mut consumed = PerLine::default();
    for line in ProductLine::ALL {
        let available = parts_available.get(line).max(0.0);
        let required = dept.gross.get(line) * config.parts_per_product.get(line);
        let scale = coverage(required, available);
        if scale < 1.0 {
            log::warn!(
                "parts short for {}: need {:.1} {}, have {:.1}",
                line.product_label(),
                required,
                line.part_label(),
                available
            );
            scale_line(dept, line, scale);
        }
        *consumed.get_mut(line) = (required * scale).min(available);
    }
    dept.recompute_totals();
    consumed
}

// ── Floor bookkeeping ──────────────────────────────────────────────

/// Machines that were set up or produced remember their line for next
/// week's setup, even when a shortage or short schedule left no output.
pub fn record_last_part_types(floor: &mut MachineFloor, report: &ProductionReport) {
    for machine in &mut floor.machines {
        if let Some(row) = report.machine(machine.id) {
            if row.setup_hours > 0.0 || row.produced() {
                machine.last_part_type = row.line;
            }
        }
    }
}
