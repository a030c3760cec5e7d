/// Prosim Engine - Decision Validation
///
/// Checks a decision record against the company it targets before any
/// state changes. Errors reject the week; warnings are carried into the
/// report.

use std::collections::BTreeSet;
use std::fmt;

use crate::config::SimulationConfig;
use crate::decisions::Decisions;
use crate::domain::{Company, Department};
use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub field: String,
    pub message: String,
}

impl Issue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationReport {
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(Issue::new(field, message));
    }

    fn warn(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(Issue::new(field, message));
    }

    /// Promote every warning to an error.
    pub fn strict(mut self) -> Self {
        self.errors.append(&mut self.warnings);
        self
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(Issue::to_string).collect()
    }

    /// `Ok(warnings)` when valid, otherwise a `SimError::Validation`
    /// listing every error.
    pub fn into_result(self) -> SimResult<Vec<String>> {
        if self.errors.is_empty() {
            Ok(self.warning_messages())
        } else {
            Err(SimError::Validation(
                self.errors.iter().map(Issue::to_string).collect(),
            ))
        }
    }
}

/// Validate `decisions` for the week after `company.current_week`.
pub fn validate_decisions(
    decisions: &Decisions,
    company: &Company,
    config: &SimulationConfig,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_identity(decisions, company, &mut report);
    check_budgets(decisions, config, &mut report);
    check_orders(decisions, config, &mut report);
    check_machines(decisions, company, config, &mut report);
    report
}

fn check_identity(decisions: &Decisions, company: &Company, report: &mut ValidationReport) {
    let expected = company.current_week + 1;
    if decisions.week != expected {
        report.error(
            "week",
            format!(
                "decisions are for week {} but the company is due week {}",
                decisions.week, expected
            ),
        );
    }
    if decisions.company_id != company.company_id {
        report.error(
            "company_id",
            format!(
                "decisions are for company {} but this is company {}",
                decisions.company_id, company.company_id
            ),
        );
    }
}

fn check_budgets(decisions: &Decisions, config: &SimulationConfig, report: &mut ValidationReport) {
    let limits = &config.limits;
    for (field, value) in [
        ("quality_budget", decisions.quality_budget),
        ("maintenance_budget", decisions.maintenance_budget),
    ] {
        if !value.is_finite() || value < 0.0 {
            report.error(field, format!("must be a non-negative amount (got {})", value));
        } else if value > limits.budget_limit {
            report.error(
                field,
                format!("{} exceeds the limit of {}", value, limits.budget_limit),
            );
        } else if value > limits.budget_warning {
            report.warn(field, format!("{} is unusually high", value));
        }
    }
    if decisions.quality_budget == 0.0 {
        report.warn(
            "quality_budget",
            format!(
                "no quality budget, rejects run at the {:.0}% ceiling",
                config.quality.reject_ceiling * 100.0
            ),
        );
    }
}

fn check_orders(decisions: &Decisions, config: &SimulationConfig, report: &mut ValidationReport) {
    let mut quantities = vec![
        ("raw_materials_regular".to_string(), decisions.raw_materials_regular),
        ("raw_materials_expedited".to_string(), decisions.raw_materials_expedited),
    ];
    for (line, qty) in decisions.part_orders.iter() {
        quantities.push((format!("part_orders.{}", line.part_label()), qty));
    }
    for (field, qty) in quantities {
        if !qty.is_finite() || qty < 0.0 {
            report.error(field, format!("order quantity cannot be negative (got {})", qty));
        }
    }

    if decisions.raw_materials_expedited > 0.0 && decisions.raw_materials_regular <= 0.0 {
        report.warn(
            "raw_materials_expedited",
            format!(
                "expedited order without a regular order costs an extra {}",
                config.costs.expedite_premium
            ),
        );
    }
    let total_parts = decisions.total_parts_ordered();
    if total_parts > config.limits.parts_order_warning {
        report.warn(
            "part_orders",
            format!("buying {} parts is expensive compared to making them", total_parts),
        );
    }
}

fn check_machines(
    decisions: &Decisions,
    company: &Company,
    config: &SimulationConfig,
    report: &mut ValidationReport,
) {
    let expected = config.game.machine_count() as usize;
    if decisions.machines.len() != expected {
        report.error(
            "machines",
            format!(
                "expected {} machine decisions, got {}",
                expected,
                decisions.machines.len()
            ),
        );
        return;
    }

    let max_hours = config.game.max_scheduled_hours;
    let mut seen = BTreeSet::new();
    let mut parts_hours = 0.0;
    let mut assembly_hours = 0.0;

    for md in &decisions.machines {
        let field = format!("machine_{}", md.machine_id);
        let Some(machine) = company.machines.get(md.machine_id) else {
            report.error(
                field,
                format!("unknown machine id (valid ids are 1..={})", expected),
            );
            continue;
        };
        if !seen.insert(md.machine_id) {
            report.error(field, "duplicate decision for this machine");
            continue;
        }
        if !md.scheduled_hours.is_finite()
            || md.scheduled_hours < 0.0
            || md.scheduled_hours > max_hours
        {
            report.error(
                format!("{}.scheduled_hours", field),
                format!("must lie in 0..={} (got {})", max_hours, md.scheduled_hours),
            );
        }
        if md.line().is_none() {
            report.error(
                format!("{}.part_type", field),
                format!("must be 1, 2 or 3 (got {})", md.part_type),
            );
        }
        if md.is_working() {
            match machine.department {
                Department::Parts => parts_hours += md.scheduled_hours,
                Department::Assembly => assembly_hours += md.scheduled_hours,
            }
        }
    }

    if parts_hours > 0.0 && assembly_hours == 0.0 {
        report.warn("machines", "parts are scheduled but no assembly is");
    }
    let training = decisions.operators_training().len();
    if training > config.limits.training_warning {
        report.warn(
            "machines",
            format!("training {} operators at once will cut production sharply", training),
        );
    }
}
