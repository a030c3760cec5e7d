/// Prosim Engine - Weekly Decisions
///
/// The record a player submits each week. Parsing the legacy
/// fixed-column decision file happens outside the engine; this is the
/// already-parsed form.

use serde::{Deserialize, Serialize};

use crate::domain::{PerLine, ProductLine};

/// One line of machine instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineDecision {
    pub machine_id: u32,
    /// Send this machine's operator to training for the week.
    pub send_for_training: bool,
    /// 1 = X/X', 2 = Y/Y', 3 = Z/Z'.
    pub part_type: u8,
    pub scheduled_hours: f64,
}

impl MachineDecision {
    pub fn line(&self) -> Option<ProductLine> {
        ProductLine::from_code(self.part_type)
    }

    /// Working (not training) with hours on the clock.
    pub fn is_working(&self) -> bool {
        !self.send_for_training && self.scheduled_hours > 0.0
    }

    /// Needs an operator this week, either to work or to train.
    pub fn needs_operator(&self) -> bool {
        self.send_for_training || self.scheduled_hours > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Decisions {
    pub week: u32,
    pub company_id: u32,
    pub quality_budget: f64,
    pub maintenance_budget: f64,
    pub raw_materials_regular: f64,
    pub raw_materials_expedited: f64,
    pub part_orders: PerLine,
    pub machines: Vec<MachineDecision>,
}

impl Decisions {
    /// Every machine idle, nothing ordered, no budgets.
    pub fn idle(week: u32, company_id: u32, machine_count: u32) -> Self {
        Self {
            week,
            company_id,
            quality_budget: 0.0,
            maintenance_budget: 0.0,
            raw_materials_regular: 0.0,
            raw_materials_expedited: 0.0,
            part_orders: PerLine::default(),
            machines: (1..=machine_count)
                .map(|machine_id| MachineDecision {
                    machine_id,
                    send_for_training: false,
                    part_type: ((machine_id - 1) % 3 + 1) as u8,
                    scheduled_hours: 0.0,
                })
                .collect(),
        }
    }

    pub fn machine(&self, machine_id: u32) -> Option<&MachineDecision> {
        self.machines.iter().find(|m| m.machine_id == machine_id)
    }

    /// Schedule `hours` of `line` on `machine_id`.
    pub fn schedule(mut self, machine_id: u32, line: ProductLine, hours: f64) -> Self {
        if let Some(m) = self.machines.iter_mut().find(|m| m.machine_id == machine_id) {
            m.part_type = line.code();
            m.scheduled_hours = hours;
            m.send_for_training = false;
        }
        self
    }

    /// Send the operator on `machine_id` to training.
    pub fn train(mut self, machine_id: u32) -> Self {
        if let Some(m) = self.machines.iter_mut().find(|m| m.machine_id == machine_id) {
            m.send_for_training = true;
            m.scheduled_hours = 0.0;
        }
        self
    }

    pub fn with_budgets(mut self, quality: f64, maintenance: f64) -> Self {
        self.quality_budget = quality;
        self.maintenance_budget = maintenance;
        self
    }

    pub fn with_raw_material_orders(mut self, regular: f64, expedited: f64) -> Self {
        self.raw_materials_regular = regular;
        self.raw_materials_expedited = expedited;
        self
    }

    pub fn with_part_orders(mut self, orders: PerLine) -> Self {
        self.part_orders = orders;
        self
    }

    pub fn operators_training(&self) -> Vec<u32> {
        self.machines
            .iter()
            .filter(|m| m.send_for_training)
            .map(|m| m.machine_id)
            .collect()
    }

    pub fn total_parts_ordered(&self) -> f64 {
        self.part_orders.total()
    }

    pub fn total_scheduled_hours(&self) -> f64 {
        self.machines
            .iter()
            .filter(|m| !m.send_for_training)
            .map(|m| m.scheduled_hours)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_template_cycles_part_types() {
        let d = Decisions::idle(1, 1, 9);
        assert_eq!(d.machines.len(), 9);
        let codes: Vec<u8> = d.machines.iter().map(|m| m.part_type).collect();
        assert_eq!(codes, vec![1, 2, 3, 1, 2, 3, 1, 2, 3]);
        assert_eq!(d.total_scheduled_hours(), 0.0);
    }

    #[test]
    fn builders_set_machine_lines() {
        let d = Decisions::idle(2, 1, 9)
            .schedule(1, ProductLine::Z, 40.0)
            .train(5)
            .with_budgets(750.0, 500.0);
        let m1 = d.machine(1).unwrap();
        assert_eq!(m1.line(), Some(ProductLine::Z));
        assert!(m1.is_working());
        assert!(d.machine(5).unwrap().needs_operator());
        assert!(!d.machine(5).unwrap().is_working());
        assert_eq!(d.operators_training(), vec![5]);
        assert_eq!(d.quality_budget, 750.0);
    }

    #[test]
    fn decisions_deserialize_from_json() {
        let json = r#"{
            "week": 1, "company_id": 7,
            "quality_budget": 750.0, "maintenance_budget": 500.0,
            "raw_materials_regular": 10000.0, "raw_materials_expedited": 0.0,
            "part_orders": {"x": 0.0, "y": 100.0, "z": 0.0},
            "machines": [
                {"machine_id": 1, "send_for_training": false, "part_type": 1, "scheduled_hours": 40.0}
            ]
        }"#;
        let d: Decisions = serde_json::from_str(json).unwrap();
        assert_eq!(d.company_id, 7);
        assert_eq!(d.part_orders.y, 100.0);
        assert_eq!(d.machines[0].line(), Some(ProductLine::X));
    }
}
