//! The dataset both repositories operate on.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::calculation::{YtdDelta, apply_ytd_delta};
use crate::error::{EngineError, EngineResult};
use crate::models::{Deduction, Employee, EmployeeStatus, Paystub, YtdTotals};

/// Everything the engine stores.
///
/// Records are kept in insertion order; deductions are applied in that
/// order, and paystubs are sorted by pay date when read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayrollData {
    /// Employees.
    #[serde(default)]
    pub employees: Vec<Employee>,
    /// Deductions of every employee.
    #[serde(default)]
    pub deductions: Vec<Deduction>,
    /// Paystubs of every employee.
    #[serde(default)]
    pub paystubs: Vec<Paystub>,
}

impl PayrollData {
    pub(crate) fn employee(&self, id: &str) -> EngineResult<&Employee> {
        self.employees
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| not_found("employee", id))
    }

    pub(crate) fn employees_with_status(&self, status: Option<EmployeeStatus>) -> Vec<Employee> {
        self.employees
            .iter()
            .filter(|e| status.is_none_or(|s| e.status == s))
            .cloned()
            .collect()
    }

    pub(crate) fn upsert_employee(&mut self, employee: &Employee) {
        match self.employees.iter_mut().find(|e| e.id == employee.id) {
            Some(existing) => *existing = employee.clone(),
            None => self.employees.push(employee.clone()),
        }
    }

    pub(crate) fn active_deductions(&self, employee_id: &str) -> Vec<Deduction> {
        self.deductions
            .iter()
            .filter(|d| d.employee_id == employee_id && d.active)
            .cloned()
            .collect()
    }

    pub(crate) fn insert_deduction(&mut self, deduction: &Deduction) -> EngineResult<()> {
        self.employee(&deduction.employee_id)?;
        if self.deductions.iter().any(|d| d.id == deduction.id) {
            return Err(EngineError::invalid_input(
                "deduction_id",
                format!("deduction {} already exists", deduction.id),
            ));
        }
        self.deductions.push(deduction.clone());
        Ok(())
    }

    pub(crate) fn set_deduction_active(
        &mut self,
        deduction_id: &str,
        active: bool,
    ) -> EngineResult<Deduction> {
        let deduction = self
            .deductions
            .iter_mut()
            .find(|d| d.id == deduction_id)
            .ok_or_else(|| not_found("deduction", deduction_id))?;
        deduction.active = active;
        Ok(deduction.clone())
    }

    pub(crate) fn paystubs_for(&self, employee_id: &str, year: Option<i32>) -> Vec<Paystub> {
        let mut paystubs: Vec<Paystub> = self
            .paystubs
            .iter()
            .filter(|p| p.employee_id == employee_id)
            .filter(|p| year.is_none_or(|y| p.pay_period.pay_date.year() == y))
            .cloned()
            .collect();
        paystubs.sort_by_key(|p| p.pay_period.pay_date);
        paystubs
    }

    pub(crate) fn insert_paystub(&mut self, paystub: &Paystub) -> EngineResult<()> {
        self.employee(&paystub.employee_id)?;
        if self.paystubs.iter().any(|p| p.id == paystub.id) {
            return Err(EngineError::invalid_input(
                "paystub_id",
                format!("paystub {} already exists", paystub.id),
            ));
        }
        self.paystubs.push(paystub.clone());
        Ok(())
    }

    pub(crate) fn apply_delta(
        &mut self,
        employee_id: &str,
        delta: &YtdDelta,
    ) -> EngineResult<YtdTotals> {
        let employee = self
            .employees
            .iter_mut()
            .find(|e| e.id == employee_id)
            .ok_or_else(|| not_found("employee", employee_id))?;
        let updated = apply_ytd_delta(&employee.ytd, delta)?;
        employee.ytd = updated.clone();
        Ok(updated)
    }

    /// Validates both halves of a run before changing anything.
    pub(crate) fn commit_run(
        &mut self,
        paystub: &Paystub,
        delta: &YtdDelta,
    ) -> EngineResult<YtdTotals> {
        let employee = self.employee(&paystub.employee_id)?;
        let updated = apply_ytd_delta(&employee.ytd, delta)?;
        self.insert_paystub(paystub)?;
        self.apply_delta(&paystub.employee_id, delta)?;
        Ok(updated)
    }
}

fn not_found(entity: &'static str, id: &str) -> EngineError {
    EngineError::NotFound {
        entity,
        id: id.to_string(),
    }
}
