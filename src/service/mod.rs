//! The payroll service.
//!
//! [`PayrollService`] ties the pure calculation functions to a repository
//! and a policy set. It owns the rules about when state changes: a payroll
//! run re-reads the employee under a per-employee lock, calculates, and
//! commits the paystub together with the ledger update.

mod bulk;
mod locks;
mod year_end;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{PayInputs, YtdDelta, apply_ytd_delta, calculate_net_pay};
use crate::config::PolicySet;
use crate::error::EngineResult;
use crate::models::{
    Deduction, Employee, EmployeeStatus, NewDeduction, NewEmployee, PayPeriod, PayrollResult,
    Paystub,
};
use crate::repository::PayrollRepository;

pub use bulk::{BulkFailure, BulkRunReport};

use locks::EmployeeLocks;

/// Options for a single payroll run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Hours worked (hourly employees).
    #[serde(default)]
    pub hours: Option<Decimal>,
    /// Extra hours paid at the overtime rate.
    #[serde(default)]
    pub overtime_hours: Option<Decimal>,
    /// Clamp taxable gross at zero instead of rejecting the run when
    /// pre-tax deductions exceed gross pay.
    #[serde(default)]
    pub clamp_taxable_gross: bool,
}

impl RunOptions {
    /// Options carrying only the hours worked.
    pub fn hours(hours: Option<Decimal>) -> Self {
        Self {
            hours,
            ..Self::default()
        }
    }
}

/// A committed payroll run: the calculation and the paystub it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRun {
    /// The calculation with its audit trace.
    pub result: PayrollResult,
    /// The stored paystub.
    pub paystub: Paystub,
}

/// Payroll operations over a repository and a set of tax policies.
pub struct PayrollService {
    repository: Arc<dyn PayrollRepository>,
    policies: PolicySet,
    locks: EmployeeLocks,
}

impl PayrollService {
    /// Creates a service.
    pub fn new(repository: Arc<dyn PayrollRepository>, policies: PolicySet) -> Self {
        Self {
            repository,
            policies,
            locks: EmployeeLocks::default(),
        }
    }

    /// The underlying repository.
    pub fn repository(&self) -> &Arc<dyn PayrollRepository> {
        &self.repository
    }

    /// The configured tax policies.
    pub fn policies(&self) -> &PolicySet {
        &self.policies
    }

    /// Hires an employee and returns the stored record.
    pub fn add_employee(&self, new: NewEmployee, hire_date: NaiveDate) -> EngineResult<Employee> {
        new.validate()?;
        let employee = new.into_employee(new_employee_id(), hire_date);
        self.repository.save_employee(&employee)?;
        info!(
            employee_id = %employee.id,
            name = %employee.name,
            pay_frequency = %employee.pay_frequency,
            "Added employee"
        );
        Ok(employee)
    }

    /// Fetches an employee.
    pub fn get_employee(&self, employee_id: &str) -> EngineResult<Employee> {
        self.repository.get_employee(employee_id)
    }

    /// Lists employees, optionally filtered by status.
    pub fn list_employees(&self, status: Option<EmployeeStatus>) -> EngineResult<Vec<Employee>> {
        self.repository.list_employees(status)
    }

    /// Changes an employee's lifecycle status.
    pub fn set_employee_status(
        &self,
        employee_id: &str,
        status: EmployeeStatus,
    ) -> EngineResult<Employee> {
        let lock = self.locks.lock_for(employee_id);
        let _guard = locks::hold(&lock);

        let mut employee = self.repository.get_employee(employee_id)?;
        employee.status = status;
        self.repository.save_employee(&employee)?;
        info!(employee_id = %employee_id, status = %status, "Changed employee status");
        Ok(employee)
    }

    /// Adds a deduction to an existing employee.
    pub fn add_deduction(&self, new: NewDeduction) -> EngineResult<Deduction> {
        self.repository.get_employee(&new.employee_id)?;
        let deduction = new.into_deduction(Uuid::new_v4().to_string(), Utc::now())?;
        self.repository.save_deduction(&deduction)?;
        info!(
            employee_id = %deduction.employee_id,
            deduction_id = %deduction.id,
            kind = %deduction.kind,
            amount = %deduction.amount,
            "Added deduction"
        );
        Ok(deduction)
    }

    /// Turns a deduction off. It stays on record but is no longer taken.
    pub fn deactivate_deduction(&self, deduction_id: &str) -> EngineResult<Deduction> {
        let deduction = self.repository.set_deduction_active(deduction_id, false)?;
        info!(deduction_id = %deduction_id, "Deactivated deduction");
        Ok(deduction)
    }

    /// Calculates a period's pay without storing anything.
    ///
    /// The preview is priced in the tax year of the employee's ledger, which
    /// is the hire year until a run lands in a later year. For an employee
    /// not yet paid this year it therefore applies that earlier year's
    /// policy and YTD figures; `run_payroll` rolls the ledger forward and
    /// may differ.
    pub fn compute_net_pay(
        &self,
        employee: &Employee,
        hours: Option<Decimal>,
        overtime_hours: Option<Decimal>,
    ) -> EngineResult<PayrollResult> {
        let tax_year = employee.ytd.tax_year;
        let policy = self.policies.policy_for(tax_year)?;
        let deductions = self.repository.get_active_deductions(&employee.id)?;
        let inputs = PayInputs::for_year(tax_year)
            .with_hours(hours)
            .with_overtime(overtime_hours);
        calculate_net_pay(employee, &deductions, &inputs, policy)
    }

    /// Runs payroll for one employee and period.
    pub fn run_payroll(
        &self,
        employee_id: &str,
        period: &PayPeriod,
        hours: Option<Decimal>,
    ) -> EngineResult<PayrollRun> {
        self.run_payroll_with(employee_id, period, &RunOptions::hours(hours))
    }

    /// Runs payroll for one employee and period with explicit options.
    ///
    /// The employee is re-read under its lock so the calculation always
    /// starts from the committed ledger. Nothing is stored unless the
    /// paystub and the ledger update commit together.
    pub fn run_payroll_with(
        &self,
        employee_id: &str,
        period: &PayPeriod,
        options: &RunOptions,
    ) -> EngineResult<PayrollRun> {
        period.validate()?;
        let tax_year = period.tax_year();
        let policy = self.policies.policy_for(tax_year)?;

        let lock = self.locks.lock_for(employee_id);
        let _guard = locks::hold(&lock);

        let employee = self.repository.get_employee(employee_id)?;
        let deductions = self.repository.get_active_deductions(employee_id)?;
        let inputs = PayInputs {
            tax_year,
            hours: options.hours,
            overtime_hours: options.overtime_hours,
            clamp_taxable_gross: options.clamp_taxable_gross,
        };

        let result = calculate_net_pay(&employee, &deductions, &inputs, policy)?;
        for warning in &result.audit_trace.warnings {
            warn!(
                employee_id = %employee_id,
                code = %warning.code,
                severity = ?warning.severity,
                "{}",
                warning.message
            );
        }

        let delta = YtdDelta::from_result(&result);
        let ytd_after = apply_ytd_delta(&employee.ytd, &delta)?;
        let paystub = Paystub::from_result(&employee, period, &result, &ytd_after);
        self.repository.commit_payroll_run(&paystub, &delta)?;

        info!(
            employee_id = %employee_id,
            check_number = %paystub.check_number,
            pay_date = %period.pay_date,
            gross = %result.gross_pay,
            net = %result.net_pay,
            duration_us = result.audit_trace.duration_us,
            "Payroll run committed"
        );

        Ok(PayrollRun { result, paystub })
    }
}

fn new_employee_id() -> String {
    format!(
        "EMP-{}",
        Uuid::new_v4().simple().to_string()[..8].to_uppercase()
    )
}
