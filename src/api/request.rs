//! Request types for the payroll API.
//!
//! This module defines the JSON request bodies and their conversion into
//! domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::models::{DeductionAmount, DeductionKind, NewDeduction, NewEmployee, PayPeriod};
use crate::service::RunOptions;

/// Request body for `POST /employees`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmployeeRequest {
    /// The hire's attributes.
    #[serde(flatten)]
    pub employee: NewEmployee,
    /// Date of hire. Defaults to today.
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
}

/// Request body for `POST /employees/:id/deductions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeductionRequest {
    /// Kind of deduction.
    pub deduction_type: DeductionKind,
    /// Flat or percentage amount.
    pub amount: DeductionAmount,
    /// Description shown on paystubs.
    #[serde(default)]
    pub description: String,
}

impl DeductionRequest {
    /// Attaches the deduction to `employee_id`.
    pub fn for_employee(self, employee_id: impl Into<String>) -> NewDeduction {
        NewDeduction {
            employee_id: employee_id.into(),
            kind: self.deduction_type,
            amount: self.amount,
            description: self.description,
        }
    }
}

/// Request body for `POST /employees/:id/net-pay`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetPayRequest {
    /// Hours worked (hourly employees).
    #[serde(default)]
    pub hours: Option<Decimal>,
    /// Overtime hours.
    #[serde(default)]
    pub overtime_hours: Option<Decimal>,
}

/// Request body for `POST /employees/:id/payroll`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPayrollRequest {
    /// First day of the work window.
    pub start_date: NaiveDate,
    /// Last day of the work window.
    pub end_date: NaiveDate,
    /// The day wages are paid; decides the tax year.
    pub pay_date: NaiveDate,
    /// Hours worked (hourly employees).
    #[serde(default)]
    pub hours: Option<Decimal>,
    /// Overtime hours.
    #[serde(default)]
    pub overtime_hours: Option<Decimal>,
    /// Clamp taxable gross at zero instead of rejecting the run.
    #[serde(default)]
    pub clamp_taxable_gross: bool,
}

impl RunPayrollRequest {
    /// The validated pay period.
    pub fn period(&self) -> EngineResult<PayPeriod> {
        PayPeriod::new(self.start_date, self.end_date, self.pay_date)
    }

    /// The run options.
    pub fn options(&self) -> RunOptions {
        RunOptions {
            hours: self.hours,
            overtime_hours: self.overtime_hours,
            clamp_taxable_gross: self.clamp_taxable_gross,
        }
    }
}

/// Request body for `POST /payroll/bulk`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRunRequest {
    /// Employees to pay. Every active employee when omitted.
    #[serde(default)]
    pub employee_ids: Option<Vec<String>>,
    /// First day of the work window.
    pub start_date: NaiveDate,
    /// Last day of the work window.
    pub end_date: NaiveDate,
    /// The day wages are paid.
    pub pay_date: NaiveDate,
}

impl BulkRunRequest {
    /// The validated pay period.
    pub fn period(&self) -> EngineResult<PayPeriod> {
        PayPeriod::new(self.start_date, self.end_date, self.pay_date)
    }
}
