//! Payroll result models.
//!
//! This module contains the [`PayrollResult`] produced by the net-pay
//! calculator and the audit structures that record how each figure was
//! reached.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DeductionKind, Money};

/// How the period's gross pay was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayBasis {
    /// Annual salary divided by periods per year.
    Salaried,
    /// Hours worked at the hourly rate, with overtime.
    Hourly,
    /// An hourly employee with no hours supplied, paid as salaried.
    SalariedFallback,
}

/// How urgently a warning needs a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    /// Informational.
    Low,
    /// Should be looked at before pay is released.
    Medium,
    /// Must be reviewed before pay is released.
    High,
}

/// A single step in the audit trace recording a calculation decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the result.
    pub reasoning: String,
}

/// A warning raised during calculation.
///
/// Warnings do not stop a run but flag figures that need review, such as a
/// negative net pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level.
    pub severity: WarningSeverity,
}

/// The complete audit trace for a calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
    /// The total calculation duration in microseconds.
    pub duration_us: u64,
}

/// One resolved deduction within a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionLine {
    /// The deduction this line came from.
    pub deduction_id: String,
    /// Kind of deduction.
    pub kind: DeductionKind,
    /// Description shown on the paystub.
    pub description: String,
    /// Amount taken this period.
    pub amount: Money,
    /// True if taken before tax.
    pub pre_tax: bool,
}

/// The outcome of a gross-to-net calculation for one employee and period.
///
/// The amounts always satisfy
/// `net_pay = gross_pay - pre_tax_deductions - total_taxes() - post_tax_deductions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollResult {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// When the calculation was performed.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that performed the calculation.
    pub engine_version: String,
    /// The employee the calculation is for.
    pub employee_id: String,
    /// The tax year whose ledger and policy were used.
    pub tax_year: i32,
    /// How gross pay was determined.
    pub pay_basis: PayBasis,
    /// Regular hours paid (hourly basis only).
    pub regular_hours: Option<Decimal>,
    /// Overtime hours paid (hourly basis only).
    pub overtime_hours: Option<Decimal>,
    /// Gross pay for the period.
    pub gross_pay: Money,
    /// Total pre-tax deductions.
    pub pre_tax_deductions: Money,
    /// Gross pay less pre-tax deductions.
    pub taxable_gross: Money,
    /// Federal income tax withheld.
    pub federal_tax: Money,
    /// State income tax withheld.
    pub state_tax: Money,
    /// Social Security tax withheld.
    pub ss_tax: Money,
    /// Medicare tax withheld, surtax included.
    pub medicare_tax: Money,
    /// The additional-Medicare portion of `medicare_tax`.
    pub medicare_surtax: Money,
    /// Total post-tax deductions.
    pub post_tax_deductions: Money,
    /// Take-home pay. May be negative; see the audit warnings.
    pub net_pay: Money,
    /// Wages Social Security was assessed on this period.
    pub ss_wages: Money,
    /// Wages Medicare was assessed on this period.
    pub medicare_wages: Money,
    /// The individual deductions taken.
    pub deduction_lines: Vec<DeductionLine>,
    /// Complete audit trace of calculation decisions.
    pub audit_trace: AuditTrace,
}

impl PayrollResult {
    /// Federal, state, Social Security and Medicare combined.
    pub fn total_taxes(&self) -> Money {
        self.federal_tax + self.state_tax + self.ss_tax + self.medicare_tax
    }

    /// Pre-tax and post-tax deductions combined.
    pub fn total_deductions(&self) -> Money {
        self.pre_tax_deductions + self.post_tax_deductions
    }

    /// Checks the gross-to-net identity to the cent.
    pub fn is_balanced(&self) -> bool {
        self.gross_pay - self.pre_tax_deductions - self.total_taxes() - self.post_tax_deductions
            == self.net_pay
    }

    /// Returns true if any warning was raised.
    pub fn has_warnings(&self) -> bool {
        !self.audit_trace.warnings.is_empty()
    }

    /// Returns true if a warning with `code` was raised.
    pub fn has_warning(&self, code: &str) -> bool {
        self.audit_trace.warnings.iter().any(|w| w.code == code)
    }
}
