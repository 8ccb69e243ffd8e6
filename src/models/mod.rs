//! Core data models for the payroll engine.
//!
//! This module contains all the domain models used throughout the engine.

mod deduction;
mod employee;
mod money;
mod pay_period;
mod payroll_result;
mod paystub;

pub use deduction::{Deduction, DeductionAmount, DeductionKind, NewDeduction};
pub use employee::{
    Employee, EmployeeStatus, FilingStatus, NewEmployee, PayFrequency, YtdTotals,
};
pub use money::{CENT_SCALE, Money};
pub use pay_period::PayPeriod;
pub use payroll_result::{
    AuditStep, AuditTrace, AuditWarning, DeductionLine, PayBasis, PayrollResult, WarningSeverity,
};
pub use paystub::{Paystub, PaystubLine, YearEndSummary};
