//! Calculation logic for the payroll engine.
//!
//! This module contains the pure calculation functions that turn an
//! employee snapshot, its deductions and a tax policy into a period's pay:
//! gross pay, deduction classification, federal bracket withholding,
//! Social Security and Medicare, state withholding, net pay, and the
//! year-to-date ledger update.

mod brackets;
mod deductions;
mod fica;
mod gross_pay;
mod ledger;
mod net_pay;
mod withholding;

pub use brackets::{
    AnnualTaxResult, BracketPortion, FederalWithholdingResult, calculate_annual_tax,
    calculate_federal_withholding,
};
pub use deductions::{DeductionClassification, classify_deductions};
pub use fica::{MedicareResult, SocialSecurityResult, calculate_medicare, calculate_social_security};
pub use gross_pay::{GrossPayResult, MAX_PERIOD_HOURS, calculate_gross_pay};
pub use ledger::{YtdDelta, apply_ytd_delta};
pub use net_pay::{NEGATIVE_NET_PAY, PayInputs, TAXABLE_GROSS_CLAMPED, calculate_net_pay};
pub use withholding::{
    StateTaxResult, WithholdingInputs, WithholdingResult, calculate_state_tax, withhold_taxes,
};
