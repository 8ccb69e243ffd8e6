//! Combined tax withholding for one period.
//!
//! Brings together federal income tax, Social Security and Medicare for a
//! period's taxable wages, and the flat state withholding.

use rust_decimal::Decimal;

use crate::config::TaxPolicy;
use crate::models::{AuditStep, FilingStatus, Money, PayFrequency};

use super::brackets::calculate_federal_withholding;
use super::fica::{calculate_medicare, calculate_social_security};

/// What the withholding calculation needs to know about the period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithholdingInputs {
    /// Taxable wages for the period.
    pub period_wages: Money,
    /// Federal filing status.
    pub filing_status: FilingStatus,
    /// Withholding allowances claimed.
    pub allowances: u32,
    /// The employee's pay frequency.
    pub pay_frequency: PayFrequency,
    /// Social Security wages earlier in the tax year.
    pub ytd_ss_wages: Money,
    /// Medicare wages earlier in the tax year.
    pub ytd_medicare_wages: Money,
}

impl WithholdingInputs {
    /// Period wages annualized over the employee's pay frequency.
    pub fn annual_wages(&self) -> Money {
        self.period_wages
            .times(self.pay_frequency.periods_per_year().into())
    }
}

/// Federal, Social Security and Medicare withheld for one period.
#[derive(Debug, Clone)]
pub struct WithholdingResult {
    /// Federal income tax.
    pub federal: Money,
    /// Social Security tax.
    pub social_security: Money,
    /// Medicare tax, surtax included.
    pub medicare: Money,
    /// The additional-Medicare part of `medicare`.
    pub medicare_surtax: Money,
    /// Wages Social Security was assessed on.
    pub ss_wages: Money,
    /// Wages Medicare was assessed on.
    pub medicare_wages: Money,
    /// Audit steps in calculation order.
    pub audit_steps: Vec<AuditStep>,
}

impl WithholdingResult {
    /// The three withholdings as `(federal, ss, medicare)`.
    pub fn as_tuple(&self) -> (Money, Money, Money) {
        (self.federal, self.social_security, self.medicare)
    }
}

/// Calculates federal, Social Security and Medicare withholding.
///
/// Zero taxable wages withhold exactly zero of each.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::{WithholdingInputs, withhold_taxes};
/// use payroll_engine::config::PolicySet;
/// use payroll_engine::models::{FilingStatus, Money, PayFrequency};
///
/// let policies = PolicySet::builtin();
/// let inputs = WithholdingInputs {
///     period_wages: Money::whole(2_000),
///     filing_status: FilingStatus::Single,
///     allowances: 1,
///     pay_frequency: PayFrequency::Biweekly,
///     ytd_ss_wages: Money::ZERO,
///     ytd_medicare_wages: Money::ZERO,
/// };
///
/// let result = withhold_taxes(policies.policy_for(2024).unwrap(), &inputs, 1);
/// assert_eq!(
///     result.as_tuple(),
///     (Money::from_cents(14385), Money::whole(124), Money::whole(29))
/// );
/// ```
pub fn withhold_taxes(
    policy: &TaxPolicy,
    inputs: &WithholdingInputs,
    step_number_start: u32,
) -> WithholdingResult {
    let federal = calculate_federal_withholding(
        policy,
        inputs.annual_wages(),
        inputs.filing_status,
        inputs.allowances,
        inputs.pay_frequency,
        step_number_start,
    );
    let mut step = step_number_start + federal.audit_steps.len() as u32;

    let ss = calculate_social_security(
        inputs.period_wages,
        inputs.ytd_ss_wages,
        &policy.fica,
        step,
    );
    step += 1;

    let medicare = calculate_medicare(
        inputs.period_wages,
        inputs.ytd_medicare_wages,
        &policy.fica,
        step,
    );

    let mut audit_steps = federal.audit_steps;
    audit_steps.push(ss.audit_step);
    audit_steps.push(medicare.audit_step);

    WithholdingResult {
        federal: federal.period_tax,
        social_security: ss.tax,
        medicare: medicare.tax,
        medicare_surtax: medicare.surtax,
        ss_wages: ss.taxable_wages,
        medicare_wages: medicare.wages,
        audit_steps,
    }
}

/// The result of the state withholding calculation.
#[derive(Debug, Clone)]
pub struct StateTaxResult {
    /// The rate applied.
    pub rate: Decimal,
    /// State tax withheld.
    pub tax: Money,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates flat-rate state withholding on taxable wages.
pub fn calculate_state_tax(
    policy: &TaxPolicy,
    state: &str,
    taxable_wages: Money,
    step_number: u32,
) -> StateTaxResult {
    let rate = policy.state_rate(state);
    let tax = taxable_wages.non_negative().times(rate);

    let audit_step = AuditStep {
        step_number,
        rule_id: "state_tax".to_string(),
        rule_name: "State Income Tax".to_string(),
        input: serde_json::json!({
            "state": state,
            "taxable_wages": taxable_wages.to_string(),
            "rate": rate.normalize().to_string()
        }),
        output: serde_json::json!({
            "tax": tax.to_string()
        }),
        reasoning: format!("${} x {} ({}) = ${}", taxable_wages, rate.normalize(), state, tax),
    };

    StateTaxResult {
        rate,
        tax,
        audit_step,
    }
}
