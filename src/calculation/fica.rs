//! Social Security and Medicare (FICA) calculation.
//!
//! Social Security stops once the year's Social Security wages reach the
//! wage base. Medicare has no cap, but wages pushing cumulative Medicare
//! wages past the additional-Medicare threshold also owe the surtax.

use crate::config::FicaRates;
use crate::models::{AuditStep, Money};

/// The result of the Social Security calculation.
#[derive(Debug, Clone)]
pub struct SocialSecurityResult {
    /// Period wages subject to Social Security after the wage-base cap.
    pub taxable_wages: Money,
    /// Social Security tax withheld.
    pub tax: Money,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates Social Security tax for one period.
///
/// Taxable wages are the period wages limited to what remains of the wage
/// base after `ytd_ss_wages`.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_social_security;
/// use payroll_engine::config::PolicySet;
/// use payroll_engine::models::Money;
///
/// let policies = PolicySet::builtin();
/// let fica = &policies.policy_for(2024).unwrap().fica;
///
/// // 1,600 left under the 168,600 wage base
/// let result = calculate_social_security(Money::whole(5_000), Money::whole(167_000), fica, 1);
/// assert_eq!(result.taxable_wages, Money::whole(1_600));
/// assert_eq!(result.tax, Money::from_cents(9920));
/// ```
pub fn calculate_social_security(
    period_wages: Money,
    ytd_ss_wages: Money,
    fica: &FicaRates,
    step_number: u32,
) -> SocialSecurityResult {
    let remaining_base = (fica.ss_wage_base - ytd_ss_wages).non_negative();
    let taxable_wages = period_wages.non_negative().min(remaining_base);
    let tax = taxable_wages.times(fica.ss_rate);

    let reasoning = if remaining_base.is_zero() {
        format!(
            "YTD Social Security wages ${} have reached the ${} wage base; no tax",
            ytd_ss_wages, fica.ss_wage_base
        )
    } else {
        format!(
            "min(${}, ${} remaining) x {} = ${}",
            period_wages,
            remaining_base,
            fica.ss_rate.normalize(),
            tax
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "social_security".to_string(),
        rule_name: "Social Security".to_string(),
        input: serde_json::json!({
            "period_wages": period_wages.to_string(),
            "ytd_ss_wages": ytd_ss_wages.to_string(),
            "wage_base": fica.ss_wage_base.to_string(),
            "rate": fica.ss_rate.normalize().to_string()
        }),
        output: serde_json::json!({
            "taxable_wages": taxable_wages.to_string(),
            "tax": tax.to_string()
        }),
        reasoning,
    };

    SocialSecurityResult {
        taxable_wages,
        tax,
        audit_step,
    }
}

/// The result of the Medicare calculation.
#[derive(Debug, Clone)]
pub struct MedicareResult {
    /// Period wages subject to Medicare.
    pub wages: Money,
    /// Tax at the base Medicare rate.
    pub base_tax: Money,
    /// Period wages above the additional-Medicare threshold.
    pub surtax_wages: Money,
    /// Additional Medicare tax.
    pub surtax: Money,
    /// Base tax plus surtax.
    pub tax: Money,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates Medicare tax, including the additional-Medicare surtax.
///
/// `ytd_medicare_wages` is the uncapped cumulative Medicare wage total
/// before this period.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_medicare;
/// use payroll_engine::config::PolicySet;
/// use payroll_engine::models::Money;
///
/// let policies = PolicySet::builtin();
/// let fica = &policies.policy_for(2024).unwrap().fica;
///
/// // 4,000 of the 5,000 crosses the 200,000 threshold
/// let result = calculate_medicare(Money::whole(5_000), Money::whole(199_000), fica, 1);
/// assert_eq!(result.base_tax, Money::from_cents(7250));
/// assert_eq!(result.surtax, Money::whole(36));
/// assert_eq!(result.tax, Money::from_cents(10850));
/// ```
pub fn calculate_medicare(
    period_wages: Money,
    ytd_medicare_wages: Money,
    fica: &FicaRates,
    step_number: u32,
) -> MedicareResult {
    let wages = period_wages.non_negative();
    let base_tax = wages.times(fica.medicare_rate);

    let over_threshold =
        (ytd_medicare_wages + wages - fica.additional_medicare_threshold).non_negative();
    let surtax_wages = wages.min(over_threshold);
    let surtax = surtax_wages.times(fica.additional_medicare_rate);
    let tax = base_tax + surtax;

    let reasoning = if surtax.is_zero() {
        format!(
            "${} x {} = ${}",
            wages,
            fica.medicare_rate.normalize(),
            base_tax
        )
    } else {
        format!(
            "${} x {} = ${}, plus ${} above ${} x {} = ${}",
            wages,
            fica.medicare_rate.normalize(),
            base_tax,
            surtax_wages,
            fica.additional_medicare_threshold,
            fica.additional_medicare_rate.normalize(),
            surtax
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "medicare".to_string(),
        rule_name: "Medicare".to_string(),
        input: serde_json::json!({
            "period_wages": period_wages.to_string(),
            "ytd_medicare_wages": ytd_medicare_wages.to_string(),
            "rate": fica.medicare_rate.normalize().to_string(),
            "additional_rate": fica.additional_medicare_rate.normalize().to_string(),
            "additional_threshold": fica.additional_medicare_threshold.to_string()
        }),
        output: serde_json::json!({
            "base_tax": base_tax.to_string(),
            "surtax_wages": surtax_wages.to_string(),
            "surtax": surtax.to_string(),
            "tax": tax.to_string()
        }),
        reasoning,
    };

    MedicareResult {
        wages,
        base_tax,
        surtax_wages,
        surtax,
        tax,
        audit_step,
    }
}
