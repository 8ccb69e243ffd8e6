//! Progressive tax brackets and federal income tax withholding.
//!
//! Federal withholding annualizes the period's taxable wages, subtracts the
//! allowance and standard deduction, applies the marginal schedule for the
//! filing status, and spreads the annual tax back over the employee's pay
//! periods.

use serde::{Deserialize, Serialize};

use crate::config::{TaxBracket, TaxPolicy};
use crate::models::{AuditStep, FilingStatus, Money, PayFrequency};

/// The tax owed within one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketPortion {
    /// Lower bound of the bracket.
    pub lower: Money,
    /// Upper bound of the bracket, `None` for the top bracket.
    pub upper: Option<Money>,
    /// Income falling inside the bracket.
    pub taxable: Money,
    /// Tax owed on that income.
    pub tax: Money,
}

/// The result of applying a bracket schedule to annual income.
#[derive(Debug, Clone)]
pub struct AnnualTaxResult {
    /// Total annual tax.
    pub annual_tax: Money,
    /// Per-bracket breakdown, lowest bracket first.
    pub portions: Vec<BracketPortion>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Applies a progressive schedule to an annual taxable amount.
///
/// Brackets are walked in ascending order; each contributes the part of the
/// income between its bounds at its marginal rate, settled per bracket.
/// Income at or below zero owes nothing.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_annual_tax;
/// use payroll_engine::config::PolicySet;
/// use payroll_engine::models::{FilingStatus, Money};
///
/// let policies = PolicySet::builtin();
/// let policy = policies.policy_for(2024).unwrap();
///
/// let result = calculate_annual_tax(policy.schedule(FilingStatus::Single), Money::whole(100_000), 1);
/// assert_eq!(result.annual_tax, Money::whole(17_053));
/// assert_eq!(result.portions.len(), 3);
/// ```
pub fn calculate_annual_tax(
    brackets: &[TaxBracket],
    taxable_income: Money,
    step_number: u32,
) -> AnnualTaxResult {
    let mut portions = Vec::new();

    for bracket in brackets {
        if taxable_income <= bracket.lower {
            break;
        }
        let top = bracket
            .upper
            .map_or(taxable_income, |upper| taxable_income.min(upper));
        let taxable = top - bracket.lower;
        if !taxable.is_positive() {
            continue;
        }
        portions.push(BracketPortion {
            lower: bracket.lower,
            upper: bracket.upper,
            taxable,
            tax: taxable.times(bracket.rate),
        });
    }

    let annual_tax: Money = portions.iter().map(|p| p.tax).sum();

    let audit_step = AuditStep {
        step_number,
        rule_id: "annual_bracket_tax".to_string(),
        rule_name: "Annual Bracket Tax".to_string(),
        input: serde_json::json!({
            "taxable_income": taxable_income.to_string(),
            "bracket_count": brackets.len()
        }),
        output: serde_json::json!({
            "annual_tax": annual_tax.to_string(),
            "portions": portions
                .iter()
                .map(|p| serde_json::json!({
                    "lower": p.lower.to_string(),
                    "upper": p.upper.map(|u| u.to_string()),
                    "taxable": p.taxable.to_string(),
                    "tax": p.tax.to_string()
                }))
                .collect::<Vec<_>>()
        }),
        reasoning: if portions.is_empty() {
            format!("No tax owed on ${}", taxable_income)
        } else {
            format!(
                "${} across {} bracket(s) = ${}",
                taxable_income,
                portions.len(),
                annual_tax
            )
        },
    };

    AnnualTaxResult {
        annual_tax,
        portions,
        audit_step,
    }
}

/// The result of federal withholding for one period.
#[derive(Debug, Clone)]
pub struct FederalWithholdingResult {
    /// Annualized taxable wages before adjustments.
    pub annual_taxable: Money,
    /// Annual income after allowances and the standard deduction.
    pub adjusted_income: Money,
    /// Annual tax on the adjusted income.
    pub annual_tax: Money,
    /// Tax withheld this period.
    pub period_tax: Money,
    /// Audit steps: the bracket tax followed by the per-period withholding.
    pub audit_steps: Vec<AuditStep>,
}

/// Calculates the federal income tax withheld for one period.
///
/// # Arguments
///
/// * `policy` - Tax policy for the period's tax year
/// * `annual_taxable` - The period's taxable wages times periods per year
/// * `filing_status` - Selects the standard deduction and schedule
/// * `allowances` - Withholding allowances claimed
/// * `pay_frequency` - The employee's frequency; the annual tax is divided
///   by its periods per year
/// * `step_number_start` - The first step number for the audit trail
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_federal_withholding;
/// use payroll_engine::config::PolicySet;
/// use payroll_engine::models::{FilingStatus, Money, PayFrequency};
///
/// let policies = PolicySet::builtin();
/// let policy = policies.policy_for(2024).unwrap();
///
/// // 52,000 - 4,300 - 14,600 = 33,100 adjusted; 3,740 annual tax
/// let result = calculate_federal_withholding(
///     policy,
///     Money::whole(52_000),
///     FilingStatus::Single,
///     1,
///     PayFrequency::Biweekly,
///     1,
/// );
/// assert_eq!(result.annual_tax, Money::whole(3_740));
/// assert_eq!(result.period_tax, Money::from_cents(14385));
/// ```
pub fn calculate_federal_withholding(
    policy: &TaxPolicy,
    annual_taxable: Money,
    filing_status: FilingStatus,
    allowances: u32,
    pay_frequency: PayFrequency,
    step_number_start: u32,
) -> FederalWithholdingResult {
    let allowance_total = policy.allowance_value.times(allowances.into());
    let standard_deduction = policy.standard_deduction(filing_status);
    let adjusted_income = (annual_taxable - allowance_total - standard_deduction).non_negative();

    let annual = calculate_annual_tax(
        policy.schedule(filing_status),
        adjusted_income,
        step_number_start,
    );

    let periods = pay_frequency.periods_per_year();
    let period_tax = annual.annual_tax.divided_by(periods);

    let withholding_step = AuditStep {
        step_number: step_number_start + 1,
        rule_id: "federal_withholding".to_string(),
        rule_name: "Federal Income Tax Withholding".to_string(),
        input: serde_json::json!({
            "annual_taxable": annual_taxable.to_string(),
            "filing_status": filing_status.as_str(),
            "allowances": allowances,
            "allowance_total": allowance_total.to_string(),
            "standard_deduction": standard_deduction.to_string(),
            "periods_per_year": periods
        }),
        output: serde_json::json!({
            "adjusted_income": adjusted_income.to_string(),
            "annual_tax": annual.annual_tax.to_string(),
            "period_tax": period_tax.to_string()
        }),
        reasoning: format!(
            "(${} - ${} - ${}) taxed at {} rates = ${} / {} = ${}",
            annual_taxable,
            allowance_total,
            standard_deduction,
            filing_status,
            annual.annual_tax,
            periods,
            period_tax
        ),
    };

    FederalWithholdingResult {
        annual_taxable,
        adjusted_income,
        annual_tax: annual.annual_tax,
        period_tax,
        audit_steps: vec![annual.audit_step, withholding_step],
    }
}
