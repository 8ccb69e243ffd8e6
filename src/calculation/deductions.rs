//! Deduction classification.
//!
//! Active deductions are resolved against the period's gross pay and split
//! into a pre-tax bucket, which reduces taxable wages, and a post-tax bucket,
//! which is taken from pay after tax.

use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, Deduction, DeductionLine, Money};

/// The result of classifying an employee's deductions.
#[derive(Debug, Clone)]
pub struct DeductionClassification {
    /// Sum of the pre-tax deductions.
    pub pre_tax_total: Money,
    /// Sum of the post-tax deductions.
    pub post_tax_total: Money,
    /// Each deduction taken, in input order.
    pub lines: Vec<DeductionLine>,
    /// The audit step recording this classification.
    pub audit_step: AuditStep,
}

/// Resolves and buckets deductions for a period.
///
/// Inactive deductions are skipped. A flat deduction is taken as stored; a
/// percentage deduction is that percentage of `gross`, settled to the cent.
///
/// # Errors
///
/// Returns `InvalidInput` if any single deduction resolves to more than
/// `gross`.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::classify_deductions;
/// use payroll_engine::models::{DeductionAmount, DeductionKind, Money, NewDeduction};
/// use chrono::Utc;
/// use rust_decimal::Decimal;
///
/// let deductions = vec![
///     NewDeduction {
///         employee_id: "EMP-1".to_string(),
///         kind: DeductionKind::PreTax401k,
///         amount: DeductionAmount::Percentage(Decimal::from(10)),
///         description: "401k".to_string(),
///     }
///     .into_deduction("d1".to_string(), Utc::now())
///     .unwrap(),
///     NewDeduction {
///         employee_id: "EMP-1".to_string(),
///         kind: DeductionKind::PostTaxRoth,
///         amount: DeductionAmount::Flat(Money::whole(50)),
///         description: "Roth".to_string(),
///     }
///     .into_deduction("d2".to_string(), Utc::now())
///     .unwrap(),
/// ];
///
/// let result = classify_deductions(&deductions, Money::whole(2_000), 1).unwrap();
/// assert_eq!(result.pre_tax_total, Money::whole(200));
/// assert_eq!(result.post_tax_total, Money::whole(50));
/// ```
pub fn classify_deductions(
    deductions: &[Deduction],
    gross: Money,
    step_number: u32,
) -> EngineResult<DeductionClassification> {
    let mut lines = Vec::new();

    for deduction in deductions.iter().filter(|d| d.active) {
        let amount = deduction.amount.resolve(gross);
        if amount > gross {
            return Err(EngineError::invalid_input(
                "deduction",
                format!(
                    "deduction {} ({}) of ${} exceeds gross pay ${}",
                    deduction.id, deduction.description, amount, gross
                ),
            ));
        }
        lines.push(DeductionLine {
            deduction_id: deduction.id.clone(),
            kind: deduction.kind,
            description: deduction.description.clone(),
            amount,
            pre_tax: deduction.kind.is_pre_tax(),
        });
    }

    let pre_tax_total: Money = lines.iter().filter(|l| l.pre_tax).map(|l| l.amount).sum();
    let post_tax_total: Money = lines.iter().filter(|l| !l.pre_tax).map(|l| l.amount).sum();
    let skipped = deductions.len() - lines.len();

    let audit_step = AuditStep {
        step_number,
        rule_id: "deduction_classification".to_string(),
        rule_name: "Deduction Classification".to_string(),
        input: serde_json::json!({
            "gross": gross.to_string(),
            "deduction_count": deductions.len(),
            "inactive_skipped": skipped
        }),
        output: serde_json::json!({
            "pre_tax_total": pre_tax_total.to_string(),
            "post_tax_total": post_tax_total.to_string(),
            "lines": lines
                .iter()
                .map(|l| serde_json::json!({
                    "deduction_id": l.deduction_id,
                    "kind": l.kind.as_str(),
                    "amount": l.amount.to_string()
                }))
                .collect::<Vec<_>>()
        }),
        reasoning: format!(
            "{} active deduction(s): ${} pre-tax, ${} post-tax",
            lines.len(),
            pre_tax_total,
            post_tax_total
        ),
    };

    Ok(DeductionClassification {
        pre_tax_total,
        post_tax_total,
        lines,
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeductionAmount, DeductionKind};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    fn create_deduction(id: &str, kind: DeductionKind, amount: DeductionAmount) -> Deduction {
        Deduction {
            id: id.to_string(),
            employee_id: "EMP-00000001".to_string(),
            kind,
            amount,
            description: id.to_string(),
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_deductions() {
        let result = classify_deductions(&[], money("2000"), 1).unwrap();
        assert_eq!(result.pre_tax_total, Money::ZERO);
        assert_eq!(result.post_tax_total, Money::ZERO);
        assert!(result.lines.is_empty());
    }

    #[test]
    fn test_percentage_and_flat_buckets() {
        let deductions = vec![
            create_deduction(
                "401k",
                DeductionKind::PreTax401k,
                DeductionAmount::Percentage(dec("10")),
            ),
            create_deduction(
                "health",
                DeductionKind::PreTaxHealth,
                DeductionAmount::Flat(money("150")),
            ),
            create_deduction(
                "garnish",
                DeductionKind::PostTaxGarnishment,
                DeductionAmount::Flat(money("75.50")),
            ),
        ];

        let result = classify_deductions(&deductions, money("2000"), 2).unwrap();
        assert_eq!(result.pre_tax_total, money("350.00"));
        assert_eq!(result.post_tax_total, money("75.50"));
        assert_eq!(result.audit_step.step_number, 2);
    }

    #[test]
    fn test_lines_keep_input_order() {
        let deductions = vec![
            create_deduction(
                "roth",
                DeductionKind::PostTaxRoth,
                DeductionAmount::Flat(money("10")),
            ),
            create_deduction(
                "hsa",
                DeductionKind::PreTaxHsa,
                DeductionAmount::Flat(money("20")),
            ),
        ];

        let result = classify_deductions(&deductions, money("1000"), 1).unwrap();
        let ids: Vec<_> = result.lines.iter().map(|l| l.deduction_id.as_str()).collect();
        assert_eq!(ids, vec!["roth", "hsa"]);
        assert!(!result.lines[0].pre_tax);
        assert!(result.lines[1].pre_tax);
    }

    #[test]
    fn test_inactive_deductions_skipped() {
        let mut inactive = create_deduction(
            "old",
            DeductionKind::PreTaxFsa,
            DeductionAmount::Flat(money("100")),
        );
        inactive.active = false;

        let result = classify_deductions(&[inactive], money("1000"), 1).unwrap();
        assert_eq!(result.pre_tax_total, Money::ZERO);
        assert_eq!(result.audit_step.input["inactive_skipped"], 1);
    }

    #[test]
    fn test_deduction_exceeding_gross_rejected() {
        let deductions = vec![create_deduction(
            "big",
            DeductionKind::PostTaxOther,
            DeductionAmount::Flat(money("1500")),
        )];

        let result = classify_deductions(&deductions, money("1000"), 1);
        assert!(matches!(
            result,
            Err(EngineError::InvalidInput { field, .. }) if field == "deduction"
        ));
    }

    #[test]
    fn test_full_percentage_equal_to_gross_allowed() {
        let deductions = vec![create_deduction(
            "all",
            DeductionKind::PreTaxHsa,
            DeductionAmount::Percentage(dec("100")),
        )];
        let result = classify_deductions(&deductions, money("800"), 1).unwrap();
        assert_eq!(result.pre_tax_total, money("800.00"));
    }
}
