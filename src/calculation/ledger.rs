//! Year-to-date ledger updates.
//!
//! A payroll run does not touch the employee it was calculated for. Instead
//! the result is turned into a [`YtdDelta`], and the repository applies that
//! delta to the stored ledger in the same unit as saving the paystub.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{Money, PayrollResult, YtdTotals};

/// The amounts one payroll run adds to the year-to-date ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YtdDelta {
    /// The tax year the run belongs to.
    pub tax_year: i32,
    /// Gross pay.
    pub gross: Money,
    /// Federal income tax.
    pub federal_tax: Money,
    /// State income tax.
    pub state_tax: Money,
    /// Social Security tax.
    pub ss_tax: Money,
    /// Medicare tax, surtax included.
    pub medicare_tax: Money,
    /// Pre-tax plus post-tax deductions.
    pub deductions: Money,
    /// Net pay (may be negative).
    pub net: Money,
    /// Wages Social Security was assessed on.
    pub ss_wages: Money,
    /// Wages Medicare was assessed on.
    pub medicare_wages: Money,
}

impl YtdDelta {
    /// Builds the delta for a calculated period.
    pub fn from_result(result: &PayrollResult) -> Self {
        Self {
            tax_year: result.tax_year,
            gross: result.gross_pay,
            federal_tax: result.federal_tax,
            state_tax: result.state_tax,
            ss_tax: result.ss_tax,
            medicare_tax: result.medicare_tax,
            deductions: result.total_deductions(),
            net: result.net_pay,
            ss_wages: result.ss_wages,
            medicare_wages: result.medicare_wages,
        }
    }

    fn monotonic_fields(&self) -> [(&'static str, Money); 8] {
        [
            ("gross", self.gross),
            ("federal_tax", self.federal_tax),
            ("state_tax", self.state_tax),
            ("ss_tax", self.ss_tax),
            ("medicare_tax", self.medicare_tax),
            ("deductions", self.deductions),
            ("ss_wages", self.ss_wages),
            ("medicare_wages", self.medicare_wages),
        ]
    }
}

/// Applies a delta to a ledger, returning the new ledger.
///
/// A delta for a later tax year starts from an empty ledger for that year.
///
/// # Errors
///
/// Returns `InvalidInput` if the delta is for a tax year earlier than the
/// ledger, or if any accumulator other than net pay would decrease.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::{YtdDelta, apply_ytd_delta};
/// use payroll_engine::models::{Money, YtdTotals};
///
/// let mut ytd = YtdTotals::new(2024);
/// ytd.gross = Money::whole(4_000);
///
/// let delta = YtdDelta {
///     tax_year: 2024,
///     gross: Money::whole(2_000),
///     federal_tax: Money::from_cents(14385),
///     state_tax: Money::whole(100),
///     ss_tax: Money::whole(124),
///     medicare_tax: Money::whole(29),
///     deductions: Money::ZERO,
///     net: Money::from_cents(160315),
///     ss_wages: Money::whole(2_000),
///     medicare_wages: Money::whole(2_000),
/// };
///
/// let updated = apply_ytd_delta(&ytd, &delta).unwrap();
/// assert_eq!(updated.gross, Money::whole(6_000));
/// assert_eq!(ytd.gross, Money::whole(4_000));
/// ```
pub fn apply_ytd_delta(current: &YtdTotals, delta: &YtdDelta) -> EngineResult<YtdTotals> {
    if let Some((field, _)) = delta
        .monotonic_fields()
        .into_iter()
        .find(|(_, amount)| amount.is_negative())
    {
        return Err(EngineError::invalid_input(
            field,
            "year-to-date accumulators never decrease",
        ));
    }

    let base = current.for_tax_year(delta.tax_year)?;

    Ok(YtdTotals {
        tax_year: delta.tax_year,
        gross: base.gross + delta.gross,
        federal_tax: base.federal_tax + delta.federal_tax,
        state_tax: base.state_tax + delta.state_tax,
        ss_tax: base.ss_tax + delta.ss_tax,
        medicare_tax: base.medicare_tax + delta.medicare_tax,
        deductions: base.deductions + delta.deductions,
        net: base.net + delta.net,
        ss_wages: base.ss_wages + delta.ss_wages,
        medicare_wages: base.medicare_wages + delta.medicare_wages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn create_delta(tax_year: i32, gross_cents: i64) -> YtdDelta {
        let gross = Money::from_cents(gross_cents);
        YtdDelta {
            tax_year,
            gross,
            federal_tax: gross.percent(10.into()),
            state_tax: gross.percent(5.into()),
            ss_tax: gross.percent(6.into()),
            medicare_tax: gross.percent(1.into()),
            deductions: Money::ZERO,
            net: gross.percent(78.into()),
            ss_wages: gross,
            medicare_wages: gross,
        }
    }

    #[test]
    fn test_apply_accumulates() {
        let ytd = YtdTotals::new(2024);
        let once = apply_ytd_delta(&ytd, &create_delta(2024, 200_000)).unwrap();
        let twice = apply_ytd_delta(&once, &create_delta(2024, 200_000)).unwrap();

        assert_eq!(twice.gross, Money::whole(4_000));
        assert_eq!(twice.federal_tax, Money::whole(400));
        assert_eq!(twice.ss_wages, Money::whole(4_000));
        assert_eq!(twice.net, Money::whole(3_120));
    }

    #[test]
    fn test_later_year_rolls_over() {
        let mut ytd = YtdTotals::new(2024);
        ytd.gross = Money::whole(100_000);
        ytd.ss_wages = Money::whole(100_000);

        let updated = apply_ytd_delta(&ytd, &create_delta(2025, 200_000)).unwrap();
        assert_eq!(updated.tax_year, 2025);
        assert_eq!(updated.gross, Money::whole(2_000));
        assert_eq!(updated.ss_wages, Money::whole(2_000));
    }

    #[test]
    fn test_earlier_year_rejected() {
        let ytd = YtdTotals::new(2025);
        assert!(apply_ytd_delta(&ytd, &create_delta(2024, 100)).is_err());
    }

    #[test]
    fn test_negative_component_rejected() {
        let mut delta = create_delta(2024, 100_000);
        delta.federal_tax = Money::from_cents(-1);

        let result = apply_ytd_delta(&YtdTotals::new(2024), &delta);
        assert!(matches!(
            result,
            Err(EngineError::InvalidInput { field, .. }) if field == "federal_tax"
        ));
    }

    #[test]
    fn test_negative_net_is_allowed() {
        let mut delta = create_delta(2024, 100_000);
        delta.net = Money::from_cents(-5_000);

        let updated = apply_ytd_delta(&YtdTotals::new(2024), &delta).unwrap();
        assert_eq!(updated.net, Money::whole(-50));
    }

    proptest! {
        #[test]
        fn prop_accumulators_never_decrease(
            grosses in prop::collection::vec(0i64..1_000_000, 1..30),
        ) {
            let mut ytd = YtdTotals::new(2024);
            for gross in grosses {
                let next = apply_ytd_delta(&ytd, &create_delta(2024, gross)).unwrap();
                prop_assert!(next.gross >= ytd.gross);
                prop_assert!(next.federal_tax >= ytd.federal_tax);
                prop_assert!(next.ss_tax >= ytd.ss_tax);
                prop_assert!(next.medicare_tax >= ytd.medicare_tax);
                prop_assert!(next.deductions >= ytd.deductions);
                prop_assert!(next.ss_wages >= ytd.ss_wages);
                prop_assert!(next.medicare_wages >= ytd.medicare_wages);
                ytd = next;
            }
        }
    }
}
