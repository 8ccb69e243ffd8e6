//! The tax policy compiled into the engine.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::models::{FilingStatus, Money};

use super::types::{
    BracketSchedules, FicaRates, OvertimeRule, StateTaxConfig, TaxBracket, TaxPolicy,
};

fn bracket(lower: i64, upper: Option<i64>, rate_pct: i64) -> TaxBracket {
    TaxBracket {
        lower: Money::whole(lower),
        upper: upper.map(Money::whole),
        rate: Decimal::new(rate_pct, 2),
    }
}

fn schedule(bounds: [i64; 6]) -> Vec<TaxBracket> {
    let rates = [10, 12, 22, 24, 32, 35];
    let mut brackets = Vec::with_capacity(7);
    let mut lower = 0;
    for (upper, rate) in bounds.into_iter().zip(rates) {
        brackets.push(bracket(lower, Some(upper), rate));
        lower = upper;
    }
    brackets.push(bracket(lower, None, 37));
    brackets
}

/// Federal figures for tax year 2024.
pub(crate) fn policy_2024() -> TaxPolicy {
    TaxPolicy {
        tax_year: 2024,
        allowance_value: Money::whole(4_300),
        standard_deductions: HashMap::from([
            (FilingStatus::Single, Money::whole(14_600)),
            (FilingStatus::Married, Money::whole(29_200)),
            (FilingStatus::HeadOfHousehold, Money::whole(21_900)),
        ]),
        brackets: BracketSchedules {
            single: schedule([11_600, 47_150, 100_525, 191_950, 243_725, 609_350]),
            married: schedule([23_200, 94_300, 201_050, 383_900, 487_450, 731_200]),
        },
        fica: FicaRates {
            ss_rate: Decimal::new(62, 3),
            ss_wage_base: Money::whole(168_600),
            medicare_rate: Decimal::new(145, 4),
            additional_medicare_rate: Decimal::new(9, 3),
            additional_medicare_threshold: Money::whole(200_000),
        },
        state: StateTaxConfig {
            default_rate: Decimal::new(5, 2),
            rates: HashMap::new(),
        },
        overtime: OvertimeRule {
            threshold_hours: Decimal::from(40),
            multiplier: Decimal::new(15, 1),
        },
    }
}
