//! Configuration types for tax policy.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML policy files.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::models::{FilingStatus, Money};

/// Metadata about the policy set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyMetadata {
    /// Human-readable name of the policy set.
    pub name: String,
    /// The jurisdiction the rates describe.
    pub jurisdiction: String,
    /// Where the figures were taken from.
    #[serde(default)]
    pub source: String,
}

/// One band of a progressive schedule.
///
/// The band covers income above `lower` up to and including `upper`; the
/// last band of a schedule has no upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Lower bound of the band.
    pub lower: Money,
    /// Upper bound of the band, `None` for the top band.
    #[serde(default)]
    pub upper: Option<Money>,
    /// Marginal rate as a fraction (`0.22` is 22%).
    pub rate: Decimal,
}

/// Bracket schedules by filing status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSchedules {
    /// Schedule for single filers and head of household.
    pub single: Vec<TaxBracket>,
    /// Schedule for married filing jointly.
    pub married: Vec<TaxBracket>,
}

/// Social Security and Medicare parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FicaRates {
    /// Social Security rate.
    pub ss_rate: Decimal,
    /// Wages above this amount in a year owe no Social Security.
    pub ss_wage_base: Money,
    /// Base Medicare rate.
    pub medicare_rate: Decimal,
    /// Additional Medicare rate on wages above the threshold.
    pub additional_medicare_rate: Decimal,
    /// Cumulative Medicare wages above which the additional rate applies.
    pub additional_medicare_threshold: Money,
}

/// Flat state withholding rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTaxConfig {
    /// Rate for any state not listed in `rates`.
    pub default_rate: Decimal,
    /// Per-state overrides keyed by upper-case state code.
    #[serde(default)]
    pub rates: HashMap<String, Decimal>,
}

/// Weekly overtime rule for hourly employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeRule {
    /// Hours paid at the regular rate before overtime starts.
    pub threshold_hours: Decimal,
    /// Multiplier applied to the hourly rate for overtime hours.
    pub multiplier: Decimal,
}

/// The complete tax policy for one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPolicy {
    /// The calendar year this policy applies to.
    pub tax_year: i32,
    /// Annual value of one withholding allowance.
    pub allowance_value: Money,
    /// Annual standard deduction by filing status.
    pub standard_deductions: HashMap<FilingStatus, Money>,
    /// Federal bracket schedules.
    pub brackets: BracketSchedules,
    /// FICA parameters.
    pub fica: FicaRates,
    /// State withholding.
    pub state: StateTaxConfig,
    /// Overtime rule.
    pub overtime: OvertimeRule,
}

impl TaxPolicy {
    /// The standard deduction for a filing status.
    ///
    /// A status without its own entry uses the single filer's deduction.
    pub fn standard_deduction(&self, status: FilingStatus) -> Money {
        self.standard_deductions
            .get(&status)
            .or_else(|| self.standard_deductions.get(&FilingStatus::Single))
            .copied()
            .unwrap_or(Money::ZERO)
    }

    /// The bracket schedule used for a filing status.
    pub fn schedule(&self, status: FilingStatus) -> &[TaxBracket] {
        match status {
            FilingStatus::Married => &self.brackets.married,
            FilingStatus::Single | FilingStatus::HeadOfHousehold => &self.brackets.single,
        }
    }

    /// The flat withholding rate for a state code.
    pub fn state_rate(&self, state: &str) -> Decimal {
        self.state
            .rates
            .get(&state.to_uppercase())
            .copied()
            .unwrap_or(self.state.default_rate)
    }

    /// Checks that the schedules are well formed and the rates sane.
    pub fn validate(&self) -> EngineResult<()> {
        validate_schedule(self.tax_year, "single", &self.brackets.single)?;
        validate_schedule(self.tax_year, "married", &self.brackets.married)?;

        let rates = [
            ("fica.ss_rate", self.fica.ss_rate),
            ("fica.medicare_rate", self.fica.medicare_rate),
            (
                "fica.additional_medicare_rate",
                self.fica.additional_medicare_rate,
            ),
            ("state.default_rate", self.state.default_rate),
        ];
        for (field, rate) in rates {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(policy_error(
                    self.tax_year,
                    format!("{} must be a fraction between 0 and 1", field),
                ));
            }
        }

        if self.overtime.multiplier < Decimal::ONE {
            return Err(policy_error(
                self.tax_year,
                "overtime.multiplier must be at least 1",
            ));
        }
        if self.overtime.threshold_hours < Decimal::ZERO {
            return Err(policy_error(
                self.tax_year,
                "overtime.threshold_hours must not be negative",
            ));
        }
        Ok(())
    }
}

fn validate_schedule(year: i32, name: &str, brackets: &[TaxBracket]) -> EngineResult<()> {
    let Some(first) = brackets.first() else {
        return Err(policy_error(year, format!("{} schedule is empty", name)));
    };
    if !first.lower.is_zero() {
        return Err(policy_error(
            year,
            format!("{} schedule must start at zero", name),
        ));
    }

    for pair in brackets.windows(2) {
        match pair[0].upper {
            Some(upper) if upper == pair[1].lower && upper > pair[0].lower => {}
            _ => {
                return Err(policy_error(
                    year,
                    format!(
                        "{} schedule bracket starting at {} is not contiguous with the next",
                        name, pair[0].lower
                    ),
                ));
            }
        }
    }

    if brackets.last().is_some_and(|b| b.upper.is_some()) {
        return Err(policy_error(
            year,
            format!("{} schedule must end with an open bracket", name),
        ));
    }
    if brackets
        .iter()
        .any(|b| b.rate < Decimal::ZERO || b.rate > Decimal::ONE)
    {
        return Err(policy_error(
            year,
            format!("{} schedule has a rate outside 0..=1", name),
        ));
    }
    Ok(())
}

fn policy_error(year: i32, message: impl Into<String>) -> EngineError {
    EngineError::ConfigParseError {
        path: format!("tax policy {}", year),
        message: message.into(),
    }
}

/// Tax policies for every configured year.
///
/// Years are kept sorted so lookups can fall back to the latest earlier
/// year.
#[derive(Debug, Clone)]
pub struct PolicySet {
    metadata: PolicyMetadata,
    policies: BTreeMap<i32, TaxPolicy>,
}

impl PolicySet {
    /// Creates an empty set.
    pub fn new(metadata: PolicyMetadata) -> Self {
        Self {
            metadata,
            policies: BTreeMap::new(),
        }
    }

    /// The policy set compiled into the engine (tax year 2024).
    pub fn builtin() -> Self {
        let mut set = Self::new(PolicyMetadata {
            name: "Built-in federal payroll policy".to_string(),
            jurisdiction: "US".to_string(),
            source: "IRS Publication 15-T (2024)".to_string(),
        });
        set.insert(super::builtin::policy_2024());
        set
    }

    /// Adds or replaces the policy for its tax year.
    pub fn insert(&mut self, policy: TaxPolicy) {
        self.policies.insert(policy.tax_year, policy);
    }

    /// Returns the set metadata.
    pub fn metadata(&self) -> &PolicyMetadata {
        &self.metadata
    }

    /// Returns the configured tax years, oldest first.
    pub fn years(&self) -> Vec<i32> {
        self.policies.keys().copied().collect()
    }

    /// Returns true if no policy is configured.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Returns the policy that applies to `year`.
    ///
    /// The exact year when configured, otherwise the latest earlier year.
    /// A year before every configured policy is `PolicyNotFound`.
    pub fn policy_for(&self, year: i32) -> EngineResult<&TaxPolicy> {
        let (found_year, policy) = self
            .policies
            .range(..=year)
            .next_back()
            .ok_or(EngineError::PolicyNotFound { year })?;

        if *found_year != year {
            warn!(
                requested_year = year,
                policy_year = found_year,
                "No tax policy for requested year, using latest earlier policy"
            );
        }
        Ok(policy)
    }
}
