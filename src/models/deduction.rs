//! Payroll deductions.
//!
//! A [`Deduction`] belongs to one employee and is either taken before tax
//! (reducing taxable wages) or after tax, according to its
//! [`DeductionKind`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::Money;

/// The seven kinds of deduction the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeductionKind {
    /// Traditional 401(k) contribution.
    #[serde(rename = "pre_tax_401k")]
    PreTax401k,
    /// Health savings account.
    #[serde(rename = "pre_tax_hsa")]
    PreTaxHsa,
    /// Flexible spending account.
    #[serde(rename = "pre_tax_fsa")]
    PreTaxFsa,
    /// Health insurance premium.
    #[serde(rename = "pre_tax_health")]
    PreTaxHealth,
    /// Roth 401(k) contribution.
    #[serde(rename = "post_tax_roth")]
    PostTaxRoth,
    /// Wage garnishment.
    #[serde(rename = "post_tax_garnishment")]
    PostTaxGarnishment,
    /// Any other after-tax deduction.
    #[serde(rename = "post_tax_other")]
    PostTaxOther,
}

impl DeductionKind {
    /// Every kind, pre-tax kinds first.
    pub const ALL: [DeductionKind; 7] = [
        DeductionKind::PreTax401k,
        DeductionKind::PreTaxHsa,
        DeductionKind::PreTaxFsa,
        DeductionKind::PreTaxHealth,
        DeductionKind::PostTaxRoth,
        DeductionKind::PostTaxGarnishment,
        DeductionKind::PostTaxOther,
    ];

    /// Returns true if the deduction reduces taxable wages.
    pub fn is_pre_tax(&self) -> bool {
        matches!(
            self,
            DeductionKind::PreTax401k
                | DeductionKind::PreTaxHsa
                | DeductionKind::PreTaxFsa
                | DeductionKind::PreTaxHealth
        )
    }

    /// The identifier used in storage and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeductionKind::PreTax401k => "pre_tax_401k",
            DeductionKind::PreTaxHsa => "pre_tax_hsa",
            DeductionKind::PreTaxFsa => "pre_tax_fsa",
            DeductionKind::PreTaxHealth => "pre_tax_health",
            DeductionKind::PostTaxRoth => "post_tax_roth",
            DeductionKind::PostTaxGarnishment => "post_tax_garnishment",
            DeductionKind::PostTaxOther => "post_tax_other",
        }
    }
}

impl fmt::Display for DeductionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeductionKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        DeductionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                EngineError::invalid_input(
                    "deduction_type",
                    format!("unknown deduction type '{}'", wanted),
                )
            })
    }
}

/// How much a deduction takes each period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DeductionAmount {
    /// A fixed amount per period.
    Flat(Money),
    /// A percentage (0 to 100) of the period's gross pay.
    Percentage(Decimal),
}

impl DeductionAmount {
    /// Resolves the amount for a period with the given gross pay.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::{DeductionAmount, Money};
    /// use rust_decimal::Decimal;
    ///
    /// let gross = Money::whole(2_000);
    /// assert_eq!(DeductionAmount::Percentage(Decimal::from(10)).resolve(gross), Money::whole(200));
    /// assert_eq!(DeductionAmount::Flat(Money::whole(150)).resolve(gross), Money::whole(150));
    /// ```
    pub fn resolve(&self, gross: Money) -> Money {
        match self {
            DeductionAmount::Flat(amount) => *amount,
            DeductionAmount::Percentage(pct) => gross.percent(*pct),
        }
    }

    /// Rejects negative amounts and percentages outside 0..=100.
    pub fn validate(&self) -> EngineResult<()> {
        match self {
            DeductionAmount::Flat(amount) if amount.is_negative() => Err(
                EngineError::invalid_input("amount", "flat deduction must not be negative"),
            ),
            DeductionAmount::Percentage(pct)
                if (pct.is_sign_negative() && !pct.is_zero()) || *pct > Decimal::ONE_HUNDRED =>
            {
                Err(EngineError::invalid_input(
                    "amount",
                    format!("percentage {} must be between 0 and 100", pct),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Returns true for percentage-of-gross deductions.
    pub fn is_percentage(&self) -> bool {
        matches!(self, DeductionAmount::Percentage(_))
    }
}

impl fmt::Display for DeductionAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeductionAmount::Flat(amount) => write!(f, "${}", amount),
            DeductionAmount::Percentage(pct) => write!(f, "{}%", pct.normalize()),
        }
    }
}

/// A deduction attached to an employee.
///
/// Deductions are never edited; turning one off flips `active` and leaves
/// the record in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    /// Unique identifier.
    pub id: String,
    /// The employee this deduction belongs to.
    pub employee_id: String,
    /// Kind of deduction (decides pre-tax vs post-tax).
    #[serde(rename = "deduction_type")]
    pub kind: DeductionKind,
    /// Flat or percentage amount.
    pub amount: DeductionAmount,
    /// Free-text description shown on paystubs.
    pub description: String,
    /// Only active deductions are taken.
    pub active: bool,
    /// When the deduction was created.
    pub created_at: DateTime<Utc>,
}

/// The attributes needed to create a deduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDeduction {
    /// The employee the deduction is for.
    pub employee_id: String,
    /// Kind of deduction.
    #[serde(rename = "deduction_type")]
    pub kind: DeductionKind,
    /// Flat or percentage amount.
    pub amount: DeductionAmount,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

impl NewDeduction {
    /// Validates the amount and builds an active deduction.
    pub fn into_deduction(self, id: String, created_at: DateTime<Utc>) -> EngineResult<Deduction> {
        self.amount.validate()?;
        let description = if self.description.trim().is_empty() {
            "Deduction".to_string()
        } else {
            self.description
        };
        Ok(Deduction {
            id,
            employee_id: self.employee_id,
            kind: self.kind,
            amount: self.amount,
            description,
            active: true,
            created_at,
        })
    }
}
