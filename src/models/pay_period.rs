//! Pay period model.
//!
//! This module contains the [`PayPeriod`] type: the date window a payroll
//! run covers and the date the money is paid.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EngineError, EngineResult};

/// A pay period with its work window and pay date.
///
/// The tax year of a period is the calendar year of its pay date, which is
/// the year its wages are reported in.
///
/// # Example
///
/// ```
/// use payroll_engine::models::PayPeriod;
/// use chrono::NaiveDate;
///
/// let period = PayPeriod::new(
///     NaiveDate::from_ymd_opt(2024, 12, 16).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 12, 29).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
/// )
/// .unwrap();
///
/// assert_eq!(period.tax_year(), 2025);
/// assert!(period.contains_date(NaiveDate::from_ymd_opt(2024, 12, 20).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriod {
    /// The first day of work covered (inclusive).
    pub start_date: NaiveDate,
    /// The last day of work covered (inclusive).
    pub end_date: NaiveDate,
    /// The day the employee is paid.
    pub pay_date: NaiveDate,
}

impl PayPeriod {
    /// Builds a validated pay period.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        pay_date: NaiveDate,
    ) -> EngineResult<Self> {
        let period = Self {
            start_date,
            end_date,
            pay_date,
        };
        period.validate()?;
        Ok(period)
    }

    /// Rejects a period whose end precedes its start.
    ///
    /// A pay date before the end date is unusual but allowed; it is logged.
    pub fn validate(&self) -> EngineResult<()> {
        if self.end_date < self.start_date {
            return Err(EngineError::invalid_input(
                "pay_period",
                format!(
                    "end date {} precedes start date {}",
                    self.end_date, self.start_date
                ),
            ));
        }
        if self.pay_date < self.end_date {
            warn!(
                start_date = %self.start_date,
                end_date = %self.end_date,
                pay_date = %self.pay_date,
                "Pay date falls before the end of the pay period"
            );
        }
        Ok(())
    }

    /// The calendar year wages paid in this period belong to.
    pub fn tax_year(&self) -> i32 {
        self.pay_date.year()
    }

    /// Checks if a given date falls within the work window (inclusive).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}
