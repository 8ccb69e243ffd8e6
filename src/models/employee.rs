//! Employee model and related types.
//!
//! This module defines the [`Employee`] snapshot the calculator consumes,
//! its compensation and filing attributes, and the [`YtdTotals`] ledger the
//! payroll run advances.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::Money;

/// How often an employee is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayFrequency {
    /// Every week (52 periods).
    Weekly,
    /// Every two weeks (26 periods).
    Biweekly,
    /// Twice a month (24 periods).
    SemiMonthly,
    /// Once a month (12 periods).
    Monthly,
}

impl PayFrequency {
    /// Number of pay periods in a year for this frequency.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::PayFrequency;
    ///
    /// assert_eq!(PayFrequency::Weekly.periods_per_year(), 52);
    /// assert_eq!(PayFrequency::Biweekly.periods_per_year(), 26);
    /// assert_eq!(PayFrequency::SemiMonthly.periods_per_year(), 24);
    /// assert_eq!(PayFrequency::Monthly.periods_per_year(), 12);
    /// ```
    pub fn periods_per_year(&self) -> u32 {
        match self {
            PayFrequency::Weekly => 52,
            PayFrequency::Biweekly => 26,
            PayFrequency::SemiMonthly => 24,
            PayFrequency::Monthly => 12,
        }
    }

    /// The snake_case name used in storage and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            PayFrequency::Weekly => "weekly",
            PayFrequency::Biweekly => "biweekly",
            PayFrequency::SemiMonthly => "semi_monthly",
            PayFrequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for PayFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayFrequency {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weekly" => Ok(PayFrequency::Weekly),
            "biweekly" => Ok(PayFrequency::Biweekly),
            "semi_monthly" | "semimonthly" => Ok(PayFrequency::SemiMonthly),
            "monthly" => Ok(PayFrequency::Monthly),
            other => Err(EngineError::invalid_input(
                "pay_frequency",
                format!("unknown pay frequency '{}'", other),
            )),
        }
    }
}

/// Federal filing status used for withholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    /// Single filer.
    Single,
    /// Married filing jointly.
    Married,
    /// Head of household.
    HeadOfHousehold,
}

impl FilingStatus {
    /// The snake_case name used in storage and configuration keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::Married => "married",
            FilingStatus::HeadOfHousehold => "head_of_household",
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilingStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(FilingStatus::Single),
            "married" => Ok(FilingStatus::Married),
            "head_of_household" => Ok(FilingStatus::HeadOfHousehold),
            other => Err(EngineError::invalid_input(
                "filing_status",
                format!("unknown filing status '{}'", other),
            )),
        }
    }
}

/// Lifecycle status of an employee. Only active employees are paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    /// Currently employed and on payroll.
    Active,
    /// No longer employed.
    Terminated,
    /// Employed but not currently paid.
    OnLeave,
}

impl EmployeeStatus {
    /// The snake_case name used in storage and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::Terminated => "terminated",
            EmployeeStatus::OnLeave => "on_leave",
        }
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(EmployeeStatus::Active),
            "terminated" => Ok(EmployeeStatus::Terminated),
            "on_leave" => Ok(EmployeeStatus::OnLeave),
            other => Err(EngineError::invalid_input(
                "status",
                format!("unknown employee status '{}'", other),
            )),
        }
    }
}

/// Year-to-date accumulators for one tax year.
///
/// `gross`, `federal_tax`, `ss_tax`, `medicare_tax` and `deductions` are the
/// classic paystub figures. `ss_wages` and `medicare_wages` hold the wages
/// FICA was actually assessed on, so cap and surtax checks never have to
/// reconstruct wages from tax paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YtdTotals {
    /// The calendar tax year these totals belong to.
    pub tax_year: i32,
    /// Gross pay to date.
    #[serde(default)]
    pub gross: Money,
    /// Federal income tax withheld to date.
    #[serde(default)]
    pub federal_tax: Money,
    /// State income tax withheld to date.
    #[serde(default)]
    pub state_tax: Money,
    /// Social Security tax withheld to date.
    #[serde(default)]
    pub ss_tax: Money,
    /// Medicare tax (including surtax) withheld to date.
    #[serde(default)]
    pub medicare_tax: Money,
    /// Pre-tax plus post-tax deductions to date.
    #[serde(default)]
    pub deductions: Money,
    /// Net pay to date.
    #[serde(default)]
    pub net: Money,
    /// Wages subject to Social Security to date (never above the wage base).
    #[serde(default)]
    pub ss_wages: Money,
    /// Wages subject to Medicare to date (uncapped).
    #[serde(default)]
    pub medicare_wages: Money,
}

impl YtdTotals {
    /// An empty ledger for `tax_year`.
    pub fn new(tax_year: i32) -> Self {
        Self {
            tax_year,
            gross: Money::ZERO,
            federal_tax: Money::ZERO,
            state_tax: Money::ZERO,
            ss_tax: Money::ZERO,
            medicare_tax: Money::ZERO,
            deductions: Money::ZERO,
            net: Money::ZERO,
            ss_wages: Money::ZERO,
            medicare_wages: Money::ZERO,
        }
    }

    /// Returns the ledger that applies to `tax_year`.
    ///
    /// The stored totals when the year matches, an empty ledger for a later
    /// year, and an error for a year the ledger has already moved past.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::{Money, YtdTotals};
    ///
    /// let mut ytd = YtdTotals::new(2024);
    /// ytd.gross = Money::whole(50_000);
    ///
    /// assert_eq!(ytd.for_tax_year(2024).unwrap().gross, Money::whole(50_000));
    /// assert_eq!(ytd.for_tax_year(2025).unwrap().gross, Money::ZERO);
    /// assert!(ytd.for_tax_year(2023).is_err());
    /// ```
    pub fn for_tax_year(&self, tax_year: i32) -> EngineResult<YtdTotals> {
        if tax_year == self.tax_year {
            Ok(self.clone())
        } else if tax_year > self.tax_year {
            Ok(YtdTotals::new(tax_year))
        } else {
            Err(EngineError::invalid_input(
                "tax_year",
                format!(
                    "tax year {} precedes the ledger's current year {}",
                    tax_year, self.tax_year
                ),
            ))
        }
    }
}

/// An employee snapshot as seen by the calculator.
///
/// The calculator never mutates an employee; a payroll run produces new
/// [`YtdTotals`] which the repository stores alongside the paystub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier (`EMP-XXXXXXXX`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Annual salary. Used for salaried pay and the hourly fallback.
    pub annual_salary: Money,
    /// Hourly rate. When present the employee is paid hourly.
    #[serde(default)]
    pub hourly_rate: Option<Money>,
    /// How often the employee is paid.
    pub pay_frequency: PayFrequency,
    /// Federal filing status.
    pub filing_status: FilingStatus,
    /// Number of withholding allowances claimed.
    pub withholding_allowances: u32,
    /// Two-letter state code.
    pub state: String,
    /// Lifecycle status.
    pub status: EmployeeStatus,
    /// Date of hire.
    pub hire_date: NaiveDate,
    /// Department name.
    #[serde(default)]
    pub department: String,
    /// Job title.
    #[serde(default)]
    pub title: String,
    /// Contact email.
    #[serde(default)]
    pub email: String,
    /// Year-to-date ledger.
    pub ytd: YtdTotals,
}

impl Employee {
    /// Returns true if the employee is paid by the hour.
    pub fn is_hourly(&self) -> bool {
        self.hourly_rate.is_some()
    }

    /// Returns true if the employee may be paid.
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }

    /// Salary for a single period: annual salary over periods per year.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::{Money, NewEmployee, PayFrequency};
    /// use chrono::NaiveDate;
    ///
    /// let mut new = NewEmployee::salaried("Bob Jones", Money::whole(52_000));
    /// new.pay_frequency = PayFrequency::Biweekly;
    /// let employee = new.into_employee(
    ///     "EMP-00000001".to_string(),
    ///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    /// );
    /// assert_eq!(employee.period_salary(), Money::whole(2_000));
    /// ```
    pub fn period_salary(&self) -> Money {
        self.annual_salary
            .divided_by(self.pay_frequency.periods_per_year())
    }

    /// Returns a new snapshot carrying `ytd`.
    pub fn with_ytd(&self, ytd: YtdTotals) -> Employee {
        Employee {
            ytd,
            ..self.clone()
        }
    }
}

fn default_frequency() -> PayFrequency {
    PayFrequency::Biweekly
}

fn default_filing_status() -> FilingStatus {
    FilingStatus::Single
}

fn default_allowances() -> u32 {
    1
}

fn default_state() -> String {
    "CA".to_string()
}

/// The attributes needed to hire an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmployee {
    /// Display name.
    pub name: String,
    /// Annual salary.
    pub annual_salary: Money,
    /// Optional hourly rate (makes the employee hourly).
    #[serde(default)]
    pub hourly_rate: Option<Money>,
    /// Pay frequency (defaults to biweekly).
    #[serde(default = "default_frequency")]
    pub pay_frequency: PayFrequency,
    /// Filing status (defaults to single).
    #[serde(default = "default_filing_status")]
    pub filing_status: FilingStatus,
    /// Withholding allowances (defaults to 1).
    #[serde(default = "default_allowances")]
    pub withholding_allowances: u32,
    /// State code (defaults to CA).
    #[serde(default = "default_state")]
    pub state: String,
    /// Department name.
    #[serde(default)]
    pub department: String,
    /// Job title.
    #[serde(default)]
    pub title: String,
    /// Contact email.
    #[serde(default)]
    pub email: String,
}

impl NewEmployee {
    /// A salaried hire with the default frequency, filing status and state.
    pub fn salaried(name: impl Into<String>, annual_salary: Money) -> Self {
        Self {
            name: name.into(),
            annual_salary,
            hourly_rate: None,
            pay_frequency: default_frequency(),
            filing_status: default_filing_status(),
            withholding_allowances: default_allowances(),
            state: default_state(),
            department: String::new(),
            title: String::new(),
            email: String::new(),
        }
    }

    /// Checks salary, rate and state before the hire is stored.
    pub fn validate(&self) -> EngineResult<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::invalid_input("name", "must not be empty"));
        }
        if self.annual_salary.is_negative() {
            return Err(EngineError::invalid_input(
                "annual_salary",
                "must not be negative",
            ));
        }
        if let Some(rate) = self.hourly_rate {
            if !rate.is_positive() {
                return Err(EngineError::invalid_input(
                    "hourly_rate",
                    "must be greater than zero",
                ));
            }
        }
        if self.state.trim().is_empty() {
            return Err(EngineError::invalid_input("state", "must not be empty"));
        }
        Ok(())
    }

    /// Turns the hire into an active employee with an empty ledger for the
    /// hire date's year.
    pub fn into_employee(self, id: String, hire_date: NaiveDate) -> Employee {
        use chrono::Datelike;

        Employee {
            id,
            name: self.name,
            annual_salary: self.annual_salary,
            hourly_rate: self.hourly_rate,
            pay_frequency: self.pay_frequency,
            filing_status: self.filing_status,
            withholding_allowances: self.withholding_allowances,
            state: self.state.trim().to_uppercase(),
            status: EmployeeStatus::Active,
            hire_date,
            department: self.department,
            title: self.title,
            email: self.email,
            ytd: YtdTotals::new(hire_date.year()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_employee(frequency: PayFrequency) -> Employee {
        let mut new = NewEmployee::salaried("Alice Smith", Money::whole(80_000));
        new.pay_frequency = frequency;
        new.state = "ny".to_string();
        new.into_employee(
            "EMP-0000TEST".to_string(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        )
    }

    #[test]
    fn test_new_employee_is_active_with_empty_ledger() {
        let employee = create_test_employee(PayFrequency::Biweekly);
        assert!(employee.is_active());
        assert!(!employee.is_hourly());
        assert_eq!(employee.state, "NY");
        assert_eq!(employee.ytd, YtdTotals::new(2024));
    }

    #[test]
    fn test_period_salary_monthly() {
        let mut employee = create_test_employee(PayFrequency::Monthly);
        employee.annual_salary = Money::whole(60_000);
        assert_eq!(employee.period_salary(), Money::whole(5_000));
    }

    #[test]
    fn test_period_salary_rounds_half_up() {
        let mut employee = create_test_employee(PayFrequency::Weekly);
        employee.annual_salary = Money::whole(100_000);
        // 100000 / 52 = 1923.0769...
        assert_eq!(employee.period_salary(), Money::from_cents(192308));
    }

    #[test]
    fn test_hourly_rate_makes_employee_hourly() {
        let mut employee = create_test_employee(PayFrequency::Weekly);
        employee.hourly_rate = Some(Money::whole(25));
        assert!(employee.is_hourly());
    }

    #[test]
    fn test_with_ytd_returns_new_snapshot() {
        let employee = create_test_employee(PayFrequency::Biweekly);
        let mut ytd = YtdTotals::new(2024);
        ytd.gross = Money::whole(1_000);

        let updated = employee.with_ytd(ytd.clone());
        assert_eq!(updated.ytd, ytd);
        assert_eq!(employee.ytd.gross, Money::ZERO);
    }

    #[test]
    fn test_validate_rejects_negative_salary() {
        let new = NewEmployee::salaried("Neg", Money::whole(-1));
        assert!(matches!(
            new.validate(),
            Err(EngineError::InvalidInput { field, .. }) if field == "annual_salary"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_hourly_rate() {
        let mut new = NewEmployee::salaried("Zero", Money::whole(0));
        new.hourly_rate = Some(Money::ZERO);
        assert!(new.validate().is_err());
    }

    #[test]
    fn test_enum_serialization() {
        assert_eq!(
            serde_json::to_string(&PayFrequency::SemiMonthly).unwrap(),
            "\"semi_monthly\""
        );
        assert_eq!(
            serde_json::to_string(&FilingStatus::HeadOfHousehold).unwrap(),
            "\"head_of_household\""
        );
        assert_eq!(
            serde_json::to_string(&EmployeeStatus::OnLeave).unwrap(),
            "\"on_leave\""
        );
    }

    #[test]
    fn test_enum_from_str() {
        assert_eq!(
            "semi_monthly".parse::<PayFrequency>().unwrap(),
            PayFrequency::SemiMonthly
        );
        assert_eq!(
            "Married".parse::<FilingStatus>().unwrap(),
            FilingStatus::Married
        );
        assert_eq!(
            "terminated".parse::<EmployeeStatus>().unwrap(),
            EmployeeStatus::Terminated
        );
        assert!("fortnightly".parse::<PayFrequency>().is_err());
    }

    #[test]
    fn test_deserialize_employee_with_defaults() {
        let json = r#"{
            "id": "EMP-00000002",
            "name": "Bob Jones",
            "annual_salary": "52000",
            "pay_frequency": "biweekly",
            "filing_status": "single",
            "withholding_allowances": 1,
            "state": "CA",
            "status": "active",
            "hire_date": "2024-01-01",
            "ytd": { "tax_year": 2024, "gross": "2000.00" }
        }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.annual_salary, Money::whole(52_000));
        assert_eq!(employee.hourly_rate, None);
        assert_eq!(employee.ytd.gross, Money::whole(2_000));
        assert_eq!(employee.ytd.ss_wages, Money::ZERO);
        assert!(employee.department.is_empty());
    }

    #[test]
    fn test_ytd_for_earlier_year_is_rejected() {
        let ytd = YtdTotals::new(2025);
        assert!(matches!(
            ytd.for_tax_year(2024),
            Err(EngineError::InvalidInput { field, .. }) if field == "tax_year"
        ));
    }
}
