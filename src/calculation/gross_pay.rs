//! Gross pay calculation.
//!
//! Salaried employees earn their annual salary spread evenly over the pay
//! periods of a year. Hourly employees earn their rate for regular hours and
//! an overtime premium above the weekly threshold. An hourly employee with no
//! hours reported falls back to the salaried calculation.

use rust_decimal::Decimal;
use tracing::warn;

use crate::config::OvertimeRule;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, Employee, Money, PayBasis};

/// Most hours a single period can hold: 31 days of 24 hours.
pub const MAX_PERIOD_HOURS: Decimal = Decimal::from_parts(744, 0, 0, false, 0);

/// The result of calculating gross pay, including the audit step.
#[derive(Debug, Clone)]
pub struct GrossPayResult {
    /// Gross pay for the period.
    pub gross_pay: Money,
    /// How the gross was determined.
    pub pay_basis: PayBasis,
    /// Hours paid at the regular rate (hourly basis only).
    pub regular_hours: Option<Decimal>,
    /// Hours paid at the overtime rate (hourly basis only).
    pub overtime_hours: Option<Decimal>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates gross pay for one period.
///
/// # Arguments
///
/// * `employee` - The employee being paid
/// * `hours` - Total hours worked in the period, if reported
/// * `overtime_hours` - Hours to pay at the overtime rate on top of any
///   hours above the threshold
/// * `overtime` - The policy's overtime threshold and multiplier
/// * `step_number` - The step number for audit trail sequencing
///
/// # Errors
///
/// Returns `InvalidInput` for negative hours, or when hours plus overtime
/// hours exceed [`MAX_PERIOD_HOURS`]. Returns `CalculationError` if the
/// hourly gross does not fit in a decimal.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_gross_pay;
/// use payroll_engine::config::PolicySet;
/// use payroll_engine::models::{Money, NewEmployee, PayBasis};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let mut new = NewEmployee::salaried("Carol White", Money::whole(0));
/// new.hourly_rate = Some(Money::whole(25));
/// let employee = new.into_employee(
///     "EMP-00000003".to_string(),
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
/// );
/// let policies = PolicySet::builtin();
/// let overtime = &policies.policy_for(2024).unwrap().overtime;
///
/// let result = calculate_gross_pay(&employee, Some(Decimal::from(45)), None, overtime, 1).unwrap();
/// assert_eq!(result.pay_basis, PayBasis::Hourly);
/// assert_eq!(result.gross_pay, Money::from_cents(118750));
/// ```
pub fn calculate_gross_pay(
    employee: &Employee,
    hours: Option<Decimal>,
    overtime_hours: Option<Decimal>,
    overtime: &OvertimeRule,
    step_number: u32,
) -> EngineResult<GrossPayResult> {
    if hours.is_some_and(|h| h < Decimal::ZERO) {
        return Err(EngineError::invalid_input("hours", "must not be negative"));
    }
    if overtime_hours.is_some_and(|h| h < Decimal::ZERO) {
        return Err(EngineError::invalid_input(
            "overtime_hours",
            "must not be negative",
        ));
    }
    let total_hours = hours.unwrap_or(Decimal::ZERO) + overtime_hours.unwrap_or(Decimal::ZERO);
    if total_hours > MAX_PERIOD_HOURS {
        return Err(EngineError::invalid_input(
            "hours",
            format!("hours plus overtime hours must not exceed {}", MAX_PERIOD_HOURS),
        ));
    }

    match (employee.hourly_rate, hours) {
        (Some(rate), Some(hours)) => hourly_gross(
            rate,
            hours,
            overtime_hours.unwrap_or(Decimal::ZERO),
            overtime,
            step_number,
        ),
        (rate, _) => {
            let pay_basis = if rate.is_some() {
                PayBasis::SalariedFallback
            } else {
                PayBasis::Salaried
            };
            if overtime_hours.is_some_and(|h| !h.is_zero()) {
                warn!(
                    employee_id = %employee.id,
                    pay_basis = ?pay_basis,
                    "Overtime hours ignored for salaried pay"
                );
            }
            Ok(salaried_gross(employee, pay_basis, step_number))
        }
    }
}

fn hourly_gross(
    rate: Money,
    hours: Decimal,
    extra_overtime: Decimal,
    overtime: &OvertimeRule,
    step_number: u32,
) -> EngineResult<GrossPayResult> {
    let regular_hours = hours.min(overtime.threshold_hours);
    let overtime_hours = (hours - overtime.threshold_hours).max(Decimal::ZERO) + extra_overtime;
    let overflow = || EngineError::CalculationError {
        message: format!("hourly gross overflows at ${}/h for {}h", rate, hours.normalize()),
    };
    let overtime_rate = rate
        .amount()
        .checked_mul(overtime.multiplier)
        .ok_or_else(overflow)?;
    let gross = regular_hours
        .checked_mul(rate.amount())
        .zip(overtime_hours.checked_mul(overtime_rate))
        .and_then(|(regular, extra)| regular.checked_add(extra))
        .ok_or_else(overflow)?;
    let gross_pay = Money::new(gross);

    let audit_step = AuditStep {
        step_number,
        rule_id: "gross_pay".to_string(),
        rule_name: "Gross Pay (Hourly)".to_string(),
        input: serde_json::json!({
            "hourly_rate": rate.to_string(),
            "hours": hours.normalize().to_string(),
            "extra_overtime_hours": extra_overtime.normalize().to_string(),
            "overtime_threshold": overtime.threshold_hours.normalize().to_string(),
            "overtime_multiplier": overtime.multiplier.normalize().to_string()
        }),
        output: serde_json::json!({
            "regular_hours": regular_hours.normalize().to_string(),
            "overtime_hours": overtime_hours.normalize().to_string(),
            "gross_pay": gross_pay.to_string()
        }),
        reasoning: format!(
            "{}h x ${} + {}h x ${} = ${}",
            regular_hours.normalize(),
            rate,
            overtime_hours.normalize(),
            overtime_rate.normalize(),
            gross_pay
        ),
    };

    Ok(GrossPayResult {
        gross_pay,
        pay_basis: PayBasis::Hourly,
        regular_hours: Some(regular_hours),
        overtime_hours: Some(overtime_hours),
        audit_step,
    })
}

fn salaried_gross(employee: &Employee, pay_basis: PayBasis, step_number: u32) -> GrossPayResult {
    let periods = employee.pay_frequency.periods_per_year();
    let gross_pay = employee.period_salary();

    let reasoning = match pay_basis {
        PayBasis::SalariedFallback => format!(
            "No hours reported for hourly employee; ${} / {} periods = ${}",
            employee.annual_salary, periods, gross_pay
        ),
        _ => format!(
            "${} / {} periods = ${}",
            employee.annual_salary, periods, gross_pay
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "gross_pay".to_string(),
        rule_name: "Gross Pay (Salaried)".to_string(),
        input: serde_json::json!({
            "annual_salary": employee.annual_salary.to_string(),
            "pay_frequency": employee.pay_frequency.as_str(),
            "periods_per_year": periods
        }),
        output: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "fallback": pay_basis == PayBasis::SalariedFallback
        }),
        reasoning,
    };

    GrossPayResult {
        gross_pay,
        pay_basis,
        regular_hours: None,
        overtime_hours: None,
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewEmployee, PayFrequency};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn overtime_rule() -> OvertimeRule {
        OvertimeRule {
            threshold_hours: dec("40"),
            multiplier: dec("1.5"),
        }
    }

    fn create_employee(salary: i64, hourly_rate: Option<&str>) -> Employee {
        let mut new = NewEmployee::salaried("Test Employee", Money::whole(salary));
        new.hourly_rate = hourly_rate.map(|r| Money::from_str(r).unwrap());
        new.into_employee(
            "EMP-00000001".to_string(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    #[test]
    fn test_salaried_biweekly() {
        let employee = create_employee(52_000, None);
        let result = calculate_gross_pay(&employee, None, None, &overtime_rule(), 1).unwrap();

        assert_eq!(result.gross_pay, Money::whole(2_000));
        assert_eq!(result.pay_basis, PayBasis::Salaried);
        assert_eq!(result.regular_hours, None);
        assert_eq!(result.audit_step.rule_id, "gross_pay");
        assert_eq!(result.audit_step.step_number, 1);
    }

    #[test]
    fn test_salaried_ignores_hours() {
        let employee = create_employee(52_000, None);
        let result =
            calculate_gross_pay(&employee, Some(dec("60")), None, &overtime_rule(), 1).unwrap();
        assert_eq!(result.gross_pay, Money::whole(2_000));
    }

    #[test]
    fn test_hourly_without_overtime() {
        let employee = create_employee(0, Some("25.00"));
        let result =
            calculate_gross_pay(&employee, Some(dec("38")), None, &overtime_rule(), 1).unwrap();

        assert_eq!(result.gross_pay, Money::whole(950));
        assert_eq!(result.regular_hours, Some(dec("38")));
        assert_eq!(result.overtime_hours, Some(dec("0")));
    }

    #[test]
    fn test_hourly_overtime_above_forty_hours() {
        let employee = create_employee(0, Some("25.00"));
        let result =
            calculate_gross_pay(&employee, Some(dec("45")), None, &overtime_rule(), 1).unwrap();

        // 40 x 25 + 5 x 37.50
        assert_eq!(result.gross_pay, Money::from_str("1187.50").unwrap());
        assert_eq!(result.regular_hours, Some(dec("40")));
        assert_eq!(result.overtime_hours, Some(dec("5")));
    }

    #[test]
    fn test_explicit_overtime_adds_to_threshold_overtime() {
        let employee = create_employee(0, Some("20.00"));
        let result = calculate_gross_pay(
            &employee,
            Some(dec("42")),
            Some(dec("3")),
            &overtime_rule(),
            1,
        )
        .unwrap();

        // 40 x 20 + 5 x 30
        assert_eq!(result.gross_pay, Money::whole(950));
        assert_eq!(result.overtime_hours, Some(dec("5")));
    }

    #[test]
    fn test_hourly_fractional_hours_settle_half_up() {
        let employee = create_employee(0, Some("17.33"));
        let result =
            calculate_gross_pay(&employee, Some(dec("7.5")), None, &overtime_rule(), 1).unwrap();
        // 7.5 x 17.33 = 129.975
        assert_eq!(result.gross_pay, Money::from_str("129.98").unwrap());
    }

    #[test]
    fn test_hourly_without_hours_falls_back_to_salary() {
        let mut employee = create_employee(62_400, Some("30.00"));
        employee.pay_frequency = PayFrequency::Weekly;
        let result = calculate_gross_pay(&employee, None, None, &overtime_rule(), 1).unwrap();

        assert_eq!(result.pay_basis, PayBasis::SalariedFallback);
        assert_eq!(result.gross_pay, Money::whole(1_200));
        assert!(result.audit_step.reasoning.contains("No hours reported"));
    }

    #[test]
    fn test_negative_hours_rejected() {
        let employee = create_employee(0, Some("25.00"));
        let result = calculate_gross_pay(&employee, Some(dec("-1")), None, &overtime_rule(), 1);
        assert!(matches!(
            result,
            Err(EngineError::InvalidInput { field, .. }) if field == "hours"
        ));
    }

    #[test]
    fn test_negative_overtime_hours_rejected() {
        let employee = create_employee(0, Some("25.00"));
        let result = calculate_gross_pay(
            &employee,
            Some(dec("10")),
            Some(dec("-2")),
            &overtime_rule(),
            1,
        );
        assert!(matches!(
            result,
            Err(EngineError::InvalidInput { field, .. }) if field == "overtime_hours"
        ));
    }

    #[test]
    fn test_hours_beyond_a_period_rejected() {
        let employee = create_employee(0, Some("25.00"));
        let result = calculate_gross_pay(
            &employee,
            Some(dec("10000000000000000000000000000")),
            None,
            &overtime_rule(),
            1,
        );
        assert!(matches!(
            result,
            Err(EngineError::InvalidInput { field, .. }) if field == "hours"
        ));

        let result = calculate_gross_pay(
            &employee,
            Some(dec("700")),
            Some(dec("45")),
            &overtime_rule(),
            1,
        );
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    }

    #[test]
    fn test_full_period_of_hours_accepted() {
        let employee = create_employee(0, Some("25.00"));
        let result =
            calculate_gross_pay(&employee, Some(MAX_PERIOD_HOURS), None, &overtime_rule(), 1)
                .unwrap();
        // 40 x 25 + 704 x 37.50
        assert_eq!(result.gross_pay, Money::whole(27_400));
    }

    #[test]
    fn test_overflowing_rate_is_calculation_error() {
        let employee = create_employee(0, Some("70000000000000000000000000000"));
        let result = calculate_gross_pay(&employee, Some(dec("40")), None, &overtime_rule(), 1);
        assert!(matches!(result, Err(EngineError::CalculationError { .. })));
    }

    #[test]
    fn test_zero_hours_is_zero_gross() {
        let employee = create_employee(0, Some("25.00"));
        let result =
            calculate_gross_pay(&employee, Some(dec("0")), None, &overtime_rule(), 1).unwrap();
        assert_eq!(result.gross_pay, Money::ZERO);
    }
}
