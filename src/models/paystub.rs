//! Paystubs and year-end summaries.
//!
//! A [`Paystub`] is the immutable record of one payroll run. A
//! [`YearEndSummary`] is derived on demand by summing an employee's paystubs
//! for a calendar year.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Employee, Money, PayBasis, PayPeriod, PayrollResult, YtdTotals};

/// One printed line of a paystub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaystubLine {
    /// Line label, e.g. "Federal Income Tax".
    pub label: String,
    /// Amount for this period.
    pub amount: Money,
    /// Year-to-date amount after this period, where one is tracked.
    pub ytd_amount: Option<Money>,
    /// True for lines subtracted from gross.
    pub is_deduction: bool,
}

impl PaystubLine {
    fn earning(label: impl Into<String>, amount: Money, ytd_amount: Option<Money>) -> Self {
        Self {
            label: label.into(),
            amount,
            ytd_amount,
            is_deduction: false,
        }
    }

    fn deduction(label: impl Into<String>, amount: Money, ytd_amount: Option<Money>) -> Self {
        Self {
            label: label.into(),
            amount,
            ytd_amount,
            is_deduction: true,
        }
    }
}

/// The immutable record of a completed payroll run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paystub {
    /// Unique identifier.
    pub id: Uuid,
    /// Check number (`CHK-XXXXXX`).
    pub check_number: String,
    /// The calculation this paystub records.
    pub calculation_id: Uuid,
    /// The employee paid.
    pub employee_id: String,
    /// The employee's name at the time of the run.
    pub employee_name: String,
    /// The period paid.
    pub pay_period: PayPeriod,
    /// How gross pay was determined.
    pub pay_basis: PayBasis,
    /// Regular hours paid (hourly basis only).
    pub regular_hours: Option<Decimal>,
    /// Overtime hours paid (hourly basis only).
    pub overtime_hours: Option<Decimal>,
    /// Gross pay.
    pub gross_pay: Money,
    /// Pre-tax deductions.
    pub pre_tax_deductions: Money,
    /// Taxable gross.
    pub taxable_gross: Money,
    /// Federal income tax withheld.
    pub federal_income_tax: Money,
    /// State income tax withheld.
    pub state_income_tax: Money,
    /// Social Security tax withheld.
    pub ss_tax: Money,
    /// Medicare tax withheld (surtax included).
    pub medicare_tax: Money,
    /// Post-tax deductions.
    pub post_tax_deductions: Money,
    /// Net pay.
    pub net_pay: Money,
    /// Wages subject to Social Security this period.
    pub ss_wages: Money,
    /// Wages subject to Medicare this period.
    pub medicare_wages: Money,
    /// Printed lines; earnings minus deduction lines equals net pay.
    pub lines: Vec<PaystubLine>,
    /// Year-to-date gross after this period.
    pub ytd_gross: Money,
    /// Year-to-date net after this period.
    pub ytd_net: Money,
    /// When the paystub was generated.
    pub generated_at: DateTime<Utc>,
}

impl Paystub {
    /// Builds the paystub for a calculated period.
    ///
    /// `ytd_after` is the employee's ledger once this period is applied.
    pub fn from_result(
        employee: &Employee,
        period: &PayPeriod,
        result: &PayrollResult,
        ytd_after: &YtdTotals,
    ) -> Paystub {
        let id = Uuid::new_v4();
        let check_number = format!(
            "CHK-{}",
            &Uuid::new_v4().simple().to_string()[..6].to_uppercase()
        );

        Paystub {
            id,
            check_number,
            calculation_id: result.calculation_id,
            employee_id: employee.id.clone(),
            employee_name: employee.name.clone(),
            pay_period: period.clone(),
            pay_basis: result.pay_basis,
            regular_hours: result.regular_hours,
            overtime_hours: result.overtime_hours,
            gross_pay: result.gross_pay,
            pre_tax_deductions: result.pre_tax_deductions,
            taxable_gross: result.taxable_gross,
            federal_income_tax: result.federal_tax,
            state_income_tax: result.state_tax,
            ss_tax: result.ss_tax,
            medicare_tax: result.medicare_tax,
            post_tax_deductions: result.post_tax_deductions,
            net_pay: result.net_pay,
            ss_wages: result.ss_wages,
            medicare_wages: result.medicare_wages,
            lines: build_lines(employee, result, ytd_after),
            ytd_gross: ytd_after.gross,
            ytd_net: ytd_after.net,
            generated_at: Utc::now(),
        }
    }

    /// Checks that the printed lines add up to gross and net pay.
    pub fn lines_balance(&self) -> bool {
        let earnings: Money = self
            .lines
            .iter()
            .filter(|l| !l.is_deduction)
            .map(|l| l.amount)
            .sum();
        let deductions: Money = self
            .lines
            .iter()
            .filter(|l| l.is_deduction)
            .map(|l| l.amount)
            .sum();
        earnings == self.gross_pay && earnings - deductions == self.net_pay
    }
}

fn build_lines(
    employee: &Employee,
    result: &PayrollResult,
    ytd_after: &YtdTotals,
) -> Vec<PaystubLine> {
    let mut lines = Vec::new();

    match (result.regular_hours, result.overtime_hours, employee.hourly_rate) {
        (Some(regular), Some(overtime), Some(rate)) => {
            let regular_pay = rate.times(regular);
            lines.push(PaystubLine::earning(
                format!("Regular Pay ({}h)", regular.normalize()),
                regular_pay,
                Some(ytd_after.gross),
            ));
            if overtime > Decimal::ZERO {
                lines.push(PaystubLine::earning(
                    format!("Overtime ({}h)", overtime.normalize()),
                    result.gross_pay - regular_pay,
                    None,
                ));
            }
        }
        _ => lines.push(PaystubLine::earning(
            "Regular Pay",
            result.gross_pay,
            Some(ytd_after.gross),
        )),
    }

    for line in result.deduction_lines.iter().filter(|l| l.pre_tax) {
        lines.push(PaystubLine::deduction(
            format!("{} (pre-tax)", line.description),
            line.amount,
            None,
        ));
    }
    lines.push(PaystubLine::deduction(
        "Federal Income Tax",
        result.federal_tax,
        Some(ytd_after.federal_tax),
    ));
    lines.push(PaystubLine::deduction(
        "Social Security Tax",
        result.ss_tax,
        Some(ytd_after.ss_tax),
    ));
    lines.push(PaystubLine::deduction(
        "Medicare Tax",
        result.medicare_tax,
        Some(ytd_after.medicare_tax),
    ));
    lines.push(PaystubLine::deduction(
        format!("State Tax ({})", employee.state),
        result.state_tax,
        Some(ytd_after.state_tax),
    ));
    for line in result.deduction_lines.iter().filter(|l| !l.pre_tax) {
        lines.push(PaystubLine::deduction(line.description.clone(), line.amount, None));
    }

    lines
}

/// W2-style totals for one employee and calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearEndSummary {
    /// The employee summarized.
    pub employee_id: String,
    /// The employee's name.
    pub employee_name: String,
    /// The calendar year.
    pub year: i32,
    /// Number of paystubs summed.
    pub paystub_count: usize,
    /// Total gross pay.
    pub ytd_gross: Money,
    /// Total federal income tax withheld.
    pub ytd_federal_tax: Money,
    /// Total Social Security tax withheld.
    pub ytd_ss_tax: Money,
    /// Total Medicare tax withheld.
    pub ytd_medicare_tax: Money,
    /// Total state tax withheld.
    pub ytd_state_tax: Money,
    /// Total pre-tax deductions.
    pub ytd_pre_tax_deductions: Money,
    /// Total post-tax deductions.
    pub ytd_post_tax_deductions: Money,
    /// Total net pay.
    pub ytd_net: Money,
    /// Box 1: wages subject to federal income tax.
    pub w2_box1: Money,
    /// Box 2: federal income tax withheld.
    pub w2_box2: Money,
    /// Box 3: Social Security wages, capped at the wage base.
    pub w2_box3: Money,
    /// Box 4: Social Security tax withheld.
    pub w2_box4: Money,
    /// Box 5: Medicare wages.
    pub w2_box5: Money,
    /// Box 6: Medicare tax withheld.
    pub w2_box6: Money,
}

impl YearEndSummary {
    /// Sums `paystubs` (already filtered to `year`) into a summary.
    ///
    /// `ss_wage_base` is the Social Security wage base of that year's policy.
    pub fn from_paystubs(
        employee: &Employee,
        year: i32,
        paystubs: &[Paystub],
        ss_wage_base: Money,
    ) -> YearEndSummary {
        let total = |f: fn(&Paystub) -> Money| -> Money { paystubs.iter().map(f).sum() };

        let ytd_gross = total(|s| s.gross_pay);
        let ytd_federal_tax = total(|s| s.federal_income_tax);
        let ytd_ss_tax = total(|s| s.ss_tax);
        let ytd_medicare_tax = total(|s| s.medicare_tax);
        let ytd_pre_tax_deductions = total(|s| s.pre_tax_deductions);

        YearEndSummary {
            employee_id: employee.id.clone(),
            employee_name: employee.name.clone(),
            year,
            paystub_count: paystubs.len(),
            ytd_gross,
            ytd_federal_tax,
            ytd_ss_tax,
            ytd_medicare_tax,
            ytd_state_tax: total(|s| s.state_income_tax),
            ytd_pre_tax_deductions,
            ytd_post_tax_deductions: total(|s| s.post_tax_deductions),
            ytd_net: total(|s| s.net_pay),
            w2_box1: ytd_gross - ytd_pre_tax_deductions,
            w2_box2: ytd_federal_tax,
            w2_box3: ytd_gross.min(ss_wage_base),
            w2_box4: ytd_ss_tax,
            w2_box5: ytd_gross,
            w2_box6: ytd_medicare_tax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditTrace, DeductionKind, DeductionLine, NewEmployee};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_employee(hourly_rate: Option<Money>) -> Employee {
        let mut new = NewEmployee::salaried("Dave Kim", Money::whole(52_000));
        new.hourly_rate = hourly_rate;
        new.into_employee(
            "EMP-0000DAVE".to_string(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    fn create_period() -> PayPeriod {
        PayPeriod::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 19).unwrap(),
        )
        .unwrap()
    }

    fn create_result() -> PayrollResult {
        PayrollResult {
            calculation_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            engine_version: "0.1.0".to_string(),
            employee_id: "EMP-0000DAVE".to_string(),
            tax_year: 2024,
            pay_basis: PayBasis::Salaried,
            regular_hours: None,
            overtime_hours: None,
            gross_pay: money("2000.00"),
            pre_tax_deductions: money("100.00"),
            taxable_gross: money("1900.00"),
            federal_tax: money("150.00"),
            state_tax: money("95.00"),
            ss_tax: money("117.80"),
            medicare_tax: money("27.55"),
            medicare_surtax: Money::ZERO,
            post_tax_deductions: money("25.00"),
            net_pay: money("1484.65"),
            ss_wages: money("1900.00"),
            medicare_wages: money("1900.00"),
            deduction_lines: vec![
                DeductionLine {
                    deduction_id: "d1".to_string(),
                    kind: DeductionKind::PreTax401k,
                    description: "401k".to_string(),
                    amount: money("100.00"),
                    pre_tax: true,
                },
                DeductionLine {
                    deduction_id: "d2".to_string(),
                    kind: DeductionKind::PostTaxOther,
                    description: "Union dues".to_string(),
                    amount: money("25.00"),
                    pre_tax: false,
                },
            ],
            audit_trace: AuditTrace::default(),
        }
    }

    fn ytd_after(result: &PayrollResult) -> YtdTotals {
        let mut ytd = YtdTotals::new(2024);
        ytd.gross = result.gross_pay;
        ytd.net = result.net_pay;
        ytd.federal_tax = result.federal_tax;
        ytd
    }

    #[test]
    fn test_paystub_copies_result_and_ytd() {
        let employee = create_employee(None);
        let result = create_result();
        let stub = Paystub::from_result(&employee, &create_period(), &result, &ytd_after(&result));

        assert!(stub.check_number.starts_with("CHK-"));
        assert_eq!(stub.check_number.len(), 10);
        assert_eq!(stub.gross_pay, money("2000.00"));
        assert_eq!(stub.net_pay, money("1484.65"));
        assert_eq!(stub.ytd_gross, money("2000.00"));
        assert_eq!(stub.ytd_net, money("1484.65"));
        assert_eq!(stub.calculation_id, result.calculation_id);
    }

    #[test]
    fn test_salaried_lines_balance() {
        let employee = create_employee(None);
        let result = create_result();
        let stub = Paystub::from_result(&employee, &create_period(), &result, &ytd_after(&result));

        assert!(stub.lines_balance());
        assert_eq!(stub.lines[0].label, "Regular Pay");
        assert!(stub.lines.iter().any(|l| l.label == "State Tax (CA)"));
        assert!(stub.lines.iter().any(|l| l.label == "401k (pre-tax)"));
        assert!(stub.lines.iter().any(|l| l.label == "Union dues"));
    }

    #[test]
    fn test_hourly_lines_split_overtime() {
        let employee = create_employee(Some(money("20.00")));
        let mut result = create_result();
        result.pay_basis = PayBasis::Hourly;
        result.regular_hours = Some(dec("40"));
        result.overtime_hours = Some(dec("5"));
        // 40 * 20 + 5 * 30 = 950
        result.gross_pay = money("950.00");
        result.pre_tax_deductions = Money::ZERO;
        result.post_tax_deductions = Money::ZERO;
        result.deduction_lines.clear();
        result.net_pay = money("950.00") - result.total_taxes();

        let stub = Paystub::from_result(&employee, &create_period(), &result, &ytd_after(&result));

        assert_eq!(stub.lines[0].label, "Regular Pay (40h)");
        assert_eq!(stub.lines[0].amount, money("800.00"));
        assert_eq!(stub.lines[1].label, "Overtime (5h)");
        assert_eq!(stub.lines[1].amount, money("150.00"));
        assert!(stub.lines_balance());
    }

    #[test]
    fn test_year_end_summary_caps_box3() {
        let employee = create_employee(None);
        let result = create_result();
        let stub = Paystub::from_result(&employee, &create_period(), &result, &ytd_after(&result));
        let stubs = vec![stub.clone(), stub];

        let summary = YearEndSummary::from_paystubs(&employee, 2024, &stubs, money("3000.00"));

        assert_eq!(summary.paystub_count, 2);
        assert_eq!(summary.ytd_gross, money("4000.00"));
        assert_eq!(summary.w2_box1, money("3800.00"));
        assert_eq!(summary.w2_box2, money("300.00"));
        assert_eq!(summary.w2_box3, money("3000.00"));
        assert_eq!(summary.w2_box4, money("235.60"));
        assert_eq!(summary.w2_box5, money("4000.00"));
        assert_eq!(summary.w2_box6, money("55.10"));
        assert_eq!(summary.ytd_net, money("2969.30"));
    }

    #[test]
    fn test_year_end_summary_of_no_paystubs_is_zero() {
        let employee = create_employee(None);
        let summary = YearEndSummary::from_paystubs(&employee, 2024, &[], money("168600"));
        assert_eq!(summary.paystub_count, 0);
        assert_eq!(summary.ytd_gross, Money::ZERO);
        assert_eq!(summary.w2_box3, Money::ZERO);
    }
}
