//! Gross-to-net calculation.
//!
//! [`calculate_net_pay`] runs every step of a period's pay in order and
//! assembles the [`PayrollResult`] with its audit trace. It reads the
//! employee's year-to-date ledger but never changes it.

use std::time::Instant;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::TaxPolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrace, AuditWarning, Deduction, Employee, Money, PayrollResult,
    WarningSeverity,
};

use super::deductions::classify_deductions;
use super::gross_pay::calculate_gross_pay;
use super::withholding::{WithholdingInputs, calculate_state_tax, withhold_taxes};

/// Warning code raised when deductions and taxes exceed gross pay.
pub const NEGATIVE_NET_PAY: &str = "NEGATIVE_NET_PAY";

/// Warning code raised when pre-tax deductions exceeding gross were clamped.
pub const TAXABLE_GROSS_CLAMPED: &str = "TAXABLE_GROSS_CLAMPED";

/// Per-run inputs to the calculator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayInputs {
    /// The tax year whose ledger and policy apply.
    pub tax_year: i32,
    /// Hours worked (hourly employees).
    pub hours: Option<Decimal>,
    /// Extra hours paid at the overtime rate (hourly employees).
    pub overtime_hours: Option<Decimal>,
    /// Clamp taxable gross to zero instead of rejecting pre-tax deductions
    /// larger than gross.
    pub clamp_taxable_gross: bool,
}

impl PayInputs {
    /// Inputs for a salaried run in `tax_year`.
    pub fn for_year(tax_year: i32) -> Self {
        Self {
            tax_year,
            hours: None,
            overtime_hours: None,
            clamp_taxable_gross: false,
        }
    }

    /// Sets the hours worked.
    pub fn with_hours(mut self, hours: Option<Decimal>) -> Self {
        self.hours = hours;
        self
    }

    /// Sets explicit overtime hours.
    pub fn with_overtime(mut self, overtime_hours: Option<Decimal>) -> Self {
        self.overtime_hours = overtime_hours;
        self
    }
}

/// Calculates one period's pay from gross to net.
///
/// # Arguments
///
/// * `employee` - Snapshot of the employee, including the YTD ledger
/// * `deductions` - The employee's deductions (inactive ones are skipped)
/// * `inputs` - Tax year, hours and options for this run
/// * `policy` - Tax policy for the tax year
///
/// # Errors
///
/// - `InactiveEmployee` if the employee is not active
/// - `InvalidInput` for negative hours, a deduction larger than gross,
///   pre-tax deductions larger than gross (unless clamping is enabled), or a
///   tax year earlier than the employee's ledger
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::{PayInputs, calculate_net_pay};
/// use payroll_engine::config::PolicySet;
/// use payroll_engine::models::{Money, NewEmployee};
/// use chrono::NaiveDate;
///
/// let employee = NewEmployee::salaried("Alice Smith", Money::whole(52_000)).into_employee(
///     "EMP-00000001".to_string(),
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
/// );
/// let policies = PolicySet::builtin();
///
/// let result = calculate_net_pay(
///     &employee,
///     &[],
///     &PayInputs::for_year(2024),
///     policies.policy_for(2024).unwrap(),
/// )
/// .unwrap();
///
/// assert_eq!(result.gross_pay, Money::whole(2_000));
/// assert_eq!(result.net_pay, Money::from_cents(160315));
/// assert!(result.is_balanced());
/// ```
pub fn calculate_net_pay(
    employee: &Employee,
    deductions: &[Deduction],
    inputs: &PayInputs,
    policy: &TaxPolicy,
) -> EngineResult<PayrollResult> {
    let start_time = Instant::now();

    if !employee.is_active() {
        return Err(EngineError::InactiveEmployee {
            employee_id: employee.id.clone(),
            status: employee.status,
        });
    }
    let ytd = employee.ytd.for_tax_year(inputs.tax_year)?;

    let mut audit_steps: Vec<AuditStep> = Vec::new();
    let mut warnings: Vec<AuditWarning> = Vec::new();
    let mut step_number: u32 = 1;

    let gross = calculate_gross_pay(
        employee,
        inputs.hours,
        inputs.overtime_hours,
        &policy.overtime,
        step_number,
    )?;
    let gross_pay = gross.gross_pay;
    audit_steps.push(gross.audit_step);
    step_number += 1;

    let classified = classify_deductions(deductions, gross_pay, step_number)?;
    audit_steps.push(classified.audit_step);
    step_number += 1;

    let unclamped = gross_pay - classified.pre_tax_total;
    let taxable_gross = if unclamped.is_negative() {
        if !inputs.clamp_taxable_gross {
            return Err(EngineError::invalid_input(
                "pre_tax_deductions",
                format!(
                    "pre-tax deductions ${} exceed gross pay ${}",
                    classified.pre_tax_total, gross_pay
                ),
            ));
        }
        warnings.push(AuditWarning {
            code: TAXABLE_GROSS_CLAMPED.to_string(),
            message: format!(
                "Pre-tax deductions ${} exceed gross pay ${}; taxable gross clamped to zero",
                classified.pre_tax_total, gross_pay
            ),
            severity: WarningSeverity::Medium,
        });
        Money::ZERO
    } else {
        unclamped
    };
    audit_steps.push(AuditStep {
        step_number,
        rule_id: "taxable_gross".to_string(),
        rule_name: "Taxable Gross".to_string(),
        input: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "pre_tax_deductions": classified.pre_tax_total.to_string()
        }),
        output: serde_json::json!({
            "taxable_gross": taxable_gross.to_string(),
            "clamped": unclamped != taxable_gross
        }),
        reasoning: format!(
            "${} - ${} = ${}",
            gross_pay, classified.pre_tax_total, taxable_gross
        ),
    });
    step_number += 1;

    let withholding = withhold_taxes(
        policy,
        &WithholdingInputs {
            period_wages: taxable_gross,
            filing_status: employee.filing_status,
            allowances: employee.withholding_allowances,
            pay_frequency: employee.pay_frequency,
            ytd_ss_wages: ytd.ss_wages,
            ytd_medicare_wages: ytd.medicare_wages,
        },
        step_number,
    );
    step_number += withholding.audit_steps.len() as u32;
    let (federal_tax, ss_tax, medicare_tax) = withholding.as_tuple();
    audit_steps.extend(withholding.audit_steps);

    let state = calculate_state_tax(policy, &employee.state, taxable_gross, step_number);
    let state_tax = state.tax;
    audit_steps.push(state.audit_step);
    step_number += 1;

    let total_taxes = federal_tax + state_tax + ss_tax + medicare_tax;
    let net_pay =
        gross_pay - classified.pre_tax_total - total_taxes - classified.post_tax_total;
    audit_steps.push(AuditStep {
        step_number,
        rule_id: "net_pay".to_string(),
        rule_name: "Net Pay".to_string(),
        input: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "pre_tax_deductions": classified.pre_tax_total.to_string(),
            "total_taxes": total_taxes.to_string(),
            "post_tax_deductions": classified.post_tax_total.to_string()
        }),
        output: serde_json::json!({
            "net_pay": net_pay.to_string()
        }),
        reasoning: format!(
            "${} - ${} - ${} - ${} = ${}",
            gross_pay, classified.pre_tax_total, total_taxes, classified.post_tax_total, net_pay
        ),
    });

    if net_pay.is_negative() {
        warnings.push(AuditWarning {
            code: NEGATIVE_NET_PAY.to_string(),
            message: format!(
                "Deductions and taxes exceed gross pay by ${}",
                -net_pay
            ),
            severity: WarningSeverity::High,
        });
    }

    Ok(PayrollResult {
        calculation_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        employee_id: employee.id.clone(),
        tax_year: inputs.tax_year,
        pay_basis: gross.pay_basis,
        regular_hours: gross.regular_hours,
        overtime_hours: gross.overtime_hours,
        gross_pay,
        pre_tax_deductions: classified.pre_tax_total,
        taxable_gross,
        federal_tax,
        state_tax,
        ss_tax,
        medicare_tax,
        medicare_surtax: withholding.medicare_surtax,
        post_tax_deductions: classified.post_tax_total,
        net_pay,
        ss_wages: withholding.ss_wages,
        medicare_wages: withholding.medicare_wages,
        deduction_lines: classified.lines,
        audit_trace: AuditTrace {
            steps: audit_steps,
            warnings,
            duration_us: start_time.elapsed().as_micros() as u64,
        },
    })
}
