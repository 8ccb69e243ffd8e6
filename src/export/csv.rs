//! CSV payroll register.

use std::io::Write;

use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::repository::PayrollRepository;

/// Column headings of the payroll register.
pub const CSV_HEADER: [&str; 12] = [
    "Employee ID",
    "Name",
    "Pay Date",
    "Gross",
    "Federal Tax",
    "SS Tax",
    "Medicare Tax",
    "State Tax",
    "Pre-Tax Deductions",
    "Post-Tax Deductions",
    "Net Pay",
    "Check #",
];

/// Writes one row per paystub of every active employee paid in `year`.
///
/// Employees appear in repository order and each employee's paystubs in
/// pay-date order. Returns the number of rows written.
pub fn export_payroll_csv<W: Write>(
    repository: &dyn PayrollRepository,
    year: i32,
    writer: W,
) -> EngineResult<usize> {
    let mut csv = ::csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER).map_err(csv_error)?;

    let mut rows = 0;
    for employee in repository.list_active_employees()? {
        for stub in repository.get_paystubs(&employee.id, Some(year))? {
            csv.write_record([
                employee.id.clone(),
                employee.name.clone(),
                stub.pay_period.pay_date.to_string(),
                stub.gross_pay.to_string(),
                stub.federal_income_tax.to_string(),
                stub.ss_tax.to_string(),
                stub.medicare_tax.to_string(),
                stub.state_income_tax.to_string(),
                stub.pre_tax_deductions.to_string(),
                stub.post_tax_deductions.to_string(),
                stub.net_pay.to_string(),
                stub.check_number.clone(),
            ])
            .map_err(csv_error)?;
            rows += 1;
        }
    }

    csv.flush()
        .map_err(|e| EngineError::persistence(format!("Failed to flush CSV: {}", e)))?;
    info!(year, rows, "Exported payroll register");
    Ok(rows)
}

fn csv_error(e: ::csv::Error) -> EngineError {
    EngineError::persistence(format!("Failed to write CSV: {}", e))
}
