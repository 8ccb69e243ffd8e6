//! Year-end (W2) summaries.

use tracing::debug;

use crate::error::EngineResult;
use crate::models::YearEndSummary;

use super::PayrollService;

impl PayrollService {
    /// Sums an employee's paystubs for `year` into W2 box totals.
    ///
    /// A year with no paystubs yields an all-zero summary.
    pub fn year_end_summary(&self, employee_id: &str, year: i32) -> EngineResult<YearEndSummary> {
        let employee = self.repository.get_employee(employee_id)?;
        let paystubs = self.repository.get_paystubs(employee_id, Some(year))?;
        let wage_base = self.policies.policy_for(year)?.fica.ss_wage_base;

        debug!(
            employee_id = %employee_id,
            year,
            paystubs = paystubs.len(),
            "Building year-end summary"
        );
        Ok(YearEndSummary::from_paystubs(
            &employee, year, &paystubs, wage_base,
        ))
    }
}
