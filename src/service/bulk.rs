//! Bulk payroll runs.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::EngineResult;
use crate::models::{PayPeriod, Paystub};

use super::{PayrollService, RunOptions};

/// An employee whose run failed within a bulk run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkFailure {
    /// The employee the run was for.
    pub employee_id: String,
    /// Why the run failed.
    pub error: String,
}

/// The outcome of a bulk run. One employee's failure never blocks another.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkRunReport {
    /// Paystubs of the runs that committed, in request order.
    pub succeeded: Vec<Paystub>,
    /// Runs that failed, in request order.
    pub failed: Vec<BulkFailure>,
}

impl BulkRunReport {
    /// Number of employees attempted.
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Returns true if every run committed.
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

impl PayrollService {
    /// Runs payroll for each listed employee in parallel.
    ///
    /// Salaried pay is used for every employee (no hours are supplied).
    pub fn run_bulk(&self, employee_ids: &[String], period: &PayPeriod) -> BulkRunReport {
        let options = RunOptions::default();
        let outcomes: Vec<(String, EngineResult<Paystub>)> = employee_ids
            .par_iter()
            .map(|id| {
                let outcome = self
                    .run_payroll_with(id, period, &options)
                    .map(|run| run.paystub);
                (id.clone(), outcome)
            })
            .collect();

        let mut report = BulkRunReport::default();
        for (employee_id, outcome) in outcomes {
            match outcome {
                Ok(paystub) => report.succeeded.push(paystub),
                Err(e) => {
                    warn!(employee_id = %employee_id, error = %e, "Bulk run failed for employee");
                    report.failed.push(BulkFailure {
                        employee_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            pay_date = %period.pay_date,
            attempted = report.attempted(),
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Bulk payroll run complete"
        );
        report
    }

    /// Runs payroll for every active employee.
    pub fn run_bulk_active(&self, period: &PayPeriod) -> EngineResult<BulkRunReport> {
        let ids: Vec<String> = self
            .repository
            .list_active_employees()?
            .into_iter()
            .map(|e| e.id)
            .collect();
        Ok(self.run_bulk(&ids, period))
    }
}
