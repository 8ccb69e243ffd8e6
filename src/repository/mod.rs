//! Persistence for employees, deductions and paystubs.
//!
//! The [`PayrollRepository`] trait is what the service talks to. Two
//! implementations are provided: [`InMemoryRepository`] for tests and
//! embedding, and [`JsonFileRepository`] which keeps the whole dataset in one
//! JSON document written atomically.

mod data;
mod json_file;
mod memory;

use crate::calculation::YtdDelta;
use crate::error::EngineResult;
use crate::models::{Deduction, Employee, EmployeeStatus, Paystub, YtdTotals};

pub use data::PayrollData;
pub use json_file::{JsonFileRepository, read_json, write_json_atomic};
pub use memory::InMemoryRepository;

/// Storage operations the payroll service relies on.
///
/// Implementations must be safe to share between threads; bulk runs call
/// them from several workers at once.
pub trait PayrollRepository: Send + Sync {
    /// Fetches an employee, or `NotFound`.
    fn get_employee(&self, id: &str) -> EngineResult<Employee>;

    /// Lists employees in insertion order, optionally filtered by status.
    fn list_employees(&self, status: Option<EmployeeStatus>) -> EngineResult<Vec<Employee>>;

    /// Lists active employees in insertion order.
    fn list_active_employees(&self) -> EngineResult<Vec<Employee>> {
        self.list_employees(Some(EmployeeStatus::Active))
    }

    /// Inserts or replaces an employee.
    fn save_employee(&self, employee: &Employee) -> EngineResult<()>;

    /// Active deductions of an employee in insertion order.
    fn get_active_deductions(&self, employee_id: &str) -> EngineResult<Vec<Deduction>>;

    /// Stores a new deduction. The employee must exist.
    fn save_deduction(&self, deduction: &Deduction) -> EngineResult<()>;

    /// Turns a deduction on or off, returning the updated deduction.
    fn set_deduction_active(&self, deduction_id: &str, active: bool) -> EngineResult<Deduction>;

    /// Paystubs of an employee ordered by pay date, optionally limited to
    /// the calendar year of the pay date.
    fn get_paystubs(&self, employee_id: &str, year: Option<i32>) -> EngineResult<Vec<Paystub>>;

    /// Stores a paystub on its own.
    fn save_paystub(&self, paystub: &Paystub) -> EngineResult<()>;

    /// Applies a delta to an employee's ledger, returning the new ledger.
    fn apply_ytd_delta(&self, employee_id: &str, delta: &YtdDelta) -> EngineResult<YtdTotals>;

    /// Stores a paystub and applies its delta as one unit: either both are
    /// persisted or neither is.
    fn commit_payroll_run(&self, paystub: &Paystub, delta: &YtdDelta) -> EngineResult<YtdTotals>;
}
