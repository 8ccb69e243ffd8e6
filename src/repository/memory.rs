//! In-memory repository.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::calculation::YtdDelta;
use crate::error::{EngineError, EngineResult};
use crate::models::{Deduction, Employee, EmployeeStatus, Paystub, YtdTotals};

use super::{PayrollData, PayrollRepository};

/// A repository that keeps everything in memory behind a single lock.
///
/// Every mutation runs under the write lock, so a payroll commit is never
/// observed half applied.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    data: RwLock<PayrollData>,
}

impl InMemoryRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository holding `data`.
    pub fn with_data(data: PayrollData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// A copy of the full dataset.
    pub fn snapshot(&self) -> EngineResult<PayrollData> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> EngineResult<RwLockReadGuard<'_, PayrollData>> {
        self.data
            .read()
            .map_err(|e| EngineError::persistence(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> EngineResult<RwLockWriteGuard<'_, PayrollData>> {
        self.data
            .write()
            .map_err(|e| EngineError::persistence(format!("Failed to acquire write lock: {}", e)))
    }
}

impl PayrollRepository for InMemoryRepository {
    fn get_employee(&self, id: &str) -> EngineResult<Employee> {
        self.read()?.employee(id).cloned()
    }

    fn list_employees(&self, status: Option<EmployeeStatus>) -> EngineResult<Vec<Employee>> {
        Ok(self.read()?.employees_with_status(status))
    }

    fn save_employee(&self, employee: &Employee) -> EngineResult<()> {
        self.write()?.upsert_employee(employee);
        debug!(employee_id = %employee.id, "Saved employee");
        Ok(())
    }

    fn get_active_deductions(&self, employee_id: &str) -> EngineResult<Vec<Deduction>> {
        Ok(self.read()?.active_deductions(employee_id))
    }

    fn save_deduction(&self, deduction: &Deduction) -> EngineResult<()> {
        self.write()?.insert_deduction(deduction)
    }

    fn set_deduction_active(&self, deduction_id: &str, active: bool) -> EngineResult<Deduction> {
        self.write()?.set_deduction_active(deduction_id, active)
    }

    fn get_paystubs(&self, employee_id: &str, year: Option<i32>) -> EngineResult<Vec<Paystub>> {
        Ok(self.read()?.paystubs_for(employee_id, year))
    }

    fn save_paystub(&self, paystub: &Paystub) -> EngineResult<()> {
        self.write()?.insert_paystub(paystub)
    }

    fn apply_ytd_delta(&self, employee_id: &str, delta: &YtdDelta) -> EngineResult<YtdTotals> {
        self.write()?.apply_delta(employee_id, delta)
    }

    fn commit_payroll_run(&self, paystub: &Paystub, delta: &YtdDelta) -> EngineResult<YtdTotals> {
        let ytd = self.write()?.commit_run(paystub, delta)?;
        debug!(
            employee_id = %paystub.employee_id,
            check_number = %paystub.check_number,
            "Committed payroll run"
        );
        Ok(ytd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::{PayInputs, calculate_net_pay};
    use crate::config::PolicySet;
    use crate::models::{
        DeductionAmount, DeductionKind, Money, NewDeduction, NewEmployee, PayPeriod,
    };
    use chrono::{NaiveDate, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_employee(id: &str) -> Employee {
        NewEmployee::salaried("Test Employee", Money::whole(52_000))
            .into_employee(id.to_string(), date(2024, 1, 1))
    }

    fn create_run(employee: &Employee, pay_date: NaiveDate) -> (Paystub, YtdDelta) {
        let policies = PolicySet::builtin();
        let result = calculate_net_pay(
            employee,
            &[],
            &PayInputs::for_year(2024),
            policies.policy_for(2024).unwrap(),
        )
        .unwrap();
        let delta = YtdDelta::from_result(&result);
        let ytd_after = crate::calculation::apply_ytd_delta(&employee.ytd, &delta).unwrap();
        let period = PayPeriod::new(date(2024, 1, 1), date(2024, 1, 14), pay_date).unwrap();
        (
            Paystub::from_result(employee, &period, &result, &ytd_after),
            delta,
        )
    }

    #[test]
    fn test_get_missing_employee_is_not_found() {
        let repo = InMemoryRepository::new();
        assert!(matches!(
            repo.get_employee("EMP-MISSING"),
            Err(EngineError::NotFound { entity: "employee", .. })
        ));
    }

    #[test]
    fn test_save_and_list_employees_in_insertion_order() {
        let repo = InMemoryRepository::new();
        repo.save_employee(&create_employee("EMP-B")).unwrap();
        repo.save_employee(&create_employee("EMP-A")).unwrap();

        let mut terminated = create_employee("EMP-C");
        terminated.status = EmployeeStatus::Terminated;
        repo.save_employee(&terminated).unwrap();

        let ids: Vec<_> = repo
            .list_employees(None)
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["EMP-B", "EMP-A", "EMP-C"]);
        assert_eq!(repo.list_active_employees().unwrap().len(), 2);
    }

    #[test]
    fn test_save_employee_replaces_existing() {
        let repo = InMemoryRepository::new();
        let mut employee = create_employee("EMP-A");
        repo.save_employee(&employee).unwrap();
        employee.name = "Renamed".to_string();
        repo.save_employee(&employee).unwrap();

        assert_eq!(repo.list_employees(None).unwrap().len(), 1);
        assert_eq!(repo.get_employee("EMP-A").unwrap().name, "Renamed");
    }

    #[test]
    fn test_deduction_lifecycle() {
        let repo = InMemoryRepository::new();
        repo.save_employee(&create_employee("EMP-A")).unwrap();

        let deduction = NewDeduction {
            employee_id: "EMP-A".to_string(),
            kind: DeductionKind::PreTaxHsa,
            amount: DeductionAmount::Flat(Money::whole(50)),
            description: "HSA".to_string(),
        }
        .into_deduction("ded-1".to_string(), Utc::now())
        .unwrap();
        repo.save_deduction(&deduction).unwrap();
        assert_eq!(repo.get_active_deductions("EMP-A").unwrap().len(), 1);

        let updated = repo.set_deduction_active("ded-1", false).unwrap();
        assert!(!updated.active);
        assert!(repo.get_active_deductions("EMP-A").unwrap().is_empty());
    }

    #[test]
    fn test_deduction_for_unknown_employee_rejected() {
        let repo = InMemoryRepository::new();
        let deduction = NewDeduction {
            employee_id: "EMP-NOPE".to_string(),
            kind: DeductionKind::PostTaxOther,
            amount: DeductionAmount::Flat(Money::whole(5)),
            description: String::new(),
        }
        .into_deduction("ded-1".to_string(), Utc::now())
        .unwrap();
        assert!(repo.save_deduction(&deduction).is_err());
    }

    #[test]
    fn test_commit_applies_delta_and_saves_paystub() {
        let repo = InMemoryRepository::new();
        let employee = create_employee("EMP-A");
        repo.save_employee(&employee).unwrap();

        let (paystub, delta) = create_run(&employee, date(2024, 1, 19));
        let ytd = repo.commit_payroll_run(&paystub, &delta).unwrap();

        assert_eq!(ytd.gross, Money::whole(2_000));
        assert_eq!(repo.get_employee("EMP-A").unwrap().ytd, ytd);
        assert_eq!(repo.get_paystubs("EMP-A", Some(2024)).unwrap().len(), 1);
        assert!(repo.get_paystubs("EMP-A", Some(2023)).unwrap().is_empty());
    }

    #[test]
    fn test_failed_commit_changes_nothing() {
        let repo = InMemoryRepository::new();
        let employee = create_employee("EMP-A");
        repo.save_employee(&employee).unwrap();

        let (paystub, mut delta) = create_run(&employee, date(2024, 1, 19));
        delta.gross = Money::whole(-1);

        assert!(repo.commit_payroll_run(&paystub, &delta).is_err());
        assert!(repo.get_paystubs("EMP-A", None).unwrap().is_empty());
        assert_eq!(repo.get_employee("EMP-A").unwrap().ytd.gross, Money::ZERO);
    }

    #[test]
    fn test_duplicate_paystub_rejected_without_applying_delta() {
        let repo = InMemoryRepository::new();
        let employee = create_employee("EMP-A");
        repo.save_employee(&employee).unwrap();

        let (paystub, delta) = create_run(&employee, date(2024, 1, 19));
        repo.commit_payroll_run(&paystub, &delta).unwrap();
        assert!(repo.commit_payroll_run(&paystub, &delta).is_err());
        assert_eq!(
            repo.get_employee("EMP-A").unwrap().ytd.gross,
            Money::whole(2_000)
        );
    }

    #[test]
    fn test_paystubs_sorted_by_pay_date() {
        let repo = InMemoryRepository::new();
        let employee = create_employee("EMP-A");
        repo.save_employee(&employee).unwrap();

        let (later, _) = create_run(&employee, date(2024, 2, 2));
        let (earlier, _) = create_run(&employee, date(2024, 1, 19));
        repo.save_paystub(&later).unwrap();
        repo.save_paystub(&earlier).unwrap();

        let stubs = repo.get_paystubs("EMP-A", None).unwrap();
        assert_eq!(stubs[0].pay_period.pay_date, date(2024, 1, 19));
        assert_eq!(stubs[1].pay_period.pay_date, date(2024, 2, 2));
    }
}
