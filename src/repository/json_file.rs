//! JSON file repository with atomic writes.
//!
//! The whole dataset lives in one JSON document. Each mutation is applied
//! to a staged copy, the copy is written to a temp file and renamed over the
//! document, and only then does it replace the in-memory state.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::calculation::YtdDelta;
use crate::error::{EngineError, EngineResult};
use crate::models::{Deduction, Employee, EmployeeStatus, Paystub, YtdTotals};

use super::{PayrollData, PayrollRepository};

/// Read JSON from a file, returning a default value if the file doesn't exist.
pub fn read_json<T, P>(path: P) -> EngineResult<T>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path).map_err(|e| {
        EngineError::persistence(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| {
        EngineError::persistence(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Write JSON to a file atomically (write to temp, then rename).
pub fn write_json_atomic<T, P>(path: P, data: &T) -> EngineResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            EngineError::persistence(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Same directory as the target so the rename stays on one filesystem.
    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path)
        .map_err(|e| EngineError::persistence(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| EngineError::persistence(format!("Failed to serialize data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| EngineError::persistence(format!("Failed to flush data: {}", e)))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| EngineError::persistence(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        EngineError::persistence(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

/// A repository persisted as a single JSON document.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    data: RwLock<PayrollData>,
}

impl JsonFileRepository {
    /// Opens the document at `path`, starting empty if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> EngineResult<Self> {
        let path = path.into();
        let data: PayrollData = read_json(&path)?;
        info!(
            path = %path.display(),
            employees = data.employees.len(),
            paystubs = data.paystubs.len(),
            "Opened payroll data file"
        );
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// The path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> EngineResult<RwLockReadGuard<'_, PayrollData>> {
        self.data
            .read()
            .map_err(|e| EngineError::persistence(format!("Failed to acquire read lock: {}", e)))
    }

    /// Applies `change` to a staged copy, persists it, then publishes it.
    ///
    /// If `change` or the write fails the published state is untouched.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut PayrollData) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let mut data = self
            .data
            .write()
            .map_err(|e| EngineError::persistence(format!("Failed to acquire write lock: {}", e)))?;

        let mut staged = data.clone();
        let output = change(&mut staged)?;
        write_json_atomic(&self.path, &staged)?;
        *data = staged;
        Ok(output)
    }
}

impl PayrollRepository for JsonFileRepository {
    fn get_employee(&self, id: &str) -> EngineResult<Employee> {
        self.read()?.employee(id).cloned()
    }

    fn list_employees(&self, status: Option<EmployeeStatus>) -> EngineResult<Vec<Employee>> {
        Ok(self.read()?.employees_with_status(status))
    }

    fn save_employee(&self, employee: &Employee) -> EngineResult<()> {
        self.mutate(|data| {
            data.upsert_employee(employee);
            Ok(())
        })?;
        debug!(employee_id = %employee.id, "Saved employee");
        Ok(())
    }

    fn get_active_deductions(&self, employee_id: &str) -> EngineResult<Vec<Deduction>> {
        Ok(self.read()?.active_deductions(employee_id))
    }

    fn save_deduction(&self, deduction: &Deduction) -> EngineResult<()> {
        self.mutate(|data| data.insert_deduction(deduction))
    }

    fn set_deduction_active(&self, deduction_id: &str, active: bool) -> EngineResult<Deduction> {
        self.mutate(|data| data.set_deduction_active(deduction_id, active))
    }

    fn get_paystubs(&self, employee_id: &str, year: Option<i32>) -> EngineResult<Vec<Paystub>> {
        Ok(self.read()?.paystubs_for(employee_id, year))
    }

    fn save_paystub(&self, paystub: &Paystub) -> EngineResult<()> {
        self.mutate(|data| data.insert_paystub(paystub))
    }

    fn apply_ytd_delta(&self, employee_id: &str, delta: &YtdDelta) -> EngineResult<YtdTotals> {
        self.mutate(|data| data.apply_delta(employee_id, delta))
    }

    fn commit_payroll_run(&self, paystub: &Paystub, delta: &YtdDelta) -> EngineResult<YtdTotals> {
        let ytd = self.mutate(|data| data.commit_run(paystub, delta))?;
        debug!(
            employee_id = %paystub.employee_id,
            check_number = %paystub.check_number,
            path = %self.path.display(),
            "Committed payroll run"
        );
        Ok(ytd)
    }
}
