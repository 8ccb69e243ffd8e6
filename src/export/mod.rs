//! Payroll data export.

pub mod csv;

pub use self::csv::{CSV_HEADER, export_payroll_csv};
