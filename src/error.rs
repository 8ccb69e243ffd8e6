//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the engine, its repositories, and its policy loader
//! can report.

use thiserror::Error;

use crate::models::EmployeeStatus;

/// The main error type for the payroll engine.
///
/// All engine operations return this error type. Calculation problems are
/// reported as [`EngineError::InvalidInput`] rather than being coerced into
/// a value, and storage failures surface as [`EngineError::Persistence`]
/// without any automatic retry.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::NotFound {
///     entity: "employee",
///     id: "EMP-0000".to_string(),
/// };
/// assert_eq!(error.to_string(), "employee not found: EMP-0000");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// An employee, deduction, or other entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity that was looked up.
        entity: &'static str,
        /// The identifier that was not found.
        id: String,
    },

    /// Payroll was attempted for an employee whose status is not active.
    #[error("Employee {employee_id} is not active (status: {status})")]
    InactiveEmployee {
        /// The employee the run was attempted for.
        employee_id: String,
        /// The employee's current lifecycle status.
        status: EmployeeStatus,
    },

    /// A caller-supplied value failed validation.
    #[error("Invalid input '{field}': {message}")]
    InvalidInput {
        /// The field or quantity that was invalid.
        field: String,
        /// A description of what made it invalid.
        message: String,
    },

    /// The storage layer failed.
    #[error("Persistence error: {message}")]
    Persistence {
        /// A description of the storage failure.
        message: String,
    },

    /// No tax policy covers the requested tax year.
    #[error("No tax policy configured for tax year {year}")]
    PolicyNotFound {
        /// The requested tax year.
        year: i32,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    /// Shorthand for an [`EngineError::InvalidInput`].
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an [`EngineError::Persistence`].
    pub fn persistence(message: impl Into<String>) -> Self {
        EngineError::Persistence {
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
