//! HTTP API module for the payroll engine.
//!
//! Exposes employee management, net-pay previews, payroll runs, bulk runs
//! and year-end summaries as JSON endpoints.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    BulkRunRequest, CreateEmployeeRequest, DeductionRequest, NetPayRequest, RunPayrollRequest,
};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
