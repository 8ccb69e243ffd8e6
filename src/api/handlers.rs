//! HTTP request handlers for the payroll API.
//!
//! This module contains the handler functions for all API endpoints.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::service::PayrollService;

use super::request::{
    BulkRunRequest, CreateEmployeeRequest, DeductionRequest, NetPayRequest, RunPayrollRequest,
};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/employees", post(create_employee_handler))
        .route("/employees/:id", get(get_employee_handler))
        .route("/employees/:id/deductions", post(add_deduction_handler))
        .route("/employees/:id/net-pay", post(net_pay_handler))
        .route("/employees/:id/payroll", post(run_payroll_handler))
        .route("/employees/:id/year-end/:year", get(year_end_handler))
        .route("/payroll/bulk", post(bulk_run_handler))
        .with_state(state)
}

/// Handler for POST /employees.
async fn create_employee_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateEmployeeRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing create employee request");

    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let hire_date = request.hire_date.unwrap_or_else(|| Utc::now().date_naive());
    let outcome = run_blocking(state.service(), move |service| {
        service.add_employee(request.employee, hire_date)
    })
    .await;
    respond(correlation_id, StatusCode::CREATED, outcome)
}

/// Handler for GET /employees/:id.
async fn get_employee_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, employee_id = %employee_id, "Fetching employee");

    let outcome = run_blocking(state.service(), move |service| {
        service.get_employee(&employee_id)
    })
    .await;
    respond(correlation_id, StatusCode::OK, outcome)
}

/// Handler for POST /employees/:id/deductions.
async fn add_deduction_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    payload: Result<Json<DeductionRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        employee_id = %employee_id,
        "Processing deduction request"
    );

    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let outcome = run_blocking(state.service(), move |service| {
        service.add_deduction(request.for_employee(employee_id))
    })
    .await;
    respond(correlation_id, StatusCode::CREATED, outcome)
}

/// Handler for POST /employees/:id/net-pay.
///
/// Calculates the period's pay without storing anything.
async fn net_pay_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    payload: Result<Json<NetPayRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        employee_id = %employee_id,
        "Processing net pay request"
    );

    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let outcome = run_blocking(state.service(), move |service| {
        let employee = service.get_employee(&employee_id)?;
        service.compute_net_pay(&employee, request.hours, request.overtime_hours)
    })
    .await;

    if let Ok(result) = &outcome {
        info!(
            correlation_id = %correlation_id,
            gross_pay = %result.gross_pay,
            net_pay = %result.net_pay,
            duration_us = result.audit_trace.duration_us,
            "Net pay calculated"
        );
    }
    respond(correlation_id, StatusCode::OK, outcome)
}

/// Handler for POST /employees/:id/payroll.
async fn run_payroll_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    payload: Result<Json<RunPayrollRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        employee_id = %employee_id,
        "Processing payroll run request"
    );

    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let outcome = run_blocking(state.service(), move |service| {
        let period = request.period()?;
        service.run_payroll_with(&employee_id, &period, &request.options())
    })
    .await;

    if let Ok(run) = &outcome {
        info!(
            correlation_id = %correlation_id,
            check_number = %run.paystub.check_number,
            net_pay = %run.paystub.net_pay,
            "Payroll run completed"
        );
    }
    respond(correlation_id, StatusCode::CREATED, outcome)
}

/// Handler for POST /payroll/bulk.
///
/// Always answers 200 when the period is valid; per-employee failures are
/// listed in the report.
async fn bulk_run_handler(
    State(state): State<AppState>,
    payload: Result<Json<BulkRunRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing bulk payroll request");

    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let outcome = run_blocking(state.service(), move |service| {
        let period = request.period()?;
        match &request.employee_ids {
            Some(ids) => Ok(service.run_bulk(ids, &period)),
            None => service.run_bulk_active(&period),
        }
    })
    .await;

    if let Ok(report) = &outcome {
        info!(
            correlation_id = %correlation_id,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Bulk payroll completed"
        );
    }
    respond(correlation_id, StatusCode::OK, outcome)
}

/// Handler for GET /employees/:id/year-end/:year.
async fn year_end_handler(
    State(state): State<AppState>,
    Path((employee_id, year)): Path<(String, i32)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        employee_id = %employee_id,
        year,
        "Processing year-end request"
    );

    let outcome = run_blocking(state.service(), move |service| {
        service.year_end_summary(&employee_id, year)
    })
    .await;
    respond(correlation_id, StatusCode::OK, outcome)
}

/// Unwraps a JSON body or builds the 400 response for it.
#[allow(clippy::result_large_err)]
fn parse_body<T>(
    correlation_id: Uuid,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, Response> {
    let rejection = match payload {
        Ok(Json(request)) => return Ok(request),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's description of the problem.
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") || body_text.contains("unknown variant") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    Err(ApiErrorResponse::bad_request(error).into_response())
}

/// Runs a service call on the blocking pool.
///
/// Service calls take locks, touch the filesystem and fan out on rayon,
/// none of which belongs on an async worker.
async fn run_blocking<T, F>(service: &Arc<PayrollService>, call: F) -> EngineResult<T>
where
    T: Send + 'static,
    F: FnOnce(&PayrollService) -> EngineResult<T> + Send + 'static,
{
    let service = Arc::clone(service);
    tokio::task::spawn_blocking(move || call(service.as_ref()))
        .await
        .map_err(|e| EngineError::CalculationError {
            message: format!("Worker task failed: {}", e),
        })?
}

fn respond<T: Serialize>(
    correlation_id: Uuid,
    status: StatusCode,
    outcome: EngineResult<T>,
) -> Response {
    match outcome {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Request failed"
            );
            ApiErrorResponse::from(err).into_response()
        }
    }
}
