//! Integration tests for the payroll engine.
//!
//! This suite drives the engine end to end:
//! - HTTP API flows against the router
//! - FICA wage caps and the additional Medicare surtax across runs
//! - Bulk runs with partial failure
//! - JSON file persistence across restarts
//! - Year-end summaries against the YTD ledger
//! - Hourly pay with overtime

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use payroll_engine::api::{AppState, create_router};
use payroll_engine::calculation::NEGATIVE_NET_PAY;
use payroll_engine::config::{PolicyLoader, PolicySet};
use payroll_engine::error::EngineError;
use payroll_engine::models::{
    DeductionAmount, DeductionKind, Employee, EmployeeStatus, Money, NewDeduction, NewEmployee,
    PayBasis, PayFrequency, PayPeriod,
};
use payroll_engine::repository::{InMemoryRepository, JsonFileRepository, PayrollRepository};
use payroll_engine::service::{PayrollService, RunOptions};

// =============================================================================
// Test Helpers
// =============================================================================

fn money(s: &str) -> Money {
    Money::from_str(s).unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn period(start: &str, end: &str, pay: &str) -> PayPeriod {
    PayPeriod::new(date(start), date(end), date(pay)).unwrap()
}

fn load_policies() -> PolicySet {
    PolicyLoader::load("./config/tax").expect("Failed to load tax policy")
}

fn create_service() -> PayrollService {
    PayrollService::new(Arc::new(InMemoryRepository::new()), load_policies())
}

fn hire(service: &PayrollService, name: &str, salary: &str, frequency: PayFrequency) -> Employee {
    let mut new = NewEmployee::salaried(name, money(salary));
    new.pay_frequency = frequency;
    service.add_employee(new, date("2024-01-01")).unwrap()
}

/// Stores a mid-year ledger for an employee, as if earlier periods had run.
fn seed_ytd(service: &PayrollService, employee: &Employee, gross: &str, ss_wages: &str) {
    let mut seeded = employee.clone();
    seeded.ytd.gross = money(gross);
    seeded.ytd.net = money(gross);
    seeded.ytd.ss_wages = money(ss_wages);
    seeded.ytd.medicare_wages = money(gross);
    service.repository().save_employee(&seeded).unwrap();
}

async fn send(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

// =============================================================================
// HTTP API
// =============================================================================

#[tokio::test]
async fn test_api_full_payroll_flow() {
    let router = create_router(AppState::new(create_service()));

    let (status, employee) = send(
        router.clone(),
        "POST",
        "/employees",
        Some(json!({
            "name": "Alice Smith",
            "annual_salary": "52000",
            "pay_frequency": "biweekly",
            "filing_status": "single",
            "withholding_allowances": 1,
            "state": "CA",
            "hire_date": "2024-01-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = employee["id"].as_str().unwrap().to_string();

    let (status, deduction) = send(
        router.clone(),
        "POST",
        &format!("/employees/{}/deductions", id),
        Some(json!({
            "deduction_type": "pre_tax_401k",
            "amount": { "type": "percentage", "value": "10" },
            "description": "401k"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(deduction["active"], json!(true));

    let (status, run) = send(
        router.clone(),
        "POST",
        &format!("/employees/{}/payroll", id),
        Some(json!({
            "start_date": "2024-01-01",
            "end_date": "2024-01-14",
            "pay_date": "2024-01-19"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(run["paystub"]["gross_pay"], json!("2000.00"));
    assert_eq!(run["paystub"]["pre_tax_deductions"], json!("200.00"));
    assert_eq!(run["result"]["taxable_gross"], json!("1800.00"));

    let (status, summary) = send(
        router.clone(),
        "GET",
        &format!("/employees/{}/year-end/2024", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["paystub_count"], json!(1));
    assert_eq!(summary["w2_box1"], json!("1800.00"));
    assert_eq!(summary["w2_box5"], json!("2000.00"));

    let (status, stored) = send(router, "GET", &format!("/employees/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["ytd"]["gross"], json!("2000.00"));
    assert_eq!(stored["ytd"]["deductions"], json!("200.00"));
}

#[tokio::test]
async fn test_api_inactive_employee_conflict() {
    let service = create_service();
    let employee = hire(&service, "Bob Jones", "52000", PayFrequency::Biweekly);
    service
        .set_employee_status(&employee.id, EmployeeStatus::Terminated)
        .unwrap();
    let router = create_router(AppState::new(service));

    let (status, error) = send(
        router,
        "POST",
        &format!("/employees/{}/payroll", employee.id),
        Some(json!({
            "start_date": "2024-01-01",
            "end_date": "2024-01-14",
            "pay_date": "2024-01-19"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], json!("EMPLOYEE_INACTIVE"));
}

#[tokio::test]
async fn test_api_policy_missing_for_year() {
    let service = create_service();
    let employee = hire(&service, "Bob Jones", "52000", PayFrequency::Biweekly);
    let router = create_router(AppState::new(service));

    let (status, error) = send(
        router,
        "POST",
        &format!("/employees/{}/payroll", employee.id),
        Some(json!({
            "start_date": "2019-01-01",
            "end_date": "2019-01-14",
            "pay_date": "2019-01-18"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["code"], json!("POLICY_NOT_FOUND"));
}

#[tokio::test]
async fn test_api_bulk_run_reports_failures() {
    let service = create_service();
    let paid = hire(&service, "Alice Smith", "52000", PayFrequency::Biweekly);
    let router = create_router(AppState::new(service));

    let (status, report) = send(
        router,
        "POST",
        "/payroll/bulk",
        Some(json!({
            "employee_ids": [paid.id, "EMP-MISSING"],
            "start_date": "2024-01-01",
            "end_date": "2024-01-14",
            "pay_date": "2024-01-19"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["succeeded"].as_array().unwrap().len(), 1);
    assert_eq!(report["failed"][0]["employee_id"], json!("EMP-MISSING"));
}

// =============================================================================
// FICA caps and surtax
// =============================================================================

#[test]
fn test_medicare_surtax_on_crossing_threshold() {
    let service = create_service();
    let employee = hire(&service, "High Earner", "60000", PayFrequency::Monthly);
    seed_ytd(&service, &employee, "199000", "168600");

    let run = service
        .run_payroll(&employee.id, &period("2024-11-01", "2024-11-30", "2024-11-30"), None)
        .unwrap();

    assert_eq!(run.result.gross_pay, money("5000"));
    assert_eq!(run.result.ss_tax, Money::ZERO);
    assert_eq!(run.result.medicare_surtax, money("36.00"));
    assert_eq!(run.result.medicare_tax, money("108.50"));
    assert_eq!(run.result.medicare_wages, money("5000"));
}

#[test]
fn test_social_security_cap_crossed_mid_period() {
    let service = create_service();
    let employee = hire(&service, "Cap Crosser", "52000", PayFrequency::Biweekly);
    seed_ytd(&service, &employee, "167600", "167600");

    let run = service
        .run_payroll(&employee.id, &period("2024-12-02", "2024-12-15", "2024-12-20"), None)
        .unwrap();

    assert_eq!(run.result.ss_wages, money("1000"));
    assert_eq!(run.result.ss_tax, money("62.00"));

    let stored = service.get_employee(&employee.id).unwrap();
    assert_eq!(stored.ytd.ss_wages, money("168600"));
}

#[test]
fn test_social_security_stops_after_cap() {
    let service = create_service();
    let employee = hire(&service, "Capped", "52000", PayFrequency::Biweekly);
    seed_ytd(&service, &employee, "170000", "168600");

    let run = service
        .run_payroll(&employee.id, &period("2024-12-02", "2024-12-15", "2024-12-20"), None)
        .unwrap();

    assert_eq!(run.result.ss_tax, Money::ZERO);
    assert_eq!(run.result.medicare_tax, money("29.00"));
}

#[test]
fn test_wage_base_follows_policy_year() {
    let service = create_service();
    let employee = hire(&service, "Next Year", "52000", PayFrequency::Biweekly);

    let mut seeded = employee.clone();
    seeded.ytd.tax_year = 2025;
    seeded.ytd.gross = money("175100");
    seeded.ytd.ss_wages = money("175100");
    seeded.ytd.medicare_wages = money("175100");
    service.repository().save_employee(&seeded).unwrap();

    let run = service
        .run_payroll(&employee.id, &period("2025-12-01", "2025-12-14", "2025-12-19"), None)
        .unwrap();

    // 2025 wage base is 176100.
    assert_eq!(run.result.ss_wages, money("1000"));
}

// =============================================================================
// Bulk runs
// =============================================================================

#[test]
fn test_bulk_partial_failure_commits_the_rest() {
    let service = create_service();
    let ids: Vec<String> = (0..5)
        .map(|i| hire(&service, &format!("Employee {}", i), "52000", PayFrequency::Biweekly).id)
        .collect();
    service
        .set_employee_status(&ids[3], EmployeeStatus::Terminated)
        .unwrap();

    let report = service.run_bulk(&ids, &period("2024-01-01", "2024-01-14", "2024-01-19"));

    assert_eq!(report.succeeded.len(), 4);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].employee_id, ids[3]);

    for (i, id) in ids.iter().enumerate() {
        let stubs = service.repository().get_paystubs(id, Some(2024)).unwrap();
        let expected = if i == 3 { 0 } else { 1 };
        assert_eq!(stubs.len(), expected);
    }
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_json_store_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("payroll.json");

    let employee_id = {
        let repository = JsonFileRepository::open(&path).unwrap();
        let service = PayrollService::new(Arc::new(repository), load_policies());
        let employee = hire(&service, "Alice Smith", "52000", PayFrequency::Biweekly);
        service
            .add_deduction(NewDeduction {
                employee_id: employee.id.clone(),
                kind: DeductionKind::PostTaxRoth,
                amount: DeductionAmount::Flat(money("50")),
                description: "Roth".to_string(),
            })
            .unwrap();
        service
            .run_payroll(&employee.id, &period("2024-01-01", "2024-01-14", "2024-01-19"), None)
            .unwrap();
        employee.id
    };

    let repository = JsonFileRepository::open(&path).unwrap();
    let service = PayrollService::new(Arc::new(repository), load_policies());

    let stored = service.get_employee(&employee_id).unwrap();
    assert_eq!(stored.ytd.gross, money("2000"));
    assert_eq!(stored.ytd.deductions, money("50"));

    let second = service
        .run_payroll(&employee_id, &period("2024-01-15", "2024-01-28", "2024-02-02"), None)
        .unwrap();
    assert_eq!(second.paystub.ytd_gross, money("4000"));
    assert_eq!(second.paystub.post_tax_deductions, money("50"));
    assert_eq!(
        service
            .repository()
            .get_paystubs(&employee_id, None)
            .unwrap()
            .len(),
        2
    );
}

// =============================================================================
// Ledger and year-end
// =============================================================================

#[test]
fn test_year_end_matches_ledger() {
    let service = create_service();
    let employee = hire(&service, "Carol White", "78000", PayFrequency::SemiMonthly);
    service
        .add_deduction(NewDeduction {
            employee_id: employee.id.clone(),
            kind: DeductionKind::PreTaxHealth,
            amount: DeductionAmount::Flat(money("120")),
            description: "Medical".to_string(),
        })
        .unwrap();

    for month in 1..=6u32 {
        let start = NaiveDate::from_ymd_opt(2024, month, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, month, 15).unwrap();
        service
            .run_payroll(&employee.id, &PayPeriod::new(start, end, end).unwrap(), None)
            .unwrap();
    }

    let ledger = service.get_employee(&employee.id).unwrap().ytd;
    let summary = service.year_end_summary(&employee.id, 2024).unwrap();

    assert_eq!(summary.paystub_count, 6);
    assert_eq!(summary.ytd_gross, ledger.gross);
    assert_eq!(summary.ytd_net, ledger.net);
    assert_eq!(summary.w2_box2, ledger.federal_tax);
    assert_eq!(summary.w2_box4, ledger.ss_tax);
    assert_eq!(summary.w2_box6, ledger.medicare_tax);
    assert_eq!(summary.w2_box1, ledger.gross - money("720"));
    assert_eq!(
        summary.ytd_gross
            - summary.ytd_pre_tax_deductions
            - summary.ytd_federal_tax
            - summary.ytd_ss_tax
            - summary.ytd_medicare_tax
            - summary.ytd_state_tax
            - summary.ytd_post_tax_deductions,
        summary.ytd_net
    );
}

#[test]
fn test_earlier_year_rejected_after_rollover() {
    let service = create_service();
    let employee = hire(&service, "Dan Brown", "52000", PayFrequency::Biweekly);

    service
        .run_payroll(&employee.id, &period("2024-12-23", "2025-01-05", "2025-01-10"), None)
        .unwrap();
    let result =
        service.run_payroll(&employee.id, &period("2024-12-09", "2024-12-22", "2024-12-27"), None);

    assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    assert_eq!(
        service.repository().get_paystubs(&employee.id, None).unwrap().len(),
        1
    );
}

// =============================================================================
// Hourly pay and warnings
// =============================================================================

#[test]
fn test_hourly_overtime_paystub() {
    let service = create_service();
    let mut new = NewEmployee::salaried("Dave Kim", Money::ZERO);
    new.hourly_rate = Some(money("25"));
    let employee = service.add_employee(new, date("2024-01-01")).unwrap();

    let run = service
        .run_payroll(
            &employee.id,
            &period("2024-01-01", "2024-01-14", "2024-01-19"),
            Some(dec("45")),
        )
        .unwrap();

    assert_eq!(run.result.pay_basis, PayBasis::Hourly);
    assert_eq!(run.result.gross_pay, money("1187.50"));
    assert_eq!(run.result.overtime_hours, Some(dec("5")));
    assert!(run.paystub.lines_balance());
    assert!(run.paystub.lines[0].label.starts_with("Regular Pay"));
    assert_eq!(run.paystub.lines[1].amount, money("187.50"));
}

#[test]
fn test_garnishment_beyond_net_warns() {
    let service = create_service();
    let employee = hire(&service, "Eve Black", "52000", PayFrequency::Biweekly);
    service
        .add_deduction(NewDeduction {
            employee_id: employee.id.clone(),
            kind: DeductionKind::PostTaxGarnishment,
            amount: DeductionAmount::Flat(money("2000")),
            description: "Garnishment".to_string(),
        })
        .unwrap();

    let run = service
        .run_payroll_with(
            &employee.id,
            &period("2024-01-01", "2024-01-14", "2024-01-19"),
            &RunOptions::default(),
        )
        .unwrap();

    assert!(run.result.net_pay.is_negative());
    assert!(run.result.has_warning(NEGATIVE_NET_PAY));
    assert!(run.result.is_balanced());
}

#[test]
fn test_loaded_policies_cover_both_years() {
    let policies = load_policies();
    assert_eq!(policies.years(), vec![2024, 2025]);
    assert_eq!(
        policies.policy_for(2026).unwrap().tax_year,
        2025
    );
}
