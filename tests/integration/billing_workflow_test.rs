//! Usage ledger, invoice, and payment workflow tests
//!
//! Require `TEST_DATABASE_URL`; each test self-skips without it.

#[macro_use]
mod common;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .or_else(|| value.as_f64().and_then(Decimal::from_f64_retain))
        .unwrap_or_else(|| panic!("not a decimal: {}", value))
}

async fn log_usage(
    app: &common::TestApp,
    team_id: Uuid,
    user_id: Uuid,
    amount: f64,
    cost: &str,
) -> (StatusCode, Value) {
    app.post(
        "/v1/usage",
        json!({
            "team_id": team_id,
            "user_id": user_id,
            "usage_type": "inference",
            "amount": amount,
            "unit": "tokens",
            "cost": cost,
        }),
    )
    .await
}

#[tokio::test]
async fn test_full_billing_workflow() {
    let app = require_test_db!();
    let owner = Uuid::new_v4();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let (team_id, _) = app.create_team("Billing Co", owner).await;

    let token = app.invite(team_id, "alice@example.com", "member", owner).await;
    let (status, _) = app.accept(&token, alice).await;
    assert_eq!(status, StatusCode::OK);

    // Three ledger entries across two users: 1.0 + 1.5 + 0.5 = 3.0
    let (status, _) = log_usage(&app, team_id, alice, 1000.0, "1.0").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = log_usage(&app, team_id, alice, 2000.0, "1.5").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = log_usage(&app, team_id, bob, 500.0, "0.5").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, invoice) = app.post("/v1/invoices", json!({ "team_id": team_id })).await;
    assert_eq!(status, StatusCode::CREATED, "invoice: {}", invoice);
    assert_eq!(invoice["status"].as_str().unwrap(), "pending");
    assert_eq!(decimal(&invoice["total"]), Decimal::new(30, 1));

    let breakdown = invoice["member_breakdown"].as_array().unwrap();
    assert_eq!(breakdown.len(), 2);

    let alice_item = breakdown
        .iter()
        .find(|item| item["user_id"].as_str().unwrap() == alice.to_string())
        .expect("missing alice line item");
    assert_eq!(alice_item["tokens_used"].as_f64().unwrap(), 3000.0);
    assert_eq!(decimal(&alice_item["cost"]), Decimal::new(25, 1));

    let bob_item = breakdown
        .iter()
        .find(|item| item["user_id"].as_str().unwrap() == bob.to_string())
        .expect("missing bob line item");
    assert_eq!(bob_item["tokens_used"].as_f64().unwrap(), 500.0);
    assert_eq!(decimal(&bob_item["cost"]), Decimal::new(5, 1));

    // Invariant: total equals the sum of line-item costs exactly
    let sum: Decimal = breakdown.iter().map(|item| decimal(&item["cost"])).sum();
    assert_eq!(sum, decimal(&invoice["total"]));

    let invoice_id = invoice["invoice_id"].as_str().unwrap().to_string();

    // Pay settles the invoice at the full amount
    let (status, payment) = app
        .post(
            &format!("/v1/invoices/{}/pay", invoice_id),
            json!({ "method": "card" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "payment: {}", payment);
    assert_eq!(payment["invoice_status"].as_str().unwrap(), "paid");
    assert_eq!(payment["status"].as_str().unwrap(), "paid");
    assert_eq!(decimal(&payment["amount"]), Decimal::new(30, 1));

    // Paid status is stable on read, and the payment attempt is recorded
    let (status, read) = app.get(&format!("/v1/invoices/{}", invoice_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["status"].as_str().unwrap(), "paid");
    assert_eq!(read["member_breakdown"].as_array().unwrap().len(), 2);
    let payments = read["payments"].as_array().unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["method"].as_str().unwrap(), "card");

    // The ledger reads back in commit order
    let (status, usage) = app.get(&format!("/v1/teams/{}/usage", team_id)).await;
    assert_eq!(status, StatusCode::OK);
    let usage = usage.as_array().unwrap();
    assert_eq!(usage.len(), 3);
    assert_eq!(usage[0]["amount"].as_f64().unwrap(), 1000.0);
    assert_eq!(usage[1]["amount"].as_f64().unwrap(), 2000.0);
    assert_eq!(usage[2]["amount"].as_f64().unwrap(), 500.0);

    // The invoice shows up in the team listing
    let (status, invoices) = app.get(&format!("/v1/teams/{}/invoices", team_id)).await;
    assert_eq!(status, StatusCode::OK);
    let invoices = invoices.as_array().unwrap();
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0]["invoice_id"].as_str().unwrap(), invoice_id);
    assert_eq!(invoices[0]["status"].as_str().unwrap(), "paid");
}

#[tokio::test]
async fn test_repeat_pay_is_accepted_and_status_stays_paid() {
    let app = require_test_db!();
    let owner = Uuid::new_v4();

    let (team_id, _) = app.create_team("Repay", owner).await;
    let (_, invoice) = app.post("/v1/invoices", json!({ "team_id": team_id })).await;
    let invoice_id = invoice["invoice_id"].as_str().unwrap().to_string();

    let (status, first) = app
        .post(&format!("/v1/invoices/{}/pay", invoice_id), json!({ "method": "card" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["invoice_status"].as_str().unwrap(), "paid");

    // A second payment attempt is accepted; it records a new payment row
    // while the invoice status stays terminal
    let (status, second) = app
        .post(&format!("/v1/invoices/{}/pay", invoice_id), json!({ "method": "bank" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["invoice_status"].as_str().unwrap(), "paid");
    assert_ne!(
        first["payment_id"].as_str().unwrap(),
        second["payment_id"].as_str().unwrap()
    );
}

#[tokio::test]
async fn test_empty_window_yields_zero_total_invoice() {
    let app = require_test_db!();
    let owner = Uuid::new_v4();

    let (team_id, _) = app.create_team("Quiet Month", owner).await;

    let (status, invoice) = app.post("/v1/invoices", json!({ "team_id": team_id })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&invoice["total"]), Decimal::ZERO);
    assert!(invoice["member_breakdown"].as_array().unwrap().is_empty());
    assert_eq!(invoice["status"].as_str().unwrap(), "pending");
}

#[tokio::test]
async fn test_invoice_generation_is_not_idempotent() {
    let app = require_test_db!();
    let owner = Uuid::new_v4();

    let (team_id, _) = app.create_team("Twice", owner).await;
    log_usage(&app, team_id, owner, 100.0, "1.0").await;

    let (_, first) = app.post("/v1/invoices", json!({ "team_id": team_id })).await;
    let (_, second) = app.post("/v1/invoices", json!({ "team_id": team_id })).await;

    // Two separate invoices over the same window, summing the same rows
    assert_ne!(
        first["invoice_id"].as_str().unwrap(),
        second["invoice_id"].as_str().unwrap()
    );
    assert_eq!(decimal(&first["total"]), decimal(&second["total"]));
}

#[tokio::test]
async fn test_explicit_window_bounds_are_half_open() {
    let app = require_test_db!();
    let owner = Uuid::new_v4();

    let (team_id, _) = app.create_team("Window", owner).await;
    log_usage(&app, team_id, owner, 100.0, "1.0").await;

    // A window entirely in the past excludes the record just written
    let (status, invoice) = app
        .post(
            "/v1/invoices",
            json!({
                "team_id": team_id,
                "period_start": "2020-01-01T00:00:00Z",
                "period_end": "2020-02-01T00:00:00Z",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&invoice["total"]), Decimal::ZERO);

    // Supplying only one boundary is rejected
    let (status, _) = app
        .post(
            "/v1/invoices",
            json!({ "team_id": team_id, "period_start": "2020-01-01T00:00:00Z" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_log_usage_validation_and_not_found() {
    let app = require_test_db!();
    let owner = Uuid::new_v4();

    let (status, _) = log_usage(&app, Uuid::new_v4(), owner, 1.0, "0.1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (team_id, _) = app.create_team("Validation", owner).await;
    let (status, body) = log_usage(&app, team_id, owner, -5.0, "0.1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"].as_str().unwrap(), "INVALID");

    let (status, _) = log_usage(&app, team_id, owner, 5.0, "-0.1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invoice_not_found_cases() {
    let app = require_test_db!();

    let missing = Uuid::new_v4();
    let (status, _) = app.get(&format!("/v1/invoices/{}", missing)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get(&format!("/v1/invoices/{}/pdf", missing)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(&format!("/v1/invoices/{}/pay", missing), json!({ "method": "card" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post("/v1/invoices", json!({ "team_id": Uuid::new_v4() }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invoice_pdf_locator() {
    let app = require_test_db!();
    let owner = Uuid::new_v4();

    let (team_id, _) = app.create_team("Docs", owner).await;
    let (_, invoice) = app.post("/v1/invoices", json!({ "team_id": team_id })).await;
    let invoice_id = invoice["invoice_id"].as_str().unwrap().to_string();

    let (status, body) = app.get(&format!("/v1/invoices/{}/pdf", invoice_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["pdf_url"].as_str().unwrap(),
        format!("{}/invoices/{}.pdf", common::TEST_APP_BASE_URL, invoice_id)
    );
}

#[tokio::test]
async fn test_concurrent_usage_logging_loses_nothing() {
    let app = require_test_db!();
    let owner = Uuid::new_v4();

    let (team_id, _) = app.create_team("Firehose", owner).await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let router = app.router.clone();
        handles.push(tokio::spawn(async move {
            use axum::body::Body;
            use axum::http::{header, Method, Request};
            use tower::ServiceExt;

            let body = json!({
                "team_id": team_id,
                "user_id": Uuid::new_v4(),
                "usage_type": "inference",
                "amount": i as f64,
                "unit": "tokens",
                "cost": "0.1",
            });
            let request = Request::builder()
                .method(Method::POST)
                .uri("/v1/usage")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            router.oneshot(request).await.unwrap().status()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::CREATED);
    }

    // Every append landed exactly once: 10 records, total cost 1.0
    let (_, invoice) = app.post("/v1/invoices", json!({ "team_id": team_id })).await;
    assert_eq!(decimal(&invoice["total"]), Decimal::ONE);
    assert_eq!(invoice["member_breakdown"].as_array().unwrap().len(), 10);
}
