// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for creating and updating customers, accounts,
//! transactions and their reconciliation

mod fixtures;

use axum::http::StatusCode;
use fixtures::{SEEDED_ACCOUNT, SEEDED_CUSTOMER, get, start_server};
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION};
use serde_json::{Value, json};

async fn put(addr: std::net::SocketAddr, path: &str, body: &Value) -> reqwest::Response {
    reqwest::Client::new()
        .put(format!("http://{addr}{path}"))
        .json(body)
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
async fn new_customer_is_created_then_updated() {
    let (addr, _) = start_server().await;
    let path = "/customers/9876543210";

    let created = put(
        addr,
        path,
        &json!({"number": "9876543210", "firstName": "Ida", "surname": "Holm"}),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(
        created
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok()),
        Some(path)
    );

    let updated = put(
        addr,
        path,
        &json!({"number": "9876543210", "firstName": "Ida", "middleName": "Marie", "surname": "Holm"}),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);

    let fetched: Value = get(addr, path, "application/hal+json")
        .await
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(fetched["middleName"], "Marie");
}

#[tokio::test]
async fn customer_update_changes_the_etag() {
    let (addr, _) = start_server().await;
    let path = format!("/customers/{SEEDED_CUSTOMER}");

    let before = get(addr, &path, "application/hal+json").await;
    let before = before
        .headers()
        .get(reqwest::header::ETAG)
        .cloned()
        .expect("ETag is set");

    let updated = put(
        addr,
        &path,
        &json!({"number": SEEDED_CUSTOMER, "firstName": "Hans", "surname": "Hansen"}),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);

    // The middle name was dropped, so the content and its tag changed
    let after = get(addr, &path, "application/hal+json").await;
    assert_ne!(after.headers().get(reqwest::header::ETAG), Some(&before));
}

#[tokio::test]
async fn mismatched_customer_number_is_rejected() {
    let (addr, _) = start_server().await;

    let response = put(
        addr,
        &format!("/customers/{SEEDED_CUSTOMER}"),
        &json!({"number": "1111111111", "firstName": "Eve", "surname": "Mallory"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn account_is_renamed_keeping_transactions() {
    let (addr, _) = start_server().await;
    let path = format!("/accounts/{SEEDED_ACCOUNT}");

    let response = put(
        addr,
        &path,
        &json!({"regNo": "5479", "accountNo": "1234567", "name": "Budget"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let account: Value = get(addr, &path, "application/hal+json")
        .await
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(account["name"], "Budget");
    assert_eq!(
        account["_embedded"]["transactions"]
            .as_array()
            .map(Vec::len),
        Some(3)
    );
}

#[tokio::test]
async fn overlong_account_name_is_rejected() {
    let (addr, _) = start_server().await;

    let response = put(
        addr,
        "/accounts/5479-0000001",
        &json!({"regNo": "5479", "accountNo": "0000001", "name": "x".repeat(41)}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let (addr, _) = start_server().await;

    let response = reqwest::Client::new()
        .put(format!("http://{addr}/customers/{SEEDED_CUSTOMER}"))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

fn header<'a>(response: &'a reqwest::Response, name: &reqwest::header::HeaderName) -> Option<&'a str> {
    response.headers().get(name).and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn transaction_is_booked_once() {
    let (addr, _) = start_server().await;
    let path = format!("/accounts/{SEEDED_ACCOUNT}/transactions/00000000-0000-0000-0000-0000000000aa");
    let booking = json!({"description": "Cinema", "amount": "-120.00"});

    let booked = put(addr, &path, &booking).await;
    assert_eq!(booked.status(), StatusCode::CREATED);
    assert_eq!(header(&booked, &LOCATION), Some(path.as_str()));
    assert_eq!(
        header(&booked, &CONTENT_TYPE),
        Some("application/hal+json;concept=transaction;v=1")
    );
    assert_eq!(header(&booked, &CACHE_CONTROL), Some("max-age=30"));

    let fetched: Value = get(addr, &path, "application/hal+json")
        .await
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(fetched["amount"], "-120.00");
    assert_eq!(fetched["description"], "Cinema");

    let again = put(addr, &path, &booking).await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn booking_validates_account_and_amount() {
    let (addr, _) = start_server().await;

    let unknown_account = put(
        addr,
        "/accounts/1111-1/transactions/00000000-0000-0000-0000-0000000000ab",
        &json!({"description": "Fee", "amount": "10.00"}),
    )
    .await;
    assert_eq!(unknown_account.status(), StatusCode::NOT_FOUND);

    let bad_amount = put(
        addr,
        &format!("/accounts/{SEEDED_ACCOUNT}/transactions/00000000-0000-0000-0000-0000000000ab"),
        &json!({"description": "Fee", "amount": "10,00"}),
    )
    .await;
    assert_eq!(bad_amount.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn transaction_is_reconciled() {
    let (addr, _) = start_server().await;
    let path = format!(
        "/accounts/{SEEDED_ACCOUNT}/reconciled-transactions/00000000-0000-0000-0000-000000000002"
    );

    let stored = put(addr, &path, &json!({"note": "payslip checked", "reconciled": "true"})).await;
    assert_eq!(stored.status(), StatusCode::OK);
    assert_eq!(header(&stored, &CACHE_CONTROL), Some("max-age=60"));

    let fetched = get(addr, &path, "application/hal+json+reconciledtransaction+v1").await;
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(header(&fetched, &CACHE_CONTROL), Some("max-age=86400"));
    let body: Value = fetched.json().await.expect("Failed to parse JSON");
    assert_eq!(body["reconciled"], true);
    assert_eq!(
        body["_links"]["transaction"]["href"],
        format!("/accounts/{SEEDED_ACCOUNT}/transactions/00000000-0000-0000-0000-000000000002")
    );

    let listed: Value = get(
        addr,
        &format!("/accounts/{SEEDED_ACCOUNT}/reconciled-transactions"),
        "application/hal+json;concept=reconciledtransactions;v=1",
    )
    .await
    .json()
    .await
    .expect("Failed to parse JSON");
    assert_eq!(
        listed["_embedded"]["reconciledTransactions"]
            .as_array()
            .map(Vec::len),
        Some(1)
    );
}

#[tokio::test]
async fn reconciling_an_unbooked_transaction_is_rejected() {
    let (addr, _) = start_server().await;

    let response = put(
        addr,
        &format!(
            "/accounts/{SEEDED_ACCOUNT}/reconciled-transactions/00000000-0000-0000-0000-0000000000ff"
        ),
        &json!({"note": "unknown", "reconciled": "false"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
