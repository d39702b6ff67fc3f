// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for error statuses and the operational endpoints

mod fixtures;

use axum::http::StatusCode;
use fixtures::{SEEDED_ACCOUNT, get, start_server};
use serde_json::Value;

#[tokio::test]
async fn unknown_customer_is_not_found() {
    let (addr, _) = start_server().await;

    let response = get(addr, "/customers/9999999999", "application/hal+json").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn malformed_keys_are_bad_requests() {
    let (addr, _) = start_server().await;

    for path in [
        "/customers/12ab".to_string(),
        "/accounts/not-an-account".to_string(),
        format!("/accounts/{SEEDED_ACCOUNT}/transactions/not-a-uuid"),
    ] {
        let response = get(addr, &path, "application/hal+json").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
    }
}

#[tokio::test]
async fn unknown_transaction_is_not_found() {
    let (addr, _) = start_server().await;

    let response = get(
        addr,
        &format!("/accounts/{SEEDED_ACCOUNT}/transactions/00000000-0000-0000-0000-0000000000ff"),
        "application/hal+json",
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_archivists() {
    let (addr, _) = start_server().await;

    let response = reqwest::get(format!("http://{addr}/health"))
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "Up");
    assert_eq!(body["environment"], "testing");
    assert_eq!(body["archivists"]["customers"], "Up");
}

#[tokio::test]
async fn metrics_count_unsupported_media_types() {
    let (addr, _) = start_server().await;

    let _ = get(addr, "/customers", "text/plain").await;
    let response = reqwest::get(format!("http://{addr}/metrics"))
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("Failed to read response");
    assert!(body.contains("bank_api_unsupported_media_type_total"));
}

#[tokio::test]
async fn openapi_document_lists_resources() {
    let (addr, _) = start_server().await;

    let response = reqwest::get(format!("http://{addr}/api-doc/openapi.json"))
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["paths"]["/customers/{number}"].is_object());
    assert!(body["paths"]["/accounts/{account}/transactions/{id}"].is_object());
}
