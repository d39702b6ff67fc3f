// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the customer and account event feeds

mod fixtures;

use axum::http::StatusCode;
use fixtures::{SEEDED_ACCOUNT, SEEDED_CUSTOMER, get, start_server};
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde_json::{Value, json};

fn header<'a>(response: &'a reqwest::Response, name: &reqwest::header::HeaderName) -> Option<&'a str> {
    response.headers().get(name).and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn seeded_saves_are_listed_per_feed() {
    let (addr, _) = start_server().await;

    let response = get(addr, "/customer-events", "application/hal+json;concept=events;v=1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, &CACHE_CONTROL), Some("max-age=60"));
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["_embedded"]["events"].as_array().map(Vec::len), Some(3));

    let response = get(addr, "/account-events", "application/hal+json+events+v1").await;
    assert_eq!(header(&response, &CONTENT_TYPE), Some("application/hal+json+events+v1"));
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["_embedded"]["events"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn customer_update_is_published_in_its_category() {
    let (addr, _) = start_server().await;

    let updated = reqwest::Client::new()
        .put(format!("http://{addr}/customers/{SEEDED_CUSTOMER}"))
        .json(&json!({"number": SEEDED_CUSTOMER, "firstName": "Hans", "surname": "Hansen"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(updated.status(), StatusCode::OK);

    let category: Value = get(
        addr,
        &format!("/customer-events/{SEEDED_CUSTOMER}"),
        "application/hal+json;concept=eventcategory;v=1",
    )
    .await
    .json()
    .await
    .expect("Failed to parse JSON");
    let events = category["_embedded"]["events"]
        .as_array()
        .expect("category embeds events");
    assert_eq!(events.len(), 2);
    let latest = &events[1];
    assert_eq!(latest["_links"]["origin"]["href"], format!("/customers/{SEEDED_CUSTOMER}"));

    let self_link = latest["_links"]["self"]["href"]
        .as_str()
        .expect("event links to itself");
    let single = get(addr, self_link, "application/hal+json+event+v1").await;
    assert_eq!(single.status(), StatusCode::OK);
    assert_eq!(header(&single, &CACHE_CONTROL), Some("max-age=604800"));
    let body: Value = single.json().await.expect("Failed to parse JSON");
    assert_eq!(body["id"], latest["id"]);
}

#[tokio::test]
async fn booking_is_published_on_the_account_feed() {
    let (addr, _) = start_server().await;
    let transaction = format!("/accounts/{SEEDED_ACCOUNT}/transactions/00000000-0000-0000-0000-0000000000cc");

    let booked = reqwest::Client::new()
        .put(format!("http://{addr}{transaction}"))
        .json(&json!({"description": "Bakery", "amount": "-35.50"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(booked.status(), StatusCode::CREATED);

    let category: Value = get(addr, "/account-events/1234567-5479", "application/hal+json")
        .await
        .json()
        .await
        .expect("Failed to parse JSON");
    let events = category["_embedded"]["events"]
        .as_array()
        .expect("category embeds events");
    let latest = events.last().expect("booking published an event");
    assert_eq!(latest["information"], format!("new transaction on account {SEEDED_ACCOUNT}"));
    assert_eq!(latest["_links"]["origin"]["href"], transaction);
    assert_eq!(latest["_links"]["metadata"]["href"], "/account-events-metadata");
}

#[tokio::test]
async fn interval_excludes_events_outside_it() {
    let (addr, _) = start_server().await;

    let past: Value = get(
        addr,
        "/customer-events?interval=2000-01-01T00:00:00Z/2000-02-01T00:00:00Z",
        "application/hal+json",
    )
    .await
    .json()
    .await
    .expect("Failed to parse JSON");
    assert_eq!(past["_embedded"]["events"].as_array().map(Vec::len), Some(0));

    let malformed = get(addr, "/customer-events?interval=yesterday", "application/hal+json").await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn metadata_is_negotiated_like_any_resource() {
    let (addr, _) = start_server().await;

    let response = get(addr, "/customer-events-metadata", "application/hal+json;concept=metadata;v=1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, &CACHE_CONTROL), Some("max-age=2419200"));
    assert_eq!(
        header(&response, &CONTENT_TYPE),
        Some("application/hal+json;concept=metadata;v=1")
    );
    assert!(response.headers().contains_key("x-log-token"));
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["_links"]["events"]["href"], "/customer-events");

    let unsupported = get(addr, "/account-events-metadata", "application/json").await;
    assert_eq!(unsupported.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn unknown_event_is_not_found() {
    let (addr, _) = start_server().await;

    let response = get(
        addr,
        &format!("/customer-events/{SEEDED_CUSTOMER}/00000000-0000-0000-0000-000000000000"),
        "application/hal+json",
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(addr, &format!("/customer-events/{SEEDED_CUSTOMER}/not-a-uuid"), "application/hal+json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
