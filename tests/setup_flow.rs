//! End-to-end coverage of the setup endpoint: validation order, the returned
//! services URL, and session replacement.

mod common;

use common::{customer_payload, run_setup, spawn_harness};
use reqwest::Client;
use serde_json::json;

#[tokio::test]
async fn setup_requires_a_name() {
    let base = spawn_harness().await;
    let client = Client::new();

    let response = client
        .post(format!("{base}setup"))
        .json(&json!({ "models": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "name is required");
    assert_eq!(body["error"]["code"], "invalid_request");

    // The failed setup must not have configured anything.
    let response = client.get(format!("{base}services")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 503);
}

#[tokio::test]
async fn setup_rejects_models_that_are_not_an_object() {
    let base = spawn_harness().await;
    let client = Client::new();
    for models in [json!([1, 2]), json!("nope"), json!(null)] {
        let response = client
            .post(format!("{base}setup"))
            .json(&json!({ "name": "svc", "models": models }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"]["message"], "models must be a valid object");
    }

    let response = client
        .post(format!("{base}setup"))
        .json(&json!({ "name": "svc" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn name_is_checked_before_models() {
    let base = spawn_harness().await;
    let response = Client::new()
        .post(format!("{base}setup"))
        .json(&json!({ "models": "broken" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "name is required");
}

#[tokio::test]
async fn setup_returns_an_absolute_services_url() {
    let base = spawn_harness().await;
    let client = Client::new();
    let body = run_setup(&client, &base, &customer_payload()).await;
    let url = body["servicesUrl"].as_str().expect("servicesUrl");
    assert!(url.starts_with(&base), "not rooted at {base}: {url}");
    assert!(url.ends_with("services?lbServices"), "unexpected servicesUrl: {url}");

    // The URL it returned actually serves the script.
    let response = client.get(url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn a_second_setup_replaces_the_first_entirely() {
    let base = spawn_harness().await;
    let client = Client::new();

    let first = json!({
        "name": "firstServices",
        "models": { "Alpha": { "properties": { "label": "string" } } }
    });
    run_setup(&client, &base, &first).await;
    let created = client
        .post(format!("{base}api/Alpha"))
        .json(&json!({ "label": "old" }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);

    let second = json!({
        "name": "secondServices",
        "models": { "Beta": { "properties": { "label": "string" } } }
    });
    run_setup(&client, &base, &second).await;

    let script = client
        .get(format!("{base}services?secondServices"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(script.contains("secondServices"));
    assert!(script.contains("Beta"));
    assert!(!script.contains("Alpha"));

    // New model starts empty; the old one is gone along with its data.
    let rows: Vec<serde_json::Value> = client
        .get(format!("{base}api/Beta"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(rows.is_empty());
    let response = client.get(format!("{base}api/Alpha")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn invalid_model_definitions_fail_the_setup() {
    let base = spawn_harness().await;
    let client = Client::new();
    let payload = json!({
        "name": "svc",
        "models": {
            "Pair": {
                "properties": {
                    "a": { "type": "number", "id": true },
                    "b": { "type": "number", "id": true }
                }
            }
        }
    });
    let response = client.post(format!("{base}setup")).json(&payload).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "invalid_model");

    // Failed setups leave the session unconfigured.
    let response = client.get(format!("{base}api/Pair")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 503);
}
