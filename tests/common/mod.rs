//! Shared helpers for the end-to-end tests.

use fixture_harness::{HarnessConfig, HarnessServer};

/// Spawn a harness on an ephemeral port and return its base URL, with the
/// trailing slash. The server task lives until the test process exits.
pub async fn spawn_harness() -> String {
    let config = HarnessConfig { port: 0, ..HarnessConfig::default() };
    let server = HarnessServer::bind(&config).await.expect("bind harness");
    let base_url = server.base_url().to_string();
    tokio::spawn(server.run());
    base_url
}

/// A minimal single-model setup body.
#[allow(dead_code)]
pub fn customer_payload() -> serde_json::Value {
    serde_json::json!({
        "name": "lbServices",
        "models": {
            "Customer": {
                "properties": { "name": "string" },
                "options": {}
            }
        }
    })
}

/// Run a setup and panic unless it succeeds.
#[allow(dead_code)]
pub async fn run_setup(client: &reqwest::Client, base: &str, payload: &serde_json::Value) -> serde_json::Value {
    let response = client
        .post(format!("{base}setup"))
        .json(payload)
        .send()
        .await
        .expect("setup request");
    assert_eq!(response.status().as_u16(), 200, "setup failed");
    response.json().await.expect("setup response body")
}
