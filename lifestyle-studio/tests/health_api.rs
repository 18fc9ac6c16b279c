use serde_json::{json, Value};

use lifestyle_studio::Settings;

mod support;
use support::spawn_server;

#[tokio::test]
async fn health_reports_healthy_without_credentials() {
    let base = spawn_server(Settings::default()).await;
    let response = reqwest::get(format!("{base}/health")).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({"healthy": true})
    );
}
