#![allow(dead_code)]

use std::net::SocketAddr;

use lifestyle_studio::{router, ServerState, Settings};

/// 指向 mock 上游的配置。
pub fn upstream_settings(upstream: &str) -> Settings {
    Settings::default()
        .bria_api_token("test-token")
        .bria_base_url(upstream)
        .gemini_api_key("test-key")
        .gemini_base_url(upstream)
}

/// 在随机端口启动服务，返回基础 URL。
pub async fn spawn_server(settings: Settings) -> String {
    let state = ServerState::new(settings).unwrap();
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{addr}")
}
