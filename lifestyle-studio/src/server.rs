//! HTTP endpoints: `/api/generate-lifestyle` and `/api/scene-suggestions`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use lifestyle_studio_types::http::ErrorBody;
use lifestyle_studio_types::lifestyle::{GenerateLifestyleRequest, GenerateLifestyleResponse};
use lifestyle_studio_types::scene::SceneSuggestionsResponse;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::client::build_http_client;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::lifestyle::{resolve_request, LifestyleClient};
use crate::vision::{VisionClient, DEFAULT_IMAGE_MIME};

/// 上传图片的请求体上限。
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// 服务共享状态（只读）。
#[derive(Clone)]
pub struct ServerState {
    settings: Arc<Settings>,
    http: reqwest::Client,
}

impl ServerState {
    /// # Errors
    /// 当 HTTP 客户端配置无效时返回错误。
    pub fn new(settings: Settings) -> Result<Self> {
        let http = build_http_client(&settings.http_options)?;
        Ok(Self {
            settings: Arc::new(settings),
            http,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// 接口错误：状态码 + `{error}` 响应体。
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 把内部错误转为面向用户的消息。
    ///
    /// 校验与配置错误原样返回；上游错误保留状态码；其余统一为 `fallback`。
    fn from_error(err: Error, upstream_prefix: Option<&str>, fallback: &str) -> Self {
        let status = err.status_code();
        match err {
            Error::Validation { message } | Error::Configuration { message } => {
                Self::new(status, message)
            }
            Error::Upstream { message, .. } => match upstream_prefix {
                Some(prefix) => Self::new(status, format!("{prefix}{message}")),
                None => Self::new(status, fallback),
            },
            other => {
                tracing::error!(error = %other, "request failed");
                Self::new(status, fallback)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}

/// 构建路由。
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/generate-lifestyle", post(generate_lifestyle))
        .route("/api/scene-suggestions", post(scene_suggestions))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// 启动服务直到监听失败。
///
/// # Errors
/// 绑定地址或服务运行失败时返回错误。
pub async fn serve(state: ServerState) -> Result<()> {
    let addr = state.settings.listen_addr;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("lifestyle studio listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "healthy": true }))
}

async fn generate_lifestyle(
    State(state): State<ServerState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<Json<GenerateLifestyleResponse>, ApiError> {
    const FALLBACK: &str = "Failed to generate lifestyle shots";
    let body = body.map_err(|rejection| {
        tracing::warn!(error = %rejection, "rejecting unreadable generate request");
        ApiError::new(rejection.status(), rejection.body_text())
    })?;
    let request: GenerateLifestyleRequest = serde_json::from_slice(&body).map_err(|err| {
        tracing::warn!(error = %err, "rejecting malformed generate request");
        ApiError::new(StatusCode::BAD_REQUEST, "Invalid JSON body")
    })?;

    let to_api = |err| ApiError::from_error(err, Some("API request failed: "), FALLBACK);
    let request = resolve_request(request).map_err(to_api)?;
    let client = LifestyleClient::from_settings(state.http.clone(), &state.settings).map_err(to_api)?;
    let images = client.lifestyle_shot_by_text(&request).await.map_err(|err| {
        tracing::warn!(error = %err, "lifestyle generation failed");
        to_api(err)
    })?;

    tracing::info!(count = images.len(), "lifestyle shots generated");
    Ok(Json(GenerateLifestyleResponse { images }))
}

async fn scene_suggestions(
    State(state): State<ServerState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Json<SceneSuggestionsResponse>, ApiError> {
    const FALLBACK: &str = "Failed to generate scene suggestions";
    let mut multipart = multipart.map_err(|rejection| {
        tracing::warn!(error = %rejection, "rejecting non-multipart suggestion request");
        ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Expected multipart/form-data: {}", rejection.body_text()),
        )
    })?;
    let mut image: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| {
            ApiError::new(err.status(), format!("Multipart error: {}", err.body_text()))
        })?
    {
        if field.name() != Some("image") {
            continue;
        }
        let mime_type = field
            .content_type()
            .map_or_else(|| DEFAULT_IMAGE_MIME.to_string(), ToString::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|err| {
                ApiError::new(err.status(), format!("Read error: {}", err.body_text()))
            })?;
        image = Some((data.to_vec(), mime_type));
    }

    let to_api = |err| ApiError::from_error(err, None, FALLBACK);
    let (data, mime_type) = image
        .filter(|(data, _)| !data.is_empty())
        .ok_or_else(|| to_api(Error::validation("No image provided")))?;
    let client = VisionClient::from_settings(state.http.clone(), &state.settings).map_err(to_api)?;
    let suggestions = client
        .suggest_scenes(data, &mime_type)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "scene suggestion request failed");
            to_api(err)
        })?;

    tracing::info!(count = suggestions.len(), "scene suggestions generated");
    Ok(Json(SceneSuggestionsResponse { suggestions }))
}
