//! Runtime configuration read from the environment.

use std::net::SocketAddr;

use crate::client::HttpOptions;
use crate::error::{Error, Result};

pub const DEFAULT_BRIA_BASE_URL: &str = "https://engine.prod.bria-api.com/";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
pub const DEFAULT_GEMINI_API_VERSION: &str = "v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_STORAGE_BUCKET: &str = "scene-images";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// 服务配置。
///
/// 凭据缺失不会阻止启动，而是在请求时以 `Error::Configuration` 返回。
#[derive(Debug, Clone)]
pub struct Settings {
    /// 生成服务令牌（`BRIA_API_TOKEN`）。
    pub bria_api_token: Option<String>,
    pub bria_base_url: String,
    /// 多模态模型 API Key（`GEMINI_API_KEY` / `GOOGLE_API_KEY`）。
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_api_version: String,
    pub gemini_model: String,
    pub storage: StorageSettings,
    pub listen_addr: SocketAddr,
    pub http_options: HttpOptions,
}

/// 对象存储配置（客户端上传使用）。
#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub url: Option<String>,
    pub key: Option<String>,
    pub bucket: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            url: None,
            key: None,
            bucket: DEFAULT_STORAGE_BUCKET.to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bria_api_token: None,
            bria_base_url: DEFAULT_BRIA_BASE_URL.to_string(),
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_api_version: DEFAULT_GEMINI_API_VERSION.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            storage: StorageSettings::default(),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            http_options: HttpOptions::default(),
        }
    }
}

impl Settings {
    /// 从环境变量读取配置，空白值视为未设置。
    ///
    /// # Errors
    /// 当 `LISTEN_ADDR` 或 `HTTP_TIMEOUT_SECS` 无法解析时返回错误。
    pub fn from_env() -> Result<Self> {
        let mut settings = Self {
            bria_api_token: env_value("BRIA_API_TOKEN"),
            gemini_api_key: env_value("GEMINI_API_KEY").or_else(|| env_value("GOOGLE_API_KEY")),
            ..Self::default()
        };

        if let Some(base_url) = env_value("BRIA_BASE_URL") {
            settings.bria_base_url = base_url;
        }
        if let Some(base_url) = env_value("GENAI_BASE_URL").or_else(|| env_value("GEMINI_BASE_URL"))
        {
            settings.gemini_base_url = base_url;
        }
        if let Some(api_version) = env_value("GENAI_API_VERSION") {
            settings.gemini_api_version = api_version;
        }
        if let Some(model) = env_value("GEMINI_MODEL") {
            settings.gemini_model = model;
        }

        settings.storage.url = env_value("SUPABASE_URL");
        settings.storage.key = env_value("SUPABASE_KEY");
        if let Some(bucket) = env_value("STORAGE_BUCKET") {
            settings.storage.bucket = bucket;
        }

        let listen_addr = env_value("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.into());
        settings.listen_addr = listen_addr.parse().map_err(|_| Error::Configuration {
            message: format!("Invalid LISTEN_ADDR: {listen_addr}"),
        })?;

        if let Some(timeout) = env_value("HTTP_TIMEOUT_SECS") {
            let secs = timeout.parse::<u64>().map_err(|_| Error::Configuration {
                message: format!("Invalid HTTP_TIMEOUT_SECS: {timeout}"),
            })?;
            settings.http_options.timeout = Some(secs);
        }

        Ok(settings)
    }

    /// 设置生成服务令牌。
    #[must_use]
    pub fn bria_api_token(mut self, token: impl Into<String>) -> Self {
        self.bria_api_token = Some(token.into());
        self
    }

    /// 设置生成服务基础 URL。
    #[must_use]
    pub fn bria_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.bria_base_url = base_url.into();
        self
    }

    /// 设置模型 API Key。
    #[must_use]
    pub fn gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(key.into());
        self
    }

    /// 设置模型基础 URL。
    #[must_use]
    pub fn gemini_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.gemini_base_url = base_url.into();
        self
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
