//! Object storage uploads (Supabase Storage REST API).

use std::path::Path;

use reqwest::header::{HeaderName, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};

use crate::client::{normalize_base_url, sensitive_header};
use crate::config::StorageSettings;
use crate::error::{Error, Result};
use crate::session::ImageFile;

const CACHE_CONTROL_VALUE: &str = "max-age=3600";

/// 对象存储客户端。
#[derive(Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

impl StorageClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl AsRef<str>,
        api_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url.as_ref()),
            api_key: api_key.into(),
            bucket: bucket.into(),
        }
    }

    /// 使用存储配置创建客户端。
    ///
    /// # Errors
    /// 缺少存储地址或密钥时返回 `Error::Configuration`。
    pub fn from_settings(http: reqwest::Client, settings: &StorageSettings) -> Result<Self> {
        let url = settings
            .url
            .as_deref()
            .ok_or_else(|| Error::configuration("SUPABASE_URL not configured"))?;
        let key = settings
            .key
            .as_deref()
            .ok_or_else(|| Error::configuration("SUPABASE_KEY not configured"))?;
        Ok(Self::new(http, url, key, settings.bucket.clone()))
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// 对象的公开访问地址。
    #[must_use]
    pub fn public_url(&self, object_path: &str) -> String {
        format!(
            "{}storage/v1/object/public/{}/{object_path}",
            self.base_url, self.bucket
        )
    }

    /// 以随机文件名上传图片，返回公开 URL。
    ///
    /// 不覆盖已有对象，不重试。
    ///
    /// # Errors
    /// 网络失败或非 2xx 响应以 `Error::Upload` 返回；密钥非法时返回 `Error::Configuration`。
    pub async fn upload(&self, file: &ImageFile) -> Result<String> {
        let object_path = random_object_name(&file.name);
        let url = format!(
            "{}storage/v1/object/{}/{object_path}",
            self.base_url, self.bucket
        );
        let content_type = if file.mime_type.is_empty() {
            mime_guess::from_path(&file.name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        } else {
            file.mime_type.clone()
        };

        let bearer = sensitive_header(&format!("Bearer {}", self.api_key), "storage key")?;
        let apikey = sensitive_header(&self.api_key, "storage key")?;
        let result = self
            .http
            .post(url)
            .header(AUTHORIZATION, bearer)
            .header(HeaderName::from_static("apikey"), apikey)
            .header(HeaderName::from_static("x-upsert"), "false")
            .header(CACHE_CONTROL, CACHE_CONTROL_VALUE)
            .header(CONTENT_TYPE, content_type)
            .body(file.data.clone())
            .send()
            .await;

        let response = result.map_err(|err| Error::Upload {
            message: err.to_string(),
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, bucket = %self.bucket, "storage upload rejected");
            return Err(Error::Upload {
                message: format!("status {}: {body}", status.as_u16()),
            });
        }

        tracing::info!(bucket = %self.bucket, object = %object_path, "image uploaded");
        Ok(self.public_url(&object_path))
    }
}

/// 生成保留原扩展名的随机对象名。
#[must_use]
pub fn random_object_name(original: &str) -> String {
    let id = uuid::Uuid::new_v4();
    match Path::new(original)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
    {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}
