//! Shared HTTP transport for the upstream clients.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client as HttpClient, Proxy};

use crate::error::{Error, Result};

/// HTTP 配置。
#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    /// 请求超时（秒），未设置时使用传输层默认值。
    pub timeout: Option<u64>,
    pub proxy: Option<String>,
    pub headers: HashMap<String, String>,
}

impl HttpOptions {
    /// 设置请求超时（秒）。
    #[must_use]
    pub const fn timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(secs);
        self
    }

    /// 设置代理。
    #[must_use]
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.proxy = Some(url.into());
        self
    }

    /// 增加默认 HTTP 头。
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// 按配置构建共享的 `reqwest::Client`。
///
/// # Errors
/// 当头部、代理无效或构建 HTTP 客户端失败时返回错误。
pub fn build_http_client(options: &HttpOptions) -> Result<HttpClient> {
    let mut http_builder = HttpClient::builder();
    if let Some(timeout) = options.timeout {
        http_builder = http_builder.timeout(Duration::from_secs(timeout));
    }

    if let Some(proxy_url) = &options.proxy {
        let proxy = Proxy::all(proxy_url).map_err(|e| Error::Configuration {
            message: format!("Invalid proxy: {e}"),
        })?;
        http_builder = http_builder.proxy(proxy);
    }

    let headers = build_headers(&options.headers)?;
    if !headers.is_empty() {
        http_builder = http_builder.default_headers(headers);
    }

    Ok(http_builder.build()?)
}

fn build_headers(extra: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (key, value) in extra {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| Error::Configuration {
            message: format!("Invalid header name: {key}"),
        })?;
        let value = HeaderValue::from_str(value).map_err(|_| Error::Configuration {
            message: format!("Invalid header value for {key}"),
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// 构建敏感头（凭据），避免在调试输出中泄露。
pub(crate) fn sensitive_header(value: &str, what: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value).map_err(|_| Error::Configuration {
        message: format!("Invalid {what} value"),
    })?;
    header.set_sensitive(true);
    Ok(header)
}

/// 非 2xx 响应转换为 `Error::Upstream`，原样保留状态码与响应体。
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(Error::Upstream {
        status: status.as_u16(),
        message: response.text().await.unwrap_or_default(),
    })
}

pub(crate) fn normalize_base_url(base_url: &str) -> String {
    let mut value = base_url.trim().to_string();
    if !value.ends_with('/') {
        value.push('/');
    }
    value
}
