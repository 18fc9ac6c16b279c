//! Error definitions for the service and its clients.

use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// 调用方输入缺失或非法（HTTP 400）。
    #[error("{message}")]
    Validation { message: String },

    /// 服务端凭据或配置缺失（HTTP 500）。
    #[error("{message}")]
    Configuration { message: String },

    /// 第三方接口返回非成功状态。
    #[error("Upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    /// 对象存储写入失败。
    #[error("Upload failed: {message}")]
    Upload { message: String },

    #[error("HTTP client error: {source}")]
    HttpClient {
        #[from]
        source: reqwest::Error,
    },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// 对应的 HTTP 状态码。
    ///
    /// 上游状态码原样透传；无法识别的状态码与解析失败一律视为 502。
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Parse { .. } => StatusCode::BAD_GATEWAY,
            Self::Configuration { .. }
            | Self::Upload { .. }
            | Self::HttpClient { .. }
            | Self::Serialization { .. }
            | Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            Error::validation("missing").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::configuration("unset").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::Upstream {
                status: 429,
                message: "slow down".into()
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            Error::Parse {
                message: "bad tuple".into()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn invalid_upstream_status_maps_to_bad_gateway() {
        let err = Error::Upstream {
            status: 42,
            message: String::new(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn validation_message_is_displayed_verbatim() {
        assert_eq!(
            Error::validation("No image URL provided").to_string(),
            "No image URL provided"
        );
    }
}
