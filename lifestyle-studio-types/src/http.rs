//! 接口错误响应体。

use serde::{Deserialize, Serialize};

/// 接口统一的错误响应体 `{ "error": "..." }`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
