//! Lifestyle shot generation: request resolution, provider call and result decoding.

use lifestyle_studio_types::lifestyle::{
    GenerateLifestyleRequest, GeneratedImage, LifestyleShotRequest, DEFAULT_NUM_RESULTS,
};
use reqwest::header::HeaderName;
use serde_json::Value;

use crate::client::{ensure_success, normalize_base_url, sensitive_header};
use crate::config::Settings;
use crate::error::{Error, Result};

const LIFESTYLE_SHOT_PATH: &str = "v1/product/lifestyle_shot_by_text";

/// 生成服务客户端。
#[derive(Clone)]
pub struct LifestyleClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl LifestyleClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl AsRef<str>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url.as_ref()),
            api_token: api_token.into(),
        }
    }

    /// 使用服务配置创建客户端。
    ///
    /// # Errors
    /// 未配置 `BRIA_API_TOKEN` 时返回 `Error::Configuration`。
    pub fn from_settings(http: reqwest::Client, settings: &Settings) -> Result<Self> {
        let token = settings
            .bria_api_token
            .as_deref()
            .ok_or_else(|| Error::configuration("API token not configured"))?;
        Ok(Self::new(http, &settings.bria_base_url, token))
    }

    /// 调用 `lifestyle_shot_by_text` 并解码结果。
    ///
    /// # Errors
    /// 非 2xx 响应返回带原始状态码与响应体的 `Error::Upstream`；
    /// 结果结构不符合约定时返回 `Error::Parse`。
    pub async fn lifestyle_shot_by_text(
        &self,
        request: &LifestyleShotRequest,
    ) -> Result<Vec<GeneratedImage>> {
        let url = format!("{}{LIFESTYLE_SHOT_PATH}", self.base_url);
        tracing::info!(
            num_results = request.num_results,
            "requesting lifestyle shots from provider"
        );
        let response = self
            .http
            .post(url)
            .header(
                HeaderName::from_static("api_token"),
                sensitive_header(&self.api_token, "API token")?,
            )
            .json(request)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let value = response.json::<Value>().await?;
        decode_lifestyle_result_v1(&value)
    }
}

/// 校验并补全调用方请求。
///
/// # Errors
/// `imageUrl` 或 `sceneDescription` 缺失/为空时返回 `Error::Validation`。
pub fn resolve_request(request: GenerateLifestyleRequest) -> Result<LifestyleShotRequest> {
    let image_url = request
        .image_url
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::validation("No image URL provided"))?;
    let scene_description = request
        .scene_description
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::validation("No scene description provided"))?;
    Ok(LifestyleShotRequest::new(
        image_url,
        scene_description,
        request.shot_size.unwrap_or_default(),
        request.num_results.unwrap_or(DEFAULT_NUM_RESULTS),
    ))
}

/// 解码生成服务响应（v1 约定）：`result` 为 `[url, id, filename]` 元组数组。
///
/// 任一元组不合法则整体失败，不返回部分结果。
///
/// # Errors
/// 缺少 `result` 数组或元组结构不符时返回 `Error::Parse`。
pub fn decode_lifestyle_result_v1(value: &Value) -> Result<Vec<GeneratedImage>> {
    let entries = value
        .get("result")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Parse {
            message: "Provider response is missing the result array".into(),
        })?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| decode_tuple(index, entry))
        .collect()
}

fn decode_tuple(index: usize, entry: &Value) -> Result<GeneratedImage> {
    let items = entry.as_array().ok_or_else(|| Error::Parse {
        message: format!("Result entry {index} is not an array"),
    })?;
    if items.len() < 3 {
        return Err(Error::Parse {
            message: format!(
                "Result entry {index} has {} elements, expected [url, id, filename]",
                items.len()
            ),
        });
    }
    let url = items[0].as_str().ok_or_else(|| Error::Parse {
        message: format!("Result entry {index} has a non-string url"),
    })?;
    let id = match &items[1] {
        Value::String(id) => id.clone(),
        Value::Number(id) => id.to_string(),
        _ => {
            return Err(Error::Parse {
                message: format!("Result entry {index} has an invalid id"),
            })
        }
    };
    let filename = items[2].as_str().ok_or_else(|| Error::Parse {
        message: format!("Result entry {index} has a non-string filename"),
    })?;

    Ok(GeneratedImage {
        url: url.to_string(),
        id,
        filename: filename.to_string(),
    })
}
