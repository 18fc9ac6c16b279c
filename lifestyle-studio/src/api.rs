//! Client for the service's own HTTP endpoints.

use lifestyle_studio_types::http::ErrorBody;
use lifestyle_studio_types::lifestyle::{
    GenerateLifestyleRequest, GenerateLifestyleResponse, GeneratedImage,
};
use lifestyle_studio_types::scene::{SceneSuggestion, SceneSuggestionsResponse};
use reqwest::multipart::{Form, Part};

use crate::client::normalize_base_url;
use crate::error::{Error, Result};
use crate::session::ImageFile;
use crate::vision::DEFAULT_IMAGE_MIME;

pub const SUGGESTIONS_FALLBACK_ERROR: &str = "Failed to generate scene suggestions";
pub const GENERATION_FALLBACK_ERROR: &str = "Failed to generate lifestyle shots";
/// 描述为空的建议显示的文本。
pub const UNKNOWN_SCENE: &str = "Unknown scene";

/// 访问 `/api/*` 的客户端。
#[derive(Clone)]
pub struct StudioApi {
    http: reqwest::Client,
    base_url: String,
}

impl StudioApi {
    pub fn new(http: reqwest::Client, base_url: impl AsRef<str>) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url.as_ref()),
        }
    }

    /// 上传图片获取场景建议，条目统一编号为 `ai-suggestion-{i}`。
    ///
    /// # Errors
    /// 服务端返回非 2xx 时，以其 `error` 字段作为消息返回 `Error::Upstream`。
    pub async fn scene_suggestions(&self, file: &ImageFile) -> Result<Vec<SceneSuggestion>> {
        let mime_type = if file.mime_type.is_empty() {
            DEFAULT_IMAGE_MIME
        } else {
            file.mime_type.as_str()
        };
        let part = Part::bytes(file.data.to_vec())
            .file_name(file.name.clone())
            .mime_str(mime_type)?;
        let form = Form::new().part("image", part);
        let response = self
            .http
            .post(format!("{}api/scene-suggestions", self.base_url))
            .multipart(form)
            .send()
            .await?;
        let response = check_response(response, SUGGESTIONS_FALLBACK_ERROR).await?;
        let body = response.json::<SceneSuggestionsResponse>().await?;
        Ok(body
            .suggestions
            .into_descriptions()
            .into_iter()
            .enumerate()
            .map(|(index, description)| {
                let description = if description.is_empty() {
                    UNKNOWN_SCENE.to_string()
                } else {
                    description
                };
                SceneSuggestion::new(format!("ai-suggestion-{index}"), description)
            })
            .collect())
    }

    /// 请求生成生活场景图。
    ///
    /// # Errors
    /// 服务端返回非 2xx 时，以其 `error` 字段作为消息返回 `Error::Upstream`。
    pub async fn generate_lifestyle(
        &self,
        request: &GenerateLifestyleRequest,
    ) -> Result<Vec<GeneratedImage>> {
        let response = self
            .http
            .post(format!("{}api/generate-lifestyle", self.base_url))
            .json(request)
            .send()
            .await?;
        let response = check_response(response, GENERATION_FALLBACK_ERROR).await?;
        let body = response.json::<GenerateLifestyleResponse>().await?;
        Ok(body.images)
    }
}

async fn check_response(response: reqwest::Response, fallback: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<ErrorBody>()
        .await
        .map(|body| body.error)
        .ok()
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_string());
    Err(Error::Upstream {
        status: status.as_u16(),
        message,
    })
}
