//! Scene suggestions from the multimodal model.

use lifestyle_studio_types::content::{
    Content, GenerateContentRequest, GenerateContentResponse, Part,
};
use lifestyle_studio_types::scene::{SceneSuggestion, SuggestionList};
use reqwest::header::HeaderName;
use serde_json::Value;

use crate::client::{ensure_success, normalize_base_url, sensitive_header};
use crate::config::Settings;
use crate::error::{Error, Result};

/// 固定的场景建议指令。
pub const SCENE_SUGGESTION_PROMPT: &str = "Generate 5 scene suggestions for product lifestyle shots for this product. Return ONLY a JSON array of strings with the scene descriptions. For example: [\"A kitchen counter with a blurred background\", \"A pantry shelf alongside other food items\"]";

/// 未声明类型时使用的图片 MIME。
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// 多模态模型客户端。
#[derive(Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
    model: String,
    api_key: String,
}

impl VisionClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl AsRef<str>,
        api_version: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url.as_ref()),
            api_version: api_version.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// 使用服务配置创建客户端。
    ///
    /// # Errors
    /// 未配置模型 API Key 时返回 `Error::Configuration`。
    pub fn from_settings(http: reqwest::Client, settings: &Settings) -> Result<Self> {
        let key = settings
            .gemini_api_key
            .as_deref()
            .ok_or_else(|| Error::configuration("Gemini API key not configured"))?;
        Ok(Self::new(
            http,
            &settings.gemini_base_url,
            settings.gemini_api_version.clone(),
            settings.gemini_model.clone(),
            key,
        ))
    }

    /// 生成内容，返回第一个候选的文本（无文本时为空串）。
    ///
    /// # Errors
    /// 请求失败或返回非 2xx 时返回错误。
    pub async fn generate_text(&self, contents: Vec<Content>) -> Result<String> {
        let url = format!(
            "{}{}/models/{}:generateContent",
            self.base_url, self.api_version, self.model
        );
        let body = GenerateContentRequest { contents };
        let response = self
            .http
            .post(url)
            .header(
                HeaderName::from_static("x-goog-api-key"),
                sensitive_header(&self.api_key, "API key")?,
            )
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let response = response.json::<GenerateContentResponse>().await?;
        Ok(response.text().unwrap_or_default())
    }

    /// 请求产品图片的场景建议。
    ///
    /// # Errors
    /// 上游请求失败时返回错误；模型输出格式异常不会导致失败。
    pub async fn suggest_scenes(&self, image: Vec<u8>, mime_type: &str) -> Result<SuggestionList> {
        tracing::info!(
            model = %self.model,
            bytes = image.len(),
            "requesting scene suggestions"
        );
        let contents = vec![Content::user_parts(vec![
            Part::text(SCENE_SUGGESTION_PROMPT),
            Part::inline_data(image, mime_type),
        ])];
        let text = self.generate_text(contents).await?;
        Ok(parse_suggestions(&text))
    }
}

/// 解析模型输出。
///
/// 优先按 JSON 数组严格解析（允许 Markdown 代码块包裹）；失败时按行退化解析。
#[must_use]
pub fn parse_suggestions(text: &str) -> SuggestionList {
    if let Some(descriptions) = parse_json_array(text.trim()) {
        return SuggestionList::Descriptions(descriptions);
    }
    if let Some(descriptions) = strip_code_fence(text).and_then(parse_json_array) {
        return SuggestionList::Descriptions(descriptions);
    }
    SuggestionList::Suggestions(parse_lines(text))
}

fn parse_json_array(text: &str) -> Option<Vec<String>> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) else {
        return None;
    };
    Some(items.into_iter().map(describe_value).collect())
}

fn describe_value(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Object(ref map) => match map.get("description") {
            Some(Value::String(description)) => description.clone(),
            _ => value.to_string(),
        },
        other => other.to_string(),
    }
}

fn strip_code_fence(text: &str) -> Option<&str> {
    let body = text.trim().strip_prefix("```")?.strip_suffix("```")?;
    // 去掉语言标记所在的首行，例如 ```json
    let (_, rest) = body.split_once('\n')?;
    Some(rest.trim())
}

fn parse_lines(text: &str) -> Vec<SceneSuggestion> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(index, line)| {
            SceneSuggestion::new(format!("suggestion-{index}"), strip_decorations(line))
        })
        .collect()
}

fn strip_decorations(line: &str) -> &str {
    line.trim_matches(|c: char| c == '"' || c == '\'' || c == '-' || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_settings;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    #[test]
    fn test_parse_json_array_keeps_length_and_order() {
        let list = parse_suggestions(r#"["Kitchen counter", "Picnic blanket", "Office desk"]"#);
        assert_eq!(
            list,
            SuggestionList::Descriptions(vec![
                "Kitchen counter".into(),
                "Picnic blanket".into(),
                "Office desk".into(),
            ])
        );
    }

    #[test]
    fn test_parse_json_array_inside_code_fence() {
        let list = parse_suggestions("```json\n[\"A\", \"B\"]\n```");
        assert_eq!(
            list,
            SuggestionList::Descriptions(vec!["A".into(), "B".into()])
        );
    }

    #[test]
    fn test_parse_json_array_with_non_string_elements() {
        let list = parse_suggestions(r#"[{"description": "Beach"}, 7, {"name": "x"}]"#);
        assert_eq!(
            list.into_descriptions(),
            vec![
                "Beach".to_string(),
                "7".to_string(),
                r#"{"name":"x"}"#.to_string()
            ]
        );
    }

    #[test]
    fn test_parse_lines_strips_quotes_and_dashes() {
        let text = "- \"A rustic kitchen\"\n\n  'A sunny patio' -\n--A gym bag--\n   \n";
        let list = parse_suggestions(text);
        assert_eq!(
            list,
            SuggestionList::Suggestions(vec![
                SceneSuggestion::new("suggestion-0", "A rustic kitchen"),
                SceneSuggestion::new("suggestion-1", "A sunny patio"),
                SceneSuggestion::new("suggestion-2", "A gym bag"),
            ])
        );
    }

    #[test]
    fn test_parse_lines_keeps_inner_punctuation() {
        let list = parse_suggestions("A well-lit, modern loft's shelf");
        assert_eq!(
            list.into_descriptions(),
            vec!["A well-lit, modern loft's shelf".to_string()]
        );
    }

    #[test]
    fn test_non_array_json_falls_back_to_lines() {
        let list = parse_suggestions(r#"{"scenes": ["a"]}"#);
        assert!(matches!(list, SuggestionList::Suggestions(ref items) if items.len() == 1));
    }

    #[test]
    fn test_mixed_prose_and_fragments_do_not_fail() {
        let list = parse_suggestions("Here you go:\n[\"A\",\n\"B\"]\nEnjoy!");
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_empty_text_yields_empty_list() {
        assert!(parse_suggestions("").is_empty());
        assert!(parse_suggestions("  \n \n").is_empty());
    }

    #[test]
    fn test_from_settings_requires_key() {
        let err = VisionClient::from_settings(reqwest::Client::new(), &Settings::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_suggest_scenes_sends_prompt_and_inline_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(|req: &Request| {
                let body: Value = serde_json::from_slice(&req.body).unwrap();
                let parts = &body["contents"][0]["parts"];
                assert_eq!(parts[0]["text"], SCENE_SUGGESTION_PROMPT);
                assert_eq!(parts[1]["inlineData"]["mimeType"], "image/webp");
                assert_eq!(parts[1]["inlineData"]["data"], "AQI=");
                ResponseTemplate::new(200).set_body_json(json!({
                    "candidates": [{
                        "content": {"role": "model", "parts": [{"text": "[\"A\", \"B\"]"}]}
                    }]
                }))
            })
            .expect(1)
            .mount(&server)
            .await;

        let client =
            VisionClient::from_settings(reqwest::Client::new(), &test_settings(&server.uri()))
                .unwrap();
        let list = client.suggest_scenes(vec![1, 2], "image/webp").await.unwrap();
        assert_eq!(list.into_descriptions(), vec!["A".to_string(), "B".to_string()]);
    }

    #[tokio::test]
    async fn test_suggest_scenes_joins_split_text_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [
                        {"text": "[\"A sunlit cafe\", "},
                        {"text": "\"A rainy window\"]"}
                    ]}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            VisionClient::from_settings(reqwest::Client::new(), &test_settings(&server.uri()))
                .unwrap();
        let list = client.suggest_scenes(vec![1], DEFAULT_IMAGE_MIME).await.unwrap();
        assert_eq!(
            list,
            SuggestionList::Descriptions(vec!["A sunlit cafe".into(), "A rainy window".into()])
        );
    }

    #[tokio::test]
    async fn test_suggest_scenes_propagates_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let client =
            VisionClient::from_settings(reqwest::Client::new(), &test_settings(&server.uri()))
                .unwrap();
        let err = client
            .suggest_scenes(vec![1], DEFAULT_IMAGE_MIME)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream { status: 403, .. }));
    }
}
