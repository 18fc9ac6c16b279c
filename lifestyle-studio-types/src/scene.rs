//! 场景描述相关类型。

use serde::{Deserialize, Serialize};

/// 单条场景描述。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSuggestion {
    pub id: String,
    pub description: String,
}

impl SceneSuggestion {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

/// 内置场景描述（id, description）。
pub const BUILTIN_SCENES: [(&str, &str); 5] = [
    ("scene-1", "High end photography"),
    ("scene-2", "A pantry shelf alongside other food items"),
    ("scene-3", "A dining table setting as part of a meal"),
    ("scene-4", "A health food store display"),
    ("scene-5", "A cooking show set during a demonstration"),
];

/// 返回内置场景列表。
#[must_use]
pub fn builtin_scenes() -> Vec<SceneSuggestion> {
    BUILTIN_SCENES
        .iter()
        .map(|(id, description)| SceneSuggestion::new(*id, *description))
        .collect()
}

/// `/api/scene-suggestions` 的两种返回形态。
///
/// 模型输出为合法 JSON 数组时返回纯字符串列表；退化为按行解析时返回带 id 的条目。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SuggestionList {
    Descriptions(Vec<String>),
    Suggestions(Vec<SceneSuggestion>),
}

impl SuggestionList {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Descriptions(items) => items.len(),
            Self::Suggestions(items) => items.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按出现顺序取出描述文本。
    #[must_use]
    pub fn into_descriptions(self) -> Vec<String> {
        match self {
            Self::Descriptions(items) => items,
            Self::Suggestions(items) => items.into_iter().map(|item| item.description).collect(),
        }
    }
}

/// `/api/scene-suggestions` 响应体。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSuggestionsResponse {
    pub suggestions: SuggestionList,
}
