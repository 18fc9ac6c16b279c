//! 生活场景图生成的请求/响应结构。

use serde::{Deserialize, Serialize};

/// 默认输出尺寸（宽, 高）。
pub const DEFAULT_SHOT_SIZE: ShotSize = ShotSize {
    width: 900,
    height: 550,
};

/// 默认生成数量。
pub const DEFAULT_NUM_RESULTS: u32 = 1;

/// 输出尺寸，传输格式为 `[width, height]`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct ShotSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ShotSize {
    fn default() -> Self {
        DEFAULT_SHOT_SIZE
    }
}

impl From<[u32; 2]> for ShotSize {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

impl From<ShotSize> for [u32; 2] {
    fn from(size: ShotSize) -> Self {
        [size.width, size.height]
    }
}

/// `/api/generate-lifestyle` 请求体。
///
/// 必填字段也声明为 `Option`，以便服务端返回具体的 400 信息。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLifestyleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_size: Option<ShotSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_results: Option<u32>,
}

impl GenerateLifestyleRequest {
    pub fn new(image_url: impl Into<String>, scene_description: impl Into<String>) -> Self {
        Self {
            image_url: Some(image_url.into()),
            scene_description: Some(scene_description.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_num_results(mut self, num_results: u32) -> Self {
        self.num_results = Some(num_results);
        self
    }

    #[must_use]
    pub const fn with_shot_size(mut self, shot_size: ShotSize) -> Self {
        self.shot_size = Some(shot_size);
        self
    }
}

/// 单张生成结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
    pub id: String,
    pub filename: String,
}

/// `/api/generate-lifestyle` 成功响应。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateLifestyleResponse {
    pub images: Vec<GeneratedImage>,
}

/// 产品摆放方式，本服务固定为 automatic。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementType {
    Automatic,
}

/// 发往生成服务 `lifestyle_shot_by_text` 的请求体。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifestyleShotRequest {
    pub image_url: String,
    pub scene_description: String,
    pub placement_type: PlacementType,
    pub shot_size: ShotSize,
    pub num_results: u32,
    pub optimize_description: bool,
}

impl LifestyleShotRequest {
    /// 使用固定的 placement/optimize 参数构建请求。
    pub fn new(
        image_url: impl Into<String>,
        scene_description: impl Into<String>,
        shot_size: ShotSize,
        num_results: u32,
    ) -> Self {
        Self {
            image_url: image_url.into(),
            scene_description: scene_description.into(),
            placement_type: PlacementType::Automatic,
            shot_size,
            num_results,
            optimize_description: true,
        }
    }
}
