//! View models for the dropzone, scene picker and results gallery.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::ensure_success;
use crate::error::{Error, Result};
use crate::session::{AppState, MAX_FILES};

/// 结果卡片依次显示的间隔（纯视觉效果）。
pub const REVEAL_STAGGER: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub id: String,
    pub url: String,
    pub uploading: bool,
}

/// 上传区域。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropzoneView {
    pub prompt: &'static str,
    pub counter: String,
    pub disabled: bool,
    pub thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneCard {
    pub id: String,
    pub description: String,
    pub selected: bool,
}

/// 场景选择区域。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenePickerView {
    pub button_label: &'static str,
    pub button_disabled: bool,
    pub cards: Vec<SceneCard>,
}

/// 生成按钮，未满足条件时不显示（`None`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateButtonView {
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCard {
    pub url: String,
    pub alt: String,
    pub download_filename: String,
    pub reveal_after: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSection {
    pub heading: String,
    pub cards: Vec<ImageCard>,
}

/// 结果区域。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryView {
    Loading {
        title: &'static str,
        subtitle: &'static str,
    },
    Empty,
    Results(Vec<ResultSection>),
}

#[must_use]
pub fn dropzone(state: &AppState) -> DropzoneView {
    let prompt = if state.is_drag_active() {
        "Drop the files here"
    } else {
        "Drag & drop product images here"
    };
    let mut thumbnails: Vec<Thumbnail> = state
        .uploaded()
        .iter()
        .map(|image| Thumbnail {
            id: image.id.clone(),
            url: image.url.clone(),
            uploading: false,
        })
        .collect();
    thumbnails.extend(state.pending_uploads().iter().map(|pending| Thumbnail {
        id: pending.id.clone(),
        url: pending.preview_url.clone(),
        uploading: true,
    }));

    DropzoneView {
        prompt,
        counter: format!("{} / {MAX_FILES} images", state.file_count()),
        disabled: state.file_count() >= MAX_FILES,
        thumbnails,
    }
}

#[must_use]
pub fn scene_picker(state: &AppState) -> ScenePickerView {
    let selected_id = state.selected_scene().map(|scene| scene.id.as_str());
    ScenePickerView {
        button_label: if state.is_suggesting() {
            "Generating..."
        } else {
            "Generate AI Suggestions"
        },
        button_disabled: state.is_suggesting() || state.selected_product().is_none(),
        cards: state
            .suggestions()
            .iter()
            .map(|scene| SceneCard {
                id: scene.id.clone(),
                description: scene.description.clone(),
                selected: selected_id == Some(scene.id.as_str()),
            })
            .collect(),
    }
}

#[must_use]
pub fn generate_button(state: &AppState) -> Option<GenerateButtonView> {
    if state.uploaded().is_empty() || state.selected_scene().is_none() {
        return None;
    }
    Some(GenerateButtonView {
        disabled: state.is_generating(),
    })
}

#[must_use]
pub fn gallery(state: &AppState) -> GalleryView {
    if state.is_generating() {
        return GalleryView::Loading {
            title: "Generating lifestyle shots...",
            subtitle: "This may take a minute",
        };
    }
    if state.results().is_empty() {
        return GalleryView::Empty;
    }
    GalleryView::Results(
        state
            .results()
            .iter()
            .map(|result| ResultSection {
                heading: format!("Scene: {}", result.scene_description),
                cards: result
                    .images
                    .iter()
                    .zip(0u32..)
                    .map(|(image, index)| ImageCard {
                        url: image.url.clone(),
                        alt: format!("Generated lifestyle shot {}", image.id),
                        download_filename: image.filename.clone(),
                        reveal_after: REVEAL_STAGGER * index,
                    })
                    .collect(),
            })
            .collect(),
    )
}

/// 下载生成的图片到 `dir`，返回写入路径。
///
/// # Errors
/// 请求失败、非 2xx 或写文件失败时返回错误；调用方只记录日志。
pub async fn download_image(
    http: &reqwest::Client,
    url: &str,
    dir: &Path,
    filename: &str,
) -> Result<PathBuf> {
    let name = Path::new(filename)
        .file_name()
        .ok_or_else(|| Error::validation(format!("Invalid download filename: {filename}")))?;
    let response = ensure_success(http.get(url).send().await?).await?;
    let bytes = response.bytes().await?;
    let target = dir.join(name);
    tokio::fs::write(&target, &bytes).await?;
    tracing::info!(path = %target.display(), "image downloaded");
    Ok(target)
}
