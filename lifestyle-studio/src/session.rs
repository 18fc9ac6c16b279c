//! Client session state and its reducer.
//!
//! All orchestration lives in [`AppState::reduce`]: user actions and network
//! completions go in, [`Effect`]s for the driver come out. No I/O happens here.

use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use lifestyle_studio_types::lifestyle::{GenerateLifestyleRequest, GeneratedImage};
use lifestyle_studio_types::scene::{builtin_scenes, SceneSuggestion};

/// 最多可上传的图片数量。
pub const MAX_FILES: usize = 10;

/// 可接受的图片扩展名。
pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "webp"];

/// 默认生成数量。
pub const DEFAULT_IMAGE_COUNT: u32 = 4;

/// 单次生成数量上限。
pub const MAX_IMAGE_COUNT: u32 = 4;

pub const MSG_UPLOAD_REQUIRED: &str = "Please upload at least one product image";
pub const MSG_SCENE_REQUIRED: &str = "Please select a scene description";

/// 用户选择的图片文件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// 小写扩展名。
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.extension()
            .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
    }
}

/// 已上传到对象存储的产品图。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub id: String,
    pub url: String,
    pub file: ImageFile,
}

/// 上传中的图片，`preview_url` 为本地引用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub id: String,
    pub preview_url: String,
    pub file: ImageFile,
}

/// 一次成功生成的结果，创建后不再修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub product_image: UploadedImage,
    pub images: Vec<GeneratedImage>,
    pub scene_description: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationVariant {
    Default,
    Destructive,
}

/// 提示消息（toast）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NotificationVariant::Destructive,
        }
    }
}

/// 会话所处阶段，由状态字段推导。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Uploading,
    ReadyToSuggest,
    Suggesting,
    ReadyToGenerate,
    Generating,
    HasResults,
}

/// 用户操作与网络完成事件。
#[derive(Debug, Clone)]
pub enum Action {
    DragStateChanged(bool),
    FilesDropped {
        files: Vec<ImageFile>,
        at: DateTime<Utc>,
    },
    UploadSucceeded {
        upload_id: String,
        url: String,
    },
    UploadFailed {
        upload_id: String,
        message: String,
    },
    ImageRemoved {
        id: String,
    },
    ProductSelected {
        id: String,
    },
    SceneSelected(SceneSuggestion),
    ImageCountChanged(u32),
    SuggestionsRequested,
    SuggestionsLoaded(Vec<SceneSuggestion>),
    SuggestionsFailed {
        message: String,
    },
    GenerateRequested,
    GenerationSucceeded {
        images: Vec<GeneratedImage>,
        at: DateTime<Utc>,
    },
    GenerationFailed {
        message: String,
    },
    NotificationsCleared,
}

impl Action {
    /// 以当前时间构造拖放事件。
    #[must_use]
    pub fn files_dropped(files: Vec<ImageFile>) -> Self {
        Self::FilesDropped {
            files,
            at: Utc::now(),
        }
    }
}

/// 需要驱动层执行的副作用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Upload { upload_id: String, file: ImageFile },
    FetchSuggestions { file: ImageFile },
    Generate { request: GenerateLifestyleRequest },
}

#[derive(Debug, Clone)]
struct PendingGeneration {
    product: UploadedImage,
    scene_description: String,
}

/// 会话状态。
#[derive(Debug, Clone)]
pub struct AppState {
    uploaded: Vec<UploadedImage>,
    pending_uploads: Vec<PendingUpload>,
    selected_product: Option<String>,
    suggestions: Vec<SceneSuggestion>,
    selected_scene: Option<SceneSuggestion>,
    image_count: u32,
    suggesting: bool,
    generation: Option<PendingGeneration>,
    results: Vec<GenerationResult>,
    notifications: Vec<Notification>,
    drag_active: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            uploaded: Vec::new(),
            pending_uploads: Vec::new(),
            selected_product: None,
            suggestions: builtin_scenes(),
            selected_scene: None,
            image_count: DEFAULT_IMAGE_COUNT,
            suggesting: false,
            generation: None,
            results: Vec::new(),
            notifications: Vec::new(),
            drag_active: false,
        }
    }
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn uploaded(&self) -> &[UploadedImage] {
        &self.uploaded
    }

    #[must_use]
    pub fn pending_uploads(&self) -> &[PendingUpload] {
        &self.pending_uploads
    }

    #[must_use]
    pub fn selected_product(&self) -> Option<&UploadedImage> {
        let id = self.selected_product.as_deref()?;
        self.uploaded.iter().find(|image| image.id == id)
    }

    #[must_use]
    pub fn suggestions(&self) -> &[SceneSuggestion] {
        &self.suggestions
    }

    #[must_use]
    pub const fn selected_scene(&self) -> Option<&SceneSuggestion> {
        self.selected_scene.as_ref()
    }

    #[must_use]
    pub const fn image_count(&self) -> u32 {
        self.image_count
    }

    #[must_use]
    pub const fn is_suggesting(&self) -> bool {
        self.suggesting
    }

    #[must_use]
    pub const fn is_generating(&self) -> bool {
        self.generation.is_some()
    }

    /// 结果列表，最新的在前。
    #[must_use]
    pub fn results(&self) -> &[GenerationResult] {
        &self.results
    }

    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    #[must_use]
    pub const fn is_drag_active(&self) -> bool {
        self.drag_active
    }

    /// 已上传与上传中的图片总数。
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.uploaded.len() + self.pending_uploads.len()
    }

    #[must_use]
    pub fn can_generate(&self) -> bool {
        self.selected_product().is_some() && self.selected_scene.is_some() && !self.is_generating()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.is_generating() {
            Phase::Generating
        } else if self.suggesting {
            Phase::Suggesting
        } else if !self.pending_uploads.is_empty() {
            Phase::Uploading
        } else if !self.results.is_empty() {
            Phase::HasResults
        } else if self.selected_product().is_some() && self.selected_scene.is_some() {
            Phase::ReadyToGenerate
        } else if self.selected_product().is_some() {
            Phase::ReadyToSuggest
        } else {
            Phase::Idle
        }
    }

    /// 应用一个事件，返回需要执行的副作用。
    pub fn reduce(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::DragStateChanged(active) => {
                self.drag_active = active;
                Vec::new()
            }
            Action::FilesDropped { files, at } => {
                self.drag_active = false;
                self.accept_files(files, at)
            }
            Action::UploadSucceeded { upload_id, url } => {
                self.finish_upload(&upload_id, url);
                Vec::new()
            }
            Action::UploadFailed { upload_id, message } => {
                tracing::warn!(%upload_id, %message, "upload failed");
                self.pending_uploads.retain(|pending| pending.id != upload_id);
                self.notifications.push(Notification::error(
                    "Upload failed",
                    "There was an error uploading your image.",
                ));
                Vec::new()
            }
            Action::ImageRemoved { id } => {
                self.remove_image(&id);
                Vec::new()
            }
            Action::ProductSelected { id } => {
                if self.uploaded.iter().any(|image| image.id == id) {
                    self.selected_product = Some(id);
                }
                Vec::new()
            }
            Action::SceneSelected(scene) => {
                self.selected_scene = Some(scene);
                Vec::new()
            }
            Action::ImageCountChanged(count) => {
                self.image_count = count.clamp(1, MAX_IMAGE_COUNT);
                Vec::new()
            }
            Action::SuggestionsRequested => self.request_suggestions(),
            Action::SuggestionsLoaded(suggestions) => {
                self.suggesting = false;
                self.suggestions = suggestions;
                Vec::new()
            }
            Action::SuggestionsFailed { message } => {
                self.suggesting = false;
                self.notifications.push(Notification::error("Error", message));
                Vec::new()
            }
            Action::GenerateRequested => self.request_generation(),
            Action::GenerationSucceeded { images, at } => {
                if let Some(pending) = self.generation.take() {
                    self.results.insert(
                        0,
                        GenerationResult {
                            product_image: pending.product,
                            images,
                            scene_description: pending.scene_description,
                            timestamp: at,
                        },
                    );
                }
                Vec::new()
            }
            Action::GenerationFailed { message } => {
                self.generation = None;
                self.notifications.push(Notification::error("Error", message));
                Vec::new()
            }
            Action::NotificationsCleared => {
                self.notifications.clear();
                Vec::new()
            }
        }
    }

    fn accept_files(&mut self, files: Vec<ImageFile>, at: DateTime<Utc>) -> Vec<Effect> {
        let (accepted, rejected): (Vec<_>, Vec<_>) =
            files.into_iter().partition(ImageFile::is_accepted);
        if !rejected.is_empty() {
            self.notifications.push(Notification::error(
                "Unsupported file type",
                "Only .jpeg, .jpg, .png and .webp images are accepted.",
            ));
        }

        let capacity = MAX_FILES.saturating_sub(self.file_count());
        if accepted.len() > capacity {
            self.notifications.push(Notification::error(
                "Upload limit reached",
                format!("At most {MAX_FILES} images can be uploaded."),
            ));
        }

        let millis = at.timestamp_millis();
        let mut effects = Vec::new();
        for file in accepted.into_iter().take(capacity) {
            let upload_id = self.unique_id(&format!("{}-{millis}", file.name));
            self.pending_uploads.push(PendingUpload {
                id: upload_id.clone(),
                preview_url: format!("blob:{upload_id}"),
                file: file.clone(),
            });
            effects.push(Effect::Upload { upload_id, file });
        }
        effects
    }

    fn unique_id(&self, base: &str) -> String {
        let taken = |candidate: &str| {
            self.uploaded.iter().any(|image| image.id == candidate)
                || self
                    .pending_uploads
                    .iter()
                    .any(|pending| pending.id == candidate)
        };
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    fn finish_upload(&mut self, upload_id: &str, url: String) {
        let Some(index) = self
            .pending_uploads
            .iter()
            .position(|pending| pending.id == upload_id)
        else {
            return;
        };
        let pending = self.pending_uploads.remove(index);
        self.uploaded.push(UploadedImage {
            id: pending.id.clone(),
            url,
            file: pending.file,
        });
        if self.selected_product.is_none() {
            self.selected_product = Some(pending.id);
        }
    }

    fn remove_image(&mut self, id: &str) {
        self.uploaded.retain(|image| image.id != id);
        if self.selected_product.as_deref() == Some(id) {
            self.selected_product = self.uploaded.first().map(|image| image.id.clone());
        }
    }

    fn request_suggestions(&mut self) -> Vec<Effect> {
        if self.suggesting {
            return Vec::new();
        }
        let Some(product) = self.selected_product() else {
            self.notifications
                .push(Notification::error("Error", MSG_UPLOAD_REQUIRED));
            return Vec::new();
        };
        let file = product.file.clone();
        self.suggesting = true;
        vec![Effect::FetchSuggestions { file }]
    }

    fn request_generation(&mut self) -> Vec<Effect> {
        if self.is_generating() {
            return Vec::new();
        }
        let Some(product) = self.selected_product().cloned() else {
            self.notifications
                .push(Notification::error("Error", MSG_UPLOAD_REQUIRED));
            return Vec::new();
        };
        let Some(scene) = self.selected_scene.clone() else {
            self.notifications
                .push(Notification::error("Error", MSG_SCENE_REQUIRED));
            return Vec::new();
        };

        let request = GenerateLifestyleRequest::new(product.url.clone(), &scene.description)
            .with_num_results(self.image_count);
        self.generation = Some(PendingGeneration {
            product,
            scene_description: scene.description,
        });
        vec![Effect::Generate { request }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::png_file;
    use chrono::TimeZone;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn uploaded_state(names: &[&str]) -> AppState {
        let mut state = AppState::new();
        let files = names.iter().map(|name| png_file(name)).collect();
        let effects = state.reduce(Action::FilesDropped {
            files,
            at: at(1_000),
        });
        for effect in effects {
            if let Effect::Upload { upload_id, file } = effect {
                state.reduce(Action::UploadSucceeded {
                    upload_id,
                    url: format!("https://bucket/{}", file.name),
                });
            }
        }
        state
    }

    fn image(id: &str) -> GeneratedImage {
        GeneratedImage {
            url: format!("https://cdn/{id}.png"),
            id: id.to_string(),
            filename: format!("{id}.png"),
        }
    }

    #[test]
    fn test_initial_state_offers_builtin_scenes() {
        let state = AppState::new();
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.suggestions().len(), 5);
        assert_eq!(state.image_count(), DEFAULT_IMAGE_COUNT);
        assert!(!state.can_generate());
    }

    #[test]
    fn test_drop_starts_uploads_with_local_preview() {
        let mut state = AppState::new();
        let effects = state.reduce(Action::FilesDropped {
            files: vec![png_file("shoe.png")],
            at: at(1_700_000_000_000),
        });
        assert_eq!(state.phase(), Phase::Uploading);
        assert_eq!(state.pending_uploads()[0].id, "shoe.png-1700000000000");
        assert_eq!(
            state.pending_uploads()[0].preview_url,
            "blob:shoe.png-1700000000000"
        );
        assert!(matches!(&effects[..], [Effect::Upload { upload_id, .. }] if upload_id == "shoe.png-1700000000000"));
    }

    #[test]
    fn test_same_name_in_one_drop_gets_distinct_ids() {
        let mut state = AppState::new();
        state.reduce(Action::FilesDropped {
            files: vec![png_file("a.png"), png_file("a.png")],
            at: at(5),
        });
        let ids: Vec<_> = state.pending_uploads().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a.png-5", "a.png-5-1"]);
    }

    #[test]
    fn test_upload_success_selects_first_product() {
        let state = uploaded_state(&["a.png", "b.png"]);
        assert_eq!(state.uploaded().len(), 2);
        assert_eq!(state.selected_product().unwrap().url, "https://bucket/a.png");
        assert_eq!(state.phase(), Phase::ReadyToSuggest);
    }

    #[test]
    fn test_upload_failure_leaves_image_out_and_notifies() {
        let mut state = AppState::new();
        let effects = state.reduce(Action::FilesDropped {
            files: vec![png_file("a.png")],
            at: at(1),
        });
        let Effect::Upload { upload_id, .. } = effects[0].clone() else {
            panic!("expected upload effect");
        };
        state.reduce(Action::UploadFailed {
            upload_id,
            message: "boom".into(),
        });
        assert!(state.uploaded().is_empty());
        assert!(state.pending_uploads().is_empty());
        assert_eq!(state.notifications()[0].title, "Upload failed");
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn test_drop_rejects_unsupported_and_excess_files() {
        let mut state = AppState::new();
        let mut files: Vec<_> = (0..12).map(|i| png_file(&format!("{i}.png"))).collect();
        files.push(ImageFile::new("notes.txt", "text/plain", Bytes::new()));
        let effects = state.reduce(Action::FilesDropped { files, at: at(1) });
        assert_eq!(effects.len(), MAX_FILES);
        let titles: Vec<_> = state
            .notifications()
            .iter()
            .map(|n| n.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Unsupported file type", "Upload limit reached"]);

        let effects = state.reduce(Action::FilesDropped {
            files: vec![png_file("late.png")],
            at: at(2),
        });
        assert!(effects.is_empty());
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        assert!(png_file("PHOTO.JPG").is_accepted());
        assert!(!png_file("photo").is_accepted());
        assert!(!png_file("photo.gif").is_accepted());
    }

    #[test]
    fn test_removing_selected_product_selects_next() {
        let mut state = uploaded_state(&["a.png", "b.png"]);
        let first = state.uploaded()[0].id.clone();
        state.reduce(Action::ImageRemoved { id: first });
        assert_eq!(state.selected_product().unwrap().url, "https://bucket/b.png");

        let second = state.uploaded()[0].id.clone();
        state.reduce(Action::ImageRemoved { id: second });
        assert!(state.selected_product().is_none());
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn test_suggestions_request_requires_product() {
        let mut state = AppState::new();
        assert!(state.reduce(Action::SuggestionsRequested).is_empty());
        assert_eq!(state.notifications()[0].description, MSG_UPLOAD_REQUIRED);
    }

    #[test]
    fn test_only_one_suggestion_request_in_flight() {
        let mut state = uploaded_state(&["a.png"]);
        let effects = state.reduce(Action::SuggestionsRequested);
        assert!(matches!(&effects[..], [Effect::FetchSuggestions { file }] if file.name == "a.png"));
        assert_eq!(state.phase(), Phase::Suggesting);
        assert!(state.reduce(Action::SuggestionsRequested).is_empty());
    }

    #[test]
    fn test_suggestions_replace_list_wholesale() {
        let mut state = uploaded_state(&["a.png"]);
        state.reduce(Action::SuggestionsRequested);
        state.reduce(Action::SuggestionsLoaded(vec![SceneSuggestion::new(
            "ai-suggestion-0",
            "Beach",
        )]));
        assert_eq!(state.suggestions().len(), 1);
        assert_eq!(state.phase(), Phase::ReadyToSuggest);
    }

    #[test]
    fn test_suggestion_failure_returns_to_ready_state() {
        let mut state = uploaded_state(&["a.png"]);
        state.reduce(Action::SuggestionsRequested);
        state.reduce(Action::SuggestionsFailed {
            message: "quota".into(),
        });
        assert_eq!(state.phase(), Phase::ReadyToSuggest);
        assert_eq!(state.suggestions().len(), 5);
        assert_eq!(state.notifications()[0].description, "quota");
    }

    #[test]
    fn test_generate_requires_scene() {
        let mut state = uploaded_state(&["a.png"]);
        assert!(state.reduce(Action::GenerateRequested).is_empty());
        assert_eq!(state.notifications()[0].description, MSG_SCENE_REQUIRED);
    }

    #[test]
    fn test_generate_uses_product_url_scene_and_count() {
        let mut state = uploaded_state(&["a.png"]);
        state.reduce(Action::SceneSelected(builtin_scenes()[3].clone()));
        state.reduce(Action::ImageCountChanged(2));
        assert_eq!(state.phase(), Phase::ReadyToGenerate);

        let effects = state.reduce(Action::GenerateRequested);
        assert_eq!(
            effects,
            vec![Effect::Generate {
                request: GenerateLifestyleRequest::new(
                    "https://bucket/a.png",
                    "A health food store display"
                )
                .with_num_results(2),
            }]
        );
        assert_eq!(state.phase(), Phase::Generating);
        assert!(state.reduce(Action::GenerateRequested).is_empty());
    }

    #[test]
    fn test_image_count_is_clamped() {
        let mut state = AppState::new();
        state.reduce(Action::ImageCountChanged(0));
        assert_eq!(state.image_count(), 1);
        state.reduce(Action::ImageCountChanged(9));
        assert_eq!(state.image_count(), MAX_IMAGE_COUNT);
    }

    #[test]
    fn test_new_results_are_prepended_and_kept() {
        let mut state = uploaded_state(&["a.png", "b.png"]);
        state.reduce(Action::SceneSelected(builtin_scenes()[0].clone()));
        state.reduce(Action::GenerateRequested);
        state.reduce(Action::GenerationSucceeded {
            images: vec![image("1")],
            at: at(10),
        });
        assert_eq!(state.phase(), Phase::HasResults);

        let second = state.uploaded()[1].id.clone();
        state.reduce(Action::ProductSelected { id: second });
        assert_eq!(state.results().len(), 1);

        state.reduce(Action::SceneSelected(builtin_scenes()[1].clone()));
        state.reduce(Action::GenerateRequested);
        // 场景在请求发出后变化，不影响结果的标签
        state.reduce(Action::SceneSelected(builtin_scenes()[2].clone()));
        state.reduce(Action::GenerationSucceeded {
            images: vec![image("2"), image("3")],
            at: at(20),
        });

        let results = state.results();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].images.len(), 2);
        assert_eq!(
            results[0].scene_description,
            "A pantry shelf alongside other food items"
        );
        assert_eq!(results[0].product_image.url, "https://bucket/b.png");
        assert_eq!(results[1].scene_description, "High end photography");
        assert_eq!(results[1].timestamp, at(10));
    }

    #[test]
    fn test_generation_failure_keeps_prior_results() {
        let mut state = uploaded_state(&["a.png"]);
        state.reduce(Action::SceneSelected(builtin_scenes()[0].clone()));
        state.reduce(Action::GenerateRequested);
        state.reduce(Action::GenerationSucceeded {
            images: vec![image("1")],
            at: at(10),
        });
        state.reduce(Action::GenerateRequested);
        state.reduce(Action::GenerationFailed {
            message: "API request failed: nope".into(),
        });
        assert_eq!(state.results().len(), 1);
        assert!(!state.is_generating());
        assert!(state.can_generate());
        assert_eq!(state.notifications()[0].variant, NotificationVariant::Destructive);
    }

    #[test]
    fn test_stale_generation_result_is_ignored() {
        let mut state = AppState::new();
        state.reduce(Action::GenerationSucceeded {
            images: vec![image("1")],
            at: at(1),
        });
        assert!(state.results().is_empty());
    }
}
