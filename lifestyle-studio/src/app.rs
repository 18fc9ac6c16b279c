//! Async driver that runs session effects against a backend.

use std::collections::VecDeque;

use chrono::Utc;
use futures_util::future::BoxFuture;
use lifestyle_studio_types::lifestyle::{GenerateLifestyleRequest, GeneratedImage};
use lifestyle_studio_types::scene::SceneSuggestion;

use crate::api::StudioApi;
use crate::error::Result;
use crate::session::{Action, AppState, Effect, ImageFile};
use crate::storage::StorageClient;

/// 会话依赖的外部能力：存储上传、场景建议、生成。
pub trait StudioBackend: Send + Sync {
    fn upload(&self, file: ImageFile) -> BoxFuture<'_, Result<String>>;
    fn suggest_scenes(&self, file: ImageFile) -> BoxFuture<'_, Result<Vec<SceneSuggestion>>>;
    fn generate(
        &self,
        request: GenerateLifestyleRequest,
    ) -> BoxFuture<'_, Result<Vec<GeneratedImage>>>;
}

/// 通过对象存储与本服务 HTTP 接口实现的后端。
#[derive(Clone)]
pub struct RemoteBackend {
    storage: StorageClient,
    api: StudioApi,
}

impl RemoteBackend {
    #[must_use]
    pub const fn new(storage: StorageClient, api: StudioApi) -> Self {
        Self { storage, api }
    }
}

impl StudioBackend for RemoteBackend {
    fn upload(&self, file: ImageFile) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move { self.storage.upload(&file).await })
    }

    fn suggest_scenes(&self, file: ImageFile) -> BoxFuture<'_, Result<Vec<SceneSuggestion>>> {
        Box::pin(async move { self.api.scene_suggestions(&file).await })
    }

    fn generate(
        &self,
        request: GenerateLifestyleRequest,
    ) -> BoxFuture<'_, Result<Vec<GeneratedImage>>> {
        Box::pin(async move { self.api.generate_lifestyle(&request).await })
    }
}

/// 单个会话：状态 + 后端。
pub struct Studio<B> {
    state: AppState,
    backend: B,
}

impl<B: StudioBackend> Studio<B> {
    pub fn new(backend: B) -> Self {
        Self {
            state: AppState::new(),
            backend,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// 只应用事件，不执行副作用；由调用方决定何时执行 [`Self::execute`]。
    pub fn submit(&mut self, action: Action) -> Vec<Effect> {
        self.state.reduce(action)
    }

    /// 执行一个副作用，返回对应的完成事件。失败转换为事件，不向上传播。
    pub async fn execute(&self, effect: Effect) -> Action {
        match effect {
            Effect::Upload { upload_id, file } => match self.backend.upload(file).await {
                Ok(url) => Action::UploadSucceeded { upload_id, url },
                Err(err) => Action::UploadFailed {
                    upload_id,
                    message: err.to_string(),
                },
            },
            Effect::FetchSuggestions { file } => match self.backend.suggest_scenes(file).await {
                Ok(suggestions) => Action::SuggestionsLoaded(suggestions),
                Err(err) => Action::SuggestionsFailed {
                    message: user_message(&err),
                },
            },
            Effect::Generate { request } => match self.backend.generate(request).await {
                Ok(images) => Action::GenerationSucceeded {
                    images,
                    at: Utc::now(),
                },
                Err(err) => Action::GenerationFailed {
                    message: user_message(&err),
                },
            },
        }
    }

    /// 应用事件并依次执行所有派生的副作用，直到状态稳定。
    pub async fn dispatch(&mut self, action: Action) {
        let mut queue = VecDeque::from([action]);
        while let Some(action) = queue.pop_front() {
            for effect in self.state.reduce(action) {
                let completion = self.execute(effect).await;
                queue.push_back(completion);
            }
        }
    }
}

fn user_message(err: &crate::Error) -> String {
    match err {
        crate::Error::Upstream { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
