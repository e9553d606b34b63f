use std::sync::Arc;

use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::api::{
    AnswerReviewer, ApiClient, HttpAnswerReviewer, HttpAuthClient, HttpQuestionSource,
    QuestionSource,
};
use crate::auth_service::AuthService;
use crate::config::{ApiConfig, PracticeSettings};
use crate::error::AppServicesError;
use crate::practice::PracticeLoopService;
use crate::question_bank::BuiltinQuestionBank;

/// Where practice questions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionSourceKind {
    #[default]
    Remote,
    /// Built-in free-response bank; no network or sign-in needed.
    Offline,
}

/// Assembles app-facing services from configuration and storage.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    api: ApiClient,
    auth: Arc<AuthService>,
    practice: Arc<PracticeLoopService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the remote API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        api: ApiConfig,
        settings: PracticeSettings,
        source: QuestionSourceKind,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        info!(db_url, "credential store ready");
        Ok(Self::with_storage(&storage, clock, api, settings, source))
    }

    /// Build services over an already opened `Storage`.
    #[must_use]
    pub fn with_storage(
        storage: &Storage,
        clock: Clock,
        api: ApiConfig,
        settings: PracticeSettings,
        source: QuestionSourceKind,
    ) -> Self {
        let api = ApiClient::new(api);
        let questions: Arc<dyn QuestionSource> = match source {
            QuestionSourceKind::Remote => Arc::new(HttpQuestionSource::new(api.clone())),
            QuestionSourceKind::Offline => Arc::new(BuiltinQuestionBank::new()),
        };
        let reviewer: Arc<dyn AnswerReviewer> = Arc::new(HttpAnswerReviewer::new(api.clone()));
        let auth = Arc::new(AuthService::new(
            clock,
            Arc::new(HttpAuthClient::new(api.clone())),
            Arc::clone(&storage.credentials),
        ));
        let practice = Arc::new(PracticeLoopService::new(questions, reviewer, settings));

        Self {
            clock,
            api,
            auth,
            practice,
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn practice(&self) -> Arc<PracticeLoopService> {
        Arc::clone(&self.practice)
    }
}
