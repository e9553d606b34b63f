use async_trait::async_trait;
use prep_core::model::{AnswerFeedback, CapturedAudio, SessionContext};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use super::client::{ApiClient, bearer, decode_json};
use crate::error::CollaboratorError;

/// Transcribes a spoken answer and returns written feedback on it.
#[async_trait]
pub trait AnswerReviewer: Send + Sync {
    /// Review `audio` recorded for the question `prompt`.
    ///
    /// The audio is only borrowed; callers keep it for a retry on failure.
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError` when the service cannot be reached or rejects the upload.
    async fn review_answer(
        &self,
        prompt: &str,
        audio: &CapturedAudio,
        context: &SessionContext,
    ) -> Result<AnswerFeedback, CollaboratorError>;
}

#[derive(Clone, Debug)]
pub struct HttpAnswerReviewer {
    api: ApiClient,
}

impl HttpAnswerReviewer {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[derive(Debug, Deserialize)]
struct FeedbackDto {
    #[serde(default)]
    transcription: String,
    #[serde(default)]
    feedback: String,
}

#[async_trait]
impl AnswerReviewer for HttpAnswerReviewer {
    async fn review_answer(
        &self,
        prompt: &str,
        audio: &CapturedAudio,
        context: &SessionContext,
    ) -> Result<AnswerFeedback, CollaboratorError> {
        let token = bearer(context)?;
        let url = self.api.url("interview/feedback")?;
        debug!(%url, bytes = audio.bytes().len(), "uploading answer for review");

        let part = Part::bytes(audio.bytes().to_vec())
            .file_name(format!("answer.{}", file_extension(audio.mime_type())))
            .mime_str(audio.mime_type())?;
        let form = Form::new()
            .part("audio", part)
            .text("question", prompt.to_owned());

        let response = self
            .api
            .http()
            .post(url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        let body: FeedbackDto = decode_json(response, "Failed to review answer").await?;
        into_feedback(body)
    }
}

fn into_feedback(body: FeedbackDto) -> Result<AnswerFeedback, CollaboratorError> {
    if body.transcription.trim().is_empty() && body.feedback.trim().is_empty() {
        return Err(CollaboratorError::Malformed("empty review".into()));
    }
    Ok(AnswerFeedback {
        transcription: body.transcription.trim().to_owned(),
        feedback: body.feedback.trim().to_owned(),
    })
}

fn file_extension(mime_type: &str) -> &str {
    match mime_type.split(';').next().unwrap_or_default().trim() {
        "audio/webm" => "webm",
        "audio/ogg" => "ogg",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/mpeg" => "mp3",
        _ => "bin",
    }
}
