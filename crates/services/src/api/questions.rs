use async_trait::async_trait;
use prep_core::model::{JobRole, Question, QuestionId, SessionContext};
use serde::Deserialize;
use tracing::debug;

use super::client::{ApiClient, bearer, decode_json};
use crate::error::CollaboratorError;

const FETCH_FAILED: &str = "Failed to generate questions";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStyle {
    MultipleChoice,
    FreeResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest {
    pub job_role: JobRole,
    pub count: usize,
    pub style: QuestionStyle,
}

/// Produces the ordered question set for a practice attempt.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Whether a signed-in context is needed before calling this source.
    fn requires_auth(&self) -> bool {
        true
    }

    /// Fetch questions for the request.
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError` with a user-facing message on failure.
    async fn fetch_questions(
        &self,
        request: &QuestionRequest,
        context: &SessionContext,
    ) -> Result<Vec<Question>, CollaboratorError>;
}

/// Question generation backed by the remote API.
#[derive(Clone, Debug)]
pub struct HttpQuestionSource {
    api: ApiClient,
}

impl HttpQuestionSource {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    async fn fetch_questions(
        &self,
        request: &QuestionRequest,
        context: &SessionContext,
    ) -> Result<Vec<Question>, CollaboratorError> {
        let token = bearer(context)?;
        let path = match request.style {
            QuestionStyle::MultipleChoice => "questions/aptitude",
            QuestionStyle::FreeResponse => "questions/practice",
        };
        let url = self.api.url(path)?;
        debug!(%url, role = %request.job_role, count = request.count, "requesting questions");

        let response = self
            .api
            .http()
            .get(url)
            .query(&[
                ("jobRole", request.job_role.as_str().to_owned()),
                ("count", request.count.to_string()),
            ])
            .bearer_auth(token)
            .send()
            .await?;

        match request.style {
            QuestionStyle::MultipleChoice => {
                let body: QuestionsEnvelope<AptitudeQuestionDto> =
                    decode_json(response, FETCH_FAILED).await?;
                aptitude_questions(body.questions)
            }
            QuestionStyle::FreeResponse => {
                let body: QuestionsEnvelope<PracticeQuestionDto> =
                    decode_json(response, FETCH_FAILED).await?;
                practice_questions(body.questions)
            }
        }
    }
}

//
// ─── WIRE SHAPES ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct QuestionsEnvelope<T> {
    #[serde(default = "Vec::new")]
    questions: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AptitudeQuestionDto {
    question: String,
    options: Vec<String>,
    correct_answer: usize,
    #[serde(default)]
    explanation: String,
}

#[derive(Debug, Deserialize)]
struct PracticeQuestionDto {
    #[serde(default)]
    id: Option<u64>,
    #[serde(alias = "question")]
    text: String,
    #[serde(default)]
    topic: Option<String>,
}

// The aptitude endpoint sends no ids; position in the set identifies a question.
fn aptitude_questions(dtos: Vec<AptitudeQuestionDto>) -> Result<Vec<Question>, CollaboratorError> {
    dtos.into_iter()
        .zip(1_u64..)
        .map(|(dto, id)| {
            Question::multiple_choice(
                QuestionId::new(id),
                dto.question,
                dto.options,
                dto.correct_answer,
                dto.explanation,
            )
            .map_err(CollaboratorError::from)
        })
        .collect()
}

fn practice_questions(dtos: Vec<PracticeQuestionDto>) -> Result<Vec<Question>, CollaboratorError> {
    dtos.into_iter()
        .zip(1_u64..)
        .map(|(dto, position)| -> Result<Question, CollaboratorError> {
            let id = QuestionId::new(dto.id.unwrap_or(position));
            let question = Question::free_response(id, dto.text)?;
            Ok(match dto.topic {
                Some(topic) => question.with_topic(topic),
                None => question,
            })
        })
        .collect()
}
