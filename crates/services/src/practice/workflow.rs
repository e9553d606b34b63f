use std::sync::Arc;

use prep_core::ValidationError;
use prep_core::model::{AnswerMode, JobRole, Phase, SessionContext, is_authorized};
use tracing::{info, warn};

use super::session::{PracticeSession, SubmitResult};
use crate::api::{AnswerReviewer, QuestionRequest, QuestionSource, QuestionStyle};
use crate::config::PracticeSettings;
use crate::error::PracticeError;

/// Connects a `PracticeSession` to its remote collaborators.
///
/// Every collaborator call happens before the session is touched, so a
/// failed call leaves it exactly where it was.
#[derive(Clone)]
pub struct PracticeLoopService {
    questions: Arc<dyn QuestionSource>,
    reviewer: Arc<dyn AnswerReviewer>,
    settings: PracticeSettings,
}

impl PracticeLoopService {
    #[must_use]
    pub fn new(
        questions: Arc<dyn QuestionSource>,
        reviewer: Arc<dyn AnswerReviewer>,
        settings: PracticeSettings,
    ) -> Self {
        Self {
            questions,
            reviewer,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> PracticeSettings {
        self.settings
    }

    /// Fetch a question set for `job_role` and start the session on it.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::InvalidPhase` outside `Phase::Setup`,
    /// `PracticeError::Validation` for a blank role (checked before any
    /// request), `PracticeError::Unauthorized` when the source needs a
    /// signed-in context, and `PracticeError::Collaborator` when fetching fails.
    pub async fn begin(
        &self,
        session: &mut PracticeSession,
        context: &SessionContext,
        job_role: &str,
        style: QuestionStyle,
    ) -> Result<(), PracticeError> {
        if session.phase() != Phase::Setup {
            return Err(PracticeError::InvalidPhase {
                action: "begin a session",
                actual: session.phase(),
            });
        }
        let job_role = JobRole::parse(job_role)?;
        if self.questions.requires_auth() && !is_authorized(context) {
            return Err(PracticeError::Unauthorized);
        }

        let count = match style {
            QuestionStyle::MultipleChoice => self.settings.mcq_count,
            QuestionStyle::FreeResponse => self.settings.free_response_count,
        };
        let request = QuestionRequest {
            job_role,
            count,
            style,
        };
        let questions = self
            .questions
            .fetch_questions(&request, context)
            .await
            .inspect_err(|err| warn!(%err, role = %request.job_role, "question fetch failed"))?;
        info!(role = %request.job_role, fetched = questions.len(), ?style, "questions ready");

        session.begin(
            request.job_role.as_str(),
            questions,
            self.settings.time_limit_secs,
        )
    }

    /// Send the finished recording for review and submit it with the feedback.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Validation` if there is no finished recording,
    /// and `PracticeError::Collaborator` if the review fails. The recording
    /// stays in the draft on failure so it can be sent again.
    pub async fn submit_for_feedback(
        &self,
        session: &mut PracticeSession,
        context: &SessionContext,
    ) -> Result<SubmitResult, PracticeError> {
        if session.phase() != Phase::InProgress {
            return Err(PracticeError::InvalidPhase {
                action: "request feedback",
                actual: session.phase(),
            });
        }
        let prompt = session
            .current_question()
            .filter(|question| !question.is_multiple_choice())
            .map(|question| question.prompt().to_owned())
            .ok_or(ValidationError::NoAudioRecorded)?;
        let draft = session.draft();
        let audio = match (draft.mode, &draft.audio) {
            (AnswerMode::Audio, Some(audio)) if !session.is_capturing() => audio.clone(),
            _ => return Err(ValidationError::NoAudioRecorded.into()),
        };

        let feedback = self
            .reviewer
            .review_answer(&prompt, &audio, context)
            .await
            .inspect_err(|err| warn!(%err, "answer review failed, recording kept"))?;
        session.submit_answer_with_feedback(feedback)
    }
}

impl std::fmt::Debug for PracticeLoopService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PracticeLoopService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
