use std::fmt;
use std::sync::Arc;

use prep_core::model::{
    AnswerDraft, AnswerFeedback, AnswerMode, AnswerPayload, AnswerRecord, CapturedAudio, JobRole,
    AnswerSummary, Phase, Question, QuestionId, ScoreSummary, SessionSummary,
};
use prep_core::{Clock, ValidationError};
use tracing::{debug, info, warn};

use super::capture::{AudioInput, CaptureController, NoAudioInput};
use super::countdown::{Countdown, Tick, Ticker};
use super::progress::SessionProgress;
use crate::error::PracticeError;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    Timeout,
}

/// What locking in the current question produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Multiple choice question graded against its key.
    Scored {
        selected: Option<usize>,
        correct_answer: usize,
        is_correct: bool,
        explanation: String,
    },
    /// Free-response answer saved as a record.
    Recorded { mode: AnswerMode },
    /// Time ran out on a free-response question with nothing usable.
    Unanswered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResult {
    pub question_index: usize,
    pub trigger: SubmitTrigger,
    pub outcome: SubmitOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not counting: no question is being answered, or the tick is stale.
    Ignored,
    Counting { remaining: u32 },
    AutoSubmitted(SubmitResult),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    NextQuestion { index: usize },
    Completed(SessionSummary),
}

/// Answer state ready to be locked in.
enum Pending {
    Choice {
        selected: Option<usize>,
        correct_answer: usize,
        explanation: String,
    },
    Payload {
        question_id: QuestionId,
        payload: AnswerPayload,
    },
    Nothing,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One practice attempt, from job role input to a final score.
///
/// Works for multiple choice and free-response questions alike; the kind of
/// the current question decides how a submission is handled. The countdown
/// task and any audio capture are owned here and released on every exit
/// from `Phase::InProgress`, including drop.
pub struct PracticeSession {
    clock: Clock,
    ticker: Ticker,
    capture: CaptureController,
    job_role: Option<JobRole>,
    questions: Vec<Question>,
    current: usize,
    time_limit: u32,
    time_remaining: u32,
    score: u32,
    phase: Phase,
    draft: AnswerDraft,
    records: Vec<AnswerRecord>,
    last_result: Option<SubmitResult>,
    countdown: Option<Countdown>,
    visit: u64,
}

impl PracticeSession {
    /// A session in `Phase::Setup` with a manual ticker and no microphone.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            ticker: Ticker::Manual,
            capture: CaptureController::new(Arc::new(NoAudioInput), clock),
            job_role: None,
            questions: Vec::new(),
            current: 0,
            time_limit: 0,
            time_remaining: 0,
            score: 0,
            phase: Phase::Setup,
            draft: AnswerDraft::default(),
            records: Vec::new(),
            last_result: None,
            countdown: None,
            visit: 0,
        }
    }

    #[must_use]
    pub fn with_ticker(mut self, ticker: Ticker) -> Self {
        self.ticker = ticker;
        self
    }

    #[must_use]
    pub fn with_audio_input(mut self, input: Arc<dyn AudioInput>) -> Self {
        self.capture = CaptureController::new(input, self.clock);
        self
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn job_role(&self) -> Option<&JobRole> {
        self.job_role.as_ref()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question on screen while answering or reviewing it.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase.has_current_question() {
            self.questions.get(self.current)
        } else {
            None
        }
    }

    #[must_use]
    pub fn time_limit(&self) -> u32 {
        self.time_limit
    }

    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn draft(&self) -> &AnswerDraft {
        &self.draft
    }

    /// Saved free-response answers, in the order they were first saved.
    #[must_use]
    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    #[must_use]
    pub fn record_for(&self, question_index: usize) -> Option<&AnswerRecord> {
        self.records
            .iter()
            .find(|record| record.question_index() == question_index)
    }

    #[must_use]
    pub fn last_result(&self) -> Option<&SubmitResult> {
        self.last_result.as_ref()
    }

    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.capture.is_capturing()
    }

    #[must_use]
    pub fn capture_elapsed_secs(&self) -> Option<u32> {
        self.capture.elapsed_secs()
    }

    #[must_use]
    pub fn has_running_countdown(&self) -> bool {
        self.countdown.is_some()
    }

    /// Identifies the current question visit; ticks carry it.
    #[must_use]
    pub fn visit(&self) -> u64 {
        self.visit
    }

    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        if !self.phase.has_current_question() {
            return None;
        }
        Some(SessionProgress {
            position: self.current + 1,
            total: self.questions.len(),
            time_remaining: self.time_remaining,
            time_limit: self.time_limit,
            score: self.score,
        })
    }

    #[must_use]
    pub fn summary(&self) -> ScoreSummary {
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        ScoreSummary::new(self.score, total)
    }

    /// Saved modality per question; `None` where nothing was kept.
    #[must_use]
    pub fn answer_summary(&self) -> AnswerSummary {
        let answers = (0..self.questions.len())
            .map(|index| self.record_for(index).map(AnswerRecord::modality))
            .collect();
        AnswerSummary { answers }
    }

    /// A score when the set has anything gradable, the saved answers otherwise.
    #[must_use]
    pub fn completion_summary(&self) -> SessionSummary {
        if self.questions.iter().any(Question::is_multiple_choice) {
            SessionSummary::Scored(self.summary())
        } else {
            SessionSummary::Answered(self.answer_summary())
        }
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    /// `Setup → InProgress` on the first question with a full countdown.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Validation` for a blank job role, an empty
    /// question set or a zero time limit, and `PracticeError::InvalidPhase`
    /// outside `Phase::Setup`. The session is unchanged on error.
    pub fn begin(
        &mut self,
        job_role: &str,
        questions: Vec<Question>,
        time_limit: u32,
    ) -> Result<(), PracticeError> {
        self.expect_phase(Phase::Setup, "begin a session")?;
        let job_role = JobRole::parse(job_role)?;
        if questions.is_empty() {
            return Err(ValidationError::EmptyQuestionSet.into());
        }
        if time_limit == 0 {
            return Err(ValidationError::ZeroTimeLimit.into());
        }

        info!(role = %job_role, questions = questions.len(), time_limit, "practice session started");
        self.job_role = Some(job_role);
        self.questions = questions;
        self.current = 0;
        self.score = 0;
        self.time_limit = time_limit;
        self.time_remaining = time_limit;
        self.draft = AnswerDraft::default();
        self.records.clear();
        self.last_result = None;
        self.phase = Phase::InProgress;
        self.arm_countdown();
        Ok(())
    }

    /// One elapsed second. Auto-submits when the countdown reaches zero.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != Phase::InProgress {
            return TickOutcome::Ignored;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining > 0 {
            return TickOutcome::Counting {
                remaining: self.time_remaining,
            };
        }

        debug!(index = self.current, "time is up, submitting");
        let pending = match self.pending_answer(SubmitTrigger::Timeout) {
            Ok(pending) => pending,
            Err(err) => {
                debug!(%err, "no usable answer at timeout");
                Pending::Nothing
            }
        };
        TickOutcome::AutoSubmitted(self.lock_in(SubmitTrigger::Timeout, pending, None))
    }

    /// Apply a tick from the background countdown, dropping stale ones.
    pub fn on_tick(&mut self, tick: Tick) -> TickOutcome {
        if tick.visit != self.visit {
            return TickOutcome::Ignored;
        }
        self.tick()
    }

    /// Record a candidate option without grading it.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::InvalidPhase` once the answer is locked, and
    /// `PracticeError::Validation` if the question has no such option.
    pub fn select_answer(&mut self, option_index: usize) -> Result<(), PracticeError> {
        self.expect_phase(Phase::InProgress, "select an answer")?;
        let choices = self
            .questions
            .get(self.current)
            .and_then(Question::choices)
            .ok_or(ValidationError::NotMultipleChoice)?;
        let len = choices.options().len();
        if option_index >= len {
            return Err(ValidationError::OptionOutOfRange {
                index: option_index,
                len,
            }
            .into());
        }
        self.draft.selected_option = Some(option_index);
        Ok(())
    }

    /// Switch between typed and spoken answers. Leaving audio mode drops any
    /// recording in progress.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::InvalidPhase` outside `Phase::InProgress`.
    pub fn set_answer_mode(&mut self, mode: AnswerMode) -> Result<(), PracticeError> {
        self.expect_phase(Phase::InProgress, "change answer mode")?;
        if mode == AnswerMode::Text {
            self.capture.release();
        }
        self.draft.mode = mode;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `PracticeError::InvalidPhase` outside `Phase::InProgress`.
    pub fn set_text_answer(&mut self, text: impl Into<String>) -> Result<(), PracticeError> {
        self.expect_phase(Phase::InProgress, "edit the answer")?;
        self.draft.text = text.into();
        Ok(())
    }

    /// Start recording a spoken answer and switch to audio mode.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Device` if the microphone is unavailable or a
    /// recording is already running; the phase is unaffected.
    pub fn start_capture(&mut self) -> Result<(), PracticeError> {
        self.expect_phase(Phase::InProgress, "start recording")?;
        self.capture.start()?;
        self.draft.mode = AnswerMode::Audio;
        Ok(())
    }

    /// Finish the recording. Its payload replaces any earlier take.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Device` if nothing is recording.
    pub fn stop_capture(&mut self) -> Result<&CapturedAudio, PracticeError> {
        let audio = self.capture.stop()?;
        let audio: &CapturedAudio = self.draft.audio.insert(audio);
        Ok(audio)
    }

    /// `InProgress → ShowingResult`, grading or saving the current answer.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::InvalidPhase` outside `Phase::InProgress` (so a
    /// second submit never changes the score), and `PracticeError::Validation`
    /// when there is no answer to submit.
    pub fn submit_answer(&mut self) -> Result<SubmitResult, PracticeError> {
        self.expect_phase(Phase::InProgress, "submit an answer")?;
        let pending = self.pending_answer(SubmitTrigger::Manual)?;
        Ok(self.lock_in(SubmitTrigger::Manual, pending, None))
    }

    /// Submit the recorded answer together with the reviewer's feedback.
    ///
    /// # Errors
    ///
    /// Same as `submit_answer`; additionally the draft must hold a finished
    /// recording.
    pub fn submit_answer_with_feedback(
        &mut self,
        feedback: AnswerFeedback,
    ) -> Result<SubmitResult, PracticeError> {
        self.expect_phase(Phase::InProgress, "submit an answer")?;
        if self.draft.mode != AnswerMode::Audio {
            return Err(ValidationError::NoAudioRecorded.into());
        }
        let pending = self.pending_answer(SubmitTrigger::Manual)?;
        Ok(self.lock_in(SubmitTrigger::Manual, pending, Some(feedback)))
    }

    /// Move past the reviewed question.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::InvalidPhase` outside `Phase::ShowingResult`.
    pub fn advance(&mut self) -> Result<Advance, PracticeError> {
        self.expect_phase(Phase::ShowingResult, "advance")?;

        if self.current + 1 >= self.questions.len() {
            self.phase = Phase::Complete;
            let summary = self.completion_summary();
            match &summary {
                SessionSummary::Scored(score) => info!(
                    score = score.score,
                    total = score.total,
                    percent = score.percent(),
                    "practice session complete"
                ),
                SessionSummary::Answered(answers) => info!(
                    saved = answers.saved(),
                    total = answers.total(),
                    "practice session complete"
                ),
            }
            return Ok(Advance::Completed(summary));
        }

        self.current += 1;
        self.time_remaining = self.time_limit;
        self.capture.release();
        self.draft.clear();
        self.phase = Phase::InProgress;
        self.arm_countdown();
        Ok(Advance::NextQuestion {
            index: self.current,
        })
    }

    /// Discard everything and return to `Phase::Setup`. Valid from any phase.
    pub fn restart(&mut self) {
        self.cancel_countdown();
        self.capture.release();
        if self.phase != Phase::Setup {
            info!(phase = %self.phase, "practice session restarted");
        }
        self.job_role = None;
        self.questions.clear();
        self.current = 0;
        self.time_limit = 0;
        self.time_remaining = 0;
        self.score = 0;
        self.draft = AnswerDraft::default();
        self.records.clear();
        self.last_result = None;
        self.phase = Phase::Setup;
        self.visit += 1;
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<(), PracticeError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(PracticeError::InvalidPhase {
                action,
                actual: self.phase,
            })
        }
    }

    /// Collect the answer to lock in. On timeout an in-flight recording is
    /// finished so whatever was said still counts.
    fn pending_answer(&mut self, trigger: SubmitTrigger) -> Result<Pending, ValidationError> {
        let Some(question) = self.questions.get(self.current) else {
            return Ok(Pending::Nothing);
        };

        if let Some(choices) = question.choices() {
            let selected = self.draft.selected_option;
            if selected.is_none() && trigger == SubmitTrigger::Manual {
                return Err(ValidationError::NoAnswerSelected);
            }
            return Ok(Pending::Choice {
                selected,
                correct_answer: choices.correct_answer(),
                explanation: choices.explanation().to_owned(),
            });
        }

        let question_id = question.id();
        if self.capture.is_capturing() {
            if trigger == SubmitTrigger::Manual {
                return Err(ValidationError::NoAudioRecorded);
            }
            match self.capture.stop() {
                Ok(audio) => self.draft.audio = Some(audio),
                Err(err) => warn!(%err, "could not finish recording at timeout"),
            }
        }

        let payload = self.draft.to_payload()?;
        Ok(Pending::Payload {
            question_id,
            payload,
        })
    }

    fn lock_in(
        &mut self,
        trigger: SubmitTrigger,
        pending: Pending,
        feedback: Option<AnswerFeedback>,
    ) -> SubmitResult {
        self.cancel_countdown();
        self.capture.release();

        let question_index = self.current;
        let outcome = match pending {
            Pending::Choice {
                selected,
                correct_answer,
                explanation,
            } => {
                let is_correct = selected == Some(correct_answer);
                if is_correct {
                    self.score += 1;
                }
                SubmitOutcome::Scored {
                    selected,
                    correct_answer,
                    is_correct,
                    explanation,
                }
            }
            Pending::Payload {
                question_id,
                payload,
            } => {
                let mode = payload.mode();
                let record = AnswerRecord::new(
                    question_id,
                    question_index,
                    payload,
                    feedback,
                    self.clock.now(),
                );
                self.store_record(record);
                SubmitOutcome::Recorded { mode }
            }
            Pending::Nothing => SubmitOutcome::Unanswered,
        };

        self.phase = Phase::ShowingResult;
        debug!(question_index, ?trigger, ?outcome, "answer locked");
        let result = SubmitResult {
            question_index,
            trigger,
            outcome,
        };
        self.last_result = Some(result.clone());
        result
    }

    /// One record per question index; a re-save replaces the old one.
    ///
    /// `lock_in` runs once per visit and `restart` clears the records, so
    /// through the public API each index is written at most once.
    fn store_record(&mut self, record: AnswerRecord) {
        match self
            .records
            .iter_mut()
            .find(|existing| existing.question_index() == record.question_index())
        {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    fn arm_countdown(&mut self) {
        self.cancel_countdown();
        self.visit += 1;
        self.countdown = self.ticker.arm(self.visit);
    }

    fn cancel_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
    }
}

impl Drop for PracticeSession {
    fn drop(&mut self) {
        self.cancel_countdown();
        self.capture.release();
    }
}

impl fmt::Debug for PracticeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticeSession")
            .field("phase", &self.phase)
            .field("job_role", &self.job_role)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("time_remaining", &self.time_remaining)
            .field("score", &self.score)
            .field("records_len", &self.records.len())
            .field("capturing", &self.capture.is_capturing())
            .field("visit", &self.visit)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::practice::capture::fake::FakeMic;
    use prep_core::DeviceError;
    use prep_core::time::fixed_clock;

    fn mcq_set(keys: &[usize]) -> Vec<Question> {
        keys.iter()
            .zip(1_u64..)
            .map(|(key, id)| {
                Question::multiple_choice(
                    QuestionId::new(id),
                    format!("Question {id}"),
                    vec!["a".into(), "b".into(), "c".into()],
                    *key,
                    format!("key is {key}"),
                )
                .unwrap()
            })
            .collect()
    }

    fn free_set(len: u64) -> Vec<Question> {
        (1..=len)
            .map(|id| Question::free_response(QuestionId::new(id), format!("Explain {id}")).unwrap())
            .collect()
    }

    fn started(questions: Vec<Question>, time_limit: u32) -> PracticeSession {
        let mut session = PracticeSession::new(fixed_clock());
        session.begin("Software Engineer", questions, time_limit).unwrap();
        session
    }

    fn answer_all(session: &mut PracticeSession, picks: &[usize]) {
        for (i, pick) in picks.iter().enumerate() {
            session.select_answer(*pick).unwrap();
            session.submit_answer().unwrap();
            let next = session.advance().unwrap();
            if i + 1 < picks.len() {
                assert_eq!(next, Advance::NextQuestion { index: i + 1 });
            }
        }
    }

    #[test]
    fn begin_lands_on_first_question() {
        let session = started(mcq_set(&[0, 1]), 60);
        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.time_remaining(), 60);
        assert_eq!(session.job_role().unwrap().as_str(), "Software Engineer");
    }

    #[test]
    fn begin_validates_input_and_leaves_setup_untouched() {
        let mut session = PracticeSession::new(fixed_clock());

        let err = session.begin("  ", mcq_set(&[0]), 60).unwrap_err();
        assert!(matches!(err, PracticeError::Validation(ValidationError::EmptyJobRole)));

        let err = session.begin("Analyst", Vec::new(), 60).unwrap_err();
        assert!(matches!(err, PracticeError::Validation(ValidationError::EmptyQuestionSet)));

        let err = session.begin("Analyst", mcq_set(&[0]), 0).unwrap_err();
        assert!(matches!(err, PracticeError::Validation(ValidationError::ZeroTimeLimit)));

        assert_eq!(session.phase(), Phase::Setup);
        assert!(session.questions().is_empty());
    }

    #[test]
    fn begin_twice_is_rejected() {
        let mut session = started(mcq_set(&[0]), 60);
        let err = session.begin("Other", mcq_set(&[1, 2]), 30).unwrap_err();
        assert!(matches!(
            err,
            PracticeError::InvalidPhase {
                actual: Phase::InProgress,
                ..
            }
        ));
        assert_eq!(session.questions().len(), 1);
    }

    #[test]
    fn mixed_answers_score_exact_matches() {
        let mut session = started(mcq_set(&[1, 0, 2]), 60);
        answer_all(&mut session, &[1, 2, 2]);

        assert_eq!(session.phase(), Phase::Complete);
        let summary = session.summary();
        assert_eq!(summary.score, 2);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.percent(), 67);
    }

    #[test]
    fn all_correct_and_all_wrong() {
        let keys = [2, 0, 1, 1];
        let mut session = started(mcq_set(&keys), 60);
        answer_all(&mut session, &keys);
        assert_eq!(session.score(), 4);

        let mut session = started(mcq_set(&keys), 60);
        answer_all(&mut session, &[0, 1, 0, 0]);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn score_never_exceeds_questions_seen() {
        let keys = [0, 0, 0];
        let mut session = started(mcq_set(&keys), 60);
        for _ in 0..keys.len() {
            session.select_answer(0).unwrap();
            session.submit_answer().unwrap();
            assert!(session.score() as usize <= session.current_index() + 1);
            session.advance().unwrap();
        }
    }

    #[test]
    fn second_submit_is_locked_and_keeps_score() {
        let mut session = started(mcq_set(&[1, 0]), 60);
        session.select_answer(1).unwrap();
        session.submit_answer().unwrap();
        assert_eq!(session.score(), 1);

        let err = session.submit_answer().unwrap_err();
        assert!(matches!(
            err,
            PracticeError::InvalidPhase {
                actual: Phase::ShowingResult,
                ..
            }
        ));
        assert_eq!(session.score(), 1);
        assert_eq!(session.phase(), Phase::ShowingResult);
    }

    #[test]
    fn selection_is_locked_after_submit() {
        let mut session = started(mcq_set(&[1]), 60);
        session.select_answer(0).unwrap();
        session.submit_answer().unwrap();

        assert!(session.select_answer(1).is_err());
        assert_eq!(session.draft().selected_option, Some(0));
    }

    #[test]
    fn manual_submit_requires_selection() {
        let mut session = started(mcq_set(&[1]), 60);
        let err = session.submit_answer().unwrap_err();
        assert!(matches!(
            err,
            PracticeError::Validation(ValidationError::NoAnswerSelected)
        ));
        assert_eq!(session.phase(), Phase::InProgress);
    }

    #[test]
    fn out_of_range_option_is_rejected() {
        let mut session = started(mcq_set(&[1]), 60);
        let err = session.select_answer(3).unwrap_err();
        assert!(matches!(
            err,
            PracticeError::Validation(ValidationError::OptionOutOfRange { index: 3, len: 3 })
        ));
        assert_eq!(session.draft().selected_option, None);
    }

    #[test]
    fn submit_reports_key_and_explanation() {
        let mut session = started(mcq_set(&[2]), 60);
        session.select_answer(0).unwrap();
        let result = session.submit_answer().unwrap();
        assert_eq!(
            result.outcome,
            SubmitOutcome::Scored {
                selected: Some(0),
                correct_answer: 2,
                is_correct: false,
                explanation: "key is 2".into(),
            }
        );
        assert_eq!(result.trigger, SubmitTrigger::Manual);
        assert_eq!(session.last_result(), Some(&result));
    }

    #[test]
    fn sixty_ticks_auto_submit_exactly_once() {
        let mut session = started(mcq_set(&[1, 0]), 60);
        session.select_answer(1).unwrap();

        let mut auto_submits = 0;
        let mut previous = session.time_remaining();
        for _ in 0..60 {
            match session.tick() {
                TickOutcome::Counting { remaining } => {
                    assert!(remaining < previous);
                    previous = remaining;
                }
                TickOutcome::AutoSubmitted(result) => {
                    auto_submits += 1;
                    assert_eq!(result.trigger, SubmitTrigger::Timeout);
                }
                TickOutcome::Ignored => panic!("tick ignored while in progress"),
            }
        }
        assert_eq!(auto_submits, 1);
        assert_eq!(session.phase(), Phase::ShowingResult);
        assert_eq!(session.score(), 1);

        // Further ticks do nothing once the answer is locked.
        assert_eq!(session.tick(), TickOutcome::Ignored);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn timeout_without_selection_scores_zero() {
        let mut session = started(mcq_set(&[1]), 3);
        session.tick();
        session.tick();
        let TickOutcome::AutoSubmitted(result) = session.tick() else {
            panic!("expected auto submit");
        };
        assert!(matches!(
            result.outcome,
            SubmitOutcome::Scored {
                selected: None,
                is_correct: false,
                ..
            }
        ));
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn advance_resets_timer_and_clears_draft() {
        let mut session = started(mcq_set(&[1, 0]), 10);
        session.tick();
        session.tick();
        session.select_answer(1).unwrap();
        session.submit_answer().unwrap();

        session.advance().unwrap();
        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.time_remaining(), 10);
        assert_eq!(session.draft().selected_option, None);
    }

    #[test]
    fn advance_from_last_question_completes() {
        let mut session = started(mcq_set(&[0]), 60);
        session.select_answer(0).unwrap();
        session.submit_answer().unwrap();
        let next = session.advance().unwrap();
        assert_eq!(
            next,
            Advance::Completed(SessionSummary::Scored(ScoreSummary::new(1, 1)))
        );
        assert_eq!(session.phase(), Phase::Complete);
        assert!(session.current_question().is_none());

        assert!(session.advance().is_err());
        assert_eq!(session.tick(), TickOutcome::Ignored);
        assert_eq!(session.phase(), Phase::Complete);
    }

    #[test]
    fn advance_requires_locked_answer() {
        let mut session = started(mcq_set(&[0, 1]), 60);
        assert!(session.advance().is_err());
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn restart_from_every_phase_resets_everything() {
        let mut setup = PracticeSession::new(fixed_clock());
        setup.restart();
        assert_eq!(setup.phase(), Phase::Setup);

        let mut in_progress = started(free_set(2), 60);
        in_progress.set_text_answer("draft").unwrap();
        in_progress.restart();

        let mut showing = started(free_set(2), 60);
        showing.set_text_answer("saved").unwrap();
        showing.submit_answer().unwrap();
        showing.restart();

        let mut complete = started(mcq_set(&[0]), 60);
        complete.select_answer(0).unwrap();
        complete.submit_answer().unwrap();
        complete.advance().unwrap();
        complete.restart();

        for session in [&setup, &in_progress, &showing, &complete] {
            assert_eq!(session.phase(), Phase::Setup);
            assert_eq!(session.score(), 0);
            assert_eq!(session.current_index(), 0);
            assert!(session.records().is_empty());
            assert!(session.questions().is_empty());
            assert!(session.job_role().is_none());
        }
    }

    #[test]
    fn free_response_text_answer_is_recorded() {
        let mut session = started(free_set(2), 60);
        session.set_text_answer("  Arrays are contiguous.  ").unwrap();
        let result = session.submit_answer().unwrap();
        assert_eq!(
            result.outcome,
            SubmitOutcome::Recorded {
                mode: AnswerMode::Text
            }
        );

        let record = session.record_for(0).unwrap();
        assert_eq!(record.question_id(), QuestionId::new(1));
        assert_eq!(record.modality(), AnswerMode::Text);
        assert_eq!(
            record.payload(),
            &AnswerPayload::Text("Arrays are contiguous.".into())
        );
        assert!(record.playback().is_none());
    }

    #[test]
    fn free_response_requires_text() {
        let mut session = started(free_set(1), 60);
        session.set_text_answer("   ").unwrap();
        let err = session.submit_answer().unwrap_err();
        assert!(matches!(
            err,
            PracticeError::Validation(ValidationError::EmptyTextAnswer)
        ));
        assert_eq!(session.phase(), Phase::InProgress);
        assert!(session.records().is_empty());
    }

    #[test]
    fn each_question_keeps_a_single_record() {
        let mut session = started(free_set(2), 60);
        session.set_text_answer("first").unwrap();
        session.submit_answer().unwrap();

        // Editing and submitting again on the same visit is refused.
        assert!(session.set_text_answer("second").is_err());
        assert!(session.submit_answer().is_err());
        assert_eq!(session.records().len(), 1);
        assert_eq!(
            session.records()[0].payload(),
            &AnswerPayload::Text("first".into())
        );

        session.advance().unwrap();
        session.set_text_answer("other").unwrap();
        session.submit_answer().unwrap();
        let indices: Vec<usize> = session
            .records()
            .iter()
            .map(AnswerRecord::question_index)
            .collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn free_response_set_completes_with_saved_answers() {
        let mut session = started(free_set(3), 1);
        session.set_text_answer("one").unwrap();
        session.submit_answer().unwrap();
        session.advance().unwrap();
        // Second question times out empty.
        session.tick();
        session.advance().unwrap();
        session.set_text_answer("three").unwrap();
        session.submit_answer().unwrap();

        let Advance::Completed(SessionSummary::Answered(summary)) = session.advance().unwrap()
        else {
            panic!("expected answered summary");
        };
        assert_eq!(
            summary.answers,
            vec![Some(AnswerMode::Text), None, Some(AnswerMode::Text)]
        );
        assert_eq!(summary.saved(), 2);
        assert_eq!(session.phase(), Phase::Complete);
    }

    #[test]
    fn free_response_timeout_without_answer_saves_nothing() {
        let mut session = started(free_set(1), 1);
        let TickOutcome::AutoSubmitted(result) = session.tick() else {
            panic!("expected auto submit");
        };
        assert_eq!(result.outcome, SubmitOutcome::Unanswered);
        assert!(session.records().is_empty());
        assert_eq!(session.phase(), Phase::ShowingResult);
    }

    #[test]
    fn audio_answer_is_recorded_with_playback_handle() {
        let mic = Arc::new(FakeMic::default());
        let mut session = PracticeSession::new(fixed_clock()).with_audio_input(mic.clone());
        session.begin("Data Scientist", free_set(2), 60).unwrap();

        session.start_capture().unwrap();
        assert!(mic.is_held());

        // Payload is not usable while still recording.
        let err = session.submit_answer().unwrap_err();
        assert!(matches!(
            err,
            PracticeError::Validation(ValidationError::NoAudioRecorded)
        ));
        assert!(session.is_capturing());

        let playback = session.stop_capture().unwrap().playback();
        assert!(!mic.is_held());

        session.submit_answer().unwrap();
        let record = session.record_for(0).unwrap();
        assert_eq!(record.modality(), AnswerMode::Audio);
        assert_eq!(record.playback(), Some(playback));
    }

    #[test]
    fn second_capture_is_rejected_first_stays_active() {
        let mic = Arc::new(FakeMic::default());
        let mut session = PracticeSession::new(fixed_clock()).with_audio_input(mic.clone());
        session.begin("Developer", free_set(1), 60).unwrap();

        session.start_capture().unwrap();
        let err = session.start_capture().unwrap_err();
        assert!(matches!(
            err,
            PracticeError::Device(DeviceError::CaptureAlreadyActive)
        ));
        assert!(session.is_capturing());
        assert!(mic.is_held());
        assert_eq!(session.phase(), Phase::InProgress);
    }

    #[test]
    fn device_errors_leave_phase_alone() {
        let mut session = started(free_set(1), 60);
        let err = session.start_capture().unwrap_err();
        assert!(matches!(err, PracticeError::Device(DeviceError::Unavailable)));
        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(session.draft().mode, AnswerMode::Text);
    }

    #[test]
    fn capture_is_released_on_every_exit() {
        let mic = Arc::new(FakeMic::default());

        let mut session = PracticeSession::new(fixed_clock()).with_audio_input(mic.clone());
        session.begin("Developer", free_set(2), 60).unwrap();
        session.start_capture().unwrap();
        session.restart();
        assert!(!mic.is_held());

        let mut session = PracticeSession::new(fixed_clock()).with_audio_input(mic.clone());
        session.begin("Developer", free_set(2), 60).unwrap();
        session.start_capture().unwrap();
        session.set_answer_mode(AnswerMode::Text).unwrap();
        assert!(!mic.is_held());

        session.start_capture().unwrap();
        drop(session);
        assert!(!mic.is_held());
    }

    #[test]
    fn timeout_mid_recording_keeps_the_take() {
        let mic = Arc::new(FakeMic::default());
        let mut session = PracticeSession::new(fixed_clock()).with_audio_input(mic.clone());
        session.begin("Developer", free_set(1), 1).unwrap();
        session.start_capture().unwrap();

        let TickOutcome::AutoSubmitted(result) = session.tick() else {
            panic!("expected auto submit");
        };
        assert_eq!(
            result.outcome,
            SubmitOutcome::Recorded {
                mode: AnswerMode::Audio
            }
        );
        assert!(!mic.is_held());
        assert_eq!(session.records().len(), 1);
    }

    #[test]
    fn stale_ticks_are_ignored() {
        let mut session = started(mcq_set(&[0, 0]), 5);
        let stale = Tick {
            visit: session.visit(),
        };
        session.select_answer(0).unwrap();
        session.submit_answer().unwrap();
        session.advance().unwrap();

        assert_eq!(session.on_tick(stale), TickOutcome::Ignored);
        assert_eq!(session.time_remaining(), 5);

        let fresh = Tick {
            visit: session.visit(),
        };
        assert_eq!(session.on_tick(fresh), TickOutcome::Counting { remaining: 4 });
    }

    #[test]
    fn feedback_is_attached_to_audio_record() {
        let mic = Arc::new(FakeMic::default());
        let mut session = PracticeSession::new(fixed_clock()).with_audio_input(mic);
        session.begin("Developer", free_set(1), 60).unwrap();
        session.start_capture().unwrap();
        session.stop_capture().unwrap();

        let feedback = AnswerFeedback {
            transcription: "a heap is a tree".into(),
            feedback: "Mention the heap property.".into(),
        };
        session.submit_answer_with_feedback(feedback.clone()).unwrap();
        assert_eq!(session.record_for(0).unwrap().feedback(), Some(&feedback));
    }

    #[test]
    fn progress_tracks_position() {
        let mut session = started(mcq_set(&[0, 0, 0, 0]), 30);
        session.select_answer(0).unwrap();
        session.submit_answer().unwrap();
        session.advance().unwrap();
        let progress = session.progress().unwrap();
        assert_eq!(progress.position, 2);
        assert_eq!(progress.total, 4);
        assert_eq!(progress.percent_through(), 50);
        assert_eq!(progress.score, 1);
    }
}
