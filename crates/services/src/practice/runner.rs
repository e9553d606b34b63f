use prep_core::model::{
    AnswerFeedback, AnswerMode, PlaybackHandle, Question, SessionContext, SessionSummary,
};
use tokio::sync::mpsc;
use tracing::debug;

use super::countdown::Tick;
use super::session::{Advance, PracticeSession, SubmitResult, TickOutcome};
use super::workflow::PracticeLoopService;
use crate::api::QuestionStyle;
use crate::error::PracticeError;

/// Input from whoever drives the session (a terminal, a test).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PracticeCommand {
    Begin { job_role: String, style: QuestionStyle },
    Select(usize),
    SetMode(AnswerMode),
    Text(String),
    StartCapture,
    StopCapture,
    Submit,
    SubmitForFeedback,
    Advance,
    Restart,
    Quit,
}

/// The question on screen, flattened for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub prompt: String,
    pub topic: Option<String>,
    pub options: Vec<String>,
    pub time_limit: u32,
}

impl QuestionView {
    fn new(question: &Question, index: usize, total: usize, time_limit: u32) -> Self {
        Self {
            index,
            total,
            prompt: question.prompt().to_owned(),
            topic: question.topic().map(str::to_owned),
            options: question
                .choices()
                .map(|choices| choices.options().to_vec())
                .unwrap_or_default(),
            time_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PracticeEvent {
    Started { job_role: String, total: usize },
    QuestionShown(QuestionView),
    TimeRemaining(u32),
    Submitted(SubmitResult),
    CaptureStarted,
    CaptureStopped {
        recorded_secs: u32,
        playback: PlaybackHandle,
    },
    Feedback(AnswerFeedback),
    Completed(SessionSummary),
    Restarted,
    /// A command that could not be applied; the session did not change.
    Rejected(String),
}

/// Event loop around one `PracticeSession`.
///
/// Multiplexes user commands with countdown ticks so a question times out
/// even when nobody types anything.
pub struct PracticeRunner {
    service: PracticeLoopService,
    session: PracticeSession,
    context: SessionContext,
    ticks: mpsc::UnboundedReceiver<Tick>,
    events: mpsc::UnboundedSender<PracticeEvent>,
}

impl PracticeRunner {
    /// `ticks` must be the receiver paired with the session's ticker.
    #[must_use]
    pub fn new(
        service: PracticeLoopService,
        session: PracticeSession,
        context: SessionContext,
        ticks: mpsc::UnboundedReceiver<Tick>,
    ) -> (Self, mpsc::UnboundedReceiver<PracticeEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                service,
                session,
                context,
                ticks,
                events,
            },
            rx,
        )
    }

    /// Run until `Quit` or until the command channel closes. Returns the
    /// session for inspection.
    pub async fn run(mut self, mut commands: mpsc::Receiver<PracticeCommand>) -> PracticeSession {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    None | Some(PracticeCommand::Quit) => break,
                    Some(command) => self.handle(command).await,
                },
                Some(tick) = self.ticks.recv() => self.on_tick(tick),
            }
        }
        debug!(phase = %self.session.phase(), "practice runner stopped");
        self.session
    }

    async fn handle(&mut self, command: PracticeCommand) {
        if let Err(err) = self.apply(command).await {
            debug!(%err, "command rejected");
            self.emit(PracticeEvent::Rejected(err.to_string()));
        }
    }

    async fn apply(&mut self, command: PracticeCommand) -> Result<(), PracticeError> {
        match command {
            PracticeCommand::Begin { job_role, style } => {
                self.service
                    .begin(&mut self.session, &self.context, &job_role, style)
                    .await?;
                let job_role = self
                    .session
                    .job_role()
                    .map(|role| role.as_str().to_owned())
                    .unwrap_or_default();
                let total = self.session.questions().len();
                self.emit(PracticeEvent::Started { job_role, total });
                self.show_question();
            }
            PracticeCommand::Select(index) => self.session.select_answer(index)?,
            PracticeCommand::SetMode(mode) => self.session.set_answer_mode(mode)?,
            PracticeCommand::Text(text) => self.session.set_text_answer(text)?,
            PracticeCommand::StartCapture => {
                self.session.start_capture()?;
                self.emit(PracticeEvent::CaptureStarted);
            }
            PracticeCommand::StopCapture => {
                let audio = self.session.stop_capture()?;
                let event = PracticeEvent::CaptureStopped {
                    recorded_secs: audio.recorded_secs(),
                    playback: audio.playback(),
                };
                self.emit(event);
            }
            PracticeCommand::Submit => {
                let result = self.session.submit_answer()?;
                self.emit(PracticeEvent::Submitted(result));
            }
            PracticeCommand::SubmitForFeedback => {
                let result = self
                    .service
                    .submit_for_feedback(&mut self.session, &self.context)
                    .await?;
                let feedback = self
                    .session
                    .record_for(result.question_index)
                    .and_then(|record| record.feedback())
                    .cloned();
                self.emit(PracticeEvent::Submitted(result));
                if let Some(feedback) = feedback {
                    self.emit(PracticeEvent::Feedback(feedback));
                }
            }
            PracticeCommand::Advance => match self.session.advance()? {
                Advance::NextQuestion { .. } => self.show_question(),
                Advance::Completed(summary) => self.emit(PracticeEvent::Completed(summary)),
            },
            PracticeCommand::Restart => {
                self.session.restart();
                self.emit(PracticeEvent::Restarted);
            }
            PracticeCommand::Quit => {}
        }
        Ok(())
    }

    fn on_tick(&mut self, tick: Tick) {
        match self.session.on_tick(tick) {
            TickOutcome::Ignored => {}
            TickOutcome::Counting { remaining } => {
                self.emit(PracticeEvent::TimeRemaining(remaining));
            }
            TickOutcome::AutoSubmitted(result) => {
                self.emit(PracticeEvent::TimeRemaining(0));
                self.emit(PracticeEvent::Submitted(result));
            }
        }
    }

    fn show_question(&self) {
        let total = self.session.questions().len();
        let index = self.session.current_index();
        if let Some(question) = self.session.current_question() {
            let view = QuestionView::new(question, index, total, self.session.time_limit());
            self.emit(PracticeEvent::QuestionShown(view));
        }
    }

    fn emit(&self, event: PracticeEvent) {
        // Nobody listening is fine; the session still advances.
        let _ = self.events.send(event);
    }
}
