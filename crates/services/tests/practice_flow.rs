use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use prep_core::model::{
    AnswerFeedback, CapturedAudio, Credentials, Phase, Question, QuestionId, SessionContext,
    SessionSummary, UserProfile,
};
use prep_core::time::{fixed_clock, fixed_now};
use services::api::{AnswerReviewer, QuestionRequest, QuestionSource, QuestionStyle};
use services::config::DEFAULT_API_BASE;
use services::practice::{Advance, AudioFileInput, SubmitTrigger, Ticker};
use services::{
    ApiConfig, AppServices, BuiltinQuestionBank, CollaboratorError, PracticeCommand, PracticeEvent, PracticeLoopService,
    PracticeRunner, PracticeSession, PracticeSettings, QuestionSourceKind,
};
use storage::repository::Storage;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

struct AptitudeStub;

#[async_trait]
impl QuestionSource for AptitudeStub {
    async fn fetch_questions(
        &self,
        request: &QuestionRequest,
        _context: &SessionContext,
    ) -> Result<Vec<Question>, CollaboratorError> {
        assert_eq!(request.style, QuestionStyle::MultipleChoice);
        let keys = [1, 0, 2];
        Ok(keys
            .iter()
            .zip(1_u64..)
            .map(|(key, id)| {
                Question::multiple_choice(
                    QuestionId::new(id),
                    format!("Aptitude {id}"),
                    vec!["10".into(), "20".into(), "30".into()],
                    *key,
                    String::new(),
                )
                .unwrap()
            })
            .collect())
    }
}

struct SilentReviewer;

#[async_trait]
impl AnswerReviewer for SilentReviewer {
    async fn review_answer(
        &self,
        _prompt: &str,
        _audio: &CapturedAudio,
        _context: &SessionContext,
    ) -> Result<AnswerFeedback, CollaboratorError> {
        Err(CollaboratorError::Unsupported("no reviewer in tests"))
    }
}

/// Reports what it was sent instead of transcribing it.
struct EchoReviewer;

#[async_trait]
impl AnswerReviewer for EchoReviewer {
    async fn review_answer(
        &self,
        prompt: &str,
        audio: &CapturedAudio,
        _context: &SessionContext,
    ) -> Result<AnswerFeedback, CollaboratorError> {
        Ok(AnswerFeedback {
            transcription: format!("{} bytes of {}", audio.bytes().len(), audio.mime_type()),
            feedback: format!("answered: {prompt}"),
        })
    }
}

fn signed_in() -> SessionContext {
    SessionContext::SignedIn(Credentials::new(
        "token",
        UserProfile {
            name: "Lin".into(),
            email: None,
        },
        fixed_now(),
    ))
}

#[tokio::test]
async fn aptitude_round_scores_two_of_three() {
    let service = PracticeLoopService::new(
        Arc::new(AptitudeStub),
        Arc::new(SilentReviewer),
        PracticeSettings::default(),
    );
    let mut session = PracticeSession::new(fixed_clock());
    service
        .begin(&mut session, &signed_in(), "QA Engineer", QuestionStyle::MultipleChoice)
        .await
        .unwrap();

    let mut finished = None;
    for pick in [1, 2, 2] {
        session.select_answer(pick).unwrap();
        session.submit_answer().unwrap();
        if let Advance::Completed(SessionSummary::Scored(summary)) = session.advance().unwrap() {
            finished = Some(summary);
        }
    }

    let summary = finished.unwrap();
    assert_eq!((summary.score, summary.total), (2, 3));
    assert_eq!(summary.percent(), 67);

    session.restart();
    assert_eq!(session.phase(), Phase::Setup);
    assert_eq!(session.score(), 0);
}

#[tokio::test(start_paused = true)]
async fn offline_practice_through_app_services() {
    let services = AppServices::with_storage(
        &Storage::in_memory(),
        fixed_clock(),
        ApiConfig::new(DEFAULT_API_BASE).unwrap(),
        PracticeSettings {
            time_limit_secs: 5,
            mcq_count: 10,
            free_response_count: 2,
        },
        QuestionSourceKind::Offline,
    );
    let context = services.auth().load_context().await.unwrap();

    let (ticker, ticks) = Ticker::interval(Handle::current(), Duration::from_secs(1));
    let session = PracticeSession::new(services.clock()).with_ticker(ticker);
    let (runner, mut events) =
        PracticeRunner::new((*services.practice()).clone(), session, context, ticks);
    let (commands, rx) = mpsc::channel(8);

    let drive = async {
        commands
            .send(PracticeCommand::Begin {
                job_role: "Software Developer".into(),
                style: QuestionStyle::FreeResponse,
            })
            .await
            .unwrap();
        commands
            .send(PracticeCommand::Text("A linked list chases pointers.".into()))
            .await
            .unwrap();
        // Let the first question run out with the typed answer still in the draft.
        tokio::time::sleep(Duration::from_secs(6)).await;
        commands.send(PracticeCommand::Advance).await.unwrap();
        commands.send(PracticeCommand::Text("O(log n).".into())).await.unwrap();
        commands.send(PracticeCommand::Submit).await.unwrap();
        commands.send(PracticeCommand::Advance).await.unwrap();
        commands.send(PracticeCommand::Quit).await.unwrap();
    };
    let (session, ()) = tokio::join!(runner.run(rx), drive);

    let mut submitted = Vec::new();
    let mut completed = None;
    while let Ok(event) = events.try_recv() {
        match event {
            PracticeEvent::Submitted(result) => submitted.push(result.trigger),
            PracticeEvent::Completed(summary) => completed = Some(summary),
            _ => {}
        }
    }
    assert_eq!(submitted, [SubmitTrigger::Timeout, SubmitTrigger::Manual]);
    let Some(SessionSummary::Answered(answers)) = completed else {
        panic!("free-response session should report saved answers");
    };
    assert_eq!((answers.saved(), answers.total()), (2, 2));
    assert_eq!(session.phase(), Phase::Complete);
    assert_eq!(session.records().len(), 2);
}

#[tokio::test]
async fn recorded_clip_is_reviewed_as_spoken_answer() {
    let clip = std::env::temp_dir().join(format!("prep-flow-{}.webm", std::process::id()));
    std::fs::write(&clip, [0x1a, 0x45, 0xdf, 0xa3, 0x01]).unwrap();

    let service = PracticeLoopService::new(
        Arc::new(BuiltinQuestionBank::new()),
        Arc::new(EchoReviewer),
        PracticeSettings::default(),
    );
    let mut session =
        PracticeSession::new(fixed_clock()).with_audio_input(Arc::new(AudioFileInput::new(&clip)));
    service
        .begin(&mut session, &signed_in(), "Backend Developer", QuestionStyle::FreeResponse)
        .await
        .unwrap();

    session.start_capture().unwrap();
    let audio = session.stop_capture().unwrap();
    assert_eq!(audio.mime_type(), "audio/webm");
    assert_eq!(audio.bytes().len(), 5);

    service.submit_for_feedback(&mut session, &signed_in()).await.unwrap();
    let record = session.record_for(0).unwrap();
    let feedback = record.feedback().unwrap();
    assert_eq!(feedback.transcription, "5 bytes of audio/webm");
    assert!(!session.is_capturing());

    std::fs::remove_file(clip).unwrap();
}
