use std::fmt;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use prep_core::model::{AnswerMode, AnswerSummary, ScoreSummary, SessionContext, SessionSummary};
use services::api::QuestionStyle;
use services::practice::{
    AudioFileInput, AudioInput, NoAudioInput, PracticeCommand, PracticeEvent, PracticeRunner,
    PracticeSession, QuestionView, SubmitOutcome, SubmitResult, SubmitTrigger, Ticker,
};
use services::{ApiConfig, AppServices, Clock, PracticeSettings, QuestionSourceKind};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidApiUrl { raw: String, reason: String },
    InvalidNumber { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidApiUrl { raw, reason } => {
                write!(f, "invalid API base url {raw:?}: {reason}")
            }
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

/// A count or duration flag; zero is rejected along with non-numbers.
fn require_positive<T: std::str::FromStr + Default + PartialEq>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let raw = require_value(args, flag)?;
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        _ => Err(ArgsError::InvalidNumber { flag, raw }),
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  prep signin   [--email <email>]");
    eprintln!("  prep signup   [--name <name>] [--email <email>]");
    eprintln!("  prep signout");
    eprintln!("  prep whoami");
    eprintln!("  prep aptitude [--role <job role>] [--count <n>] [--time-limit <secs>]");
    eprintln!("  prep practice [--role <job role>] [--count <n>] [--time-limit <secs>] [--offline]");
    eprintln!("                [--audio-file <clip>]");
    eprintln!();
    eprintln!("Common flags:");
    eprintln!("  --api <url>   API base url (default http://localhost:5000/api)");
    eprintln!("  --db <url>    credential store (default sqlite://prep.sqlite3)");
    eprintln!();
    eprintln!("A spoken answer is read from --audio-file (webm, ogg, wav or mp3) when you type");
    eprintln!(":stop, so the clip can be re-recorded between questions.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PREP_API_BASE, PREP_DB_URL, PREP_TIME_LIMIT_SECS, PREP_QUESTION_COUNT, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    SignIn,
    SignUp,
    SignOut,
    WhoAmI,
    Aptitude,
    Practice,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "signin" => Some(Self::SignIn),
            "signup" => Some(Self::SignUp),
            "signout" => Some(Self::SignOut),
            "whoami" => Some(Self::WhoAmI),
            "aptitude" => Some(Self::Aptitude),
            "practice" => Some(Self::Practice),
            _ => None,
        }
    }

    fn style(self) -> Option<QuestionStyle> {
        match self {
            Self::Aptitude => Some(QuestionStyle::MultipleChoice),
            Self::Practice => Some(QuestionStyle::FreeResponse),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    api: ApiConfig,
    settings: PracticeSettings,
    source: QuestionSourceKind,
    role: Option<String>,
    name: Option<String>,
    email: Option<String>,
    audio_file: Option<PathBuf>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("PREP_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://prep.sqlite3".into(), normalize_sqlite_url);
        let mut settings = PracticeSettings::from_env();
        let mut api_base = None;
        let mut source = QuestionSourceKind::Remote;
        let mut role = None;
        let mut name = None;
        let mut email = None;
        let mut audio_file = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--api" => api_base = Some(require_value(args, "--api")?),
                "--role" => role = Some(require_value(args, "--role")?),
                "--name" => name = Some(require_value(args, "--name")?),
                "--email" => email = Some(require_value(args, "--email")?),
                "--time-limit" => {
                    settings.time_limit_secs = require_positive(args, "--time-limit")?;
                }
                "--count" => {
                    let count = require_positive(args, "--count")?;
                    settings.mcq_count = count;
                    settings.free_response_count = count;
                }
                "--offline" => source = QuestionSourceKind::Offline,
                "--audio-file" => {
                    audio_file = Some(PathBuf::from(require_value(args, "--audio-file")?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let api = match api_base {
            Some(raw) => ApiConfig::new(&raw).map_err(|err| ArgsError::InvalidApiUrl {
                raw,
                reason: err.to_string(),
            })?,
            None => ApiConfig::from_env().map_err(|err| ArgsError::InvalidApiUrl {
                raw: std::env::var("PREP_API_BASE").unwrap_or_default(),
                reason: err.to_string(),
            })?,
        };

        Ok(Self {
            db_url,
            api,
            settings,
            source,
            role,
            name,
            email,
            audio_file,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

//
// ─── TERMINAL INPUT ────────────────────────────────────────────────────────────
//

/// Print `label` and read one trimmed line from stdin. Empty on EOF.
async fn prompt(label: &'static str) -> Result<String, Box<dyn std::error::Error>> {
    let line = tokio::task::spawn_blocking(move || -> std::io::Result<String> {
        let mut out = std::io::stdout();
        write!(out, "{label}")?;
        out.flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_owned())
    })
    .await??;
    Ok(line)
}

async fn value_or_prompt(
    value: Option<String>,
    label: &'static str,
) -> Result<String, Box<dyn std::error::Error>> {
    match value {
        Some(value) => Ok(value),
        None => prompt(label).await,
    }
}

/// Translate one line typed during a session into runner commands.
///
/// `None` means the line was not understood.
fn parse_line(line: &str, style: QuestionStyle, job_role: &str) -> Option<Vec<PracticeCommand>> {
    let line = line.trim();
    let commands = match line {
        "" => vec![PracticeCommand::Advance],
        ":q" | ":quit" => vec![PracticeCommand::Quit],
        ":r" | ":restart" => vec![
            PracticeCommand::Restart,
            PracticeCommand::Begin {
                job_role: job_role.to_owned(),
                style,
            },
        ],
        ":rec" | ":record" => vec![PracticeCommand::StartCapture],
        ":stop" => vec![PracticeCommand::StopCapture],
        ":text" => vec![PracticeCommand::SetMode(AnswerMode::Text)],
        ":submit" => vec![PracticeCommand::Submit],
        ":feedback" => vec![PracticeCommand::SubmitForFeedback],
        _ if line.starts_with(':') => return None,
        _ => match style {
            QuestionStyle::MultipleChoice => {
                let choice = line.parse::<usize>().ok().filter(|n| *n > 0)?;
                vec![PracticeCommand::Select(choice - 1), PracticeCommand::Submit]
            }
            QuestionStyle::FreeResponse => vec![
                PracticeCommand::Text(line.to_owned()),
                PracticeCommand::Submit,
            ],
        },
    };
    Some(commands)
}

fn print_session_help(style: QuestionStyle) {
    match style {
        QuestionStyle::MultipleChoice => println!("Type an option number to answer."),
        QuestionStyle::FreeResponse => {
            println!("Type your answer, or :record / :stop / :feedback for a spoken one.");
        }
    }
    println!("Enter moves on, :restart starts over, :quit leaves.");
}

/// Stdin is read on a plain thread so a pending read never holds up shutdown.
fn spawn_reader(commands: mpsc::Sender<PracticeCommand>, style: QuestionStyle, job_role: String) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let Some(parsed) = parse_line(&line, style, &job_role) else {
                print_session_help(style);
                continue;
            };
            for command in parsed {
                if commands.blocking_send(command).is_err() {
                    return;
                }
            }
        }
        let _ = commands.blocking_send(PracticeCommand::Quit);
    });
}

//
// ─── TERMINAL OUTPUT ───────────────────────────────────────────────────────────
//

fn print_question(view: &QuestionView) {
    println!();
    match &view.topic {
        Some(topic) => println!("Question {}/{} [{topic}]", view.index + 1, view.total),
        None => println!("Question {}/{}", view.index + 1, view.total),
    }
    println!("{}", view.prompt);
    for (i, option) in view.options.iter().enumerate() {
        println!("  {}) {option}", i + 1);
    }
    println!("You have {}s.", view.time_limit);
}

fn print_result(result: &SubmitResult) {
    if result.trigger == SubmitTrigger::Timeout {
        println!("Time's up!");
    }
    match &result.outcome {
        SubmitOutcome::Scored {
            is_correct: true,
            explanation,
            ..
        } => {
            println!("Correct!");
            print_explanation(explanation);
        }
        SubmitOutcome::Scored {
            correct_answer,
            explanation,
            ..
        } => {
            println!("Incorrect. The answer was option {}.", correct_answer + 1);
            print_explanation(explanation);
        }
        SubmitOutcome::Recorded { mode } => {
            let kind = match mode {
                AnswerMode::Text => "Typed",
                AnswerMode::Audio => "Spoken",
            };
            println!("{kind} answer saved.");
        }
        SubmitOutcome::Unanswered => println!("No answer was saved for this question."),
    }
    println!("Press Enter for the next question.");
}

fn print_explanation(explanation: &str) {
    if !explanation.trim().is_empty() {
        println!("{explanation}");
    }
}

fn print_score(score: &ScoreSummary) {
    println!(
        "Finished! Score: {}/{} ({}%).",
        score.score,
        score.total,
        score.percent()
    );
}

fn print_answers(answers: &AnswerSummary) {
    println!(
        "End of questions. {} of {} answers saved.",
        answers.saved(),
        answers.total()
    );
    for (i, slot) in answers.answers.iter().enumerate() {
        let kind = match slot {
            Some(AnswerMode::Text) => "typed",
            Some(AnswerMode::Audio) => "spoken",
            None => "skipped",
        };
        println!("  {}) {kind}", i + 1);
    }
}

async fn print_events(mut events: mpsc::UnboundedReceiver<PracticeEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            PracticeEvent::Started { job_role, total } => {
                println!("Practice for {job_role}: {total} questions.");
            }
            PracticeEvent::QuestionShown(view) => print_question(&view),
            PracticeEvent::TimeRemaining(left) if left > 0 && (left % 15 == 0 || left <= 5) => {
                println!("  {left}s left");
            }
            PracticeEvent::TimeRemaining(_) => {}
            PracticeEvent::Submitted(result) => print_result(&result),
            PracticeEvent::CaptureStarted => println!("Recording... type :stop when done."),
            PracticeEvent::CaptureStopped {
                recorded_secs,
                playback,
            } => println!("Recorded {recorded_secs}s ({playback})."),
            PracticeEvent::Feedback(review) => {
                println!("Transcription: {}", review.transcription);
                println!("Feedback: {}", review.feedback);
            }
            PracticeEvent::Completed(summary) => {
                println!();
                match &summary {
                    SessionSummary::Scored(score) => print_score(score),
                    SessionSummary::Answered(answers) => print_answers(answers),
                }
                println!("Type :restart to go again or :quit to leave.");
            }
            PracticeEvent::Restarted => println!("Starting over."),
            PracticeEvent::Rejected(message) => eprintln!("! {message}"),
        }
    }
}

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

fn audio_input(audio_file: Option<PathBuf>) -> Arc<dyn AudioInput> {
    match audio_file {
        Some(path) => Arc::new(AudioFileInput::new(path)),
        None => Arc::new(NoAudioInput),
    }
}

async fn run_practice(
    services: &AppServices,
    context: SessionContext,
    style: QuestionStyle,
    role: Option<String>,
    audio_file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let job_role = value_or_prompt(role, "Job role: ").await?;

    let (ticker, ticks) = Ticker::interval(Handle::current(), Duration::from_secs(1));
    let session = PracticeSession::new(services.clock())
        .with_ticker(ticker)
        .with_audio_input(audio_input(audio_file));
    let (runner, events) =
        PracticeRunner::new((*services.practice()).clone(), session, context, ticks);
    let (commands, rx) = mpsc::channel(16);

    commands
        .send(PracticeCommand::Begin {
            job_role: job_role.clone(),
            style,
        })
        .await?;
    print_session_help(style);
    let printer = tokio::spawn(print_events(events));
    spawn_reader(commands, style, job_role);

    let session = runner.run(rx).await;
    debug!(?session, "session ended");
    drop(session);
    printer.await?;
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let mut iter = argv.into_iter().skip(1);
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(
        &parsed.db_url,
        Clock::system(),
        parsed.api,
        parsed.settings,
        parsed.source,
    )
    .await?;
    let auth = services.auth();
    info!(command = ?cmd, "starting");

    match cmd {
        Command::SignIn => {
            let email = value_or_prompt(parsed.email, "Email: ").await?;
            let password = prompt("Password: ").await?;
            let context = auth.sign_in(&email, &password).await?;
            println!("Welcome back, {}!", context.display_name());
        }
        Command::SignUp => {
            let name = value_or_prompt(parsed.name, "Full name: ").await?;
            let email = value_or_prompt(parsed.email, "Email: ").await?;
            let password = prompt("Password (at least 8 characters): ").await?;
            let context = auth.sign_up(&name, &email, &password).await?;
            println!("Account created. Hi, {}!", context.display_name());
        }
        Command::SignOut => {
            auth.sign_out().await?;
            println!("Signed out.");
        }
        Command::WhoAmI => match auth.load_context().await? {
            SessionContext::SignedIn(credentials) => {
                let user = credentials.user();
                match &user.email {
                    Some(email) => println!("{} <{email}>", user.name),
                    None => println!("{}", user.name),
                }
            }
            _ => println!("Not signed in."),
        },
        Command::Aptitude | Command::Practice => {
            let context = auth.load_context().await?;
            let style = cmd.style().unwrap_or(QuestionStyle::FreeResponse);
            run_practice(&services, context, style, parsed.role, parsed.audio_file).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
