//! Practice session controller, its countdown and capture sub-flows, and the
//! loop that feeds it commands and ticks.

mod audio_file;
pub mod capture;
pub mod countdown;
mod progress;
mod runner;
mod session;
mod workflow;

pub use audio_file::AudioFileInput;
pub use capture::{AudioInput, AudioStream, CaptureController, NoAudioInput};
pub use countdown::{Countdown, Tick, Ticker};
pub use progress::SessionProgress;
pub use runner::{PracticeCommand, PracticeEvent, PracticeRunner, QuestionView};
pub use session::{
    Advance, PracticeSession, SubmitOutcome, SubmitResult, SubmitTrigger, TickOutcome,
};
pub use workflow::PracticeLoopService;
