mod answer;
mod credentials;
mod ids;
mod job_role;
mod phase;
mod question;
mod score;

pub use answer::{AnswerDraft, AnswerFeedback, AnswerMode, AnswerPayload, AnswerRecord, CapturedAudio};
pub use credentials::{Credentials, SessionContext, UserProfile, is_authorized};
pub use ids::{PlaybackHandle, QuestionId};
pub use job_role::JobRole;
pub use phase::Phase;
pub use question::{ChoiceSet, Question, QuestionError, QuestionKind};
pub use score::{AnswerSummary, ScoreSummary, SessionSummary};
