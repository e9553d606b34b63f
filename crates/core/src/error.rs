use thiserror::Error;

/// Input that blocks a state transition. The session is left unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("please enter a job role")]
    EmptyJobRole,
    #[error("no questions were provided for this session")]
    EmptyQuestionSet,
    #[error("time limit must be at least one second")]
    ZeroTimeLimit,
    #[error("please select an answer")]
    NoAnswerSelected,
    #[error("option {index} is out of range ({len} options)")]
    OptionOutOfRange { index: usize, len: usize },
    #[error("the current question is not multiple choice")]
    NotMultipleChoice,
    #[error("please type an answer")]
    EmptyTextAnswer,
    #[error("please record an answer first")]
    NoAudioRecorded,
    #[error("{field} is required")]
    MissingCredential { field: &'static str },
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
}

/// Audio input failures. Capture is aborted; the session phase is unaffected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeviceError {
    #[error("no audio input device is available")]
    Unavailable,
    #[error("microphone access was denied")]
    PermissionDenied,
    #[error("a recording is already in progress")]
    CaptureAlreadyActive,
    #[error("no recording is in progress")]
    NoActiveCapture,
    #[error("audio device error: {0}")]
    Io(String),
}
