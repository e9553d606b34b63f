use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::ids::{PlaybackHandle, QuestionId};

/// How the user answers a free-response question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnswerMode {
    #[default]
    Text,
    Audio,
}

/// Finalized recording produced when a capture is stopped.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedAudio {
    bytes: Vec<u8>,
    mime_type: String,
    playback: PlaybackHandle,
    recorded_secs: u32,
}

impl CapturedAudio {
    #[must_use]
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, recorded_secs: u32) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            playback: PlaybackHandle::generate(),
            recorded_secs,
        }
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    #[must_use]
    pub fn playback(&self) -> PlaybackHandle {
        self.playback
    }

    #[must_use]
    pub fn recorded_secs(&self) -> u32 {
        self.recorded_secs
    }
}

impl std::fmt::Debug for CapturedAudio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedAudio")
            .field("len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .field("playback", &self.playback)
            .field("recorded_secs", &self.recorded_secs)
            .finish()
    }
}

/// Transcription and written feedback returned for a spoken answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerFeedback {
    pub transcription: String,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerPayload {
    Text(String),
    Audio(CapturedAudio),
}

impl AnswerPayload {
    #[must_use]
    pub fn mode(&self) -> AnswerMode {
        match self {
            AnswerPayload::Text(_) => AnswerMode::Text,
            AnswerPayload::Audio(_) => AnswerMode::Audio,
        }
    }
}

/// A saved free-response answer. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    question_id: QuestionId,
    question_index: usize,
    payload: AnswerPayload,
    feedback: Option<AnswerFeedback>,
    recorded_at: DateTime<Utc>,
}

impl AnswerRecord {
    #[must_use]
    pub fn new(
        question_id: QuestionId,
        question_index: usize,
        payload: AnswerPayload,
        feedback: Option<AnswerFeedback>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            question_id,
            question_index,
            payload,
            feedback,
            recorded_at,
        }
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn question_index(&self) -> usize {
        self.question_index
    }

    #[must_use]
    pub fn modality(&self) -> AnswerMode {
        self.payload.mode()
    }

    #[must_use]
    pub fn payload(&self) -> &AnswerPayload {
        &self.payload
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&AnswerFeedback> {
        self.feedback.as_ref()
    }

    #[must_use]
    pub fn playback(&self) -> Option<PlaybackHandle> {
        match &self.payload {
            AnswerPayload::Audio(audio) => Some(audio.playback()),
            AnswerPayload::Text(_) => None,
        }
    }

    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Transient per-question answer buffer. Cleared on every advance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerDraft {
    pub selected_option: Option<usize>,
    pub mode: AnswerMode,
    pub text: String,
    pub audio: Option<CapturedAudio>,
}

impl AnswerDraft {
    /// Reset every field except the chosen answer mode.
    pub fn clear(&mut self) {
        let mode = self.mode;
        *self = Self {
            mode,
            ..Self::default()
        };
    }

    /// Build a free-response payload from the buffer for the active mode.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyTextAnswer` or `ValidationError::NoAudioRecorded`
    /// if the active mode has nothing usable.
    pub fn to_payload(&self) -> Result<AnswerPayload, ValidationError> {
        match self.mode {
            AnswerMode::Text => {
                let text = self.text.trim();
                if text.is_empty() {
                    return Err(ValidationError::EmptyTextAnswer);
                }
                Ok(AnswerPayload::Text(text.to_owned()))
            }
            AnswerMode::Audio => self
                .audio
                .clone()
                .map(AnswerPayload::Audio)
                .ok_or(ValidationError::NoAudioRecorded),
        }
    }
}
