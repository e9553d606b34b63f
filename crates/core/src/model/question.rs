use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyPrompt,

    #[error("multiple choice question has no options")]
    NoOptions,

    #[error("correct answer index {index} is out of range for {len} options")]
    CorrectAnswerOutOfRange { index: usize, len: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Options, key and explanation of a multiple choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceSet {
    options: Vec<String>,
    correct_answer: usize,
    explanation: String,
}

impl ChoiceSet {
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.correct_answer
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    MultipleChoice(ChoiceSet),
    FreeResponse,
}

/// A single fetched question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    topic: Option<String>,
    kind: QuestionKind,
}

impl Question {
    /// Build a multiple choice question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, there are no options,
    /// or `correct_answer` does not index into `options`.
    pub fn multiple_choice(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = validate_prompt(prompt.into())?;
        if options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        if correct_answer >= options.len() {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                index: correct_answer,
                len: options.len(),
            });
        }
        Ok(Self {
            id,
            prompt,
            topic: None,
            kind: QuestionKind::MultipleChoice(ChoiceSet {
                options,
                correct_answer,
                explanation: explanation.into(),
            }),
        })
    }

    /// Build a free-response question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyPrompt` if the prompt is blank.
    pub fn free_response(id: QuestionId, prompt: impl Into<String>) -> Result<Self, QuestionError> {
        Ok(Self {
            id,
            prompt: validate_prompt(prompt.into())?,
            topic: None,
            kind: QuestionKind::FreeResponse,
        })
    }

    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        let topic = topic.into();
        self.topic = (!topic.trim().is_empty()).then_some(topic);
        self
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    #[must_use]
    pub fn choices(&self) -> Option<&ChoiceSet> {
        match &self.kind {
            QuestionKind::MultipleChoice(choices) => Some(choices),
            QuestionKind::FreeResponse => None,
        }
    }

    #[must_use]
    pub fn is_multiple_choice(&self) -> bool {
        self.choices().is_some()
    }
}

fn validate_prompt(prompt: String) -> Result<String, QuestionError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(QuestionError::EmptyPrompt);
    }
    Ok(trimmed.to_owned())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
