use crate::model::answer::AnswerMode;

/// Final tally of a multiple choice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSummary {
    pub score: u32,
    pub total: u32,
}

impl ScoreSummary {
    #[must_use]
    pub fn new(score: u32, total: u32) -> Self {
        Self { score, total }
    }

    /// Completion percentage rounded to the nearest integer. Display only.
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let scaled = u64::from(self.score) * 100;
        let total = u64::from(self.total);
        u32::try_from((scaled * 2 + total) / (total * 2)).unwrap_or(100)
    }
}

/// What a free-response session saved, one slot per question in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSummary {
    pub answers: Vec<Option<AnswerMode>>,
}

impl AnswerSummary {
    #[must_use]
    pub fn saved(&self) -> usize {
        self.answers.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.answers.len()
    }
}

/// How a finished session is reported: graded sets get a score, free-response
/// sets list what was saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSummary {
    Scored(ScoreSummary),
    Answered(AnswerSummary),
}
