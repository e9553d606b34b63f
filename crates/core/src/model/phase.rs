use std::fmt;

/// Lifecycle stage of a practice session.
///
/// `Setup` is initial. `Complete` is terminal until the session is restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Setup,
    InProgress,
    ShowingResult,
    Complete,
}

impl Phase {
    /// True while a question is on screen (answering or reviewing it).
    #[must_use]
    pub fn has_current_question(self) -> bool {
        matches!(self, Phase::InProgress | Phase::ShowingResult)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Setup => "setup",
            Phase::InProgress => "in progress",
            Phase::ShowingResult => "showing result",
            Phase::Complete => "complete",
        };
        f.write_str(label)
    }
}
