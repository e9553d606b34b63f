/// Aggregated view of a session in progress, useful for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    /// One-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub time_remaining: u32,
    pub time_limit: u32,
    pub score: u32,
}

impl SessionProgress {
    /// Share of the set reached so far, in percent.
    #[must_use]
    pub fn percent_through(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.position.saturating_mul(100) / self.total;
        u32::try_from(pct).unwrap_or(100)
    }
}
