use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Trimmed, non-empty job role a session is generated for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobRole(String);

impl JobRole {
    /// Validate raw user input.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyJobRole` when the input is blank.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyJobRole);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased form used for keyword matching.
    #[must_use]
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for JobRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_role_is_rejected() {
        assert_eq!(JobRole::parse("   ").unwrap_err(), ValidationError::EmptyJobRole);
        assert_eq!(JobRole::parse("").unwrap_err(), ValidationError::EmptyJobRole);
    }

    #[test]
    fn role_is_trimmed() {
        let role = JobRole::parse("  Data Scientist ").unwrap();
        assert_eq!(role.as_str(), "Data Scientist");
        assert_eq!(role.normalized(), "data scientist");
    }
}
