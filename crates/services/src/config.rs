use std::env;
use std::fmt::Display;
use std::str::FromStr;

use tracing::{info, warn};
use url::Url;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api";
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 60;
pub const DEFAULT_MCQ_COUNT: usize = 10;
pub const DEFAULT_FREE_RESPONSE_COUNT: usize = 6;

/// Where the remote API lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: Url,
}

impl ApiConfig {
    /// Parse a base URL. A trailing slash is added so relative endpoints
    /// resolve beneath the base path.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the input is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(&format!("{trimmed}/"))?;
        Ok(Self { base_url })
    }

    /// Read `PREP_API_BASE`, falling back to the local development server.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the configured value is not a URL.
    pub fn from_env() -> Result<Self, url::ParseError> {
        let raw = env::var("PREP_API_BASE").unwrap_or_else(|_| {
            info!("PREP_API_BASE not set, using default: {DEFAULT_API_BASE}");
            DEFAULT_API_BASE.to_string()
        });
        Self::new(&raw)
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path relative to the base.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the path cannot be joined.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path.trim_start_matches('/'))
    }
}

/// Knobs for a practice attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PracticeSettings {
    pub time_limit_secs: u32,
    pub mcq_count: usize,
    pub free_response_count: usize,
}

impl Default for PracticeSettings {
    fn default() -> Self {
        Self {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            mcq_count: DEFAULT_MCQ_COUNT,
            free_response_count: DEFAULT_FREE_RESPONSE_COUNT,
        }
    }
}

impl PracticeSettings {
    /// Defaults overridden by `PREP_TIME_LIMIT_SECS` and `PREP_QUESTION_COUNT`.
    ///
    /// Unparseable values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(secs) = try_load_nonzero::<u32>("PREP_TIME_LIMIT_SECS") {
            settings.time_limit_secs = secs;
        }
        if let Some(count) = try_load_nonzero::<usize>("PREP_QUESTION_COUNT") {
            settings.mcq_count = count;
            settings.free_response_count = count;
        }
        settings
    }
}

fn try_load<T: FromStr>(key: &str) -> Option<T>
where
    T::Err: Display,
{
    let raw = env::var(key).ok()?;
    raw.trim()
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default");
        })
        .ok()
}

fn try_load_nonzero<T: FromStr + Default + PartialEq>(key: &str) -> Option<T>
where
    T::Err: Display,
{
    let value = try_load::<T>(key)?;
    if value == T::default() {
        warn!("{key} must be greater than zero, using default");
        return None;
    }
    Some(value)
}
