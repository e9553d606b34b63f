use prep_core::model::SessionContext;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ApiConfig;
use crate::error::CollaboratorError;

/// Shared HTTP client bound to one API base.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl ApiClient {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url, CollaboratorError> {
        Ok(self.config.endpoint(path)?)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Bearer token for an authorized request.
pub(crate) fn bearer(context: &SessionContext) -> Result<&str, CollaboratorError> {
    context
        .bearer_token()
        .filter(|token| !token.trim().is_empty())
        .ok_or(CollaboratorError::Unauthorized)
}

/// Extract the server's `message` from an error body, if it sent one.
pub(crate) fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
        .map(|message| message.trim().to_owned())
        .filter(|message| !message.is_empty())
}

/// Decode a JSON body, turning non-2xx responses into `CollaboratorError::Rejected`.
pub(crate) async fn decode_json<T: DeserializeOwned>(
    response: Response,
    fallback: &str,
) -> Result<T, CollaboratorError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let message = error_message(&body).unwrap_or_else(|| fallback.to_owned());
        return Err(CollaboratorError::Rejected { status, message });
    }

    serde_json::from_slice(&body).map_err(|err| CollaboratorError::Malformed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::{Credentials, UserProfile};
    use prep_core::time::fixed_now;

    #[test]
    fn error_message_reads_message_field() {
        assert_eq!(
            error_message(br#"{"message":"Job role not supported"}"#).as_deref(),
            Some("Job role not supported")
        );
        assert_eq!(error_message(br#"{"message":"  "}"#), None);
        assert_eq!(error_message(b"<html>502</html>"), None);
    }

    #[test]
    fn bearer_requires_signed_in_context() {
        assert!(matches!(
            bearer(&SessionContext::Anonymous),
            Err(CollaboratorError::Unauthorized)
        ));

        let ctx = SessionContext::SignedIn(Credentials::new(
            "tok",
            UserProfile {
                name: "Ada".into(),
                email: None,
            },
            fixed_now(),
        ));
        assert_eq!(bearer(&ctx).unwrap(), "tok");
    }
}
