use async_trait::async_trait;
use prep_core::model::UserProfile;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::{ApiClient, decode_json};
use crate::error::CollaboratorError;

/// Token issued by the auth API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthGrant {
    pub token: String,
    pub user: UserProfile,
}

#[async_trait]
pub trait AuthClient: Send + Sync {
    /// # Errors
    ///
    /// Returns `CollaboratorError` if the credentials are rejected or the API is unreachable.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthGrant, CollaboratorError>;

    /// # Errors
    ///
    /// Returns `CollaboratorError` if registration is rejected or the API is unreachable.
    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthGrant, CollaboratorError>;
}

#[derive(Clone, Debug)]
pub struct HttpAuthClient {
    api: ApiClient,
}

impl HttpAuthClient {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<AuthGrant, CollaboratorError> {
        let url = self.api.url(path)?;
        debug!(%url, "auth request");
        let response = self.api.http().post(url).json(body).send().await?;
        let grant: AuthGrant = decode_json(response, fallback).await?;
        if grant.token.trim().is_empty() {
            return Err(CollaboratorError::Malformed("missing token".into()));
        }
        Ok(grant)
    }
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthGrant, CollaboratorError> {
        self.post("auth/signin", &SignInRequest { email, password }, "Login failed")
            .await
    }

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthGrant, CollaboratorError> {
        self.post(
            "auth/signup",
            &SignUpRequest {
                name,
                email,
                password,
            },
            "Registration failed",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_parses_user_without_email() {
        let grant: AuthGrant =
            serde_json::from_str(r#"{"token":"abc","user":{"name":"Ada","id":"u1"}}"#).unwrap();
        assert_eq!(grant.token, "abc");
        assert_eq!(grant.user.name, "Ada");
        assert_eq!(grant.user.email, None);
    }

    #[test]
    fn sign_up_body_uses_plain_field_names() {
        let body = serde_json::to_value(SignUpRequest {
            name: "Ada",
            email: "ada@example.com",
            password: "hunter22",
        })
        .unwrap();
        assert_eq!(body["name"], "Ada");
        assert_eq!(body["email"], "ada@example.com");
        assert_eq!(body["password"], "hunter22");
    }
}
