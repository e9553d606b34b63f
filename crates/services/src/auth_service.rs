use std::sync::Arc;

use prep_core::ValidationError;
use prep_core::model::{Credentials, SessionContext};
use storage::repository::CredentialRepository;
use tracing::info;

use crate::Clock;
use crate::api::{AuthClient, AuthGrant};
use crate::error::AuthError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Owns the signed-in state. The only writer of the credential store.
#[derive(Clone)]
pub struct AuthService {
    clock: Clock,
    client: Arc<dyn AuthClient>,
    credentials: Arc<dyn CredentialRepository>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        clock: Clock,
        client: Arc<dyn AuthClient>,
        credentials: Arc<dyn CredentialRepository>,
    ) -> Self {
        Self {
            clock,
            client,
            credentials,
        }
    }

    /// Read the stored credentials into a `SessionContext`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the store cannot be read.
    pub async fn load_context(&self) -> Result<SessionContext, AuthError> {
        let context = match self.credentials.load_credentials().await? {
            Some(credentials) => SessionContext::SignedIn(credentials),
            None => SessionContext::Anonymous,
        };
        Ok(context)
    }

    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a blank email or password before
    /// any request is made, `AuthError::Collaborator` if the server refuses,
    /// and `AuthError::Storage` if the token cannot be saved.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionContext, AuthError> {
        let email = required("email", email)?;
        if password.trim().is_empty() {
            return Err(ValidationError::MissingCredential { field: "password" }.into());
        }
        let grant = self.client.sign_in(email, password).await?;
        self.store(grant).await
    }

    /// # Errors
    ///
    /// Same as `sign_in`; the password must also be at least
    /// `MIN_PASSWORD_LEN` characters.
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionContext, AuthError> {
        let name = required("name", name)?;
        let email = required("email", email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            }
            .into());
        }
        let grant = self.client.sign_up(name, email, password).await?;
        self.store(grant).await
    }

    /// Forget the stored token. Signing out twice is fine.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the store cannot be written.
    pub async fn sign_out(&self) -> Result<SessionContext, AuthError> {
        self.credentials.clear_credentials().await?;
        info!("signed out");
        Ok(SessionContext::Anonymous)
    }

    async fn store(&self, grant: AuthGrant) -> Result<SessionContext, AuthError> {
        let credentials = Credentials::new(grant.token, grant.user, self.clock.now());
        self.credentials.save_credentials(&credentials).await?;
        info!(user = %credentials.user().name, "signed in");
        Ok(SessionContext::SignedIn(credentials))
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::MissingCredential { field })
    } else {
        Ok(value)
    }
}
