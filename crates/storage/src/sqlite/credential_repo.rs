use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::repository::{CredentialRepository, StorageError};
use prep_core::model::{Credentials, UserProfile};

use super::SqliteRepository;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl CredentialRepository for SqliteRepository {
    async fn load_credentials(&self) -> Result<Option<Credentials>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT token, user_name, user_email, saved_at
            FROM credentials
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let token: String = row.try_get("token").map_err(ser)?;
        let name: String = row.try_get("user_name").map_err(ser)?;
        let email: Option<String> = row.try_get("user_email").map_err(ser)?;
        let saved_at: DateTime<Utc> = row.try_get("saved_at").map_err(ser)?;

        Ok(Some(Credentials::new(
            token,
            UserProfile { name, email },
            saved_at,
        )))
    }

    async fn save_credentials(&self, credentials: &Credentials) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO credentials (id, token, user_name, user_email, saved_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                token = excluded.token,
                user_name = excluded.user_name,
                user_email = excluded.user_email,
                saved_at = excluded.saved_at
            ",
        )
        .bind(1_i64)
        .bind(credentials.token())
        .bind(&credentials.user().name)
        .bind(credentials.user().email.as_deref())
        .bind(credentials.saved_at())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn clear_credentials(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM credentials WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
