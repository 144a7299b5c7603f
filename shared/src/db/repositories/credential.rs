use sqlx::PgPool;

use crate::db::error::DatabaseError;
use crate::models::StoredCredential;

pub struct CredentialRepository {
    pool: PgPool,
}

impl CredentialRepository {
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }

    pub async fn find(
        &self,
        function_name: &str,
    ) -> Result<Option<StoredCredential>, DatabaseError> {
        let credential = sqlx::query_as::<_, StoredCredential>(
            "SELECT function_name, token, updated_at FROM credentials WHERE function_name = $1",
        )
        .bind(function_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credential)
    }

    /// Overwrites the stored token in place. Errors with `RowNotFound` if
    /// the function was never seeded, so a typo cannot silently create a
    /// second credential row.
    pub async fn rotate(
        &self,
        function_name: &str,
        token: &str,
    ) -> Result<StoredCredential, DatabaseError> {
        let credential = sqlx::query_as::<_, StoredCredential>(
            r#"
            UPDATE credentials
            SET token = $2, updated_at = NOW()
            WHERE function_name = $1
            RETURNING function_name, token, updated_at
            "#,
        )
        .bind(function_name)
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Ok(credential)
    }

    /// Creates or replaces the row; used by the bootstrap command.
    pub async fn seed(
        &self,
        function_name: &str,
        token: &str,
    ) -> Result<StoredCredential, DatabaseError> {
        let credential = sqlx::query_as::<_, StoredCredential>(
            r#"
            INSERT INTO credentials (function_name, token)
            VALUES ($1, $2)
            ON CONFLICT (function_name)
            DO UPDATE SET token = EXCLUDED.token, updated_at = NOW()
            RETURNING function_name, token, updated_at
            "#,
        )
        .bind(function_name)
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Ok(credential)
    }
}
