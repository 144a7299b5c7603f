use sqlx::types::Json;
use sqlx::PgPool;

use crate::db::error::DatabaseError;
use crate::models::{AiSummary, Recording, RecordingStatus};

pub struct RecordingRepository {
    pool: PgPool,
}

impl RecordingRepository {
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }

    /// Dedup lookup. The provider-assigned recording identifier carries a
    /// unique index and is the sole idempotency gate for the pipeline.
    pub async fn find_by_recording_id(
        &self,
        recording_id: &str,
    ) -> Result<Option<Recording>, DatabaseError> {
        let recording = sqlx::query_as::<_, Recording>(
            r#"
            SELECT id, recording_id, course_id, meeting_id, topic, session_date,
                   display_date, video_url, audio_url, transcript_url, password,
                   download_url, attendance, ai_summary, status, created_at, updated_at
            FROM recordings
            WHERE recording_id = $1
            "#,
        )
        .bind(recording_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recording)
    }

    pub async fn create(&self, recording: &Recording) -> Result<Recording, DatabaseError> {
        let created = sqlx::query_as::<_, Recording>(
            r#"
            INSERT INTO recordings
            (id, recording_id, course_id, meeting_id, topic, session_date, display_date,
             video_url, audio_url, transcript_url, password, download_url, attendance,
             ai_summary, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING id, recording_id, course_id, meeting_id, topic, session_date,
                      display_date, video_url, audio_url, transcript_url, password,
                      download_url, attendance, ai_summary, status, created_at, updated_at
            "#,
        )
        .bind(&recording.id)
        .bind(&recording.recording_id)
        .bind(&recording.course_id)
        .bind(recording.meeting_id)
        .bind(&recording.topic)
        .bind(recording.session_date)
        .bind(&recording.display_date)
        .bind(&recording.video_url)
        .bind(&recording.audio_url)
        .bind(&recording.transcript_url)
        .bind(&recording.password)
        .bind(&recording.download_url)
        .bind(&recording.attendance)
        .bind(&recording.ai_summary)
        .bind(recording.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DatabaseError::ConstraintViolation(format!(
                    "Recording {} already ingested",
                    recording.recording_id
                ))
            }
            _ => DatabaseError::from(e),
        })?;

        Ok(created)
    }

    /// Stores the generated summary and advances the status in the same
    /// statement. This is the only post-creation mutation besides status.
    pub async fn set_ai_summary(
        &self,
        recording_id: &str,
        summary: &AiSummary,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            UPDATE recordings
            SET ai_summary = $2, status = $3, updated_at = NOW()
            WHERE recording_id = $1
            "#,
        )
        .bind(recording_id)
        .bind(Json(summary))
        .bind(RecordingStatus::Summarized)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_status(
        &self,
        recording_id: &str,
        status: RecordingStatus,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE recordings SET status = $2, updated_at = NOW() WHERE recording_id = $1")
            .bind(recording_id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
