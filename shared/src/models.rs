use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// A course registered for ingestion. Created by `add-course`, deactivated
/// by `finalize-course` once the term ends; never deleted.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Course {
    pub id: String,
    pub name: String,
    /// Cohort/section tag (e.g. "MJD003"); also selects the bot token.
    pub cohort: String,
    pub term: i32,
    pub meeting_id: i64,
    pub channel: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle of a recording, advanced after each completed pipeline step
/// so an interrupted run can resume from the last durable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RecordingStatus {
    Persisted,
    Notified,
    Summarized,
    SummarizationSkipped,
    SummaryNotified,
}

/// One archived class session. `recording_id` is the provider's identifier
/// for the canonical video asset and carries the unique index that makes
/// ingestion idempotent.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Recording {
    pub id: String,
    pub recording_id: String,
    pub course_id: String,
    pub meeting_id: i64,
    pub topic: String,
    pub session_date: DateTime<Utc>,
    /// Localized `DD/MM/YY` rendering of `session_date`.
    pub display_date: String,
    pub video_url: String,
    pub audio_url: Option<String>,
    pub transcript_url: Option<String>,
    pub password: String,
    /// Public URL of the archived video object.
    pub download_url: String,
    pub attendance: Json<AttendanceSummary>,
    pub ai_summary: Option<Json<AiSummary>>,
    pub status: RecordingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recording {
    /// Whether every pipeline step for this recording already ran. A
    /// recording without a transcript is done once announced; one with a
    /// transcript is done only after the summary (or apology) went out.
    pub fn is_complete(&self) -> bool {
        match self.status {
            RecordingStatus::SummaryNotified => true,
            RecordingStatus::Notified => self.transcript_url.is_none(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub full: Vec<AttendanceRecord>,
    pub partial: Vec<AttendanceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub name: String,
    pub seconds: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSummary {
    pub title: String,
    pub summary: String,
    pub blocks: Vec<SummaryBlock>,
}

/// One thematically coherent span of a class; `start` is the offset into
/// the recording in `HH:MM:SS.mmm` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryBlock {
    pub content: String,
    pub start: String,
}

/// Singleton credential row keyed by function name. Rotation overwrites
/// the token in place; there is never more than one live value per key.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredCredential {
    pub function_name: String,
    pub token: String,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(status: RecordingStatus, transcript_url: Option<&str>) -> Recording {
        let now = Utc::now();
        Recording {
            id: "01J0000000000000000000TEST".to_string(),
            recording_id: "rec-123".to_string(),
            course_id: "01J0000000000000000000CRSE".to_string(),
            meeting_id: 862_4351_9644,
            topic: "Datavis Studio".to_string(),
            session_date: now,
            display_date: "21/10/24".to_string(),
            video_url: "https://zoom.us/rec/play/abc".to_string(),
            audio_url: None,
            transcript_url: transcript_url.map(|s| s.to_string()),
            password: String::new(),
            download_url: "https://bucket.s3.us-east-1.amazonaws.com/k.mp4".to_string(),
            attendance: Json(AttendanceSummary::default()),
            ai_summary: None,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_summary_notified_is_complete() {
        assert!(recording(RecordingStatus::SummaryNotified, Some("u")).is_complete());
        assert!(recording(RecordingStatus::SummaryNotified, None).is_complete());
    }

    #[test]
    fn test_notified_without_transcript_is_complete() {
        assert!(recording(RecordingStatus::Notified, None).is_complete());
    }

    #[test]
    fn test_notified_with_transcript_still_has_work() {
        assert!(!recording(RecordingStatus::Notified, Some("u")).is_complete());
    }

    #[test]
    fn test_earlier_states_are_incomplete() {
        for status in [
            RecordingStatus::Persisted,
            RecordingStatus::Summarized,
            RecordingStatus::SummarizationSkipped,
        ] {
            assert!(!recording(status, Some("u")).is_complete());
            assert!(!recording(status, None).is_complete());
        }
    }

    #[test]
    fn test_status_serializes_as_snake_case() {
        let json = serde_json::to_string(&RecordingStatus::SummarizationSkipped).unwrap();
        assert_eq!(json, "\"summarization_skipped\"");
    }
}
