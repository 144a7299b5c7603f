use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::ZoomError;

/// Listing payload from `GET /meetings/{id}/recordings`.
#[derive(Debug, Deserialize)]
pub struct RecordingListing {
    pub topic: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub recording_files: Vec<RecordingFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordingFile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub play_url: String,
    #[serde(default)]
    pub download_url: String,
    #[serde(default)]
    pub recording_type: String,
}

/// One page of `GET /past_meetings/{id}/participants`.
#[derive(Debug, Deserialize)]
pub struct ParticipantsPage {
    #[serde(default)]
    pub participants: Vec<ParticipantSegment>,
    #[serde(default)]
    pub next_page_token: String,
}

/// One join interval from the participant report. A person who drops and
/// rejoins shows up once per interval.
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantSegment {
    pub name: String,
    #[serde(default)]
    pub duration: u64,
}

/// The distilled view of one cloud recording: the file picked as the session
/// video plus whichever companion assets were produced alongside it.
#[derive(Debug, Clone)]
pub struct RecordingMetadata {
    pub recording_id: String,
    pub topic: String,
    pub session_date: DateTime<Utc>,
    pub display_date: String,
    pub password: String,
    pub video_url: String,
    pub download_url: String,
    pub audio_url: Option<String>,
    pub transcript_url: Option<String>,
}

impl RecordingMetadata {
    /// Reduce a raw listing to the assets worth keeping. The largest file is
    /// taken as the session video and its provider id becomes the identity of
    /// the whole recording. Download URLs only work with an access token in
    /// the query string, so they are scoped here.
    pub fn from_listing(
        meeting_id: i64,
        listing: RecordingListing,
        token: &str,
    ) -> Result<Self, ZoomError> {
        let mut files = listing.recording_files;
        files.sort_by(|a, b| b.file_size.cmp(&a.file_size));

        let Some(video) = files.first() else {
            return Err(ZoomError::NotFound(meeting_id));
        };

        let audio_url = files
            .iter()
            .find(|f| f.recording_type == "audio_only")
            .map(|f| f.play_url.clone());
        let transcript_url = files
            .iter()
            .find(|f| f.recording_type == "audio_transcript")
            .map(|f| format!("{}?access_token={}", f.download_url, token));

        Ok(Self {
            recording_id: video.id.clone(),
            topic: listing.topic,
            session_date: listing.start_time,
            display_date: listing.start_time.format("%d/%m/%y").to_string(),
            password: listing.password,
            video_url: video.play_url.clone(),
            download_url: format!("{}?access_token={}", video.download_url, token),
            audio_url,
            transcript_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(id: &str, size: u64, kind: &str) -> RecordingFile {
        RecordingFile {
            id: id.to_string(),
            file_size: size,
            play_url: format!("https://zoom.us/rec/play/{}", id),
            download_url: format!("https://zoom.us/rec/download/{}", id),
            recording_type: kind.to_string(),
        }
    }

    fn listing(files: Vec<RecordingFile>) -> RecordingListing {
        RecordingListing {
            topic: "Datavis Studio".to_string(),
            start_time: "2024-10-21T18:00:00Z".parse().unwrap(),
            password: "s3cret".to_string(),
            recording_files: files,
        }
    }

    #[test]
    fn test_largest_file_becomes_the_video() {
        let meta = RecordingMetadata::from_listing(
            42,
            listing(vec![
                file("small", 10, "audio_only"),
                file("big", 900, "shared_screen_with_speaker_view"),
                file("mid", 500, "audio_transcript"),
            ]),
            "tok",
        )
        .unwrap();

        assert_eq!(meta.recording_id, "big");
        assert_eq!(meta.video_url, "https://zoom.us/rec/play/big");
        assert_eq!(
            meta.download_url,
            "https://zoom.us/rec/download/big?access_token=tok"
        );
    }

    #[test]
    fn test_size_ties_keep_listing_order() {
        let meta = RecordingMetadata::from_listing(
            42,
            listing(vec![
                file("first", 900, "shared_screen"),
                file("second", 900, "shared_screen"),
            ]),
            "tok",
        )
        .unwrap();

        assert_eq!(meta.recording_id, "first");
    }

    #[test]
    fn test_companion_assets_are_optional() {
        let only = listing(vec![file("only", 100, "shared_screen")]);
        let meta = RecordingMetadata::from_listing(42, only, "tok").unwrap();

        assert!(meta.audio_url.is_none());
        assert!(meta.transcript_url.is_none());
    }

    #[test]
    fn test_companion_assets_are_picked_by_type() {
        let meta = RecordingMetadata::from_listing(
            42,
            listing(vec![
                file("video", 900, "shared_screen_with_speaker_view"),
                file("audio", 300, "audio_only"),
                file("vtt", 5, "audio_transcript"),
            ]),
            "tok",
        )
        .unwrap();

        assert_eq!(meta.audio_url.as_deref(), Some("https://zoom.us/rec/play/audio"));
        assert_eq!(
            meta.transcript_url.as_deref(),
            Some("https://zoom.us/rec/download/vtt?access_token=tok")
        );
    }

    #[test]
    fn test_empty_listing_reports_not_found() {
        let err = RecordingMetadata::from_listing(42, listing(vec![]), "tok").unwrap_err();
        assert!(matches!(err, ZoomError::NotFound(42)));
    }

    #[test]
    fn test_display_date_is_day_first() {
        let single = listing(vec![file("v", 1, "shared_screen")]);
        let meta = RecordingMetadata::from_listing(42, single, "tok").unwrap();

        assert_eq!(meta.display_date, "21/10/24");
        assert_eq!(meta.topic, "Datavis Studio");
        assert_eq!(meta.password, "s3cret");
    }

    #[test]
    fn test_participant_page_tolerates_missing_fields() {
        let page: ParticipantsPage =
            serde_json::from_str(r#"{"participants":[{"name":"Ana"}]}"#).unwrap();

        assert_eq!(page.participants.len(), 1);
        assert_eq!(page.participants[0].name, "Ana");
        assert_eq!(page.participants[0].duration, 0);
        assert!(page.next_page_token.is_empty());
    }
}
