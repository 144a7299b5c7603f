use reqwest::Client;
use tracing::debug;

use crate::error::ZoomError;
use crate::models::{ParticipantSegment, ParticipantsPage, RecordingListing, RecordingMetadata};

const ZOOM_API_BASE: &str = "https://api.zoom.us/v2";
const PARTICIPANTS_PAGE_SIZE: u32 = 200;

pub struct ZoomClient {
    client: Client,
}

impl ZoomClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Fetch the newest cloud recording of a meeting, reduced to the assets
    /// the pipeline cares about. A meeting with no recording yet comes back
    /// as `ZoomError::NotFound`.
    pub async fn fetch_recording_metadata(
        &self,
        token: &str,
        meeting_id: i64,
    ) -> Result<RecordingMetadata, ZoomError> {
        let url = format!("{}/meetings/{}/recordings", ZOOM_API_BASE, meeting_id);
        let response = self.client.get(&url).bearer_auth(token).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ZoomError::NotFound(meeting_id));
        }
        let response = check(response).await?;

        let listing: RecordingListing = response.json().await?;
        debug!(
            meeting_id,
            files = listing.recording_files.len(),
            "Fetched recording listing"
        );
        RecordingMetadata::from_listing(meeting_id, listing, token)
    }

    /// Page through the attendance report of a finished meeting.
    pub async fn fetch_participants(
        &self,
        token: &str,
        meeting_id: i64,
    ) -> Result<Vec<ParticipantSegment>, ZoomError> {
        let url = format!("{}/past_meetings/{}/participants", ZOOM_API_BASE, meeting_id);
        let mut segments = Vec::new();
        let mut next_page_token = String::new();

        loop {
            let mut request = self
                .client
                .get(&url)
                .bearer_auth(token)
                .query(&[("page_size", PARTICIPANTS_PAGE_SIZE.to_string())]);
            if !next_page_token.is_empty() {
                request = request.query(&[("next_page_token", next_page_token.as_str())]);
            }

            let response = check(request.send().await?).await?;
            let page: ParticipantsPage = response.json().await?;
            segments.extend(page.participants);

            if page.next_page_token.is_empty() {
                break;
            }
            next_page_token = page.next_page_token;
        }

        debug!(
            meeting_id,
            segments = segments.len(),
            "Fetched participant report"
        );
        Ok(segments)
    }

    /// Download a transcript. The stored URL carries the access token it was
    /// discovered with, long expired by the time a summary is retried, so the
    /// query string is rebuilt around the current token.
    pub async fn fetch_transcript(
        &self,
        token: &str,
        transcript_url: &str,
    ) -> Result<String, ZoomError> {
        let base = transcript_url.split('?').next().unwrap_or(transcript_url);
        let url = format!("{}?access_token={}", base, token);

        let response = check(self.client.get(&url).send().await?).await?;
        Ok(response.text().await?)
    }
}

impl Default for ZoomClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, ZoomError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await?;
    Err(ZoomError::Api { status, body })
}
