use std::io::Write;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

use lectern_zoom_connector::{AuthManager, RecordingMetadata, ZoomClient, ZoomError};
use shared::db::repositories::{CourseRepository, CredentialRepository, RecordingRepository};
use shared::models::{AiSummary, AttendanceSummary, Course, Recording, RecordingStatus};
use shared::storage::S3Archive;
use shared::utils::generate_ulid;

use crate::attendance;
use crate::config::IngestorConfig;
use crate::llm::OpenAiCompletions;
use crate::notify::Notifier;
use crate::roster;
use crate::summarize::Summarizer;

/// Credential row holding the provider refresh token.
pub const ZOOM_REFRESHER: &str = "zoom_refresher";

/// One ingestion pass over every active course: fetch the latest recording,
/// archive it, and walk the notification steps that have not run yet.
pub struct Pipeline {
    pool: PgPool,
    config: IngestorConfig,
    auth: AuthManager,
    zoom: ZoomClient,
    storage: S3Archive,
    notifier: Notifier,
    summarizer: Option<Summarizer>,
}

impl Pipeline {
    pub async fn new(pool: PgPool, config: IngestorConfig) -> Result<Self> {
        let storage = S3Archive::new(&config.storage).await?;
        let auth = AuthManager::new(
            config.zoom.client_id.clone(),
            config.zoom.client_secret.clone(),
        );

        let summarizer = if config.openai.api_key.is_empty() {
            None
        } else {
            Some(Summarizer::new(
                Box::new(OpenAiCompletions::new(
                    config.openai.api_key.clone(),
                    config.openai.base_url.clone(),
                )),
                config.openai.segmentation_model.clone(),
                config.openai.polish_model.clone(),
            ))
        };

        Ok(Self {
            pool,
            auth,
            zoom: ZoomClient::new(),
            storage,
            notifier: Notifier::new(config.notify.clone()),
            summarizer,
            config,
        })
    }

    pub async fn run(&self) -> Result<()> {
        let credentials = CredentialRepository::new(&self.pool);
        let stored = credentials
            .find(ZOOM_REFRESHER)
            .await?
            .ok_or_else(|| anyhow!("no stored refresh token; run `seed-credential` first"))?;

        let pair = self
            .auth
            .refresh(&stored.token)
            .await
            .context("refreshing provider session")?;
        // The exchange invalidated the old refresh token. Persist its
        // replacement before the access token touches anything that can
        // fail, or the next run locks itself out.
        credentials.rotate(ZOOM_REFRESHER, &pair.refresh_token).await?;

        let courses = CourseRepository::new(&self.pool).find_active().await?;
        info!(courses = courses.len(), "Starting ingestion pass");

        for course in &courses {
            if let Err(e) = self.process_course(&pair.access_token, course).await {
                error!(
                    course = %course.name,
                    meeting_id = course.meeting_id,
                    "Course ingestion failed: {:#}",
                    e
                );
            }
        }

        info!("Ingestion pass complete");
        Ok(())
    }

    async fn process_course(&self, token: &str, course: &Course) -> Result<()> {
        let metadata = match self
            .zoom
            .fetch_recording_metadata(token, course.meeting_id)
            .await
        {
            Ok(metadata) => metadata,
            Err(ZoomError::NotFound(_)) => {
                info!(course = %course.name, "No recording available yet");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let existing = RecordingRepository::new(&self.pool)
            .find_by_recording_id(&metadata.recording_id)
            .await?;

        match classify_recording(existing) {
            IngestAction::Skip => {
                info!(course = %course.name, "Recording already ingested");
                Ok(())
            }
            IngestAction::Resume(existing) => {
                info!(
                    course = %course.name,
                    status = ?existing.status,
                    "Resuming unfinished recording"
                );
                self.advance(token, course, existing).await
            }
            IngestAction::Ingest => self.ingest_recording(token, course, metadata).await,
        }
    }

    /// Archive the video and roster, persist the recording row, then hand
    /// over to `advance` for the messaging steps. Nothing is posted until
    /// the row exists, so a crash here never produces a duplicate
    /// announcement.
    async fn ingest_recording(
        &self,
        token: &str,
        course: &Course,
        metadata: RecordingMetadata,
    ) -> Result<()> {
        info!(
            course = %course.name,
            recording_id = %metadata.recording_id,
            topic = %metadata.topic,
            "Ingesting new recording"
        );

        let video_key = roster::video_key(&course.channel, &metadata.display_date);
        let archived_url = self
            .storage
            .archive_url(&metadata.download_url, &video_key, "video/mp4")
            .await
            .context("archiving session video")?;

        let segments = self
            .zoom
            .fetch_participants(token, course.meeting_id)
            .await?;
        let attendance = attendance::compute_attendance(
            &segments,
            self.config.attendance.session_duration_secs,
            self.config.attendance.full_threshold_percent,
        );

        let roster_url = self
            .archive_roster(&metadata, &attendance)
            .await
            .context("publishing attendance roster")?;
        info!(roster_url = %roster_url, "Attendance roster published");

        let now = Utc::now();
        let recording = Recording {
            id: generate_ulid(),
            recording_id: metadata.recording_id,
            course_id: course.id.clone(),
            meeting_id: course.meeting_id,
            topic: metadata.topic,
            session_date: metadata.session_date,
            display_date: metadata.display_date,
            video_url: metadata.video_url,
            audio_url: metadata.audio_url,
            transcript_url: metadata.transcript_url,
            password: metadata.password,
            download_url: archived_url,
            attendance: Json(attendance),
            ai_summary: None,
            status: RecordingStatus::Persisted,
            created_at: now,
            updated_at: now,
        };
        let recording = RecordingRepository::new(&self.pool)
            .create(&recording)
            .await?;

        self.advance(token, course, recording).await
    }

    /// Walk the recording through whatever steps its status says are still
    /// missing. Slack failures are logged and left for the next run; the
    /// status column only moves forward after the step it records.
    async fn advance(&self, token: &str, course: &Course, recording: Recording) -> Result<()> {
        let recordings = RecordingRepository::new(&self.pool);
        let slack_token = self.config.slack.token_for(&course.cohort);

        let mut status = recording.status;
        let mut summary: Option<AiSummary> = recording.ai_summary.clone().map(|json| json.0);

        if status == RecordingStatus::Persisted {
            // The roster key is deterministic, so a resumed run can point
            // at the object uploaded before the crash.
            let roster_url = self
                .storage
                .public_url(&roster::roster_key(&recording.topic, &recording.session_date));
            if let Err(e) = self
                .notifier
                .announce_recording(slack_token, &course.channel, &recording, &roster_url)
                .await
            {
                warn!(course = %course.name, "Announcement failed, will retry next run: {:#}", e);
                return Ok(());
            }
            recordings
                .set_status(&recording.recording_id, RecordingStatus::Notified)
                .await?;
            status = RecordingStatus::Notified;
        }

        if status == RecordingStatus::Notified {
            match recording.transcript_url.as_deref() {
                // No transcript means no summary step. `is_complete`
                // treats the announced recording as final.
                None => return Ok(()),
                Some(url) => match self.summarize_recording(token, course, url).await {
                    Ok(generated) => {
                        recordings
                            .set_ai_summary(&recording.recording_id, &generated)
                            .await?;
                        summary = Some(generated);
                        status = RecordingStatus::Summarized;
                    }
                    Err(e) => {
                        warn!(course = %course.name, "Summarization failed: {:#}", e);
                        recordings
                            .set_status(
                                &recording.recording_id,
                                RecordingStatus::SummarizationSkipped,
                            )
                            .await?;
                        status = RecordingStatus::SummarizationSkipped;
                    }
                },
            }
        }

        if status == RecordingStatus::Summarized || status == RecordingStatus::SummarizationSkipped
        {
            let sent = match (status, &summary) {
                (RecordingStatus::Summarized, Some(generated)) => {
                    self.notifier
                        .send_summary(slack_token, &course.channel, generated)
                        .await
                }
                _ => self.notifier.send_apology(slack_token, &course.channel).await,
            };
            match sent {
                Ok(()) => {
                    recordings
                        .set_status(&recording.recording_id, RecordingStatus::SummaryNotified)
                        .await?;
                }
                Err(e) => {
                    warn!(
                        course = %course.name,
                        "Summary message failed, will retry next run: {:#}",
                        e
                    );
                }
            }
        }

        Ok(())
    }

    async fn summarize_recording(
        &self,
        token: &str,
        course: &Course,
        transcript_url: &str,
    ) -> Result<AiSummary> {
        let Some(summarizer) = &self.summarizer else {
            bail!("summarization is not configured (OPENAI_API_KEY unset)");
        };

        let transcript = self
            .zoom
            .fetch_transcript(token, transcript_url)
            .await
            .context("fetching transcript")?;

        Ok(summarizer.summarize(&course.name, &transcript).await?)
    }

    async fn archive_roster(
        &self,
        metadata: &RecordingMetadata,
        attendance: &AttendanceSummary,
    ) -> Result<String> {
        let text = roster::render_roster(&metadata.topic, &metadata.session_date, attendance);
        let key = roster::roster_key(&metadata.topic, &metadata.session_date);

        // NamedTempFile unlinks on drop, covering every exit path below.
        let mut file = NamedTempFile::new()?;
        file.write_all(text.as_bytes())?;
        file.flush()?;

        Ok(self
            .storage
            .archive_file(file.path(), &key, "text/plain; charset=utf-8")
            .await?)
    }
}

/// What `process_course` does with a recording the provider reported,
/// decided from the row already stored for its identifier. A recording
/// classified `Skip` triggers no call of any kind.
#[derive(Debug)]
enum IngestAction {
    Skip,
    Resume(Recording),
    Ingest,
}

fn classify_recording(existing: Option<Recording>) -> IngestAction {
    match existing {
        Some(recording) if recording.is_complete() => IngestAction::Skip,
        Some(recording) => IngestAction::Resume(recording),
        None => IngestAction::Ingest,
    }
}
