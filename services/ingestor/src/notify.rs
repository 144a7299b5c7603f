use anyhow::{Context, Result};
use tokio::time::sleep;
use tracing::info;

use lectern_slack_connector::{markdown_to_mrkdwn, split_text, SlackClient};
use shared::models::{AiSummary, Recording};

use crate::config::NotifyConfig;

const APOLOGY_MESSAGE: &str = "The transcript of the latest class is not available yet. \
    I could not produce a summary. :disappointed:";

pub struct Notifier {
    slack: SlackClient,
    config: NotifyConfig,
}

impl Notifier {
    pub fn new(config: NotifyConfig) -> Self {
        Self {
            slack: SlackClient::new(),
            config,
        }
    }

    /// Announce a freshly archived recording: one rich message with the video
    /// links, then the roster link as its own message. Two posts keep each
    /// one short, and the pause between them avoids burst rate limits.
    pub async fn announce_recording(
        &self,
        token: &str,
        channel: &str,
        recording: &Recording,
        roster_url: &str,
    ) -> Result<()> {
        let text = announcement_text(
            &recording.topic,
            &recording.video_url,
            &recording.download_url,
        );
        self.slack
            .post_section(token, channel, &text)
            .await
            .context("announcement message")?;

        sleep(self.config.pacing).await;

        let roster = format!("Attendance roster: <{}|here>", roster_url);
        self.slack
            .post_message(token, channel, &roster)
            .await
            .context("roster message")?;

        info!(channel, recording_id = %recording.recording_id, "Recording announced");
        Ok(())
    }

    /// Post the class summary, split into paced chunks when it outgrows the
    /// channel's comfortable message size.
    pub async fn send_summary(
        &self,
        token: &str,
        channel: &str,
        summary: &AiSummary,
    ) -> Result<()> {
        let markdown = summary_markdown(summary);

        if markdown.len() >= self.config.split_threshold {
            let chunks: Vec<&str> = split_text(&markdown, self.config.chunk_size).collect();
            let total = chunks.len();
            for (i, chunk) in chunks.into_iter().enumerate() {
                self.slack
                    .post_section(token, channel, &markdown_to_mrkdwn(chunk))
                    .await
                    .with_context(|| format!("summary chunk {}/{}", i + 1, total))?;
                sleep(self.config.pacing).await;
            }
        } else {
            self.slack
                .post_section(token, channel, &markdown_to_mrkdwn(&markdown))
                .await
                .context("summary message")?;
        }

        info!(channel, "Summary sent");
        Ok(())
    }

    /// Tell the channel a summary is not coming for this recording.
    pub async fn send_apology(&self, token: &str, channel: &str) -> Result<()> {
        self.slack
            .post_section(token, channel, APOLOGY_MESSAGE)
            .await
            .context("apology message")
    }
}

fn announcement_text(topic: &str, video_url: &str, download_url: &str) -> String {
    format!(
        ":red_circle: The recording of the latest *{}* class is available!\n\
         Click <{}|here> to watch the video.\n\
         To download the .mp4 file click <{}|here>.\n",
        topic, video_url, download_url
    )
}

fn summary_markdown(summary: &AiSummary) -> String {
    format!("# {}\n{}", summary.title, summary.summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_announcement_links_video_and_download() {
        let text = announcement_text(
            "Datavis Studio",
            "https://zoom.us/rec/play/abc",
            "https://bucket.s3.us-east-1.amazonaws.com/datavis-studio_21-10-24.mp4",
        );

        assert_eq!(
            text,
            ":red_circle: The recording of the latest *Datavis Studio* class is available!\n\
             Click <https://zoom.us/rec/play/abc|here> to watch the video.\n\
             To download the .mp4 file click \
             <https://bucket.s3.us-east-1.amazonaws.com/datavis-studio_21-10-24.mp4|here>.\n"
        );
    }

    #[test]
    fn test_summary_message_leads_with_a_bold_title() {
        let summary = AiSummary {
            title: "Visual Encoding (marks, channels)".to_string(),
            summary: "The class covered how data maps onto visual marks.".to_string(),
            blocks: vec![],
        };

        let rendered = markdown_to_mrkdwn(&summary_markdown(&summary));

        assert_eq!(
            rendered,
            "*Visual Encoding (marks, channels)*\n\
             The class covered how data maps onto visual marks."
        );
    }
}
