use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared::models::{AiSummary, SummaryBlock};

use crate::llm::{CompletionClient, CompletionRequest, SummarizationError};

const SEGMENTATION_SYSTEM_PROMPT: &str = "You are a teaching assistant that receives the \
    transcript of a class and produces a structured summary of the content covered.";

const POLISH_SYSTEM_PROMPT: &str = "You are a teaching assistant that receives a structured \
    class summary and fixes formatting mistakes without changing the content.";

pub struct Summarizer {
    client: Box<dyn CompletionClient>,
    segmentation_model: String,
    polish_model: String,
}

#[derive(Debug, Deserialize)]
struct SegmentedSummary {
    summary: String,
    blocks: Vec<SummaryBlock>,
}

#[derive(Debug, Deserialize)]
struct PolishedSummary {
    title: String,
    summary: String,
}

impl Summarizer {
    pub fn new(
        client: Box<dyn CompletionClient>,
        segmentation_model: String,
        polish_model: String,
    ) -> Self {
        Self {
            client,
            segmentation_model,
            polish_model,
        }
    }

    /// Run both summarization stages over a raw transcript.
    ///
    /// Stage one segments the transcript into timestamped topic blocks plus a
    /// draft paragraph; stage two rewrites the draft into a titled summary in
    /// the context of the course. The blocks are kept verbatim from stage
    /// one.
    pub async fn summarize(
        &self,
        course_name: &str,
        transcript: &str,
    ) -> Result<AiSummary, SummarizationError> {
        info!(course = course_name, "Generating class summary");

        let segmented = self.segment(transcript).await?;
        debug!(
            blocks = segmented.blocks.len(),
            draft_chars = segmented.summary.len(),
            "Segmentation stage complete"
        );

        let polished = self.polish(course_name, &segmented.blocks).await?;

        Ok(AiSummary {
            title: polished.title,
            summary: polished.summary,
            blocks: segmented.blocks,
        })
    }

    async fn segment(&self, transcript: &str) -> Result<SegmentedSummary, SummarizationError> {
        let reply = self
            .client
            .complete(CompletionRequest {
                model: self.segmentation_model.clone(),
                system: SEGMENTATION_SYSTEM_PROMPT.to_string(),
                user: format!("Summarize the following class: {}", transcript),
                schema_name: "class_summary",
                schema: segmentation_schema(),
            })
            .await?;

        serde_json::from_value(reply)
            .map_err(|e| SummarizationError::Malformed(format!("segmentation stage: {}", e)))
    }

    async fn polish(
        &self,
        course_name: &str,
        blocks: &[SummaryBlock],
    ) -> Result<PolishedSummary, SummarizationError> {
        let blocks_json = serde_json::to_string(blocks)
            .map_err(|e| SummarizationError::Malformed(format!("unencodable blocks: {}", e)))?;

        let reply = self
            .client
            .complete(CompletionRequest {
                model: self.polish_model.clone(),
                system: POLISH_SYSTEM_PROMPT.to_string(),
                user: format!(
                    "Read the following list of segments from a class of the course {}. \
                     Create a title for the class, in the context of the course, and a \
                     one-paragraph summary of what was covered: {}",
                    course_name, blocks_json
                ),
                schema_name: "final_class_summary",
                schema: polish_schema(),
            })
            .await?;

        serde_json::from_value(reply)
            .map_err(|e| SummarizationError::Malformed(format!("polish stage: {}", e)))
    }
}

fn segmentation_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": {
                "type": "string",
                "description": "A one-paragraph summary of what was covered in the class",
            },
            "blocks": {
                "type": "array",
                "description": "A list of segments of the class, each with the topics covered and the corresponding time in the video. The focus must be exclusively the content of the class, not a description of what happened.",
                "items": {
                    "type": "object",
                    "properties": {
                        "content": {
                            "type": "string",
                            "description": "The topics and concepts covered in this segment of the class, as bullet points. Be specific about every concept and piece of content.",
                        },
                        "start": {
                            "type": "string",
                            "description": "The start time of this segment in HH:MM:SS.mmm format",
                        },
                    },
                    "required": ["content", "start"],
                    "additionalProperties": false,
                },
            },
        },
        "required": ["summary", "blocks"],
        "additionalProperties": false,
    })
}

fn polish_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": "A title for the class, with a short list of the most important concepts in parentheses",
            },
            "summary": {
                "type": "string",
                "description": "A one-paragraph summary of what was covered in the class",
            },
        },
        "required": ["title", "summary"],
        "additionalProperties": false,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;

    struct ScriptedClient {
        replies: Mutex<Vec<Value>>,
        seen: Arc<Mutex<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<Value, SummarizationError> {
            self.seen
                .lock()
                .unwrap()
                .push((request.model, request.user));
            Ok(self.replies.lock().unwrap().remove(0))
        }
    }

    fn summarizer_with(replies: Vec<Value>) -> (Summarizer, Arc<Mutex<Vec<(String, String)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let client = ScriptedClient {
            replies: Mutex::new(replies),
            seen: Arc::clone(&seen),
        };
        let summarizer = Summarizer::new(
            Box::new(client),
            "gpt-4o-mini".to_string(),
            "gpt-4o".to_string(),
        );
        (summarizer, seen)
    }

    #[tokio::test]
    async fn test_blocks_survive_the_polish_stage_verbatim() {
        let (summarizer, seen) = summarizer_with(vec![
            json!({
                "summary": "Draft paragraph.",
                "blocks": [{ "content": "- Marks and channels", "start": "00:05:00.000" }],
            }),
            json!({
                "title": "Visual Encoding (marks, channels)",
                "summary": "Polished paragraph.",
            }),
        ]);

        let summary = summarizer
            .summarize("Datavis Studio", "teacher: today we cover marks...")
            .await
            .unwrap();

        assert_eq!(summary.title, "Visual Encoding (marks, channels)");
        assert_eq!(summary.summary, "Polished paragraph.");
        assert_eq!(summary.blocks.len(), 1);
        assert_eq!(summary.blocks[0].content, "- Marks and channels");
        assert_eq!(summary.blocks[0].start, "00:05:00.000");

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, "gpt-4o-mini");
        assert!(seen[0].1.contains("teacher: today we cover marks"));
        assert_eq!(seen[1].0, "gpt-4o");
        assert!(seen[1].1.contains("Datavis Studio"));
        assert!(seen[1].1.contains("Marks and channels"));
    }

    #[tokio::test]
    async fn test_a_misshapen_stage_reply_is_rejected() {
        let (summarizer, _) = summarizer_with(vec![json!({ "unexpected": true })]);

        let err = summarizer
            .summarize("Datavis Studio", "transcript")
            .await
            .unwrap_err();

        assert!(matches!(err, SummarizationError::Malformed(_)));
    }
}
