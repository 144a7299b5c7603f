use std::collections::HashMap;
use std::env;
use std::time::Duration;

use tracing::warn;

use shared::config::StorageConfig;

const COHORT_TOKEN_PREFIX: &str = "SLACK_BOT_TOKEN_";

/// Everything the `run` pass needs beyond the database; the admin
/// subcommands never construct this.
#[derive(Debug, Clone)]
pub struct IngestorConfig {
    pub storage: StorageConfig,
    pub zoom: ZoomConfig,
    pub slack: SlackConfig,
    pub openai: OpenAiConfig,
    pub attendance: AttendanceConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone)]
pub struct ZoomConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub default_token: String,
    cohort_tokens: HashMap<String, String>,
}

impl SlackConfig {
    /// The bot token for a cohort, falling back to the workspace default.
    /// A cohort tagged `MJD003` is overridden with `SLACK_BOT_TOKEN_MJD003`.
    pub fn token_for(&self, cohort: &str) -> &str {
        self.cohort_tokens
            .get(&cohort_env_fragment(cohort))
            .map(String::as_str)
            .unwrap_or(&self.default_token)
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub segmentation_model: String,
    pub polish_model: String,
}

#[derive(Debug, Clone)]
pub struct AttendanceConfig {
    pub session_duration_secs: u32,
    pub full_threshold_percent: f64,
}

#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub pacing: Duration,
    pub chunk_size: usize,
    pub split_threshold: usize,
}

impl IngestorConfig {
    pub fn from_env() -> Self {
        Self {
            storage: StorageConfig::from_env(),
            zoom: ZoomConfig {
                client_id: env::var("ZOOM_CLIENT_ID").expect("ZOOM_CLIENT_ID must be set"),
                client_secret: env::var("ZOOM_CLIENT_SECRET")
                    .expect("ZOOM_CLIENT_SECRET must be set"),
            },
            slack: SlackConfig {
                default_token: env::var("SLACK_BOT_TOKEN").expect("SLACK_BOT_TOKEN must be set"),
                cohort_tokens: collect_cohort_tokens(env::vars()),
            },
            openai: OpenAiConfig {
                api_key: env::var("OPENAI_API_KEY").unwrap_or_else(|_| {
                    warn!("OPENAI_API_KEY is not set; class summaries will be skipped");
                    String::new()
                }),
                base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                segmentation_model: env::var("OPENAI_SEGMENTATION_MODEL")
                    .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                polish_model: env::var("OPENAI_POLISH_MODEL")
                    .unwrap_or_else(|_| "gpt-4o".to_string()),
            },
            attendance: AttendanceConfig {
                session_duration_secs: env::var("SESSION_DURATION_SECS")
                    .unwrap_or_else(|_| "10800".to_string())
                    .parse()
                    .expect("SESSION_DURATION_SECS must be a number of seconds"),
                full_threshold_percent: env::var("ATTENDANCE_FULL_THRESHOLD")
                    .unwrap_or_else(|_| "60.0".to_string())
                    .parse()
                    .expect("ATTENDANCE_FULL_THRESHOLD must be a percentage"),
            },
            notify: NotifyConfig {
                pacing: Duration::from_secs(
                    env::var("NOTIFY_PACING_SECS")
                        .unwrap_or_else(|_| "2".to_string())
                        .parse()
                        .expect("NOTIFY_PACING_SECS must be a number of seconds"),
                ),
                chunk_size: env::var("NOTIFY_CHUNK_SIZE")
                    .unwrap_or_else(|_| "2000".to_string())
                    .parse()
                    .expect("NOTIFY_CHUNK_SIZE must be a byte count"),
                split_threshold: env::var("NOTIFY_SPLIT_THRESHOLD")
                    .unwrap_or_else(|_| "2500".to_string())
                    .parse()
                    .expect("NOTIFY_SPLIT_THRESHOLD must be a byte count"),
            },
        }
    }
}

fn collect_cohort_tokens<I>(vars: I) -> HashMap<String, String>
where
    I: Iterator<Item = (String, String)>,
{
    vars.filter_map(|(key, value)| {
        key.strip_prefix(COHORT_TOKEN_PREFIX)
            .map(|fragment| (fragment.to_string(), value))
    })
    .collect()
}

/// Map a cohort tag onto the charset allowed in environment variable names:
/// uppercased, with anything that is not ASCII alphanumeric as `_`.
fn cohort_env_fragment(cohort: &str) -> String {
    cohort
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
