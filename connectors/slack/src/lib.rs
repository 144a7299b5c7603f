pub mod client;
pub mod content;

pub use client::SlackClient;
pub use content::{markdown_to_mrkdwn, split_text, SplitText};
