pub mod auth;
pub mod client;
pub mod error;
pub mod models;

pub use auth::{AuthManager, TokenPair};
pub use client::ZoomClient;
pub use error::ZoomError;
pub use models::{ParticipantSegment, RecordingMetadata};
