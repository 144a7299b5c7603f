pub mod course;
pub mod credential;
pub mod recording;

pub use course::CourseRepository;
pub use credential::CredentialRepository;
pub use recording::RecordingRepository;
