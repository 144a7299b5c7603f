use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lectern-ingestor",
    about = "Archives class recordings and posts them to course channels"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one ingestion pass over all active courses
    Run,
    /// Register a course for ingestion
    AddCourse {
        /// Course name as it should appear in messages
        #[arg(long)]
        name: String,
        /// Cohort tag, e.g. MJD003; selects the bot token override
        #[arg(long)]
        cohort: String,
        /// Term number within the program
        #[arg(long)]
        term: i32,
        /// Numeric meeting identifier of the recurring session
        #[arg(long)]
        meeting_id: i64,
        /// Channel that receives this course's messages
        #[arg(long)]
        channel: String,
    },
    /// Stop ingesting a course
    FinalizeCourse {
        /// Meeting identifier the course was registered with
        #[arg(long)]
        meeting_id: i64,
    },
    /// Store or replace the provider refresh token
    SeedCredential {
        /// Refresh token obtained from the provider's OAuth consent flow
        #[arg(long)]
        refresh_token: String,
    },
}
