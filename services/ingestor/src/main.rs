mod attendance;
mod cli;
mod config;
mod llm;
mod notify;
mod pipeline;
mod roster;
mod summarize;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use shared::config::DatabaseConfig;
use shared::db::repositories::{CourseRepository, CredentialRepository};

use crate::cli::{Cli, Command};
use crate::config::IngestorConfig;
use crate::pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Every command talks to the database; only `run` demands the
    // provider environment on top of it.
    let pool = shared::db::create_pool(&DatabaseConfig::from_env()).await?;
    shared::db::MIGRATOR.run(&pool).await?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let config = IngestorConfig::from_env();
            Pipeline::new(pool, config).await?.run().await?;
        }
        Command::AddCourse {
            name,
            cohort,
            term,
            meeting_id,
            channel,
        } => {
            let course = CourseRepository::new(&pool)
                .create(&name, &cohort, term, meeting_id, &channel)
                .await?;
            info!(id = %course.id, name = %course.name, "Course registered");
        }
        Command::FinalizeCourse { meeting_id } => {
            if CourseRepository::new(&pool).set_active(meeting_id, false).await? {
                info!(meeting_id, "Course finalized; no further recordings will be ingested");
            } else {
                warn!(meeting_id, "No course registered for this meeting");
            }
        }
        Command::SeedCredential { refresh_token } => {
            CredentialRepository::new(&pool)
                .seed(pipeline::ZOOM_REFRESHER, &refresh_token)
                .await?;
            info!("Refresh credential stored");
        }
    }

    Ok(())
}
