//! CLI for running an extraction batch in the foreground.
//!
//! Uses the same configuration and collaborators as the HTTP server, so
//! results land in the same store. Prints the finished session.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use server_core::config::Config;
use server_core::kernel::create_server_deps;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use extraction::{ExtractionKind, OutcomeStatus, ResultStore, SessionState};

#[derive(Parser)]
#[command(name = "scrape_cli")]
#[command(about = "Quality-gated extraction of job postings and forms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print JSON instead of a summary
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract job postings
    Jobs {
        urls: Vec<String>,
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Extract Google Forms
    Forms {
        urls: Vec<String>,
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Show a stored session
    Session { id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,extraction=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let deps = create_server_deps(&config).await?;

    let session = match cli.command {
        Commands::Jobs { urls, user_id } => {
            deps.runner(ExtractionKind::JobPosting)
                .run(urls, user_id)
                .await
                .context("Batch failed")?
        }
        Commands::Forms { urls, user_id } => {
            deps.runner(ExtractionKind::GoogleForm)
                .run(urls, user_id)
                .await
                .context("Batch failed")?
        }
        Commands::Session { id } => deps
            .store
            .get_session(id)
            .await
            .context("Failed to load session")?
            .with_context(|| format!("Session {} not found", id))?,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        print_summary(&session);
    }

    Ok(())
}

fn print_summary(session: &SessionState) {
    println!("Session {} ({})", session.id, session.kind);
    println!("Status:  {}", session.status);
    println!("Summary: {}", session.summary);
    if let Some(error) = &session.error {
        println!("Error:   {}", error);
    }
    println!();

    for outcome in &session.outcomes {
        let marker = match outcome.status {
            OutcomeStatus::Succeeded => "ok  ",
            OutcomeStatus::Skipped => "skip",
            OutcomeStatus::Failed => "FAIL",
        };
        let detail = match (outcome.final_confidence, &outcome.message) {
            (Some(confidence), _) => format!("confidence {:.2}", confidence),
            (None, Some(message)) => message.clone(),
            (None, None) => String::new(),
        };
        println!("  [{}] {} {}", marker, outcome.url, detail);
    }
}
