//! Blotter CLI - blot command

use anyhow::Result;
use clap::{Parser, Subcommand};
use coalesce::{Coalescer, CoalescerConfig};
use std::time::Duration;
use tokio::io::AsyncBufReadExt;

/// Blotter - debounced fire-and-forget file writes
#[derive(Parser)]
#[command(name = "blot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Follow-up write delay in milliseconds (default: 100)
    #[arg(long)]
    debounce_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append stdin to a file, line by line
    Append {
        /// Target file path
        path: String,
    },
    /// Replace a file's content
    Write {
        /// Target file path
        path: String,
        /// New content (a trailing newline is added)
        content: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = CoalescerConfig::default();
    if let Some(ms) = cli.debounce_ms {
        config.debounce = Duration::from_millis(ms);
    }
    let writer = Coalescer::with_config(config);

    match cli.command {
        Commands::Append { path } => {
            let mut queued = 0usize;
            let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                writer.append(path.as_str(), format!("{line}\n"));
                queued += 1;
            }
            tracing::debug!(path = %path, queued, "stdin drained");
        }
        Commands::Write { path, content } => {
            tracing::debug!(path = %path, bytes = content.len(), "replacement queued");
            writer.write(path.as_str(), format!("{content}\n"));
        }
    }

    quiesce(&writer).await;
    tracing::debug!("all writes settled");
    Ok(())
}

/// Fire-and-forget has no flush; poll until queued work has landed
/// so the process does not exit with writes still staged.
async fn quiesce(writer: &Coalescer) {
    while !writer.idle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
