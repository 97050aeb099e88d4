/**
 * EngageIQ Sync CLI
 *
 * Inspect and drain the unsynced queue from a terminal: list pending
 * writes, retry them, or discard them.
 */

#[cfg(feature = "cli")]
mod cli {
    use clap::{Parser, Subcommand};
    use engageiq_sync::client::config::Config;
    use engageiq_sync::client::offline::{OfflineManager, RetryOneOutcome};
    use std::path::PathBuf;

    /// Manage the EngageIQ unsynced write queue
    #[derive(Debug, Parser)]
    #[command(name = "engageiq-sync", version)]
    pub struct Cli {
        /// Remote store base URL
        #[arg(long, env = "ENGAGEIQ_API_URL")]
        pub api_url: Option<String>,

        /// Directory holding the local queue database
        #[arg(long, env = "ENGAGEIQ_DATA_DIR")]
        pub data_dir: Option<PathBuf>,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Subcommand)]
    pub enum Command {
        /// List unsynced writes
        List {
            /// Print the raw queue as JSON
            #[arg(long)]
            json: bool,
        },

        /// Show queue statistics
        Stats,

        /// Retry every ready write, or one write by id
        Retry {
            /// Entry id; retries ignore backoff when given
            id: Option<String>,
        },

        /// Drop one unsynced write
        Discard {
            /// Entry id
            id: String,
        },

        /// Drop every unsynced write
        Clear,

        /// Show a user's total karma
        Karma {
            /// User id
            user_id: String,
        },
    }

    pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
        let mut config = Config::from_env()?;
        if let Some(url) = cli.api_url {
            config.app_mut().server_url = Some(url);
        }
        if let Some(dir) = cli.data_dir {
            config.app_mut().data_dir = Some(dir);
        }
        config.app().validate()?;

        let manager = OfflineManager::from_config(&config).await?;

        match cli.command {
            Command::List { json } => {
                let entries = manager.queue().snapshot().await;
                if json {
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                } else if entries.is_empty() {
                    println!("No unsynced writes.");
                } else {
                    println!("{:<40} {:<16} {:>8}  LAST ATTEMPT", "ID", "TYPE", "ATTEMPTS");
                    for entry in &entries {
                        let last = entry
                            .last_attempt
                            .and_then(|ms| chrono::DateTime::from_timestamp_millis(ms as i64))
                            .map(|dt| dt.to_rfc3339())
                            .unwrap_or_else(|| "-".to_string());
                        println!(
                            "{:<40} {:<16} {:>8}  {}",
                            entry.id(),
                            entry.kind().as_str(),
                            entry.attempts,
                            last
                        );
                    }
                }
            }
            Command::Stats => {
                let stats = manager.stats().await;
                println!("pending:         {}", stats.pending);
                println!("retrying:        {}", stats.retrying);
                println!("never attempted: {}", stats.never_attempted);
                println!("ready now:       {}", stats.ready_now);
            }
            Command::Retry { id: Some(id) } => match manager.retry_one(&id).await {
                RetryOneOutcome::NotFound => println!("{} is not queued", id),
                RetryOneOutcome::Delivered => println!("{} synced", id),
                RetryOneOutcome::Failed => println!("{} failed; still queued", id),
                RetryOneOutcome::Purged => println!("{} was invalid and has been dropped", id),
            },
            Command::Retry { id: None } => {
                let report = manager.retry_all().await;
                println!(
                    "attempted {}, synced {}, failed {}, dropped {}",
                    report.attempted,
                    report.succeeded.len(),
                    report.failed.len(),
                    report.purged.len()
                );
            }
            Command::Discard { id } => {
                if manager.discard(&id).await {
                    println!("Discarded {}", id);
                } else {
                    println!("{} is not queued", id);
                }
            }
            Command::Clear => {
                let discarded = manager.discard_all().await;
                println!("Discarded {} unsynced writes", discarded);
            }
            Command::Karma { user_id } => {
                let total = manager.karma().total_karma(&user_id).await?;
                println!("{}: {} karma", user_id, total);
            }
        }

        Ok(())
    }
}

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use clap::Parser;

    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .with_writer(std::io::stderr)
        .init();

    cli::run(cli::Cli::parse()).await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("The sync CLI requires the 'cli' feature to be enabled.");
    eprintln!("Run with: cargo run --bin engageiq-sync --features cli");
    std::process::exit(1);
}
