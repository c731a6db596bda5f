//! Access point push agent CLI.
//!
//! Runs the background agent against native host adapters. See the
//! `ap_push_agent` library for the core functionality.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use ap_push_agent::bootstrap::Bootstrap;
use ap_push_agent::dispatcher::NotificationDispatcher;
use ap_push_agent::native::{self, ConsoleNotifier, LocalContainer, RecordedPushManager};
use ap_push_agent::transmitter::send_with_retry;
use ap_push_agent::{AgentConfig, AgentHost, ApplicationServerKey, BackgroundAgent, HttpTransmitter, PushEvent};
use clap::{Parser, Subcommand};

/// Events buffered between stdin and the host loop.
const EVENT_QUEUE_CAPACITY: usize = 32;

// CLI
#[derive(Parser)]
#[command(name = "ap-push-agent")]
#[command(version)]
#[command(about = "Web push subscription agent for access point alerts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode and validate an application server key (defaults to the configured key)
    DecodeKey {
        /// URL-safe base64 server key
        key: Option<String>,
    },
    /// Save a recorded subscription descriptor on the backend
    Save {
        /// Path to the subscription JSON (as produced by JSON.stringify)
        file: PathBuf,
    },
    /// Show a notification for one push payload
    Notify {
        /// Payload text; omit to simulate a push without data
        payload: Option<String>,
    },
    /// Run the agent, reading JSON-lines events from stdin
    Run {
        /// Recorded subscription handed out by the push manager
        #[arg(long)]
        subscription: PathBuf,
    },
    /// Print the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    let config = AgentConfig::load()?;

    match cli.command {
        Commands::DecodeKey { key } => {
            let encoded = key.unwrap_or_else(|| config.server_public_key.clone());
            decode_key(&encoded)?;
        }
        Commands::Save { file } => {
            save(&config, &file).await?;
        }
        Commands::Notify { payload } => {
            notify(&config, payload).await?;
        }
        Commands::Run { subscription } => {
            run(config, &subscription).await?;
        }
        Commands::Config { init } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if init {
                let path = AgentConfig::default_path()?;
                config.save_to(&path)?;
                println!("Wrote {}", path.display());
            }
        }
    }

    Ok(())
}

fn decode_key(encoded: &str) -> Result<()> {
    let key = ApplicationServerKey::from_base64url(encoded).context("Invalid server key")?;
    let hex: String = key.as_bytes().iter().map(|b| format!("{:02x}", b)).collect();

    println!("length: {} bytes", key.as_bytes().len());
    println!("hex:    {}", hex);
    Ok(())
}

async fn save(config: &AgentConfig, file: &std::path::Path) -> Result<()> {
    config.validate()?;
    let subscription = native::read_subscription(file)?;
    let transmitter = HttpTransmitter::from_config(config)?;

    log::info!(
        "[WebPush] Saving {} on {}",
        subscription.endpoint_for_log(),
        transmitter.endpoint()
    );
    let confirmation = send_with_retry(&transmitter, &config.retry, &subscription)
        .await
        .context("Failed to save subscription")?;

    println!("{}", confirmation);
    Ok(())
}

async fn notify(config: &AgentConfig, payload: Option<String>) -> Result<()> {
    let dispatcher = NotificationDispatcher::new(config.notification_title.clone(), Arc::new(ConsoleNotifier));
    let event = match payload {
        Some(text) => PushEvent::with_data(text),
        None => PushEvent::empty(),
    };

    dispatcher.on_push(&event).await?;
    Ok(())
}

/// Register the agent, then feed stdin events through the host until EOF.
async fn run(config: AgentConfig, subscription: &std::path::Path) -> Result<()> {
    config.validate()?;

    let bootstrap = Bootstrap::new(Arc::new(LocalContainer), config.script_url.clone());
    if let Err(e) = bootstrap.register().await {
        log::error!("[Agent] Registration failed: {}", e);
        return Err(e.into());
    }

    let agent = Arc::new(BackgroundAgent::new(
        &config,
        Arc::new(RecordedPushManager::from_file(subscription)?),
        Arc::new(HttpTransmitter::from_config(&config)?),
        Arc::new(ConsoleNotifier),
    )?);

    let (host, events) = AgentHost::new(agent, EVENT_QUEUE_CAPACITY);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let (stats, forwarded) = native::run_host(host, events, stdin).await;

    println!(
        "{} activation(s), {} push(es) handled",
        stats.activations, stats.pushes
    );

    let forwarded = forwarded.context("Failed to read events from stdin")?;
    log::info!("[Host] Input closed after {} event(s)", forwarded);
    Ok(())
}
