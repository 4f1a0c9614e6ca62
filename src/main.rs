use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

use welcomebot::application::errors::BotError;
use welcomebot::application::messaging::EventDispatcher;
use welcomebot::infrastructure::adapters::{RtmConnection, SlackAdapter};
use welcomebot::infrastructure::config::{redact, ResponseConfig, Settings};

#[derive(Parser)]
#[command(name = "welcomebot")]
#[command(about = "Answers Slack channel joins and mentions with configured responses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Response rules file
    #[arg(short, long, default_value = "config.json")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (token from SLACK_TOKEN)
    Run,
    /// Show version
    Version,
    /// Print an example config
    InitConfig,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => run_bot(&cli.config),
        Commands::Version => {
            println!("welcomebot v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::InitConfig => init_config(),
    }
}

fn run_bot(config_path: &str) -> ExitCode {
    let config = match ResponseConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Error opening config file: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if config.is_empty() {
        tracing::warn!("No response rules configured, the bot will not answer anything");
    }

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(serve(settings, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Bot stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn serve(settings: Settings, config: ResponseConfig) -> Result<(), BotError> {
    tracing::info!("Starting welcomebot (token: {})", redact(&settings.token));

    let adapter = Arc::new(SlackAdapter::from_settings(&settings));
    let (events, connection) = RtmConnection::spawn(adapter.clone());
    let mut dispatcher = EventDispatcher::new(adapter, Arc::new(config));

    let result = tokio::select! {
        result = dispatcher.run(events) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
            Ok(())
        }
    };

    connection.abort();
    result
}

fn init_config() -> ExitCode {
    match serde_json::to_string_pretty(&ResponseConfig::sample()) {
        Ok(json) => {
            println!("{}", json);
            println!("\nSave this to config.json and adjust as needed.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Failed to render config: {}", e);
            ExitCode::FAILURE
        }
    }
}
