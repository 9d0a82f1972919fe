//! CallMate command-line entry point
//!
//! Validates the routing configuration, routes single prompts and runs the
//! call analysis pipeline on transcript files.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};

use callmate::{
    config::LogFormat, metrics, tiers::types::Tier, AnalysisRequest, AppError, AppResult,
    AppState, CallTranscript, Config, ConfigurationError,
};

/// Tier-routed LLM gateway for call transcript analysis
#[derive(Parser)]
#[command(name = "callmate", version)]
#[command(about = "Route LLM requests by service tier and analyze call transcripts", long_about = None)]
struct Cli {
    /// Print Prometheus metrics to stdout after the command
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the routing table against the catalog and configured providers
    CheckConfig,
    /// Route one prompt through a tier's model chain
    Route {
        /// Service tier (free, basic, pro, enterprise)
        #[arg(long)]
        tier: String,
        /// File containing the user prompt
        #[arg(long, value_name = "FILE")]
        prompt_file: PathBuf,
        /// File containing a system prompt
        #[arg(long, value_name = "FILE")]
        system_file: Option<PathBuf>,
        /// Ask the model for a JSON object
        #[arg(long)]
        json: bool,
    },
    /// Run the call analysis pipeline on a transcript
    Analyze {
        /// Service tier (free, basic, pro, enterprise)
        #[arg(long)]
        tier: String,
        /// JSON transcript file
        #[arg(long, value_name = "FILE")]
        transcript: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::Pretty);
            return fail(startup_error(e));
        }
    };
    init_tracing(config.log_format);
    metrics::init_metrics();

    let result = match AppState::new(config) {
        Ok(state) => run(&state, cli.command).await,
        Err(e) => Err(startup_error(e)),
    };

    if cli.print_metrics {
        print!("{}", metrics::render());
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "callmate=info".into());

    // stdout carries command output; logs go to stderr
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init(),
    }
}

async fn run(state: &AppState, command: Commands) -> AppResult<()> {
    match command {
        Commands::CheckConfig => {
            print_json(&serde_json::json!({
                "routing": state.router.table(),
                "provider_timeout_secs": state.config.provider_timeout.as_secs(),
                "prompts_dir": state.config.prompts_dir,
            }))?;
            info!("Routing configuration is valid");
        }
        Commands::Route {
            tier,
            prompt_file,
            system_file,
            json,
        } => {
            let tier: Tier = tier.parse()?;
            let mut request = AnalysisRequest::new(read_text(&prompt_file).await?);
            if let Some(path) = system_file {
                request = request.with_system_prompt(read_text(&path).await?);
            }
            if json {
                request = request.json();
            }

            let routed = state.router.route(tier, &request).await?;
            print_json(&routed)?;
        }
        Commands::Analyze { tier, transcript } => {
            let tier: Tier = tier.parse()?;
            let transcript: CallTranscript = serde_json::from_str(&read_text(&transcript).await?)?;

            let analysis = state.analyzer.analyze(tier, &transcript).await?;
            print_json(&analysis)?;
        }
    }
    Ok(())
}

async fn read_text(path: &Path) -> AppResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
        .map_err(AppError::Internal)
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Keep configuration defects distinguishable from other startup failures
fn startup_error(err: anyhow::Error) -> AppError {
    match err.downcast_ref::<ConfigurationError>() {
        Some(config_error) => {
            error!(error = %format!("{:#}", err), "Invalid configuration");
            AppError::Configuration(config_error.clone())
        }
        None => AppError::Internal(err),
    }
}

fn fail(err: AppError) -> ExitCode {
    if let AppError::Internal(inner) = &err {
        error!(error = %format!("{:#}", inner), "Command failed");
    }
    match serde_json::to_string(&err.to_response()) {
        Ok(body) => eprintln!("{}", body),
        Err(_) => eprintln!("{}", err),
    }
    ExitCode::FAILURE
}
