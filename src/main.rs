use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use flow_guide_conversation::adapters::{build_provider, build_publisher, build_secret_store};
use flow_guide_conversation::application::{
    ConversationTurnHandler, EventRouting, TurnError, TurnOutcome,
};
use flow_guide_conversation::config::{AppConfig, LogFormat, LoggingConfig};
use flow_guide_conversation::ports::ProviderCredentials;

#[derive(Parser, Debug)]
#[command(
    name = "flow-guide-turn",
    version,
    about = "Run one flow-guide conversation turn"
)]
struct Cli {
    /// File holding the inbound event body; stdin when omitted
    #[arg(long, env = "FLOW_GUIDE_EVENT")]
    event: Option<PathBuf>,
}

fn init_logging(config: &LoggingConfig) {
    let filter = config
        .env_filter()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // stdout is reserved for published events
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn load_config() -> Result<AppConfig, TurnError> {
    let config = AppConfig::load()?;
    config
        .validate()
        .map_err(|e| TurnError::Config(e.into()))?;
    Ok(config)
}

async fn read_body(cli: &Cli) -> std::io::Result<String> {
    match &cli.event {
        Some(path) => tokio::fs::read_to_string(path).await,
        None => {
            use tokio::io::AsyncReadExt;
            let mut body = String::new();
            tokio::io::stdin().read_to_string(&mut body).await?;
            Ok(body)
        }
    }
}

async fn run(body: &str, config: AppConfig) -> Result<TurnOutcome, TurnError> {
    let store = build_secret_store(&config.secrets);
    let credentials =
        ProviderCredentials::fetch(store.as_ref(), &config.secrets.credential_names()).await?;

    let provider = build_provider(&config.ai, &credentials);
    let publisher = build_publisher(&config.events);
    let handler = ConversationTurnHandler::new(
        provider,
        publisher,
        EventRouting::new(&config.events.source, &config.events.detail_type),
    );

    handler.handle_raw(body).await
}

#[tokio::main]
async fn main() -> ExitCode {
    // before clap so `.env` can supply FLOW_GUIDE_EVENT too
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            init_logging(&LoggingConfig::default());
            tracing::error!(error = %err, kind = %err.kind(), "Invalid configuration");
            return ExitCode::from(2);
        }
    };
    init_logging(&config.logging);

    let body = match read_body(&cli).await {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(error = %err, "Could not read event body");
            return ExitCode::FAILURE;
        }
    };

    match run(&body, config).await {
        Ok(TurnOutcome::Responded(_)) => ExitCode::SUCCESS,
        Ok(TurnOutcome::Rejected(event)) => {
            tracing::info!(error_type = %event.error_type, "Turn ended with error event");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, kind = %err.kind(), "Turn failed");
            ExitCode::FAILURE
        }
    }
}
