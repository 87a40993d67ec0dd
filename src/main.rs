use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use grabbitt_scan::amount::{Amount, AmountError};
use grabbitt_scan::config::{Config, ConfigError};
use grabbitt_scan::reward::{ResolvedScheme, calculate_points, resolve_scheme};
use grabbitt_scan::session::{
    Notice, RedemptionController, Route, ScanController, ScreenState, UiEvent,
};
use grabbitt_scan::{BackendError, HttpBackend, parse_customer_qr};

#[derive(Parser, Debug)]
#[command(name = "grabbitt-scan")]
#[command(about = "Seller-side QR scan, reward and redemption workflows", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Preview the points an order earns under a seller profile
    Preview {
        /// Seller profile JSON as returned by the backend
        #[arg(long)]
        profile: PathBuf,
        /// Order amount, required for percentage and slab schemes
        #[arg(long)]
        amount: Option<String>,
    },
    /// Classify a scanned customer QR payload
    Parse { payload: String },
    /// Validate a customer code and award points
    Scan {
        payload: String,
        #[arg(long)]
        profile: PathBuf,
        #[arg(long)]
        amount: Option<String>,
        #[command(flatten)]
        backend: BackendArgs,
    },
    /// Process a redemption code
    Redeem {
        payload: String,
        #[command(flatten)]
        backend: BackendArgs,
    },
}

#[derive(Args, Debug)]
struct BackendArgs {
    /// Base URL of the Grabbitt API
    #[arg(long, env = "GRABBITT_API_URL")]
    api_url: String,
    /// Bearer token of the signed-in seller
    #[arg(long, env = "GRABBITT_API_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// Request timeout in seconds
    #[arg(long, env = "GRABBITT_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,
}

impl BackendArgs {
    fn config(&self) -> Result<Config, ConfigError> {
        let config = Config::new(&self.api_url)?
            .with_timeout(Duration::from_secs(self.timeout_secs))?;
        Ok(match &self.token {
            Some(token) => config.with_auth_token(token.clone()),
            None => config,
        })
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Amount(#[from] AmountError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("{0}")]
    Rejected(String),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Preview { profile, amount } => {
            let resolved = load_scheme(&profile)?;
            let amount = amount.as_deref().map(str::parse::<Amount>).transpose()?;
            println!("{}", calculate_points(&resolved.scheme, amount));
            Ok(())
        }
        Command::Parse { payload } => {
            let parsed = parse_customer_qr(&payload).map_err(|e| CliError::Rejected(e.to_string()))?;
            println!("{}", serde_json::to_string(&parsed)?);
            Ok(())
        }
        Command::Scan {
            payload,
            profile,
            amount,
            backend,
        } => {
            let resolved = load_scheme(&profile)?;
            let http = HttpBackend::new(backend.config()?)?;
            let mut controller = ScanController::new(resolved.scheme, http);

            let mut events = vec![UiEvent::Barcode(payload)];
            if let Some(amount) = amount {
                events.push(UiEvent::AmountChanged(amount));
                events.push(UiEvent::SubmitAmount);
            }
            let notices = controller.run(tokio_stream::iter(events)).await;
            report_alerts(&notices)?;

            match controller.session().state() {
                ScreenState::Success(summary) => {
                    println!(
                        "{} {}",
                        summary.headline(),
                        summary.customer_name().unwrap_or("customer")
                    );
                    Ok(())
                }
                ScreenState::AmountInput(entry) => Err(CliError::Rejected(format!(
                    "order amount required (previewed {} points)",
                    entry.preview
                ))),
                other => Err(CliError::Rejected(format!(
                    "scan ended while {}",
                    other.name()
                ))),
            }
        }
        Command::Redeem { payload, backend } => {
            let http = HttpBackend::new(backend.config()?)?;
            let mut controller = RedemptionController::new(http);
            let notices = controller.dispatch(UiEvent::Barcode(payload)).await;
            report_alerts(&notices)?;

            for notice in &notices {
                if let Notice::Navigate(Route::RedemptionSuccess {
                    redemption_id,
                    points_redeemed,
                }) = notice
                {
                    println!("redeemed {redemption_id}: -{points_redeemed}");
                    return Ok(());
                }
            }
            Err(CliError::Rejected("redemption not confirmed".to_string()))
        }
    }
}

fn load_scheme(path: &Path) -> Result<ResolvedScheme, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let profile: serde_json::Value = serde_json::from_str(&raw).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    // incomplete configurations are logged by the resolver
    Ok(resolve_scheme(&profile))
}

/// The first alert ends the command.
fn report_alerts(notices: &[Notice]) -> Result<(), CliError> {
    match notices.iter().find_map(|notice| match notice {
        Notice::Alert(alert) => Some(alert),
        Notice::Navigate(_) => None,
    }) {
        Some(alert) => Err(CliError::Rejected(alert.to_string())),
        None => Ok(()),
    }
}
