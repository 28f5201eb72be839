//! Avatar Fetcher CLI application
//!
//! Command-line interface for listing, searching and downloading the avatars
//! on a VRChat account.

use std::fs::File;
use std::path::PathBuf;
use std::process;
use std::sync::Mutex;

use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use avatar_fetcher::app::AppContext;
use avatar_fetcher::auth::{default_settings_path, Settings};
use avatar_fetcher::cli::{
    handle_auth, handle_browse, handle_download, handle_download_url, handle_list, handle_login,
    handle_theme, handle_thumbnail, Cli, Commands,
};
use avatar_fetcher::config::AppConfig;
use avatar_fetcher::constants::files;
use avatar_fetcher::errors::{AppError, Result};

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        if e.is_warning() {
            eprintln!("Warning: {}", e);
        } else {
            eprintln!("Error: {}", e);
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // A missing .env is fine
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    let (config, config_source) = load_config(&cli).await?;
    let log_file = init_logging(&cli, &config)?;

    info!("Avatar Fetcher v{} starting", env!("CARGO_PKG_VERSION"));
    match &config_source {
        Some(path) => info!("Loaded configuration from: {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }
    if let Some(path) = &log_file {
        info!("Writing log to {}", path.display());
    }

    let settings_path = default_settings_path()?;
    let settings = Settings::load(&settings_path)?;
    let mut ctx = AppContext::new(config.to_runtime_config(), settings_path, settings);

    let result = match cli.command {
        Commands::Login(args) => handle_login(&mut ctx, args).await,
        Commands::List(args) => handle_list(&mut ctx, args).await,
        Commands::Download(args) => handle_download(&mut ctx, args).await,
        Commands::DownloadUrl(args) => handle_download_url(&mut ctx, args).await,
        Commands::Thumbnail(args) => handle_thumbnail(&mut ctx, args).await,
        Commands::Browse(args) => handle_browse(&mut ctx, args).await,
        Commands::Auth(args) => handle_auth(&ctx, args).await,
        Commands::Theme(args) => handle_theme(&mut ctx, args),
    };

    if let Err(e) = &result {
        tracing::error!("{} error: {}", e.category(), e);
    }
    result
}

/// Loads configuration, creating the default file on first run
async fn load_config(cli: &Cli) -> Result<(AppConfig, Option<PathBuf>)> {
    if cli.global.config.is_none() {
        // The generated file is a convenience; carry on without it
        if let Err(e) = AppConfig::initialize_first_run().await {
            eprintln!("Warning: could not create default config: {}", e);
        }
    }
    AppConfig::load_with_source(cli.global.config.clone()).await
}

/// Initialize logging from CLI verbosity and the `[logging]` config
///
/// The console layer follows the CLI flags. With `--save-log` or
/// `logging.file_logging` a second plain-text layer writes to a file at the
/// configured level.
fn init_logging(cli: &Cli, config: &AppConfig) -> Result<Option<PathBuf>> {
    let console_filter = EnvFilter::from_default_env().add_directive(
        format!("avatar_fetcher={}", cli.log_level())
            .parse()
            .map_err(|e| AppError::generic(format!("Invalid log directive: {}", e)))?,
    );

    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let log_path = match (&cli.global.save_log, config.logging.file_logging) {
        (Some(Some(path)), _) => Some(path.clone()),
        (Some(None), _) | (None, true) => Some(
            config
                .logging
                .log_file
                .clone()
                .unwrap_or_else(default_log_file_name),
        ),
        (None, false) => None,
    };

    let file_layer = match &log_path {
        Some(path) => {
            let file = File::create(path)?;
            let file_filter = EnvFilter::try_new(format!("avatar_fetcher={}", config.logging.level))
                .map_err(|e| {
                    AppError::generic(format!(
                        "Invalid logging.level '{}': {}",
                        config.logging.level, e
                    ))
                })?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(file_filter),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }

    Ok(log_path)
}

/// `avatar_fetcher_log_<YYYYmmdd_HHMMSS>.txt` in the working directory
fn default_log_file_name() -> PathBuf {
    PathBuf::from(format!(
        "{}{}.txt",
        files::LOG_FILE_PREFIX,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ))
}
