//! Facility Desk - maintenance request API for multi-department organizations
//!
//! Members file maintenance requests against their departments; department
//! admins and maintenance staff triage them. Organization owners manage
//! departments and approve join requests.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{http::HeaderValue, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

use config::LogFormat;
use facility_desk::{api, config, db, services::LocalBlobStore, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("Facility Desk {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Load configuration first (before logging, so we know log format)
    let config = AppConfig::load().context("Failed to load configuration")?;

    // The guard must be kept alive for the duration of the program
    // to ensure log messages are flushed to files
    let _log_guard = init_logging(&config);

    info!("Facility Desk starting up");

    ensure_data_directory(&config)?;
    ensure_upload_directory(&config)?;

    info!("Initializing database connection");
    let db = db::init_pool(&config.database)
        .await
        .context("Failed to initialize database")?;

    let storage = Arc::new(LocalBlobStore::new(
        &config.storage.upload_dir,
        &config.storage.public_prefix,
    ));
    info!(
        upload_dir = ?config.storage.upload_dir,
        public_prefix = %config.storage.public_prefix,
        "Photo storage ready"
    );

    let state = AppState {
        config: config.clone(),
        db,
        storage,
    };

    let app = create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address configuration")?;

    info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("HTTP server is ready to accept connections");

    axum::serve(listener, app.into_make_service())
        .await
        .context("HTTP server error")?;

    Ok(())
}

/// Initialize the tracing subscriber from the logging configuration
///
/// Returns the file writer guard when logging to a file.
fn init_logging(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use config::LogTarget;
    use tracing_subscriber::{prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let log_config = &config.logging;

    match &log_config.target {
        LogTarget::Console => {
            let subscriber = tracing_subscriber::registry().with(env_filter);
            init_console_logging(subscriber, &log_config.format);
            None
        }
        LogTarget::File => {
            let (writer, guard) = create_file_writer(log_config);
            let subscriber = tracing_subscriber::registry().with(env_filter);
            init_file_logging(subscriber, &log_config.format, writer);
            Some(guard)
        }
        LogTarget::Both => {
            let (writer, guard) = create_file_writer(log_config);
            let subscriber = tracing_subscriber::registry().with(env_filter);
            init_both_logging(subscriber, &log_config.format, writer);
            Some(guard)
        }
    }
}

fn create_file_writer(
    log_config: &config::LoggingConfig,
) -> (
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
) {
    if let Err(e) = std::fs::create_dir_all(&log_config.log_dir) {
        eprintln!(
            "Warning: Failed to create log directory {:?}: {}",
            log_config.log_dir, e
        );
    }

    let file_appender = if log_config.daily_rotation {
        tracing_appender::rolling::daily(&log_config.log_dir, &log_config.log_prefix)
    } else {
        tracing_appender::rolling::never(&log_config.log_dir, &log_config.log_prefix)
    };

    tracing_appender::non_blocking(file_appender)
}

fn init_console_logging<S>(subscriber: S, format: &LogFormat)
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync,
{
    use tracing_subscriber::{fmt, prelude::*};

    match format {
        LogFormat::Json => subscriber
            .with(fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Compact => subscriber
            .with(fmt::layer().compact().with_target(false))
            .init(),
        LogFormat::Pretty => subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init(),
    }
}

fn init_file_logging<S>(
    subscriber: S,
    format: &LogFormat,
    writer: tracing_appender::non_blocking::NonBlocking,
) where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync,
{
    use tracing_subscriber::{fmt, prelude::*};

    // No ANSI colors in files
    match format {
        LogFormat::Json => subscriber
            .with(fmt::layer().json().with_target(true).with_writer(writer))
            .init(),
        LogFormat::Compact => subscriber
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .init(),
        LogFormat::Pretty => subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .init(),
    }
}

fn init_both_logging<S>(
    subscriber: S,
    format: &LogFormat,
    writer: tracing_appender::non_blocking::NonBlocking,
) where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync,
{
    use tracing_subscriber::{fmt, prelude::*};

    match format {
        LogFormat::Json => subscriber
            .with(fmt::layer().json().with_target(true))
            .with(fmt::layer().json().with_target(true).with_writer(writer))
            .init(),
        LogFormat::Compact => subscriber
            .with(fmt::layer().compact().with_target(false))
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .init(),
        LogFormat::Pretty => subscriber
            .with(fmt::layer().with_target(true))
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .init(),
    }
}

fn ensure_data_directory(config: &AppConfig) -> Result<()> {
    // Extract directory from database URL
    if let Some(path) = config.database.url.strip_prefix("sqlite://") {
        let path = path.split('?').next().unwrap_or(path);
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).context("Failed to create data directory")?;
                info!("Created data directory: {:?}", parent);
            }
        }
    }
    Ok(())
}

fn ensure_upload_directory(config: &AppConfig) -> Result<()> {
    let dir = &config.storage.upload_dir;
    if !dir.exists() {
        std::fs::create_dir_all(dir).context("Failed to create upload directory")?;
        info!("Created upload directory: {:?}", dir);
    }
    Ok(())
}

fn create_router(state: AppState, config: &AppConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&config.server.cors_origins))
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    api::app_router(state)
        .layer(CompressionLayer::new())
        .layer(trace_layer)
        .layer(cors)
}

/// Any origin unless the configuration lists specific ones
fn allowed_origins(origins: &[String]) -> AllowOrigin {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(parsed)
    }
}

fn print_help() {
    println!(
        r#"Facility Desk {}

USAGE:
    facility-desk [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information

ENVIRONMENT:
    FACILITY_DESK_CONFIG        Path to configuration file (default: config.yaml)
    FACILITY_DESK_HOST          Listen address
    FACILITY_DESK_PORT          Listen port
    FACILITY_DESK_LOG_FORMAT    pretty, json or compact
    FACILITY_DESK_UPLOAD_DIR    Directory uploaded photos are written to
    DATABASE_URL                SQLite connection URL
    JWT_SECRET                  Token signing secret (at least 32 characters)
    RUST_LOG                    Log filter

CONFIGURATION:
    The application looks for configuration files in the following order:
    1. Path specified by FACILITY_DESK_CONFIG environment variable
    2. ./config.yaml
    3. ./config/config.yaml
    4. /etc/facility-desk/config.yaml
    5. <user config dir>/facility-desk/config.yaml"#,
        env!("CARGO_PKG_VERSION")
    );
}
