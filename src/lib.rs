pub mod models;
pub mod services;
pub mod api;

use api::AppState;
use services::{load_config, HumaniserPipeline, ParaphraseService};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

static PROCESS_START: OnceLock<Instant> = OnceLock::new();
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const KEEP_LOG_FILES: usize = 30;

fn startup_elapsed_ms() -> u128 {
    PROCESS_START
        .get()
        .map(|t| t.elapsed().as_millis())
        .unwrap_or(0)
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| services::is_truthy(&v))
        .unwrap_or(false)
}

/// File + console logging; one timestamped file per process
fn init_logging() {
    let disable_file_log = env_flag("HUMANISER_DISABLE_FILE_LOG");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if disable_file_log {
        init_console_only_logging(env_filter);
        info!("logging.file_disabled");
        return;
    }

    let logs_dir = match std::env::var("HUMANISER_LOG_DIR") {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => get_logs_dir(),
    };

    if let Err(e) = fs::create_dir_all(&logs_dir) {
        init_console_only_logging(env_filter);
        tracing::warn!(dir = %logs_dir.display(), error = %e, "logging.dir_unwritable");
        return;
    }

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let log_filename = format!("humaniser_{}.log", timestamp);

    let file_appender = rolling::never(&logs_dir, &log_filename);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(file_guard);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions))
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %logs_dir.join(&log_filename).display(),
        "logging.file_enabled"
    );

    // Pruning runs off the startup path
    std::thread::spawn(move || prune_logs(&logs_dir, KEEP_LOG_FILES));
}

fn get_logs_dir() -> PathBuf {
    match dirs::data_local_dir() {
        Some(data_dir) => data_dir.join("humaniser").join("logs"),
        None => PathBuf::from("logs"),
    }
}

fn prune_logs(logs_dir: &Path, keep: usize) {
    let mut entries: Vec<_> = match fs::read_dir(logs_dir) {
        Ok(rd) => rd.filter_map(|e| e.ok()).collect(),
        Err(_) => return,
    };

    entries.retain(|e| {
        let name = e.file_name().to_string_lossy().to_string();
        name.starts_with("humaniser_") && name.ends_with(".log")
    });

    if entries.len() <= keep {
        return;
    }

    entries.sort_by_key(|e| {
        e.metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
    });

    let remove_count = entries.len().saturating_sub(keep);
    for entry in entries.into_iter().take(remove_count) {
        let _ = fs::remove_file(entry.path());
    }
}

fn init_console_only_logging(env_filter: EnvFilter) {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions))
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

/// Console logging for command-line tools (default level `warn`)
pub fn init_console_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    init_console_only_logging(env_filter);
}

/// Start the web service and block until shutdown
pub async fn run() -> anyhow::Result<()> {
    PROCESS_START.get_or_init(Instant::now);
    dotenvy::dotenv().ok();

    let logging_t0 = Instant::now();
    init_logging();
    info!(startup_ms = startup_elapsed_ms(), logging_ms = logging_t0.elapsed().as_millis(), "logging.initialized");

    let config = load_config()?;
    info!(
        model = %config.paraphrase.model,
        enabled = config.paraphrase.enabled,
        preload = config.paraphrase.preload,
        "config.loaded"
    );

    let paraphraser = Arc::new(ParaphraseService::from_config(&config.paraphrase));
    if config.paraphrase.preload {
        let ready = paraphraser.ensure_ready().await;
        info!(ready, startup_ms = startup_elapsed_ms(), "paraphrase.preloaded");
    }

    let state = AppState {
        pipeline: HumaniserPipeline::new(paraphraser),
    };
    api::serve(&config.server, state).await?;

    info!("humaniser.stopped");
    Ok(())
}
