//! Bootstrap helpers for starting Roster from a single YAML config.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use roster_config::{
    load_config, validate_config, ConfigError, ObservabilityConfig, RosterConfig, StoreSpec,
    BACKEND_IN_MEMORY, BACKEND_JSON_FILE,
};
use roster_core::generator::OccurrenceGenerator;
use roster_core::resolver::MutationResolver;
use roster_core::store::{ShiftStore, StoreError};
use roster_stores::{InMemoryShiftStore, JsonFileShiftStore};

use crate::engine::ShiftEngine;

/// Runtime bootstrap errors.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("unsupported store backend: {0}")]
    UnsupportedStoreBackend(String),
    #[error("store backend '{0}' requires store.path")]
    MissingStorePath(String),
}

/// Running app bundle created from unified config.
pub struct RosterApp {
    pub engine: Arc<ShiftEngine>,
    pub config: RosterConfig,
}

static TRACING_INIT: OnceLock<()> = OnceLock::new();

impl RosterApp {
    /// Create a runnable app from a single `roster.yaml`.
    pub async fn from_config_path(path: impl Into<PathBuf>) -> Result<Self, BootstrapError> {
        let path = path.into();
        let config = load_config(&path)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Self::from_config(config).await
    }

    /// Create a runnable app from an already parsed config.
    pub async fn from_config(config: RosterConfig) -> Result<Self, BootstrapError> {
        validate_config(&config)?;
        init_tracing_if_needed(&config.observability);

        let store = build_store(&config.store).await?;
        let resolver = MutationResolver::new(
            OccurrenceGenerator::new(config.engine.max_occurrences),
            config.engine.recurrence_clamp_days,
        );
        tracing::info!(
            app = %config.app.name,
            environment = %config.app.environment,
            store = %config.store.backend,
            max_occurrences = config.engine.max_occurrences,
            "roster runtime ready"
        );

        Ok(Self {
            engine: Arc::new(ShiftEngine::new(store, resolver)),
            config,
        })
    }
}

async fn build_store(spec: &StoreSpec) -> Result<Arc<dyn ShiftStore>, BootstrapError> {
    match spec.backend.as_str() {
        BACKEND_IN_MEMORY => Ok(Arc::new(InMemoryShiftStore::new())),
        BACKEND_JSON_FILE => {
            let path = spec
                .path
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| BootstrapError::MissingStorePath(spec.backend.clone()))?;
            Ok(Arc::new(JsonFileShiftStore::open(path).await?))
        }
        other => Err(BootstrapError::UnsupportedStoreBackend(other.to_string())),
    }
}

/// Install the global tracing subscriber once.
///
/// `RUST_LOG` wins over `observability.log_level`. Output goes to stderr,
/// or to `ROSTER_LOG_FILE` when set, else to `observability.log_file`.
pub fn init_tracing_if_needed(observability: &ObservabilityConfig) {
    TRACING_INIT.get_or_init(|| {
        let log_file_path = std::env::var("ROSTER_LOG_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| observability.log_file.clone());
        let file_writer = log_file_path.as_deref().and_then(create_log_writer);
        let fallback_level = match observability.log_level.trim().to_ascii_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => "info",
        };

        let make_filter = || {
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback_level))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        };

        match file_writer {
            Some(writer) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(make_filter())
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(writer)
                    .try_init();
            }
            None => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(make_filter())
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .try_init();
            }
        }

        tracing::info!(
            log_level = %observability.log_level,
            log_file = log_file_path.as_deref().unwrap_or("(stderr)"),
            "tracing initialized"
        );
    });
}

fn create_log_writer(path: &str) -> Option<SharedFileMakeWriter> {
    use std::fs::{create_dir_all, OpenOptions};
    use std::path::Path;

    let file_path = Path::new(path);
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = create_dir_all(parent) {
                eprintln!(
                    "failed to create log directory '{}': {}",
                    parent.display(),
                    err
                );
                return None;
            }
        }
    }
    match OpenOptions::new().create(true).append(true).open(file_path) {
        Ok(file) => Some(SharedFileMakeWriter::new(file)),
        Err(err) => {
            eprintln!("failed to open log file '{}': {}", file_path.display(), err);
            None
        }
    }
}

#[derive(Clone)]
struct SharedFileMakeWriter {
    file: Arc<std::sync::Mutex<std::fs::File>>,
}

impl SharedFileMakeWriter {
    fn new(file: std::fs::File) -> Self {
        Self {
            file: Arc::new(std::sync::Mutex::new(file)),
        }
    }
}

struct SharedFileWriter {
    file: Arc<std::sync::Mutex<std::fs::File>>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedFileMakeWriter {
    type Writer = SharedFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileWriter {
            file: self.file.clone(),
        }
    }
}

impl std::io::Write for SharedFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| std::io::Error::other("log file mutex poisoned"))?;
        std::io::Write::write(&mut *file, buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| std::io::Error::other("log file mutex poisoned"))?;
        std::io::Write::flush(&mut *file)
    }
}
