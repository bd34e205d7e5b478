//! Logging infrastructure - structured tracing throughout the runtime
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Configurable log level, overridable through `RUST_LOG`
//! - Zero-cost when disabled
//! - Optional JSON output and span events
//! - Optional file output through a non-blocking appender

use once_cell::sync::OnceCell;
use std::io;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::allocator::{ObjRef, ScopeId};

pub use tracing::{debug, error, info, trace, warn};

/// Event targets emitted by the runtime
const TARGETS: [&str; 6] = ["scoperc", "allocator", "scope", "refcount", "containers", "runtime"];

/// Set once the subscriber is installed; holds the file writer guard if any
static LOGGER: OnceCell<Option<WorkerGuard>> = OnceCell::new();

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Log file path; console only when `None`
    pub log_path: Option<String>,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_path: None,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // SCOPERC_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level_str) = std::env::var("SCOPERC_LOG_LEVEL") {
            config.level = parse_level(&level_str).unwrap_or(Level::INFO);
        }

        // SCOPERC_LOG_FILE: path to log file
        if let Ok(path) = std::env::var("SCOPERC_LOG_FILE") {
            config.log_path = Some(path);
        }

        config.json_format = std::env::var("SCOPERC_LOG_JSON").is_ok();
        config.show_spans = std::env::var("SCOPERC_LOG_SPANS").is_ok();

        config
    }

    /// Minimal logging for hot loops
    pub fn performance() -> Self {
        Self {
            level: Level::ERROR,
            ..Self::default()
        }
    }

    /// Verbose logging including every refcount event
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            log_path: Some("scoperc.log".to_string()),
            json_format: false,
            show_spans: true,
        }
    }
}

fn parse_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize logging with configuration from the environment
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration
///
/// Only the first call installs a subscriber; later calls are ignored, as is
/// a subscriber installed by the embedding program.
pub fn init_with_config(config: LogConfig) {
    LOGGER.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(config.level)));

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let (writer, guard) = match &config.log_path {
            Some(path) => {
                let path = Path::new(path);
                let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
                let file = path.file_name().map(|f| f.to_owned()).unwrap_or_else(|| "scoperc.log".into());
                let (w, g) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file));
                (tracing_subscriber::fmt::writer::BoxMakeWriter::new(w), Some(g))
            }
            None => (tracing_subscriber::fmt::writer::BoxMakeWriter::new(io::stderr), None),
        };

        let layer = if config.json_format {
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_span_events(span_events)
                .boxed()
        } else {
            fmt::layer()
                .with_writer(writer)
                .with_span_events(span_events)
                .with_target(true)
                .with_line_number(cfg!(debug_assertions))
                .boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init()
            .ok();

        guard
    });
}

/// Filter directives enabling every runtime target at `level`
fn directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    TARGETS.iter().map(|t| format!("{}={}", t, level)).collect::<Vec<_>>().join(",")
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER.get().is_some()
}

// ============================================================================
// Runtime-specific logging functions
// ============================================================================

/// Log a record allocation
#[inline]
pub fn log_allocation(obj: ObjRef, scope: ScopeId, size_bytes: usize) {
    trace!(
        target: "allocator",
        event = "allocation",
        record = obj.index(),
        scope,
        size_bytes,
        "Record allocated"
    );
}

/// Log a record destruction
#[inline]
pub fn log_destruction(obj: ObjRef, scope: ScopeId, hooked: bool) {
    trace!(
        target: "allocator",
        event = "destruction",
        record = obj.index(),
        scope,
        hooked,
        "Record destroyed"
    );
}

/// Log a destruction deferred to an ancestor scope
#[inline]
pub fn log_deferral(obj: ObjRef, home: ScopeId, current: ScopeId) {
    trace!(
        target: "refcount",
        event = "deferral",
        record = obj.index(),
        home,
        current,
        "Destruction deferred to home scope"
    );
}

/// Log a scope entry
#[inline]
pub fn log_scope_push(scope: ScopeId) {
    debug!(target: "scope", event = "scope_push", scope, "Scope entered");
}

/// Log a scope exit and the size of its drained queue
#[inline]
pub fn log_scope_pop(scope: ScopeId, drained: usize) {
    debug!(target: "scope", event = "scope_pop", scope, drained, "Scope exited");
}

/// Log a record still alive when teardown ran
pub fn log_leak(obj: ObjRef, scope: ScopeId, refcount: usize) {
    warn!(
        target: "runtime",
        event = "leak",
        record = obj.index(),
        scope,
        refcount,
        "Record still live at teardown"
    );
}
