//! Tracing setup and the in-memory audit log
//!
//! Every run writes its events twice: human-readable lines to stdout, and
//! JSON lines into an [`AuditLog`]. The audit log is owned by the driver and
//! handed to the container writer at the end of the run, where it is bundled
//! with the computed data for traceability.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing_subscriber::{
    EnvFilter, Layer, fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Append-only, cloneable text buffer collecting the JSON log lines of one run.
#[derive(Clone, Default)]
pub struct AuditLog(Arc<Mutex<Vec<u8>>>);

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Everything logged so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }
}

impl io::Write for AuditLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for AuditLog {
    type Writer = AuditLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// JSON layer writing into `audit`, with span fields flattened into each line.
pub fn audit_layer<S>(audit: &AuditLog) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_target(false)
        .with_writer(audit.clone())
}

/// Install the global subscriber: stdout filtered by `RUST_LOG` (default
/// `info`), plus every info-and-above event into `audit`.
pub fn init(audit: &AuditLog) -> Result<(), String> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(audit_layer(audit).with_filter(tracing_subscriber::filter::LevelFilter::INFO))
        .try_init()
        .map_err(|e| format!("Failed to initialize tracing: {}", e))
}

/// Span attached to a whole run, recording who ran it and where.
pub fn run_span(recording_name: &str) -> tracing::Span {
    let username = std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_else(|_| "Users".to_string());
    let computer_name = hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    tracing::info_span!(
        "well_data",
        recording = recording_name,
        username = %username,
        computer_name = %computer_name
    )
}
