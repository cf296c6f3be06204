use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::{
    buffer::LogBuffer,
    config::{Config, Environment},
    level::Level,
    record::LogRecord,
    sink::{Sink, TracingSink},
};

/// Records leveled log events into a bounded buffer and forwards the ones the
/// environment allows to a sink.
///
/// Recording and emission are independent: every record lands in the buffer,
/// whether or not it was emitted. None of the recording methods can fail;
/// sink errors and sink panics are swallowed and only counted.
pub struct DiagnosticLogger {
    config: Config,
    buffer: Mutex<LogBuffer>,
    sink: Arc<dyn Sink>,
    dropped: AtomicU64,
}

impl DiagnosticLogger {
    pub fn new(config: Config) -> Self {
        Self::with_sink(config, TracingSink)
    }

    pub fn with_sink<S: Sink + 'static>(config: Config, sink: S) -> Self {
        Self::with_shared_sink(config, Arc::new(sink))
    }

    pub fn with_shared_sink(config: Config, sink: Arc<dyn Sink>) -> Self {
        Self {
            buffer: Mutex::new(LogBuffer::new(config.capacity)),
            config,
            sink,
            dropped: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn environment(&self) -> Environment {
        self.config.environment
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity.get()
    }

    pub fn record<S: Into<String>>(&self, level: Level, message: S, context: Option<Value>) {
        let record = Arc::new(LogRecord::now(level, message, context));
        self.buffer.lock().push(record.clone());
        if self.should_emit(&record) {
            self.emit(&record);
        }
    }

    fn should_emit(&self, record: &LogRecord) -> bool {
        self.config.environment.emits(record.level())
            && !self.config.is_suppressed(record.level(), record.message())
    }

    // The buffer lock is not held here so a slow sink never blocks recording.
    fn emit(&self, record: &LogRecord) {
        let line = record.render();
        let sink = &self.sink;
        let written = panic::catch_unwind(AssertUnwindSafe(|| sink.write(record.level(), &line)));
        if !matches!(written, Ok(Ok(()))) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn debug<S: Into<String>>(&self, message: S, context: Option<Value>) {
        self.record(Level::Debug, message, context)
    }

    pub fn info<S: Into<String>>(&self, message: S, context: Option<Value>) {
        self.record(Level::Info, message, context)
    }

    pub fn warn<S: Into<String>>(&self, message: S, context: Option<Value>) {
        self.record(Level::Warn, message, context)
    }

    pub fn error<S: Into<String>>(&self, message: S, context: Option<Value>) {
        self.record(Level::Error, message, context)
    }

    /// Timing of a named operation. Slower than the configured threshold is a warning,
    /// anything else a debug record.
    pub fn record_performance(&self, operation: &str, duration: Duration) {
        let ms = whole_millis(duration);
        let context = Some(json!({ "operation": operation, "duration_ms": ms }));
        if ms > whole_millis(self.config.slow_operation_threshold) {
            self.warn(format!("Slow operation: {} took {}ms", operation, ms), context);
        } else {
            self.debug(format!("{} took {}ms", operation, ms), context);
        }
    }

    /// Outcome of an outbound API call. Exactly one record per call:
    /// status >= 400 is an error, else slow is a warning, else debug.
    pub fn record_api_call(&self, url: &str, status: u16, duration: Duration) {
        let ms = whole_millis(duration);
        let context = Some(json!({ "url": url, "status": status, "duration_ms": ms }));
        if status >= 400 {
            self.error(format!("API call failed: {} returned {} in {}ms", url, status, ms), context);
        } else if ms > whole_millis(self.config.slow_api_threshold) {
            self.warn(format!("Slow API call: {} took {}ms", url, ms), context);
        } else {
            self.debug(format!("API call: {} returned {} in {}ms", url, status, ms), context);
        }
    }

    /// Oldest first. The returned vector is not affected by later recording or clearing.
    pub fn logs(&self) -> Vec<Arc<LogRecord>> {
        self.buffer.lock().snapshot()
    }

    pub fn logs_at_least(&self, level: Level) -> Vec<Arc<LogRecord>> {
        self.buffer
            .lock()
            .iter()
            .filter(|r| r.level() >= level)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    pub fn clear_logs(&self) {
        self.buffer.lock().clear();
    }

    /// Number of emissions the sink rejected or panicked on.
    pub fn dropped_emissions(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

// Saturates so oversized durations stay representable as JSON numbers.
fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for DiagnosticLogger {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[macro_export]
macro_rules! debug {
    ($this:expr, $e:expr) => { $this.debug($e.to_string(), None) };
    ($this:expr, $fmt:expr, $($arg:tt)*) => { $this.debug(format!($fmt, $($arg)*), None) };
}

#[macro_export]
macro_rules! info {
    ($this:expr, $e:expr) => { $this.info($e.to_string(), None) };
    ($this:expr, $fmt:expr, $($arg:tt)*) => { $this.info(format!($fmt, $($arg)*), None) };
}

#[macro_export]
macro_rules! warn {
    ($this:expr, $e:expr) => { $this.warn($e.to_string(), None) };
    ($this:expr, $fmt:expr, $($arg:tt)*) => { $this.warn(format!($fmt, $($arg)*), None) };
}

#[macro_export]
macro_rules! error {
    ($this:expr, $e:expr) => { $this.error($e.to_string(), None) };
    ($this:expr, $fmt:expr, $($arg:tt)*) => { $this.error(format!($fmt, $($arg)*), None) };
}
