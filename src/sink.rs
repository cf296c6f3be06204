use std::io::{self, Write};

use parking_lot::Mutex;
use thiserror::Error;

use crate::level::Level;

pub const TARGET: &str = "diaglog";

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink write failed: {0}")]
    Io(#[from] io::Error),
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for emitted lines.
pub trait Sink: Send + Sync {
    fn write(&self, level: Level, line: &str) -> Result<(), SinkError>;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&self, level: Level, line: &str) -> Result<(), SinkError> {
        (**self).write(level, line)
    }
}

/// Forwards lines to whatever `tracing` subscriber is installed.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn write(&self, level: Level, line: &str) -> Result<(), SinkError> {
        match level {
            Level::Debug => tracing::debug!(target: TARGET, "{}", line),
            Level::Info => tracing::info!(target: TARGET, "{}", line),
            Level::Warn => tracing::warn!(target: TARGET, "{}", line),
            Level::Error => tracing::error!(target: TARGET, "{}", line),
        }
        Ok(())
    }
}

/// Writes one line per record to an `io::Write`.
pub struct WriterSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl WriterSink<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write(&self, _level: Level, line: &str) -> Result<(), SinkError> {
        let mut out = self.out.lock();
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}
