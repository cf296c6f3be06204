//! Process-wide logger slot.
//!
//! Prefer passing a [`DiagnosticLogger`] down explicitly. This exists for hosts
//! that need one shared instance: it is created once by [`init`] and never
//! recreated implicitly. [`reset`] empties the slot so tests can start over.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use thiserror::Error;

use crate::{config::Config, logger::DiagnosticLogger, sink::Sink};

static GLOBAL: Lazy<RwLock<Option<Arc<DiagnosticLogger>>>> = Lazy::new(|| RwLock::new(None));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InitError {
    #[error("the global diagnostic logger is already initialized")]
    AlreadyInitialized,
}

pub fn init(config: Config) -> Result<Arc<DiagnosticLogger>, InitError> {
    install(DiagnosticLogger::new(config))
}

pub fn init_with_sink<S: Sink + 'static>(config: Config, sink: S) -> Result<Arc<DiagnosticLogger>, InitError> {
    install(DiagnosticLogger::with_sink(config, sink))
}

fn install(logger: DiagnosticLogger) -> Result<Arc<DiagnosticLogger>, InitError> {
    let mut slot = GLOBAL.write();
    if slot.is_some() {
        return Err(InitError::AlreadyInitialized);
    }
    let logger = Arc::new(logger);
    *slot = Some(logger.clone());
    Ok(logger)
}

pub fn get() -> Option<Arc<DiagnosticLogger>> {
    GLOBAL.read().clone()
}

/// Drops the shared instance. Handles obtained earlier stay valid. Meant for tests.
pub fn reset() {
    GLOBAL.write().take();
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::{get, init, init_with_sink, reset, InitError};
    use crate::{config::Config, sink::WriterSink};

    // Tests in this module share the global slot.
    static SERIAL: Mutex<()> = parking_lot::const_mutex(());

    #[test]
    fn init_once() {
        let _guard = SERIAL.lock();
        reset();
        assert!(get().is_none());

        let first = init(Config::production()).unwrap();
        assert!(matches!(init(Config::development()), Err(InitError::AlreadyInitialized)));
        first.info("shared", None);

        let again = get().unwrap();
        assert_eq!(again.logs().len(), 1);
        assert!(again.environment().is_production());
        reset();
    }

    #[test]
    fn reset_allows_reinit() {
        let _guard = SERIAL.lock();
        reset();
        let old = init(Config::development()).unwrap();
        old.warn("before reset", None);
        reset();
        assert!(get().is_none());

        let new = init_with_sink(Config::production(), WriterSink::new(Vec::new())).unwrap();
        assert!(new.logs().is_empty());
        assert_eq!(old.logs().len(), 1);
        reset();
    }
}
