pub mod level;
pub mod record;
pub mod buffer;
pub mod config;
pub mod sink;
pub mod logger;
pub mod global;
pub mod subscriber;

pub use buffer::{LogBuffer, DEFAULT_CAPACITY};
pub use config::{Config, ConfigError, Environment};
pub use global::InitError;
pub use level::Level;
pub use logger::DiagnosticLogger;
pub use record::{capture, LogRecord};
pub use sink::{Sink, SinkError, TracingSink, WriterSink};
pub use subscriber::install_subscriber;
