use std::{fmt::Debug, time::SystemTime};

use serde::Serialize;
use serde_json::Value;

use crate::level::Level;

/// One log entry. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    time: SystemTime,
    level: Level,
    message: String,
    context: Option<Value>,
}

impl LogRecord {
    pub fn now<S: Into<String>>(level: Level, message: S, context: Option<Value>) -> Self {
        Self::new(SystemTime::now(), level, message, context)
    }

    pub fn new<S: Into<String>>(time: SystemTime, level: Level, message: S, context: Option<Value>) -> Self {
        Self {
            time,
            level,
            message: message.into(),
            context,
        }
    }

    #[inline]
    pub fn time(&self) -> SystemTime {
        self.time
    }

    #[inline]
    pub fn level(&self) -> Level {
        self.level
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn context(&self) -> Option<&Value> {
        self.context.as_ref()
    }

    /// The line handed to a sink: `LEVEL message` followed by the context as JSON, if any.
    pub fn render(&self) -> String {
        match &self.context {
            Some(ctx) => format!("{} {} {}", self.level, self.message, ctx),
            None => format!("{} {}", self.level, self.message),
        }
    }
}

/// Turns an arbitrary value into a context payload.
///
/// Values serde cannot represent (non-string map keys, failing `Serialize`
/// impls) are kept as their `Debug` text instead of being rejected.
pub fn capture<T: Serialize + Debug + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|_| Value::String(format!("{:?}", value)))
}
