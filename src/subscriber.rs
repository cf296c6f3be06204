use tracing_subscriber::EnvFilter;

use crate::config::Environment;

/// Default filter directive for an environment. `RUST_LOG` overrides it.
pub fn default_directive(environment: Environment) -> &'static str {
    match environment {
        Environment::Development => "debug",
        Environment::Production => "warn",
    }
}

/// Installs a `fmt` subscriber so [`TracingSink`](crate::TracingSink) output reaches stderr.
/// Does nothing if a global subscriber is already set.
pub fn install_subscriber(environment: Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(environment)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
