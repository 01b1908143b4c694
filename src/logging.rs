use std::{fs::OpenOptions, sync::Mutex};

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::{
    config::SessionConfig,
    error::{AgentError, Result},
};

/// Install the global tracing subscriber described by `config`.
///
/// Human-readable events go to stderr. When `default_log_sink` is set, events are
/// also appended to that file, as JSON lines if `json_log_serialize` is on.
/// `RUST_LOG` overrides the configured level. Calling this twice keeps the first
/// subscriber and returns `Ok`.
pub fn init_logging(config: &SessionConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_log_level.as_directive()));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .boxed()];

    if let Some(path) = &config.default_log_sink {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                AgentError::Config(format!("Failed to create log directory: {err}"))
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| {
                AgentError::Config(format!(
                    "Failed to open log sink {}: {err}",
                    path.display()
                ))
            })?;

        let layer = if config.json_log_serialize {
            fmt::layer().json().with_writer(Mutex::new(file)).boxed()
        } else {
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .boxed()
        };
        layers.push(layer);
    }

    if tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
    }

    Ok(())
}
