//! Tracing bootstrap shared by every binary in the workspace.

use library_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Build the event filter, letting `RUST_LOG` override the configured one.
pub fn env_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.filter)
            .map_err(|e| anyhow::anyhow!("invalid log filter '{}': {e}", settings.filter)),
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = env_filter(settings)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match settings.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_ok() {
        tracing::debug!(
            target: "library-telemetry",
            format = ?settings.log_format,
            "tracing subscriber installed"
        );
    }

    Ok(())
}
