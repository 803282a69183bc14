//! Observability hooks for the optimizer and the pipeline.
//!
//! Per-column decisions are the interesting part of this library, so they are
//! emitted as structured key/value metrics through the `log` facade. Nothing is
//! printed unless the host application installs a logger; `init_logging` is a
//! convenience for binaries, benches and tests that do not bring their own.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Once;

use log::LevelFilter;

use crate::error::TrimframeError;

/// Logs a structured key-value metric at debug level.
///
/// # Example
/// ```
/// use trimframe::log_metric;
/// let rows = 4;
/// log_metric!("event"="narrow_int", "column"="price", "rows"=&rows);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        if ::log::log_enabled!(::log::Level::Debug) {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            ::log::debug!("TRIMFRAME_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` at `level`, optionally appending to `log_file`.
///
/// Only the first call has any effect. `RUST_LOG` still overrides `level`.
///
/// # Errors
/// Returns `TrimframeError::Io` if the log file cannot be opened.
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<(), TrimframeError> {
    if INIT_LOGGER.is_completed() {
        return Ok(());
    }
    // Open eagerly so the error can be returned; `call_once` cannot propagate it.
    let file = match log_file {
        Some(path) => Some(OpenOptions::new().append(true).create(true).open(path)?),
        None => None,
    };

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(level);
        builder.parse_default_env();

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}
