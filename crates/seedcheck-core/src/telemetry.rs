//! Tracing subscriber setup for hosts embedding the verifier.
//!
//! Filtering follows `RUST_LOG`, falling back to `SEEDCHECK_LOG` and then to
//! the supplied level. `SEEDCHECK_LOG_FORMAT=json` switches to
//! newline-delimited JSON. Only the first initialisation in a process wins.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "SEEDCHECK_LOG";
pub const LOG_FORMAT_ENV: &str = "SEEDCHECK_LOG_FORMAT";

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env(LOG_ENV))
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let registry = tracing_subscriber::registry().with(env_filter(level));
    let installed = if json {
        registry
            .with(fmt::layer().with_target(false).json())
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };
    installed.is_ok()
}

/// [`init_tracing`] with the output format taken from `SEEDCHECK_LOG_FORMAT`.
pub fn init_tracing_from_env(level: Level) -> bool {
    let format = std::env::var(LOG_FORMAT_ENV).ok();
    init_tracing(wants_json(format.as_deref()), level)
}

fn wants_json(format: Option<&str>) -> bool {
    format.is_some_and(|v| v.trim().eq_ignore_ascii_case("json"))
}
