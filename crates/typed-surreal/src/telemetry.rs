//! Tracing initialisation for binaries and integration tests.
//!
//! Without `RUST_LOG`, only this crate and the caller's own crates log at the
//! requested level; everything else (the SurrealDB engine included) is held
//! at `warn`. [`init_tracing`] installs the global subscriber once per
//! process; later calls are ignored.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Level for targets not named in the default directive
const OTHER_TARGETS: Level = Level::WARN;

/// Default filter directive: `warn,typed_surreal=<level>,<target>=<level>...`
pub fn default_directive(level: Level, targets: &[&str]) -> String {
    let level = level.as_str().to_lowercase();
    let mut directive = format!(
        "{},{}={level}",
        OTHER_TARGETS.as_str().to_lowercase(),
        env!("CARGO_CRATE_NAME")
    );
    for target in targets {
        directive.push_str(&format!(",{target}={level}"));
    }
    directive
}

/// Install an `EnvFilter` + `fmt` subscriber.
///
/// * `json` - emit newline-delimited JSON instead of human-readable lines.
/// * `level` - verbosity for this crate and `targets` when `RUST_LOG` is unset.
/// * `targets` - the caller's crate names (e.g. `env!("CARGO_CRATE_NAME")`).
pub fn init_tracing(json: bool, level: Level, targets: &[&str]) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level, targets)));

    let json_layer = json.then(|| fmt::layer().with_target(false).json());
    let text_layer = (!json).then(|| fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .ok();
}
