//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Default filter when `STRATA_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "strata=info";

/// Initialize the Strata tracing subscriber.
///
/// Reads `STRATA_LOG` for per-target levels, e.g.
/// `STRATA_LOG=strata_analysis::coupling=debug,strata_storage=warn`.
///
/// Idempotent. A subscriber installed by someone else is left in place.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("STRATA_LOG")
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
