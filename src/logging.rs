//! Logging setup on top of the `log` facade and `env_logger`.
//!
//! The crate logs with these levels:
//!
//! - `error!` - a batch run failed
//! - `warn!` - a configuration value was ignored
//! - `info!` - one line per generator job and a batch summary
//! - `debug!` - one line per fixture written
//!
//! `RUST_LOG` controls the output at runtime:
//!
//! ```bash
//! RUST_LOG=debug generate-fixtures
//! RUST_LOG=tensorref::fixture=debug generate-fixtures
//! ```

use std::{io::Write, sync::Once};

use env_logger::{Builder, Env};
use log::LevelFilter;

static INIT: Once = Once::new();

/// Default filter of [`init_from_env`] when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Initializes logging at `info` level.
///
/// Only the first call of [`init`], [`init_with_level`] or [`init_from_env`]
/// has an effect.
#[inline]
pub fn init() {
    init_with_level(LevelFilter::Info);
}

/// Initializes logging with a fixed level and a compact
/// `[LEVEL] target - message` format.
pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        let _ = Builder::new()
            .filter_level(level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{:5}] {} - {}",
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .try_init();
    });
}

/// Initializes logging from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
pub fn init_from_env() {
    INIT.call_once(|| {
        let env = Env::default().default_filter_or(DEFAULT_FILTER);
        let _ = Builder::from_env(env).try_init();
    });
}

/// Initializes logging for tests, capturing output per test.
pub fn init_test() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .is_test(true)
        .try_init();
}

/// Whether one of the non-test initializers has run.
#[inline]
#[must_use]
pub fn is_initialized() -> bool {
    INIT.is_completed()
}

#[cfg(test)]
mod tests {
    use crate::logging::{init_test, is_initialized};

    #[test]
    fn init_test_is_idempotent() {
        init_test();
        init_test();
    }

    #[test]
    fn init_test_leaves_main_initializer_unused() {
        init_test();

        assert!(!is_initialized());
    }

    #[test]
    fn log_macros_run_after_init() {
        init_test();

        log::warn!("ignored value");
        log::info!("job finished");
        log::debug!("fixture written");
    }
}
