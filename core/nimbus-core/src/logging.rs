//! Logging utilities for Nimbus
//!
//! `tracing` 구독자 초기화. `logging` 기능이 꺼져 있으면 모두 no-op입니다.

#[cfg(feature = "logging")]
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber for a server process.
///
/// `RUST_LOG` overrides [`DEFAULT_FILTER`]. Does nothing if a subscriber is
/// already installed.
///
/// ```rust
/// nimbus_core::logging::init();
/// nimbus_core::logging::init();
/// ```
#[cfg(feature = "logging")]
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .try_init();
}

/// Subscriber for tests: generated SQL (`trace`) through the test writer.
#[cfg(feature = "logging")]
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("nimbus_core=trace"))
        .with_test_writer()
        .try_init();
}

#[cfg(not(feature = "logging"))]
pub fn init() {}

#[cfg(not(feature = "logging"))]
pub fn init_test() {}
