#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Shared setup for the integration tests of the `fletia` crate.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the tracing subscriber once per test binary.
pub fn setup_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("fletia=debug,fletia_access=debug")
            .with_test_writer()
            .try_init();
    });
}
