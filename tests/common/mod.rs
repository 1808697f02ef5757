//! Common test utilities for Pact contract tests
//!
//! Provides shared initialization code for all Pact tests, including
//! rustls crypto provider setup.

use std::sync::Once;

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once per test binary.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        // Another test in the same binary may have raced us; either provider is ring
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Mock server base URL without the trailing slash
pub fn base_url(url: impl ToString) -> String {
    url.to_string().trim_end_matches('/').to_string()
}
