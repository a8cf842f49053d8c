//! Shared HTTP client
//!
//! One lazy-initialized reqwest client with connection pooling, so repeated
//! tutor requests reuse TLS sessions instead of paying a fresh handshake
//! each time.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

/// Global HTTP client for model-provider calls
///
/// - 90s timeout covers the slowest generation requests
/// - idle pooling keeps connections warm between prompts
static TUTOR_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(20)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .build()
        .expect("Failed to create tutor HTTP client")
});

/// Get the shared HTTP client
#[inline]
pub fn tutor_client() -> &'static Client {
    &TUTOR_CLIENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_is_a_singleton() {
        let first = tutor_client();
        let second = tutor_client();
        assert!(std::ptr::eq(first, second));
    }
}
