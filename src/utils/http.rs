// src/utils/http.rs

//! HTTP client utilities.

use crate::error::Result;
use crate::models::FetchConfig;

/// Create a configured asynchronous HTTP client.
///
/// Per-attempt timeouts are applied by the fetcher, not by the client.
pub fn create_async_client(config: &FetchConfig) -> Result<reqwest::Client> {
    if config.accept_invalid_certs {
        log::warn!(
            "TLS certificate verification is disabled; fetched images are not authenticated"
        );
    }

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()?;
    Ok(client)
}
