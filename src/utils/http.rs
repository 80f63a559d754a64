use anyhow::Result;
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::CheckError;

pub fn create_client(user_agent: &str, timeout: Duration) -> Result<Client> {
    let client = ClientBuilder::new()
        .user_agent(user_agent)
        .timeout(timeout)
        .pool_max_idle_per_host(6)
        .build()?;

    Ok(client)
}

/// GET `url` once and return the body. Anything but 200 is an error.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, CheckError> {
    let network_error = |reason: String| CheckError::Network {
        url: url.to_string(),
        reason,
    };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| network_error(e.to_string()))?;

    let status = response.status();
    if status != StatusCode::OK {
        warn!("HTTP error {}: {}", status, url);
        return Err(network_error(format!("status code error: {}", status)));
    }

    let body = response
        .text()
        .await
        .map_err(|e| network_error(e.to_string()))?;
    debug!("Fetched {} bytes from {}", body.len(), url);

    Ok(body)
}
