//! HTTP Client Construction
//!
//! Both providers share one blocking client configuration: a bounded
//! request timeout, a connect timeout, and a crate user agent. No retries,
//! no rate limiting.

use reqwest::blocking::{Client, Response};
use std::time::Duration;

use crate::error::{ChartsError, ChartsResult};

/// Default request timeout when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const CONNECT_TIMEOUT_SECS: u64 = 10;

const USER_AGENT: &str = concat!("crypto-charts/", env!("CARGO_PKG_VERSION"));

/// Build a blocking client with the given request timeout
pub fn build_client(timeout: Duration) -> ChartsResult<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_nodelay(true)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ChartsError::network(format!("Failed to create HTTP client: {}", e)))
}

/// Read a response body, turning any non-success status into an API error.
///
/// The body of a failed response is returned verbatim as error details and
/// never interpreted as data.
pub fn read_success_body(response: Response) -> ChartsResult<String> {
    if !response.status().is_success() {
        return Err(api_error(response));
    }
    Ok(response.text()?)
}

/// API error for a failed response, keeping whatever body could be read.
pub fn api_error(response: Response) -> ChartsError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
    ChartsError::api_request(status, body)
}

/// Host portion of a URL, for log fields
pub fn extract_domain(url: &str) -> String {
    url.trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or(url)
        .to_string()
}
