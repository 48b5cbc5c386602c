use std::time::Duration;

/// Identifier sent in the `User-Agent` header of every request.
pub const USER_AGENT_PREFIX: &str = "retouch";

pub fn get_user_agent() -> String {
    format!("{USER_AGENT_PREFIX}/{}", env!("CARGO_PKG_VERSION"))
}

/// Shared `reqwest` client builder: user agent plus an overall request timeout.
///
/// Falls back to a default client if the builder is rejected, so callers never
/// have to handle construction failures.
pub fn create_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(get_user_agent())
        .timeout(timeout)
        .build()
        .unwrap_or_else(|err| {
            tracing::warn!("failed to build configured HTTP client, using defaults: {err}");
            reqwest::Client::new()
        })
}
