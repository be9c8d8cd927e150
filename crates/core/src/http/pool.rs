use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use crate::error::ArbitrageResult;

/// Build the pooled client shared by every price source.
pub fn create_client(timeout: Duration) -> ArbitrageResult<Client> {
    let client = ClientBuilder::new()
        .pool_max_idle_per_host(8) // Keep connections alive between polls
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .timeout(timeout)
        .user_agent(concat!("spread-arb/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}
