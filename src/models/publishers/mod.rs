use crate::models::{AdapterMode, PlatformResult, Post, DEMO_SUCCESS_MESSAGE};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, post: &Post) -> Result<String>;
    fn display_name(&self) -> &'static str;
    fn get_type(&self) -> &'static str;
    fn get_id(&self) -> &str;

    /// Runs `publish` and folds its outcome into a `PlatformResult`.
    async fn submit(&self, post: &Post) -> PlatformResult {
        match self.publish(post).await {
            Ok(message) => PlatformResult::succeeded(self.display_name(), message),
            Err(e) => PlatformResult::failed(self.display_name(), format!("{:#}", e)),
        }
    }
}

/// Settings shared by every publisher built from one configuration.
#[derive(Clone)]
pub struct PublisherContext {
    pub mode: AdapterMode,
    pub client: Client,
}

impl PublisherContext {
    pub fn new(mode: AdapterMode, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("crosspostrs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { mode, client })
    }
}

pub(crate) async fn simulate_publish(platform: &str, latency: Duration) -> Result<String> {
    log::debug!("[demo] Simulating {} publish ({:?})", platform, latency);
    tokio::time::sleep(latency).await;
    Ok(DEMO_SUCCESS_MESSAGE.to_string())
}

/// Turns a non-2xx upstream response into an error carrying status and body.
pub(crate) async fn upstream_error(platform: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    log::error!("{} API error response: {} - {}", platform, status, error_text);
    anyhow::anyhow!(
        "Failed to publish to {}: {} - {}",
        platform,
        status,
        error_text
    )
}

pub(crate) fn require<'a>(value: &'a Option<String>, what: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow::anyhow!("{} is not configured", what))
}

/// Serves `router` on an ephemeral local port and returns its base URL.
#[cfg(test)]
pub(crate) async fn spawn_upstream(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub mod facebook;
pub mod instagram;
pub mod linkedin;
pub mod manager;
pub mod twitter;

pub use facebook::FacebookPublisher;
pub use instagram::InstagramPublisher;
pub use linkedin::LinkedInPublisher;
pub use manager::PublisherManager;
pub use twitter::TwitterPublisher;
