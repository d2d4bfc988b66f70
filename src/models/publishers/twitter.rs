use super::{require, simulate_publish, upstream_error, Publisher, PublisherContext};
use crate::models::{truncate_chars, AdapterMode, Post, TemplateContext, TemplateRenderer};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.twitter.com";
pub const DEFAULT_LATENCY_MS: u64 = 1000;
const MAX_TWEET_CHARS: usize = 280;

pub struct TwitterPublisher {
    pub id: String,
    pub bearer_token: Option<String>,
    pub api_url: String,
    pub latency: Duration,
    pub template: String,
    mode: AdapterMode,
    client: Client,
    renderer: TemplateRenderer,
}

impl TwitterPublisher {
    pub fn new(
        id: String,
        bearer_token: Option<String>,
        api_url: Option<String>,
        latency_ms: Option<u64>,
        template: String,
        context: &PublisherContext,
    ) -> Self {
        Self {
            id,
            bearer_token,
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            latency: Duration::from_millis(latency_ms.unwrap_or(DEFAULT_LATENCY_MS)),
            template,
            mode: context.mode,
            client: context.client.clone(),
            renderer: TemplateRenderer::new(),
        }
    }
}

#[async_trait]
impl Publisher for TwitterPublisher {
    async fn publish(&self, post: &Post) -> Result<String> {
        if self.mode == AdapterMode::Demo {
            return simulate_publish(self.display_name(), self.latency).await;
        }

        let access_token = require(&self.bearer_token, "TWITTER_BEARER_TOKEN")?;

        let context = TemplateContext {
            title: post.title.clone(),
            content: post.content.clone(),
        };
        let tweet_text = truncate_chars(
            &self.renderer.render(&self.template, &context)?,
            MAX_TWEET_CHARS,
        );

        log::info!("Attempting to publish to X: '{}'", tweet_text);

        let url = format!("{}/2/tweets", self.api_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(&json!({ "text": tweet_text }))
            .send()
            .await?;

        let status = response.status();
        log::info!("X API v2 response status: {}", status);

        if status.is_success() {
            let result: Value = response.json().await?;
            let tweet_id = result["data"]["id"].as_str().unwrap_or("unknown");
            Ok(format!("Published to X: {}", tweet_id))
        } else {
            Err(upstream_error(self.display_name(), response).await)
        }
    }

    fn display_name(&self) -> &'static str {
        "Twitter/X"
    }

    fn get_type(&self) -> &'static str {
        "twitter"
    }

    fn get_id(&self) -> &str {
        &self.id
    }
}
