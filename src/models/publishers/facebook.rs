use super::{require, simulate_publish, upstream_error, Publisher, PublisherContext};
use crate::models::{AdapterMode, Post, TemplateContext, TemplateRenderer};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://graph.facebook.com/v19.0/";
pub const DEFAULT_LATENCY_MS: u64 = 1200;

pub struct FacebookPublisher {
    pub id: String,
    pub access_token: Option<String>,
    pub page_id: Option<String>,
    pub api_url: String,
    pub latency: Duration,
    pub template: String,
    mode: AdapterMode,
    client: Client,
    renderer: TemplateRenderer,
}

impl FacebookPublisher {
    pub fn new(
        id: String,
        access_token: Option<String>,
        page_id: Option<String>,
        api_url: Option<String>,
        latency_ms: Option<u64>,
        template: String,
        context: &PublisherContext,
    ) -> Self {
        Self {
            id,
            access_token,
            page_id,
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            latency: Duration::from_millis(latency_ms.unwrap_or(DEFAULT_LATENCY_MS)),
            template,
            mode: context.mode,
            client: context.client.clone(),
            renderer: TemplateRenderer::new(),
        }
    }

    fn feed_url(&self, page_id: &str) -> Result<Url> {
        let base = Url::parse(&format!("{}/", self.api_url.trim_end_matches('/')))?;
        Ok(base.join(&format!("{}/feed", page_id))?)
    }
}

#[async_trait]
impl Publisher for FacebookPublisher {
    async fn publish(&self, post: &Post) -> Result<String> {
        if self.mode == AdapterMode::Demo {
            return simulate_publish(self.display_name(), self.latency).await;
        }

        let access_token = require(&self.access_token, "FACEBOOK_ACCESS_TOKEN")?;
        let page_id = require(&self.page_id, "Facebook page_id")?;

        let context = TemplateContext {
            title: post.title.clone(),
            content: post.content.clone(),
        };
        let message = self.renderer.render(&self.template, &context)?;

        let url = self.feed_url(page_id)?;
        log::info!("Attempting to publish to Facebook page {}", page_id);

        let response = self
            .client
            .post(url)
            .form(&[("message", message.as_str()), ("access_token", access_token)])
            .send()
            .await?;

        let status = response.status();
        log::info!("Facebook Graph API response status: {}", status);

        if status.is_success() {
            let result: Value = response.json().await?;
            Ok(format!(
                "Published to Facebook: {}",
                result["id"].as_str().unwrap_or("unknown")
            ))
        } else {
            Err(upstream_error(self.display_name(), response).await)
        }
    }

    fn display_name(&self) -> &'static str {
        "Facebook"
    }

    fn get_type(&self) -> &'static str {
        "facebook"
    }

    fn get_id(&self) -> &str {
        &self.id
    }
}
