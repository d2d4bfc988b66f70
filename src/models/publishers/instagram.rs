use super::{require, simulate_publish, upstream_error, Publisher, PublisherContext};
use crate::models::{AdapterMode, Post, TemplateContext, TemplateRenderer};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://graph.facebook.com/v19.0";
pub const DEFAULT_LATENCY_MS: u64 = 1300;

/// Instagram has no text-only feed posts, so live publishing needs an image.
/// Publishing is two steps: create a media container, then publish it.
pub struct InstagramPublisher {
    pub id: String,
    pub access_token: Option<String>,
    pub account_id: Option<String>,
    pub image_url: Option<String>,
    pub api_url: String,
    pub latency: Duration,
    pub template: String,
    mode: AdapterMode,
    client: Client,
    renderer: TemplateRenderer,
}

impl InstagramPublisher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        access_token: Option<String>,
        account_id: Option<String>,
        image_url: Option<String>,
        api_url: Option<String>,
        latency_ms: Option<u64>,
        template: String,
        context: &PublisherContext,
    ) -> Self {
        Self {
            id,
            access_token,
            account_id,
            image_url,
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
impl Publisher for InstagramPublisher {
    async fn publish(&self, post: &Post) -> Result<String> {
        if self.mode == AdapterMode::Demo {
            return simulate_publish(self.display_name(), self.latency).await;
        }

        let access_token = require(&self.access_token, "INSTAGRAM_ACCESS_TOKEN")?;
        let account_id = require(&self.account_id, "Instagram account_id")?;
        let image_url = require(&self.image_url, "Instagram image_url")?;

        let context = TemplateContext {
            title: post.title.clone(),
            content: post.content.clone(),
        };
        let caption = self.renderer.render(&self.template, &context)?;
        let base = self.api_url.trim_end_matches('/');

        let container_response = self
            .client
            .post(format!("{}/{}/media", base, account_id))
            .json(&json!({
                "image_url": image_url,
                "caption": caption,
                "access_token": access_token
            }))
            .send()
            .await?;

        if !container_response.status().is_success() {
            return Err(upstream_error(self.display_name(), container_response).await);
        }

        let container: Value = container_response.json().await?;
        let container_id = container["id"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("No container ID in Instagram response"))?;

        log::info!("Created Instagram media container: {}", container_id);

        let publish_response = self
            .client
            .post(format!("{}/{}/media_publish", base, account_id))
            .json(&json!({
                "creation_id": container_id,
                "access_token": access_token
            }))
            .send()
            .await?;

        if publish_response.status().is_success() {
            let result: Value = publish_response.json().await?;
            Ok(format!(
                "Published to Instagram: {}",
                result["id"].as_str().unwrap_or("unknown")
            ))
        } else {
            Err(upstream_error(self.display_name(), publish_response).await)
        }
    }

    fn display_name(&self) -> &'static str {
        "Instagram"
    }

    fn get_type(&self) -> &'static str {
        "instagram"
    }

    fn get_id(&self) -> &str {
        &self.id
    }
}
