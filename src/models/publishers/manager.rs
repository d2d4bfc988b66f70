use super::{
    FacebookPublisher, InstagramPublisher, LinkedInPublisher, Publisher, PublisherContext,
    TwitterPublisher,
};
use crate::models::{
    AppConfig, PlatformConfig, PlatformCredentials, PlatformResult, Post, PostResponse,
    Submission, TemplateRenderer,
};
use anyhow::Result;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

pub fn create_publisher(
    id: String,
    config: &PlatformConfig,
    credentials: &PlatformCredentials,
    context: &PublisherContext,
) -> Arc<dyn Publisher> {
    match config {
        PlatformConfig::Twitter {
            latency_ms,
            api_url,
            template,
        } => {
            let template_str = template
                .clone()
                .unwrap_or_else(|| TemplateRenderer::get_default_template("twitter"));
            Arc::new(TwitterPublisher::new(
                id,
                credentials.twitter_bearer_token.clone(),
                api_url.clone(),
                *latency_ms,
                template_str,
                context,
            ))
        }
        PlatformConfig::Facebook {
            page_id,
            latency_ms,
            api_url,
            template,
        } => {
            let template_str = template
                .clone()
                .unwrap_or_else(|| TemplateRenderer::get_default_template("facebook"));
            Arc::new(FacebookPublisher::new(
                id,
                credentials.facebook_access_token.clone(),
                page_id.clone(),
                api_url.clone(),
                *latency_ms,
                template_str,
                context,
            ))
        }
        PlatformConfig::LinkedIn {
            author_urn,
            latency_ms,
            api_url,
            template,
        } => {
            let template_str = template
                .clone()
                .unwrap_or_else(|| TemplateRenderer::get_default_template("linkedin"));
            Arc::new(LinkedInPublisher::new(
                id,
                credentials.linkedin_access_token.clone(),
                author_urn.clone(),
                api_url.clone(),
                *latency_ms,
                template_str,
                context,
            ))
        }
        PlatformConfig::Instagram {
            account_id,
            image_url,
            latency_ms,
            api_url,
            template,
        } => {
            let template_str = template
                .clone()
                .unwrap_or_else(|| TemplateRenderer::get_default_template("instagram"));
            Arc::new(InstagramPublisher::new(
                id,
                credentials.instagram_access_token.clone(),
                account_id.clone(),
                image_url.clone(),
                api_url.clone(),
                *latency_ms,
                template_str,
                context,
            ))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformInfo {
    pub id: String,
    pub name: String,
}

/// Routes platform identifiers to publishers and fans a post out to them.
pub struct PublisherManager {
    publishers: HashMap<String, Arc<dyn Publisher>>,
    timeout: Duration,
}

impl PublisherManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            publishers: HashMap::new(),
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_seconds);
        let context = PublisherContext::new(config.mode, timeout)?;

        let mut manager = Self::new(timeout);
        for (id, platform_config) in &config.platforms {
            manager.add_publisher(id.clone(), platform_config, &config.credentials, &context);
        }

        Ok(manager)
    }

    pub fn add_publisher(
        &mut self,
        id: String,
        config: &PlatformConfig,
        credentials: &PlatformCredentials,
        context: &PublisherContext,
    ) {
        let publisher = create_publisher(id.clone(), config, credentials, context);
        log::info!(
            "Initialized publisher: {} ({}, {} mode)",
            id,
            publisher.display_name(),
            context.mode
        );
        self.register(id, publisher);
    }

    pub fn register(&mut self, id: String, publisher: Arc<dyn Publisher>) {
        log::debug!(
            "Registering {} publisher '{}' under id '{}'",
            publisher.get_type(),
            publisher.get_id(),
            id
        );
        if self.publishers.insert(id.clone(), publisher).is_some() {
            log::warn!("Replaced existing publisher: {}", id);
        }
    }

    pub fn list_publishers(&self) -> Vec<PlatformInfo> {
        let mut platforms: Vec<PlatformInfo> = self
            .publishers
            .iter()
            .map(|(id, publisher)| PlatformInfo {
                id: id.clone(),
                name: publisher.display_name().to_string(),
            })
            .collect();
        platforms.sort_by(|a, b| a.id.cmp(&b.id));
        platforms
    }

    /// Publishes `post` to every platform in `platform_ids` concurrently and
    /// returns one result per identifier, in the same order. Waits for every
    /// publisher to settle; a failure, timeout or panic in one never cancels
    /// the others.
    pub async fn publish_to_all(
        &self,
        post: Arc<Post>,
        platform_ids: &[String],
    ) -> Vec<PlatformResult> {
        let tasks = platform_ids.iter().map(|id| {
            let publisher = self.publishers.get(id).cloned();
            let post = post.clone();
            let timeout = self.timeout;

            async move {
                match publisher {
                    Some(publisher) => settle(publisher, post, timeout).await,
                    None => {
                        log::warn!("Unknown platform requested: {}", id);
                        PlatformResult::unknown(id)
                    }
                }
            }
        });

        join_all(tasks).await
    }

    pub async fn dispatch(&self, submission: Submission) -> PostResponse {
        let request_id = uuid::Uuid::new_v4();
        let Submission { post, platforms } = submission;

        log::info!(
            "[{}] Publishing \"{}\" to {} platforms: {:?}",
            request_id,
            post.title,
            platforms.len(),
            platforms
        );

        let results = self.publish_to_all(Arc::new(post), &platforms).await;

        for (id, result) in platforms.iter().zip(&results) {
            if result.success {
                log::info!("[{}] ✓ Published to {}: {}", request_id, id, result.message);
            } else {
                log::error!(
                    "[{}] ✗ Failed to publish to {}: {}",
                    request_id,
                    id,
                    result.message
                );
            }
        }

        let response = PostResponse::from_results(results);
        log::info!(
            "[{}] Published to {}/{} platforms",
            request_id,
            response.succeeded_count(),
            platforms.len()
        );

        response
    }
}

async fn settle(publisher: Arc<dyn Publisher>, post: Arc<Post>, timeout: Duration) -> PlatformResult {
    let name = publisher.display_name();
    let task = tokio::spawn(async move { time::timeout(timeout, publisher.submit(&post)).await });

    match task.await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => PlatformResult::failed(name, format!("Timed out after {:?}", timeout)),
        Err(e) => PlatformResult::failed(name, format!("Publisher task failed: {}", e)),
    }
}
