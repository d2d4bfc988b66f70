use super::{require, simulate_publish, upstream_error, Publisher, PublisherContext};
use crate::models::{AdapterMode, Post, TemplateContext, TemplateRenderer};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.linkedin.com";
pub const DEFAULT_LATENCY_MS: u64 = 1500;

pub struct LinkedInPublisher {
    pub id: String,
    pub access_token: Option<String>,
    pub author_urn: Option<String>,
    pub api_url: String,
    pub latency: Duration,
    pub template: String,
    mode: AdapterMode,
    client: Client,
    renderer: TemplateRenderer,
}

impl LinkedInPublisher {
    pub fn new(
        id: String,
        access_token: Option<String>,
        author_urn: Option<String>,
        api_url: Option<String>,
        latency_ms: Option<u64>,
        template: String,
        context: &PublisherContext,
    ) -> Self {
        Self {
            id,
            access_token,
            author_urn,
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            latency: Duration::from_millis(latency_ms.unwrap_or(DEFAULT_LATENCY_MS)),
            template,
            mode: context.mode,
            client: context.client.clone(),
            renderer: TemplateRenderer::new(),
        }
    }

    /// Accepts a full URN, a numeric organization id or a person id.
    pub fn normalize_author(author: &str) -> String {
        if author.starts_with("urn:li:") {
            author.to_string()
        } else if author.chars().all(|c| c.is_ascii_digit()) {
            format!("urn:li:organization:{}", author)
        } else {
            format!("urn:li:person:{}", author)
        }
    }
}

#[async_trait]
impl Publisher for LinkedInPublisher {
    async fn publish(&self, post: &Post) -> Result<String> {
        if self.mode == AdapterMode::Demo {
            return simulate_publish(self.display_name(), self.latency).await;
        }

        let access_token = require(&self.access_token, "LINKEDIN_ACCESS_TOKEN")?;
        let author_urn = Self::normalize_author(require(&self.author_urn, "LinkedIn author_urn")?);

        let context = TemplateContext {
            title: post.title.clone(),
            content: post.content.clone(),
        };
        let commentary = self.renderer.render(&self.template, &context)?;

        log::info!("Attempting to publish to LinkedIn as {}", author_urn);

        let payload = json!({
            "author": author_urn,
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": {
                        "text": commentary
                    },
                    "shareMediaCategory": "NONE"
                }
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC"
            }
        });

        let url = format!("{}/v2/ugcPosts", self.api_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        log::info!("LinkedIn API response status: {}", status);

        if status.is_success() {
            let result: Value = response.json().await?;
            let post_id = result["id"].as_str().unwrap_or("unknown");
            Ok(format!("Published to LinkedIn: {}", post_id))
        } else {
            Err(upstream_error(self.display_name(), response).await)
        }
    }

    fn display_name(&self) -> &'static str {
        "LinkedIn"
    }

    fn get_type(&self) -> &'static str {
        "linkedin"
    }

    fn get_id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::publishers::spawn_upstream;
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };

    fn live_publisher(author: &str, api_url: String) -> LinkedInPublisher {
        let context = PublisherContext::new(AdapterMode::Live, Duration::from_secs(5)).unwrap();
        LinkedInPublisher::new(
            "linkedin".to_string(),
            Some("li-token".to_string()),
            Some(author.to_string()),
            Some(api_url),
            None,
            TemplateRenderer::get_default_template("linkedin"),
            &context,
        )
    }

    #[test]
    fn test_normalize_author() {
        assert_eq!(
            LinkedInPublisher::normalize_author("12345"),
            "urn:li:organization:12345"
        );
        assert_eq!(
            LinkedInPublisher::normalize_author("abcDEF"),
            "urn:li:person:abcDEF"
        );
        assert_eq!(
            LinkedInPublisher::normalize_author("urn:li:person:abc"),
            "urn:li:person:abc"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_mode_waits_configured_latency() {
        let context = PublisherContext::new(AdapterMode::Demo, Duration::from_secs(5)).unwrap();
        let publisher = LinkedInPublisher::new(
            "linkedin".to_string(),
            None,
            None,
            None,
            None,
            TemplateRenderer::get_default_template("linkedin"),
            &context,
        );

        let started = tokio::time::Instant::now();
        let result = publisher
            .submit(&Post::new("T".to_string(), "C".to_string()))
            .await;

        assert!(result.success);
        assert_eq!(result.platform, "LinkedIn");
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(DEFAULT_LATENCY_MS));
        assert!(elapsed < Duration::from_millis(DEFAULT_LATENCY_MS + 100));
    }

    #[tokio::test]
    async fn test_live_mode_posts_ugc_share() {
        let router = Router::new().route(
            "/v2/ugcPosts",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let share = &body["specificContent"]["com.linkedin.ugc.ShareContent"];
                let valid = headers
                    .get("x-restli-protocol-version")
                    .is_some_and(|v| v == "2.0.0")
                    && headers
                        .get("authorization")
                        .is_some_and(|v| v == "Bearer li-token")
                    && body["author"] == "urn:li:organization:12345"
                    && share["shareCommentary"]["text"] == "Hello\n\nWorld"
                    && share["shareMediaCategory"] == "NONE";
                if !valid {
                    return (StatusCode::BAD_REQUEST, Json(body));
                }
                (
                    StatusCode::CREATED,
                    Json(json!({ "id": "urn:li:share:987" })),
                )
            }),
        );
        let api_url = spawn_upstream(router).await;

        let result = live_publisher("12345", api_url)
            .submit(&Post::new("Hello".to_string(), "<p>World</p>".to_string()))
            .await;
        assert!(result.success, "{}", result.message);
        assert_eq!(result.message, "Published to LinkedIn: urn:li:share:987");
    }

    #[tokio::test]
    async fn test_live_mode_translates_upstream_errors() {
        let router = Router::new().route(
            "/v2/ugcPosts",
            post(|| async { (StatusCode::UNAUTHORIZED, "token expired") }),
        );
        let api_url = spawn_upstream(router).await;

        let result = live_publisher("urn:li:person:abc", api_url)
            .submit(&Post::new("T".to_string(), "C".to_string()))
            .await;
        assert!(!result.success);
        assert_eq!(result.platform, "LinkedIn");
        assert_eq!(
            result.message,
            "Failed to publish to LinkedIn: 401 Unauthorized - token expired"
        );
    }
}
