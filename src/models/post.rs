use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEMO_SUCCESS_MESSAGE: &str = "Posted successfully (demo mode)";
pub const UNKNOWN_PLATFORM_MESSAGE: &str = "Unknown platform";
pub const ALL_POSTED_MESSAGE: &str = "Posted to all platforms successfully";
pub const SOME_FAILED_MESSAGE: &str = "Some posts failed";

/// A blog post as handed to every publisher.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub title: String,
    pub content: String,
}

impl Post {
    pub fn new(title: String, content: String) -> Self {
        Self { title, content }
    }
}

/// Body of `POST /api/post`. Every field may be absent or null on the wire;
/// `validate` decides whether the request is usable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub platforms: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title is missing or empty")]
    MissingTitle,
    #[error("content is missing or empty")]
    MissingContent,
    #[error("platforms list is missing or empty")]
    MissingPlatforms,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub post: Post,
    pub platforms: Vec<String>,
}

impl PostRequest {
    pub fn validate(self) -> Result<Submission, ValidationError> {
        let title = self
            .title
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingTitle)?;
        let content = self
            .content
            .filter(|c| !c.is_empty())
            .ok_or(ValidationError::MissingContent)?;
        let platforms = self
            .platforms
            .filter(|p| !p.is_empty())
            .ok_or(ValidationError::MissingPlatforms)?;

        Ok(Submission {
            post: Post::new(title, content),
            platforms,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformResult {
    pub platform: String,
    pub success: bool,
    pub message: String,
}

impl PlatformResult {
    pub fn succeeded(platform: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(platform: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            success: false,
            message: message.into(),
        }
    }

    /// Result for an identifier with no registered publisher. The platform
    /// field echoes the identifier as requested.
    pub fn unknown(platform_id: &str) -> Self {
        Self::failed(platform_id, UNKNOWN_PLATFORM_MESSAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostResponse {
    pub success: bool,
    pub results: Vec<PlatformResult>,
    pub message: String,
}

impl PostResponse {
    pub fn from_results(results: Vec<PlatformResult>) -> Self {
        let success = results.iter().all(|r| r.success);
        let message = if success {
            ALL_POSTED_MESSAGE
        } else {
            SOME_FAILED_MESSAGE
        };

        Self {
            success,
            results,
            message: message.to_string(),
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: Option<&str>, content: Option<&str>, platforms: Option<&[&str]>) -> PostRequest {
        PostRequest {
            title: title.map(String::from),
            content: content.map(String::from),
            platforms: platforms.map(|p| p.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn test_validate_accepts_complete_request() {
        let submission = request(Some("T"), Some("C"), Some(&["twitter", "twitter"]))
            .validate()
            .unwrap();

        assert_eq!(submission.post, Post::new("T".into(), "C".into()));
        assert_eq!(submission.platforms, vec!["twitter", "twitter"]);
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        assert_eq!(
            request(Some(""), Some("x"), Some(&["twitter"])).validate(),
            Err(ValidationError::MissingTitle)
        );
        assert_eq!(
            request(None, Some("x"), Some(&["twitter"])).validate(),
            Err(ValidationError::MissingTitle)
        );
        assert_eq!(
            request(Some("T"), Some(""), Some(&["twitter"])).validate(),
            Err(ValidationError::MissingContent)
        );
        assert_eq!(
            request(Some("T"), Some("C"), Some(&[])).validate(),
            Err(ValidationError::MissingPlatforms)
        );
        assert_eq!(
            request(Some("T"), Some("C"), None).validate(),
            Err(ValidationError::MissingPlatforms)
        );
    }

    #[test]
    fn test_null_fields_deserialize_as_missing() {
        let parsed: PostRequest =
            serde_json::from_str(r#"{"title": null, "content": "C"}"#).unwrap();
        assert!(parsed.title.is_none());
        assert!(parsed.platforms.is_none());
        assert_eq!(parsed.validate(), Err(ValidationError::MissingTitle));
    }

    #[test]
    fn test_response_success_iff_all_results_succeed() {
        let all_ok = PostResponse::from_results(vec![
            PlatformResult::succeeded("Twitter/X", DEMO_SUCCESS_MESSAGE),
            PlatformResult::succeeded("Facebook", DEMO_SUCCESS_MESSAGE),
        ]);
        assert!(all_ok.success);
        assert_eq!(all_ok.message, ALL_POSTED_MESSAGE);
        assert_eq!(all_ok.succeeded_count(), 2);

        let partial = PostResponse::from_results(vec![
            PlatformResult::succeeded("Twitter/X", DEMO_SUCCESS_MESSAGE),
            PlatformResult::unknown("myspace"),
        ]);
        assert!(!partial.success);
        assert_eq!(partial.message, SOME_FAILED_MESSAGE);
        assert_eq!(partial.succeeded_count(), 1);
    }

    #[test]
    fn test_unknown_result_echoes_identifier() {
        let result = PlatformResult::unknown("myspace");
        assert_eq!(result.platform, "myspace");
        assert!(!result.success);
        assert_eq!(result.message, UNKNOWN_PLATFORM_MESSAGE);
    }
}
