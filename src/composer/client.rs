//! ElevenLabs music HTTP client
//!
//! Sends a composition plan to the music endpoint and streams back the
//! encoded audio. Requires an API key.
//!
//! API: https://elevenlabs.io/docs/api-reference/music

use futures::StreamExt;
use serde::Serialize;

use super::domain::{AudioStream, ComposeError, CompositionPlan};
use crate::config::ComposerConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_MODEL_ID: &str = "music_v1";
pub const DEFAULT_OUTPUT_FORMAT: &str = "mp3_44100_128";

/// Request body for `POST /v1/music`
#[derive(Debug, Serialize)]
struct ComposeRequest<'a> {
    composition_plan: &'a CompositionPlan,
    model_id: &'a str,
}

/// ElevenLabs music client
pub struct ElevenLabsClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model_id: String,
    output_format: String,
}

impl ElevenLabsClient {
    /// Create a client against the public API with default model and format
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
        }
    }

    /// Create a client from the `[composer]` config section.
    ///
    /// Fails with [`ComposeError::MissingApiKey`] when no key is available.
    pub fn from_config(config: &ComposerConfig, api_key: Option<&str>) -> Result<Self, ComposeError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ComposeError::MissingApiKey)?;

        Ok(Self {
            http_client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model_id: config.model_id.clone(),
            output_format: config.output_format.clone(),
        })
    }

    /// Create a client for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::new("test-key")
        }
    }

    /// Full URL of the compose endpoint
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1/music?output_format={}",
            self.base_url,
            urlencoding::encode(&self.output_format)
        )
    }

    /// Compose a track from a plan, streaming the audio back
    pub async fn compose(&self, plan: &CompositionPlan) -> Result<AudioStream, ComposeError> {
        let body = ComposeRequest {
            composition_plan: plan,
            model_id: &self.model_id,
        };

        tracing::debug!(
            sections = plan.sections.len(),
            duration_ms = plan.total_duration_ms(),
            "Requesting composition"
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| ComposeError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ComposeError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ComposeError::RateLimited);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| {
                status.canonical_reason().unwrap_or("Unknown").to_string()
            });
            return Err(ComposeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| ComposeError::Network(e.to_string()))
            })
            .boxed();

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::domain::PlanSection;

    fn plan() -> CompositionPlan {
        CompositionPlan {
            positive_global_styles: vec!["lofi hip-hop".to_string()],
            negative_global_styles: vec!["harsh".to_string()],
            sections: vec![PlanSection {
                section_name: "Intro".to_string(),
                positive_local_styles: vec![],
                negative_local_styles: vec![],
                duration_ms: 10_000,
                lines: vec![],
            }],
        }
    }

    #[test]
    fn test_endpoint_includes_output_format() {
        let client = ElevenLabsClient::with_base_url("http://localhost:9000");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9000/v1/music?output_format=mp3_44100_128"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let plan = plan();
        let body = ComposeRequest {
            composition_plan: &plan,
            model_id: DEFAULT_MODEL_ID,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model_id"], "music_v1");
        assert_eq!(json["composition_plan"]["sections"][0]["section_name"], "Intro");
        assert_eq!(json["composition_plan"]["negative_global_styles"][0], "harsh");
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = ComposerConfig::default();
        assert!(matches!(
            ElevenLabsClient::from_config(&config, None),
            Err(ComposeError::MissingApiKey)
        ));
        assert!(matches!(
            ElevenLabsClient::from_config(&config, Some("   ")),
            Err(ComposeError::MissingApiKey)
        ));
    }

    #[test]
    fn test_from_config_trims_base_url() {
        let config = ComposerConfig {
            base_url: "http://example.test/".to_string(),
            ..ComposerConfig::default()
        };
        let client = ElevenLabsClient::from_config(&config, Some("key")).unwrap();
        assert!(client.endpoint().starts_with("http://example.test/v1/music"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = ElevenLabsClient::with_base_url("http://127.0.0.1:1");
        let result = client.compose(&plan()).await;
        assert!(matches!(result, Err(ComposeError::Network(_))));
    }
}
