use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::generation::error::GenerationError;
use crate::generation::traits::GenerationProvider;
use crate::generation::types::{GenerationRequest, GenerationResponse};

#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

/// Chat-completions client for any OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiCompatibleProvider {
    config: OpenAiCompatibleConfig,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, GenerationError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::Config("API key is empty".to_string()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl GenerationProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let payload = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.role_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
        };

        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = res.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationError::RateLimited);
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = res.json().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(self.config.timeout)
            } else {
                GenerationError::InvalidResponse(e.to_string())
            }
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        Ok(GenerationResponse {
            provider: self.name().to_string(),
            model: parsed.model.unwrap_or_else(|| self.config.model.clone()),
            text,
            usage_tokens: parsed.usage.and_then(|u| u.total_tokens),
        })
    }
}

impl OpenAiCompatibleProvider {
    fn classify(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.config.timeout)
        } else {
            GenerationError::Http(err)
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use samd_launch_core::StageKind;

    fn config(base_url: &str) -> OpenAiCompatibleConfig {
        OpenAiCompatibleConfig {
            api_key: "sk-test".to_string(),
            base_url: base_url.to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.3,
            timeout: Duration::from_secs(60),
        }
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let provider =
            OpenAiCompatibleProvider::new(config("https://api.openai.com/")).expect("provider");
        assert_eq!(
            provider.endpoint(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn empty_key_is_rejected() {
        let mut cfg = config("https://api.openai.com");
        cfg.api_key = "  ".to_string();
        let err = OpenAiCompatibleProvider::new(cfg).err().expect("config error");
        assert!(matches!(err, GenerationError::Config(_)));
    }

    #[test]
    fn request_body_has_system_and_user_messages() {
        let payload = ChatRequest {
            model: "gpt-4o",
            temperature: 0.5,
            messages: [
                ChatMessage {
                    role: "system",
                    content: "You are a Regulatory and Clinical Risk Expert.",
                },
                ChatMessage {
                    role: "user",
                    content: "Assess Brazil",
                },
            ],
        };
        let json = serde_json::to_value(&payload).expect("json");
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Assess Brazil");
    }

    #[test]
    fn response_without_usage_parses() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Decision: Hold"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).expect("parse");
        assert!(parsed.usage.is_none());
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Decision: Hold")
        );
    }

    #[tokio::test]
    #[ignore = "requires SAMD_API_KEY and network access"]
    async fn live_completion_returns_text() {
        let Ok(api_key) = std::env::var("SAMD_API_KEY") else {
            return;
        };
        let mut cfg = config("https://api.openai.com");
        cfg.api_key = api_key;
        let provider = OpenAiCompatibleProvider::new(cfg).expect("provider");
        let res = provider
            .generate(GenerationRequest {
                stage: StageKind::Risk,
                role_instruction: "You are terse.".to_string(),
                prompt: "Reply with the word ready.".to_string(),
            })
            .await
            .expect("completion");
        assert!(!res.text.trim().is_empty());
    }
}
