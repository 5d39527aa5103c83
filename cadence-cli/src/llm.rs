//! Reqwest-backed AI client behind the generation port. One request per
//! call; retries and fast-fail live in the service's resilience layer.

use async_trait::async_trait;
use cadence_insight::{AiError, GenerativePort};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::config::LlmSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

pub struct HttpAssistant {
    provider: Provider,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpAssistant {
    /// None when the provider is unrecognized or the key env var is unset;
    /// the service then runs on local results only.
    pub fn from_config(llm: &LlmSection) -> Option<Self> {
        let provider = match llm.provider.as_str() {
            "anthropic" => Provider::Anthropic,
            "openai" => Provider::OpenAI,
            _ => return None,
        };
        let api_key = std::env::var(&llm.api_key_env).ok()?;
        Some(Self {
            provider,
            model: llm.model.clone(),
            api_key,
            client: reqwest::Client::new(),
        })
    }

    async fn anthropic_generate(&self, context: &str, prompt: &str) -> Result<String, AiError> {
        #[derive(Serialize)]
        struct Msg {
            role: String,
            content: String,
        }

        #[derive(Serialize)]
        struct Req {
            model: String,
            max_tokens: i32,
            system: String,
            messages: Vec<Msg>,
        }

        #[derive(Deserialize)]
        struct Resp {
            content: Vec<ContentBlock>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(rename = "type")]
            kind: String,
            text: Option<String>,
        }

        let body = Req {
            model: self.model.clone(),
            max_tokens: 450,
            system: context.to_string(),
            messages: vec![Msg {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| AiError::Request(format!("api key header: {e}")))?;
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Request(format!("anthropic request: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AiError::Response(format!("anthropic error: {status} {text}")));
        }

        let out: Resp = resp
            .json()
            .await
            .map_err(|e| AiError::Response(format!("parse anthropic response: {e}")))?;

        let mut reply = String::new();
        for block in out.content {
            if block.kind == "text"
                && let Some(text) = block.text
            {
                reply.push_str(&text);
            }
        }
        Ok(reply.trim().to_string())
    }

    async fn openai_generate(&self, context: &str, prompt: &str) -> Result<String, AiError> {
        #[derive(Serialize)]
        struct Msg {
            role: String,
            content: String,
        }

        #[derive(Serialize)]
        struct Req {
            model: String,
            messages: Vec<Msg>,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: self.model.clone(),
            messages: vec![
                Msg {
                    role: "system".to_string(),
                    content: context.to_string(),
                },
                Msg {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: 0.4,
        };

        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Request(format!("openai request: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AiError::Response(format!("openai error: {status} {text}")));
        }

        let out: Resp = resp
            .json()
            .await
            .map_err(|e| AiError::Response(format!("parse openai response: {e}")))?;

        let content = out
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl GenerativePort for HttpAssistant {
    async fn generate(&self, context: &str, prompt: &str) -> Result<String, AiError> {
        match self.provider {
            Provider::Anthropic => self.anthropic_generate(context, prompt).await,
            Provider::OpenAI => self.openai_generate(context, prompt).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_rejects_unknown_provider() {
        let llm = LlmSection {
            provider: "carrier-pigeon".to_string(),
            model: "fast-pigeon".to_string(),
            api_key_env: "PIGEON_KEY".to_string(),
        };
        assert!(HttpAssistant::from_config(&llm).is_none());
    }
}
