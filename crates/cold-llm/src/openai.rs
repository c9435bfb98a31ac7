//! OpenAI-compatible backend. Works with any endpoint that accepts the
//! chat-completions format with `response_format: json_schema`; point
//! `base_url` somewhere else for a compatible provider.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use cold_core::llm::{LlmClient, LlmError, StructuredRequest};

pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    fn request_body(req: &StructuredRequest) -> Value {
        json!({
            "model": req.model,
            "messages": [
                { "role": "system", "content": req.system },
                { "role": "user", "content": req.user },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": req.schema_name,
                    "strict": true,
                    "schema": req.schema,
                },
            },
        })
    }
}

/// The structured payload arrives as a JSON string inside the first
/// choice's message content.
fn extract_content(completion: &Value) -> Option<&str> {
    completion
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete_structured(&self, req: StructuredRequest) -> Result<Value, LlmError> {
        let url = self.completions_url();
        let body = Self::request_body(&req);
        debug!(model = %req.model, schema = %req.schema_name, "sending structured completion request");

        let exchange = async {
            let response = self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| LlmError::CallFailed(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(LlmError::CallFailed(format!("HTTP {status}: {text}")));
            }
            response
                .json::<Value>()
                .await
                .map_err(|e| LlmError::CallFailed(format!("failed to parse response: {e}")))
        };

        let completion = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| LlmError::Timeout(self.timeout.as_secs()))??;

        let content = extract_content(&completion).ok_or_else(|| {
            LlmError::StructuredOutputInvalid("response carries no message content".into())
        })?;
        serde_json::from_str(content).map_err(|e| LlmError::StructuredOutputInvalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completions_url_tolerates_trailing_slash() {
        let a = OpenAiClient::new("https://api.openai.com/v1", "k", 1);
        let b = OpenAiClient::new("https://api.openai.com/v1/", "k", 1);
        assert_eq!(a.completions_url(), b.completions_url());
        assert!(a.completions_url().ends_with("/chat/completions"));
    }

    #[test]
    fn request_body_carries_schema_and_messages() {
        let req = StructuredRequest {
            model: "gpt-4o".into(),
            system: "be terse".into(),
            user: "the decision".into(),
            schema_name: "col_extraction".into(),
            schema: json!({ "type": "object" }),
        };
        let body = OpenAiClient::request_body(&req);
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "the decision");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "col_extraction");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
    }

    #[test]
    fn content_extraction_reads_the_first_choice() {
        let completion = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "{\"a\":1}" } }
            ]
        });
        assert_eq!(extract_content(&completion), Some("{\"a\":1}"));
        assert_eq!(extract_content(&json!({ "choices": [] })), None);
    }
}
