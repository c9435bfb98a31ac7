//! Structured LLM seam. Backends implement `LlmClient`; steps go through
//! `call_structured`, which derives the JSON schema from the target type,
//! tags the call with a span, and turns schema violations into typed errors.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::Instrument;

use crate::types::ModelTier;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm call failed: {0}")]
    CallFailed(String),
    #[error("llm output does not match the requested schema: {0}")]
    StructuredOutputInvalid(String),
    #[error("llm call timed out after {0}s")]
    Timeout(u64),
}

/// One schema-bound completion request.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub schema_name: String,
    pub schema: Value,
}

/// Process-wide LLM backend. Implementations must be safe for concurrent
/// calls; the caller decides retry/abort policy.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete_structured(&self, req: StructuredRequest) -> Result<Value, LlmError>;
}

/// Model ids by tier, from config.
#[derive(Debug, Clone)]
pub struct ModelTable {
    pub fast: String,
    pub reasoning: String,
    pub default: String,
}

impl ModelTable {
    pub fn for_tier(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast,
            ModelTier::Reasoning => &self.reasoning,
            ModelTier::Default => &self.default,
        }
    }

    /// Static step-name → model mapping. Unknown names fall back to the
    /// default model.
    pub fn model_for(&self, step_name: &str) -> &str {
        match step_name {
            "jurisdiction_classification" | "theme_classification" | "case_citation"
            | "pil_provisions" => &self.fast,
            "col_issue" | "courts_position" | "obiter_dicta" | "dissenting_opinions" => {
                &self.reasoning
            }
            _ => &self.default,
        }
    }
}

/// Run one structured call and deserialize the result into `T`. The schema
/// is derived from `T`; a non-conforming response surfaces as
/// `StructuredOutputInvalid`. No internal retries.
pub async fn call_structured<T>(
    llm: &dyn LlmClient,
    model: &str,
    system: String,
    user: String,
    step: &str,
) -> Result<T, LlmError>
where
    T: DeserializeOwned + JsonSchema,
{
    let schema = serde_json::to_value(schemars::schema_for!(T))
        .map_err(|e| LlmError::StructuredOutputInvalid(e.to_string()))?;
    let req = StructuredRequest {
        model: model.to_string(),
        system,
        user,
        schema_name: step.to_string(),
        schema,
    };
    let span = tracing::info_span!("llm_call", step = step, model = model);
    async move {
        let value = llm.complete_structured(req).await?;
        serde_json::from_value::<T>(value)
            .map_err(|e| LlmError::StructuredOutputInvalid(e.to_string()))
    }
    .instrument(span)
    .await
}

/// Char-boundary-safe prefix, used to bound prompt sizes.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
