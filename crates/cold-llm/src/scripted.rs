//! Scripted LLM backend for tests and offline development.
//!
//! The strict constructor replays enqueued responses in order and fails once
//! the script runs dry, which keeps tests honest about how many calls a
//! scenario makes. [`ScriptedLlm::with_stub_fallback`] instead fabricates a
//! schema-shaped placeholder for every unscripted call, so the full pipeline
//! can run end to end without network access.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use cold_core::llm::{LlmClient, LlmError, StructuredRequest};
use serde_json::{json, Map, Value};

enum Scripted {
    Value(Value),
    Failure(String),
}

#[derive(Default)]
pub struct ScriptedLlm {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<StructuredRequest>>,
    stub_when_exhausted: bool,
}

impl ScriptedLlm {
    /// Strict mode: an exhausted script turns the next call into an error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dev mode: unscripted calls get a placeholder built from the request
    /// schema instead of an error.
    pub fn with_stub_fallback() -> Self {
        Self {
            stub_when_exhausted: true,
            ..Self::default()
        }
    }

    pub fn enqueue(&self, value: Value) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Scripted::Value(value));
    }

    pub fn enqueue_failure(&self, message: &str) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Scripted::Failure(message.to_string()));
    }

    /// Every request seen so far, in call order.
    pub fn calls(&self) -> Vec<StructuredRequest> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete_structured(&self, req: StructuredRequest) -> Result<Value, LlmError> {
        tracing::debug!(schema = %req.schema_name, model = %req.model, "scripted llm call");
        let next = {
            let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
            script.pop_front()
        };
        let out = match next {
            Some(Scripted::Value(v)) => Ok(v),
            Some(Scripted::Failure(msg)) => Err(LlmError::CallFailed(msg)),
            None if self.stub_when_exhausted => Ok(stub_from_schema(&req.schema)),
            None => Err(LlmError::CallFailed(format!(
                "script exhausted at step {}",
                req.schema_name
            ))),
        };
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(req);
        out
    }
}

/// Builds a placeholder value satisfying a draft-07 object schema: first enum
/// variant for enums, empty arrays, fixed strings and zeros otherwise.
pub fn stub_from_schema(schema: &Value) -> Value {
    let definitions = schema.get("definitions").cloned().unwrap_or(Value::Null);
    build(schema, &definitions)
}

fn build(node: &Value, definitions: &Value) -> Value {
    if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
        let name = reference.rsplit('/').next().unwrap_or_default();
        if let Some(target) = definitions.get(name) {
            return build(target, definitions);
        }
        return Value::Null;
    }
    if let Some(options) = node.get("enum").and_then(Value::as_array) {
        return options.first().cloned().unwrap_or(Value::Null);
    }
    let ty = node.get("type").and_then(Value::as_str).unwrap_or("object");
    match ty {
        "object" => {
            let mut out = Map::new();
            if let Some(props) = node.get("properties").and_then(Value::as_object) {
                for (key, sub) in props {
                    out.insert(key.clone(), build(sub, definitions));
                }
            }
            Value::Object(out)
        }
        "array" => json!([]),
        "string" => json!("Scripted response."),
        "boolean" => json!(false),
        "integer" | "number" => json!(0),
        _ => Value::Null,
    }
}
