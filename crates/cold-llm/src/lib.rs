//! LLM backends for the case analyzer: a real OpenAI-compatible client and
//! a scripted one for tests and offline development. Both implement
//! `cold_core::llm::LlmClient`.

pub mod openai;
pub mod scripted;

pub use openai::OpenAiClient;
pub use scripted::ScriptedLlm;
