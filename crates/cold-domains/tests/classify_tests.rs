//! Jurisdiction classification against the built-in classifier prompt,
//! with a scripted backend: catalog normalization, the degraded verdicts,
//! and the bounded prompt size.

use cold_core::classify::{classify_jurisdiction, CLASSIFIER_TEXT_CHARS};
use cold_core::types::{Confidence, LegalSystem};
use cold_domains::builtin_registry;
use cold_llm::ScriptedLlm;
use serde_json::json;

const SWISS_TEXT: &str = "The Swiss Federal Supreme Court, sitting in Lausanne, considered \
    whether the choice of Swiss law in the distribution agreement extends to claims in tort.";

fn response(system: &str, jurisdiction: &str, iso3: &str) -> serde_json::Value {
    json!({
        "legal_system_type": system,
        "precise_jurisdiction": jurisdiction,
        "iso3_code": iso3,
        "confidence": "high",
        "reasoning": "The court names itself in the heading."
    })
}

#[tokio::test]
async fn classifier_normalizes_through_the_catalog() {
    let llm = ScriptedLlm::new();
    llm.enqueue(response("civil-law jurisdiction", "switzerland", "CHE"));
    let registry = builtin_registry();

    let decision = classify_jurisdiction(&llm, "fast-model", &registry, SWISS_TEXT, None).await;

    assert_eq!(decision.precise_jurisdiction, "Switzerland");
    assert_eq!(decision.iso3_code.as_deref(), Some("CHE"));
    assert_eq!(decision.legal_system, LegalSystem::CivilLaw);
    assert_eq!(decision.confidence, Confidence::High);
    assert!(!decision.user_confirmed);

    let calls = llm.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].model, "fast-model");
    assert_eq!(calls[0].schema_name, "jurisdiction_classification");
    assert!(calls[0].user.contains("Lausanne"));
    // the prompt embeds the catalog's name list
    assert!(calls[0].user.contains("Switzerland"));
    assert!(calls[0].user.contains("India"));
    assert!(calls[0].system.contains("comparative law"));
}

#[tokio::test]
async fn catalog_legal_system_beats_the_model_answer() {
    let llm = ScriptedLlm::new();
    llm.enqueue(response("common-law jurisdiction", "Germany", "DEU"));
    let registry = builtin_registry();
    let text = "The Bundesgerichtshof ruled on the law applicable to the sales contract.";

    let decision = classify_jurisdiction(&llm, "m", &registry, text, None).await;

    assert_eq!(decision.precise_jurisdiction, "Germany");
    assert_eq!(decision.legal_system, LegalSystem::CivilLaw);
    assert_eq!(decision.iso3_code.as_deref(), Some("DEU"));
}

#[tokio::test]
async fn unlisted_jurisdiction_is_kept_and_flagged() {
    let llm = ScriptedLlm::new();
    llm.enqueue(response("civil-law jurisdiction", "Principality of Ruritania", ""));
    let registry = builtin_registry();

    let decision = classify_jurisdiction(&llm, "m", &registry, SWISS_TEXT, None).await;

    assert_eq!(decision.precise_jurisdiction, "Principality of Ruritania");
    assert_eq!(decision.iso3_code, None);
    assert!(decision
        .reasoning
        .ends_with("(not in standard jurisdiction list)"));
}

#[tokio::test]
async fn call_failure_degrades_to_unknown() {
    let llm = ScriptedLlm::new();
    llm.enqueue_failure("rate limited");
    let registry = builtin_registry();

    let decision = classify_jurisdiction(&llm, "m", &registry, SWISS_TEXT, None).await;

    assert_eq!(decision.precise_jurisdiction, "Unknown");
    assert_eq!(decision.legal_system, LegalSystem::Unknown);
    assert_eq!(decision.confidence, Confidence::Low);
    assert!(decision.reasoning.contains("Classification failed"));
    assert!(decision.reasoning.contains("rate limited"));
}

#[tokio::test]
async fn non_conforming_output_degrades_to_unknown() {
    let llm = ScriptedLlm::new();
    llm.enqueue(json!({ "legal_system_type": "civil-law jurisdiction" }));
    let registry = builtin_registry();

    let decision = classify_jurisdiction(&llm, "m", &registry, SWISS_TEXT, None).await;

    assert_eq!(decision.legal_system, LegalSystem::Unknown);
    assert!(decision.reasoning.contains("Classification failed"));
}

#[tokio::test]
async fn classifier_prompt_is_bounded() {
    let llm = ScriptedLlm::new();
    llm.enqueue(response("civil-law jurisdiction", "Switzerland", "CHE"));
    let registry = builtin_registry();
    let filler = "The court below addressed the governing law question. ".repeat(200);
    assert!(filler.chars().count() > CLASSIFIER_TEXT_CHARS);
    let text = format!("{filler}FINAL_MARKER");

    let decision = classify_jurisdiction(&llm, "m", &registry, &text, None).await;

    assert_eq!(decision.precise_jurisdiction, "Switzerland");
    let calls = llm.calls();
    assert!(calls[0].user.contains("The court below addressed"));
    assert!(!calls[0].user.contains("FINAL_MARKER"));
}

#[tokio::test]
async fn matching_hint_skips_the_model_entirely() {
    let llm = ScriptedLlm::new();
    let registry = builtin_registry();

    let decision =
        classify_jurisdiction(&llm, "m", &registry, SWISS_TEXT, Some("Holland")).await;

    assert_eq!(decision.precise_jurisdiction, "Netherlands");
    assert_eq!(decision.iso3_code.as_deref(), Some("NLD"));
    assert_eq!(decision.confidence, Confidence::High);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn unmatched_hint_falls_through_to_the_model() {
    let llm = ScriptedLlm::new();
    llm.enqueue(response("civil-law jurisdiction", "Switzerland", "CHE"));
    let registry = builtin_registry();

    let decision =
        classify_jurisdiction(&llm, "m", &registry, SWISS_TEXT, Some("somewhere odd")).await;

    assert_eq!(decision.precise_jurisdiction, "Switzerland");
    assert_eq!(llm.call_count(), 1);
}
