//! Jurisdiction classification, the root of the analysis graph. The
//! classifier never fails the run: any problem collapses into a
//! low-confidence Unknown verdict the caller can show to the user.

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

use crate::catalog;
use crate::llm::{call_structured, truncate_chars, LlmClient};
use crate::registry::PromptRegistry;
use crate::types::{Confidence, JurisdictionDecision, LegalSystem};

pub const CLASSIFY_STEP: &str = "jurisdiction_classification";

/// Inputs shorter than this are not court decisions.
pub const MIN_DECISION_CHARS: usize = 50;

/// The classifier sees at most this many characters of the decision. The
/// heading and first pages carry the court and citation; the rest is noise
/// for this question.
pub const CLASSIFIER_TEXT_CHARS: usize = 5_000;

const CLASSIFIER_SYSTEM: &str = "You are an expert in comparative law. You identify which jurisdiction a court \
    decision comes from and which legal tradition that jurisdiction belongs to. Answer only \
    from the text you are given.";

#[derive(Debug, Deserialize, JsonSchema)]
struct ClassifierResponse {
    /// "civil-law jurisdiction", "common-law jurisdiction", or "no court decision".
    legal_system_type: String,
    /// Name of the jurisdiction, or "Unknown".
    precise_jurisdiction: String,
    /// ISO 3166-1 alpha-3 code of the jurisdiction, or an empty string.
    iso3_code: String,
    /// "low", "medium", or "high".
    confidence: String,
    reasoning: String,
}

fn parse_confidence(s: &str) -> Confidence {
    match s.trim().to_lowercase().as_str() {
        "high" => Confidence::High,
        "medium" => Confidence::Medium,
        _ => Confidence::Low,
    }
}

/// Check the model's jurisdiction against the catalog. A match normalizes
/// the name, fills the ISO code, and takes the catalog's legal system over
/// the model's. A miss keeps the model's answer but flags it in the
/// reasoning so reviewers see it was not validated.
fn validate(raw: ClassifierResponse) -> JurisdictionDecision {
    let legal_system = LegalSystem::parse(&raw.legal_system_type);
    let confidence = parse_confidence(&raw.confidence);
    let name = raw.precise_jurisdiction.trim();
    if name.is_empty() || name.eq_ignore_ascii_case("unknown") || name.eq_ignore_ascii_case("none")
    {
        return JurisdictionDecision {
            precise_jurisdiction: "Unknown".into(),
            iso3_code: None,
            legal_system,
            confidence,
            reasoning: raw.reasoning,
            user_confirmed: false,
        };
    }
    match catalog::catalog().lookup_fuzzy(name) {
        Some(entry) => JurisdictionDecision {
            precise_jurisdiction: entry.name.clone(),
            iso3_code: Some(entry.iso3.clone()),
            legal_system: entry.legal_system,
            confidence,
            reasoning: raw.reasoning,
            user_confirmed: false,
        },
        None => {
            let iso3 = raw.iso3_code.trim();
            let iso3 = (iso3.len() == 3 && iso3.chars().all(|c| c.is_ascii_alphabetic()))
                .then(|| iso3.to_uppercase());
            JurisdictionDecision {
                precise_jurisdiction: name.to_string(),
                iso3_code: iso3,
                legal_system,
                confidence,
                reasoning: format!("{} (not in standard jurisdiction list)", raw.reasoning.trim()),
                user_confirmed: false,
            }
        }
    }
}

/// Classify the deciding jurisdiction of `text`. Short inputs short-circuit
/// to "no court decision" without an LLM call; a caller hint that matches
/// the catalog skips the model entirely; classifier failures of any kind
/// produce an Unknown verdict instead of an error.
pub async fn classify_jurisdiction(
    llm: &dyn LlmClient,
    model: &str,
    registry: &PromptRegistry,
    text: &str,
    hint: Option<&str>,
) -> JurisdictionDecision {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_DECISION_CHARS {
        return JurisdictionDecision::no_court_decision(
            "The input is too short to be a court decision.",
        );
    }

    if let Some(entry) = hint.and_then(|h| catalog::catalog().lookup(h)) {
        return JurisdictionDecision {
            precise_jurisdiction: entry.name.clone(),
            iso3_code: Some(entry.iso3.clone()),
            legal_system: entry.legal_system,
            confidence: Confidence::High,
            reasoning: "Jurisdiction supplied by the caller and found in the catalog.".into(),
            user_confirmed: false,
        };
    }

    let template = match registry.resolve(LegalSystem::Unknown, "", CLASSIFY_STEP) {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "classifier prompt missing");
            return JurisdictionDecision::unknown(format!("Classification unavailable: {e}"));
        }
    };
    let user = match template.render(
        CLASSIFY_STEP,
        &[
            ("text", truncate_chars(trimmed, CLASSIFIER_TEXT_CHARS)),
            ("jurisdictions", &catalog::catalog().name_list()),
        ],
    ) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "classifier prompt did not render");
            return JurisdictionDecision::unknown(format!("Classification unavailable: {e}"));
        }
    };

    match call_structured::<ClassifierResponse>(
        llm,
        model,
        CLASSIFIER_SYSTEM.to_string(),
        user,
        CLASSIFY_STEP,
    )
    .await
    {
        Ok(raw) => validate(raw),
        Err(e) => {
            warn!(error = %e, "jurisdiction classification failed");
            JurisdictionDecision::unknown(format!("Classification failed: {e}"))
        }
    }
}
