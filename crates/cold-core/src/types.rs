use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Jurisdiction ──────────────────────────────────────────────────────────

/// Broad legal tradition of the deciding court. The wire strings are shared
/// with the stored JSON and the classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum LegalSystem {
    #[serde(rename = "civil-law jurisdiction")]
    CivilLaw,
    #[serde(rename = "common-law jurisdiction")]
    CommonLaw,
    #[serde(rename = "no court decision")]
    NoCourtDecision,
    Unknown,
}

impl LegalSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegalSystem::CivilLaw => "civil-law jurisdiction",
            LegalSystem::CommonLaw => "common-law jurisdiction",
            LegalSystem::NoCourtDecision => "no court decision",
            LegalSystem::Unknown => "Unknown",
        }
    }

    /// Tolerant parse for model output and user input. Accepts bare
    /// "civil-law" / "common-law" prefixes in any case.
    pub fn parse(s: &str) -> Self {
        let lower = s.trim().to_lowercase();
        if lower.starts_with("civil") {
            LegalSystem::CivilLaw
        } else if lower.starts_with("common") {
            LegalSystem::CommonLaw
        } else if lower.contains("no court") {
            LegalSystem::NoCourtDecision
        } else {
            LegalSystem::Unknown
        }
    }
}

impl std::fmt::Display for LegalSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// Where the analyzed decision was rendered, and how sure we are about it.
/// Produced by the classifier, then overwritten once by the user when they
/// start the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionDecision {
    pub precise_jurisdiction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso3_code: Option<String>,
    #[serde(rename = "legal_system_type")]
    pub legal_system: LegalSystem,
    pub confidence: Confidence,
    pub reasoning: String,
    #[serde(default)]
    pub user_confirmed: bool,
}

impl JurisdictionDecision {
    /// Low-confidence fallback used when classification cannot run or fails.
    pub fn unknown(reasoning: impl Into<String>) -> Self {
        JurisdictionDecision {
            precise_jurisdiction: "Unknown".into(),
            iso3_code: None,
            legal_system: LegalSystem::Unknown,
            confidence: Confidence::Low,
            reasoning: reasoning.into(),
            user_confirmed: false,
        }
    }

    /// Verdict for inputs too short to be a court decision.
    pub fn no_court_decision(reasoning: impl Into<String>) -> Self {
        JurisdictionDecision {
            precise_jurisdiction: "Unknown".into(),
            iso3_code: None,
            legal_system: LegalSystem::NoCourtDecision,
            confidence: Confidence::Low,
            reasoning: reasoning.into(),
            user_confirmed: false,
        }
    }
}

// ── Steps ─────────────────────────────────────────────────────────────────

/// One node of the analysis DAG. The snake_case names double as JSON keys
/// in the stored analyzer column and as event step names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    ColExtraction,
    ThemeClassification,
    CaseCitation,
    RelevantFacts,
    PilProvisions,
    ColIssue,
    CourtsPosition,
    ObiterDicta,
    DissentingOpinions,
    Abstract,
}

impl StepKind {
    pub const ALL: [StepKind; 10] = [
        StepKind::ColExtraction,
        StepKind::ThemeClassification,
        StepKind::CaseCitation,
        StepKind::RelevantFacts,
        StepKind::PilProvisions,
        StepKind::ColIssue,
        StepKind::CourtsPosition,
        StepKind::ObiterDicta,
        StepKind::DissentingOpinions,
        StepKind::Abstract,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::ColExtraction => "col_extraction",
            StepKind::ThemeClassification => "theme_classification",
            StepKind::CaseCitation => "case_citation",
            StepKind::RelevantFacts => "relevant_facts",
            StepKind::PilProvisions => "pil_provisions",
            StepKind::ColIssue => "col_issue",
            StepKind::CourtsPosition => "courts_position",
            StepKind::ObiterDicta => "obiter_dicta",
            StepKind::DissentingOpinions => "dissenting_opinions",
            StepKind::Abstract => "abstract",
        }
    }

    pub fn parse(s: &str) -> Option<StepKind> {
        StepKind::ALL.iter().copied().find(|k| k.as_str() == s)
    }

    /// A failed fatal step terminates the run; non-fatal failures only lose
    /// that one field.
    pub fn fatal(&self) -> bool {
        !matches!(
            self,
            StepKind::CaseCitation | StepKind::ObiterDicta | StepKind::DissentingOpinions
        )
    }

    pub fn tier(&self) -> ModelTier {
        match self {
            StepKind::ThemeClassification | StepKind::CaseCitation | StepKind::PilProvisions => {
                ModelTier::Fast
            }
            StepKind::ColIssue
            | StepKind::CourtsPosition
            | StepKind::ObiterDicta
            | StepKind::DissentingOpinions => ModelTier::Reasoning,
            StepKind::ColExtraction | StepKind::RelevantFacts | StepKind::Abstract => {
                ModelTier::Default
            }
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Fast,
    Reasoning,
    Default,
}

// ── Step payloads ─────────────────────────────────────────────────────────
// One struct per step, shaped exactly like the stored JSON and the schema
// sent to the model: payload field(s) plus confidence and reasoning.

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColSections {
    /// Verbatim choice-of-law passages, in document order. May be empty.
    pub col_sections: Vec<String>,
    pub confidence: Confidence,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Themes {
    pub themes: Vec<String>,
    pub confidence: Confidence,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Citation {
    pub citation: String,
    pub confidence: Confidence,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RelevantFacts {
    pub relevant_facts: String,
    pub confidence: Confidence,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PilProvisions {
    pub pil_provisions: Vec<String>,
    pub confidence: Confidence,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColIssue {
    pub col_issue: String,
    pub confidence: Confidence,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CourtsPosition {
    pub courts_position: String,
    pub confidence: Confidence,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ObiterDicta {
    pub obiter_dicta: String,
    pub confidence: Confidence,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DissentingOpinions {
    pub dissenting_opinions: String,
    pub confidence: Confidence,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CaseAbstract {
    #[serde(rename = "abstract")]
    pub text: String,
    pub confidence: Confidence,
    pub reasoning: String,
}

/// Typed result of one completed step.
#[derive(Debug, Clone)]
pub enum StepResult {
    ColExtraction(ColSections),
    ThemeClassification(Themes),
    CaseCitation(Citation),
    RelevantFacts(RelevantFacts),
    PilProvisions(PilProvisions),
    ColIssue(ColIssue),
    CourtsPosition(CourtsPosition),
    ObiterDicta(ObiterDicta),
    DissentingOpinions(DissentingOpinions),
    Abstract(CaseAbstract),
}

impl StepResult {
    pub fn kind(&self) -> StepKind {
        match self {
            StepResult::ColExtraction(_) => StepKind::ColExtraction,
            StepResult::ThemeClassification(_) => StepKind::ThemeClassification,
            StepResult::CaseCitation(_) => StepKind::CaseCitation,
            StepResult::RelevantFacts(_) => StepKind::RelevantFacts,
            StepResult::PilProvisions(_) => StepKind::PilProvisions,
            StepResult::ColIssue(_) => StepKind::ColIssue,
            StepResult::CourtsPosition(_) => StepKind::CourtsPosition,
            StepResult::ObiterDicta(_) => StepKind::ObiterDicta,
            StepResult::DissentingOpinions(_) => StepKind::DissentingOpinions,
            StepResult::Abstract(_) => StepKind::Abstract,
        }
    }

    pub fn confidence(&self) -> Confidence {
        match self {
            StepResult::ColExtraction(p) => p.confidence,
            StepResult::ThemeClassification(p) => p.confidence,
            StepResult::CaseCitation(p) => p.confidence,
            StepResult::RelevantFacts(p) => p.confidence,
            StepResult::PilProvisions(p) => p.confidence,
            StepResult::ColIssue(p) => p.confidence,
            StepResult::CourtsPosition(p) => p.confidence,
            StepResult::ObiterDicta(p) => p.confidence,
            StepResult::DissentingOpinions(p) => p.confidence,
            StepResult::Abstract(p) => p.confidence,
        }
    }

    /// JSON shape stored in the analyzer column and sent in completed events.
    pub fn to_value(&self) -> Value {
        let out = match self {
            StepResult::ColExtraction(p) => serde_json::to_value(p),
            StepResult::ThemeClassification(p) => serde_json::to_value(p),
            StepResult::CaseCitation(p) => serde_json::to_value(p),
            StepResult::RelevantFacts(p) => serde_json::to_value(p),
            StepResult::PilProvisions(p) => serde_json::to_value(p),
            StepResult::ColIssue(p) => serde_json::to_value(p),
            StepResult::CourtsPosition(p) => serde_json::to_value(p),
            StepResult::ObiterDicta(p) => serde_json::to_value(p),
            StepResult::DissentingOpinions(p) => serde_json::to_value(p),
            StepResult::Abstract(p) => serde_json::to_value(p),
        };
        out.unwrap_or(Value::Null)
    }

    /// Reverse of `to_value`. Returns None when the stored shape does not
    /// deserialize; callers skip such entries.
    pub fn from_value(kind: StepKind, value: &Value) -> Option<StepResult> {
        let v = value.clone();
        match kind {
            StepKind::ColExtraction => serde_json::from_value(v).ok().map(StepResult::ColExtraction),
            StepKind::ThemeClassification => {
                serde_json::from_value(v).ok().map(StepResult::ThemeClassification)
            }
            StepKind::CaseCitation => serde_json::from_value(v).ok().map(StepResult::CaseCitation),
            StepKind::RelevantFacts => serde_json::from_value(v).ok().map(StepResult::RelevantFacts),
            StepKind::PilProvisions => serde_json::from_value(v).ok().map(StepResult::PilProvisions),
            StepKind::ColIssue => serde_json::from_value(v).ok().map(StepResult::ColIssue),
            StepKind::CourtsPosition => {
                serde_json::from_value(v).ok().map(StepResult::CourtsPosition)
            }
            StepKind::ObiterDicta => serde_json::from_value(v).ok().map(StepResult::ObiterDicta),
            StepKind::DissentingOpinions => {
                serde_json::from_value(v).ok().map(StepResult::DissentingOpinions)
            }
            StepKind::Abstract => serde_json::from_value(v).ok().map(StepResult::Abstract),
        }
    }
}

// ── Events ────────────────────────────────────────────────────────────────

pub const ANALYSIS_COMPLETE: &str = "analysis_complete";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    InProgress,
    Completed,
    Error,
}

/// One frame of the analyze stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisEvent {
    pub step: String,
    pub status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisEvent {
    pub fn in_progress(kind: StepKind) -> Self {
        AnalysisEvent {
            step: kind.as_str().into(),
            status: EventStatus::InProgress,
            data: None,
            error: None,
        }
    }

    pub fn completed(kind: StepKind, data: Value) -> Self {
        AnalysisEvent {
            step: kind.as_str().into(),
            status: EventStatus::Completed,
            data: Some(data),
            error: None,
        }
    }

    pub fn step_error(step: &str, message: impl Into<String>) -> Self {
        AnalysisEvent {
            step: step.into(),
            status: EventStatus::Error,
            data: None,
            error: Some(message.into()),
        }
    }

    /// The terminal frame of a successful run.
    pub fn analysis_complete() -> Self {
        AnalysisEvent {
            step: ANALYSIS_COMPLETE.into(),
            status: EventStatus::Completed,
            data: Some(serde_json::json!({ "done": true })),
            error: None,
        }
    }
}

// ── Drafts ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Draft,
    Analyzing,
    Completed,
    Failed,
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Draft => "draft",
            ModerationStatus::Analyzing => "analyzing",
            ModerationStatus::Completed => "completed",
            ModerationStatus::Failed => "failed",
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<ModerationStatus> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Some(ModerationStatus::Draft),
            "analyzing" => Some(ModerationStatus::Analyzing),
            "completed" => Some(ModerationStatus::Completed),
            "failed" => Some(ModerationStatus::Failed),
            "pending" => Some(ModerationStatus::Pending),
            "approved" => Some(ModerationStatus::Approved),
            "rejected" => Some(ModerationStatus::Rejected),
            _ => None,
        }
    }

    /// Once submitted for moderation the owner can neither mutate nor view
    /// the draft through the analyzer surface.
    pub fn is_frozen(&self) -> bool {
        matches!(
            self,
            ModerationStatus::Pending | ModerationStatus::Approved | ModerationStatus::Rejected
        )
    }
}

impl std::fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted analysis record.
#[derive(Debug, Clone)]
pub struct Draft {
    pub id: i64,
    pub user_email: String,
    pub file_name: String,
    pub text: String,
    pub model: Option<String>,
    pub case_citation: Option<String>,
    pub moderation_status: ModerationStatus,
    pub analyzer: Option<Value>,
    pub data: Option<Value>,
    pub submitted_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Draft {
    /// Step results from either storage shape: the analyzer column, or the
    /// legacy data blob (flat or nested under "analysis"). Unknown keys and
    /// undecodable entries are skipped.
    pub fn step_results(&self) -> HashMap<StepKind, StepResult> {
        let mut out = HashMap::new();
        if let Some(Value::Object(map)) = &self.analyzer {
            collect_steps(map, &mut out);
        }
        if out.is_empty() {
            if let Some(map) = self.legacy_map() {
                collect_steps(map, &mut out);
            }
        }
        out
    }

    pub fn stored_jurisdiction(&self) -> Option<JurisdictionDecision> {
        self.analyzer_field("jurisdiction")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// The failing step recorded by a fatal run, as (step, message).
    pub fn stored_error(&self) -> Option<(String, String)> {
        let entry = self.analyzer_field("error")?;
        let step = entry.get("step")?.as_str()?.to_string();
        let message = entry.get("message")?.as_str()?.to_string();
        Some((step, message))
    }

    fn analyzer_field(&self, key: &str) -> Option<&Value> {
        if let Some(Value::Object(map)) = &self.analyzer {
            if let Some(v) = map.get(key) {
                return Some(v);
            }
        }
        self.legacy_map().and_then(|m| m.get(key))
    }

    fn legacy_map(&self) -> Option<&serde_json::Map<String, Value>> {
        let Some(Value::Object(map)) = &self.data else {
            return None;
        };
        match map.get("analysis") {
            Some(Value::Object(inner)) => Some(inner),
            _ => Some(map),
        }
    }
}

fn collect_steps(map: &serde_json::Map<String, Value>, out: &mut HashMap<StepKind, StepResult>) {
    for (key, value) in map {
        if let Some(kind) = StepKind::parse(key) {
            if let Some(result) = StepResult::from_value(kind, value) {
                out.insert(kind, result);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_system_wire_strings() {
        let json = serde_json::to_string(&LegalSystem::CivilLaw).unwrap();
        assert_eq!(json, "\"civil-law jurisdiction\"");
        let back: LegalSystem = serde_json::from_str("\"common-law jurisdiction\"").unwrap();
        assert_eq!(back, LegalSystem::CommonLaw);
    }

    #[test]
    fn legal_system_tolerant_parse() {
        assert_eq!(LegalSystem::parse("Civil-Law"), LegalSystem::CivilLaw);
        assert_eq!(LegalSystem::parse("common law tradition"), LegalSystem::CommonLaw);
        assert_eq!(LegalSystem::parse("No court decision"), LegalSystem::NoCourtDecision);
        assert_eq!(LegalSystem::parse("mixed"), LegalSystem::Unknown);
    }

    #[test]
    fn step_kind_names_round_trip() {
        for kind in StepKind::ALL {
            assert_eq!(StepKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(StepKind::parse("jurisdiction"), None);
    }

    #[test]
    fn fatal_policy() {
        assert!(StepKind::ColExtraction.fatal());
        assert!(StepKind::ThemeClassification.fatal());
        assert!(StepKind::Abstract.fatal());
        assert!(!StepKind::CaseCitation.fatal());
        assert!(!StepKind::ObiterDicta.fatal());
        assert!(!StepKind::DissentingOpinions.fatal());
    }

    #[test]
    fn step_result_value_round_trip() {
        let result = StepResult::ThemeClassification(Themes {
            themes: vec!["Party autonomy".into()],
            confidence: Confidence::High,
            reasoning: "explicit clause".into(),
        });
        let value = result.to_value();
        assert_eq!(value["themes"][0], "Party autonomy");
        assert_eq!(value["confidence"], "high");
        let back = StepResult::from_value(StepKind::ThemeClassification, &value).unwrap();
        assert_eq!(back.kind(), StepKind::ThemeClassification);
    }

    #[test]
    fn abstract_payload_uses_reserved_word_key() {
        let result = StepResult::Abstract(CaseAbstract {
            text: "summary".into(),
            confidence: Confidence::Medium,
            reasoning: "r".into(),
        });
        let value = result.to_value();
        assert_eq!(value["abstract"], "summary");
        assert!(value.get("text").is_none());
    }

    #[test]
    fn event_frames_serialize_compactly() {
        let frame = AnalysisEvent::in_progress(StepKind::ColIssue);
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["step"], "col_issue");
        assert_eq!(json["status"], "in_progress");
        assert!(json.get("data").is_none());
        assert!(json.get("error").is_none());

        let terminal = serde_json::to_value(AnalysisEvent::analysis_complete()).unwrap();
        assert_eq!(terminal["step"], "analysis_complete");
        assert_eq!(terminal["status"], "completed");
        assert_eq!(terminal["data"]["done"], true);
    }

    #[test]
    fn moderation_frozen_states() {
        for status in [
            ModerationStatus::Pending,
            ModerationStatus::Approved,
            ModerationStatus::Rejected,
        ] {
            assert!(status.is_frozen());
        }
        for status in [
            ModerationStatus::Draft,
            ModerationStatus::Analyzing,
            ModerationStatus::Completed,
            ModerationStatus::Failed,
        ] {
            assert!(!status.is_frozen());
        }
    }

    fn draft_with(analyzer: Option<Value>, data: Option<Value>) -> Draft {
        Draft {
            id: 1,
            user_email: "owner@example.org".into(),
            file_name: "decision.txt".into(),
            text: "text".into(),
            model: None,
            case_citation: None,
            moderation_status: ModerationStatus::Draft,
            analyzer,
            data,
            submitted_data: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn step_results_prefer_analyzer_column() {
        let analyzer = serde_json::json!({
            "col_issue": { "col_issue": "new", "confidence": "high", "reasoning": "r" },
            "jurisdiction": { "precise_jurisdiction": "Switzerland",
                              "legal_system_type": "civil-law jurisdiction",
                              "confidence": "high", "reasoning": "hint" },
        });
        let data = serde_json::json!({
            "analysis": {
                "col_issue": { "col_issue": "old", "confidence": "low", "reasoning": "r" },
            }
        });
        let draft = draft_with(Some(analyzer), Some(data));
        let results = draft.step_results();
        assert_eq!(results.len(), 1);
        match &results[&StepKind::ColIssue] {
            StepResult::ColIssue(p) => assert_eq!(p.col_issue, "new"),
            other => panic!("unexpected result {other:?}"),
        }
        let jurisdiction = draft.stored_jurisdiction().unwrap();
        assert_eq!(jurisdiction.legal_system, LegalSystem::CivilLaw);
    }

    #[test]
    fn step_results_fall_back_to_legacy_blob() {
        let data = serde_json::json!({
            "analysis": {
                "relevant_facts": { "relevant_facts": "f", "confidence": "medium", "reasoning": "r" },
                "not_a_step": { "x": 1 },
            }
        });
        let draft = draft_with(None, Some(data));
        let results = draft.step_results();
        assert_eq!(results.len(), 1);
        assert!(results.contains_key(&StepKind::RelevantFacts));

        let flat = serde_json::json!({
            "abstract": { "abstract": "a", "confidence": "low", "reasoning": "r" },
        });
        let draft = draft_with(None, Some(flat));
        assert!(draft.step_results().contains_key(&StepKind::Abstract));
    }

    #[test]
    fn stored_error_reads_both_shapes() {
        let analyzer = serde_json::json!({
            "error": { "step": "col_issue", "message": "model unavailable" },
        });
        let draft = draft_with(Some(analyzer), None);
        let (step, message) = draft.stored_error().unwrap();
        assert_eq!(step, "col_issue");
        assert_eq!(message, "model unavailable");
        assert!(draft_with(None, None).stored_error().is_none());
    }
}
