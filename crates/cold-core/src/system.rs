//! System prompts for the analysis steps. Every step shares a phase
//! preamble; jurisdiction context is appended when the catalog knows the
//! court's jurisdiction, always marked informational so the model keeps
//! grounding its answers in the decision text.

use crate::catalog;
use crate::types::{JurisdictionDecision, LegalSystem};

/// Which flavour of work the step is doing. Section extraction and theme
/// classification get tighter instructions than the free-form analysis
/// steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    ColSection,
    Theme,
    Analysis,
}

const COL_SECTION_PREAMBLE: &str = "You are an expert in private international law assisting with the analysis of a court decision.\n\
    Your task is to find the passages of the decision that deal with choice of law.\n\
    Rules:\n\
    1. Quote the decision verbatim. Do not paraphrase, summarise, or translate.\n\
    2. Keep the original order of the passages.\n\
    3. If the decision contains no choice-of-law discussion, say so instead of quoting unrelated text.";

const THEME_PREAMBLE: &str = "You are an expert in private international law assisting with the analysis of a court decision.\n\
    Your task is to classify the choice-of-law discussion of the decision against a fixed list of themes.\n\
    Rules:\n\
    1. Use only themes from the provided table, exactly as written there.\n\
    2. Pick every theme that applies; do not invent new ones.\n\
    3. If none applies, answer with NA.";

const ANALYSIS_PREAMBLE: &str = "You are an expert in private international law assisting with the analysis of a court decision.\n\
    Answer strictly from the text of the decision and the excerpts you are given.\n\
    Rules:\n\
    1. Do not speculate beyond what the decision states.\n\
    2. Quote the decision where a verbatim passage answers the question.\n\
    3. Write in clear, precise legal English.";

impl AnalysisPhase {
    pub fn preamble(self) -> &'static str {
        match self {
            AnalysisPhase::ColSection => COL_SECTION_PREAMBLE,
            AnalysisPhase::Theme => THEME_PREAMBLE,
            AnalysisPhase::Analysis => ANALYSIS_PREAMBLE,
        }
    }
}

fn legal_system_note(system: LegalSystem) -> Option<&'static str> {
    match system {
        LegalSystem::CivilLaw => Some(
            "The decision comes from a civil-law jurisdiction: codified statutes are the primary \
             source of law and court decisions carry persuasive rather than binding authority.",
        ),
        LegalSystem::CommonLaw => Some(
            "The decision comes from a common-law jurisdiction: precedent is a primary source of \
             law, so pay attention to how earlier cases are followed or distinguished.",
        ),
        LegalSystem::NoCourtDecision | LegalSystem::Unknown => None,
    }
}

/// Assemble the system prompt for one step: phase preamble, then the
/// catalog summary for the jurisdiction when there is one, then a note on
/// the legal system. The summary is context, never an instruction source.
pub fn system_prompt(phase: AnalysisPhase, decision: &JurisdictionDecision) -> String {
    let mut out = String::from(phase.preamble());
    if let Some(summary) = catalog::catalog().summary_for(&decision.precise_jurisdiction) {
        out.push_str(
            "\n\nJurisdictional context (informational only; the text of the decision prevails):\n",
        );
        out.push_str(summary);
    }
    if let Some(note) = legal_system_note(decision.legal_system) {
        out.push_str("\n\n");
        out.push_str(note);
    }
    out
}
