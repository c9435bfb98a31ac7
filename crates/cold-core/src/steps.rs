//! The analysis steps. Each step resolves its prompt, formats it with the
//! document text and whatever upstream outputs it needs, and makes one
//! structured LLM call. Failure policy lives in the pipeline; the only
//! exception is theme classification, which degrades to an NA result so the
//! steps after it still have something to work with.

use std::collections::HashMap;

use thiserror::Error;
use tracing::warn;

use crate::llm::{call_structured, LlmClient, LlmError, ModelTable};
use crate::registry::{PromptError, PromptRegistry, PromptTemplate};
use crate::system::{system_prompt, AnalysisPhase};
use crate::themes;
use crate::types::{
    CaseAbstract, Citation, ColIssue, ColSections, Confidence, CourtsPosition, DissentingOpinions,
    JurisdictionDecision, ObiterDicta, PilProvisions, RelevantFacts, StepKind, StepResult, Themes,
};

#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Everything a step may draw on: the decision text, the jurisdiction
/// verdict, and the outputs of the steps that already ran.
pub struct StepInput<'a> {
    pub text: &'a str,
    pub decision: &'a JurisdictionDecision,
    pub results: &'a HashMap<StepKind, StepResult>,
}

const NONE_MARKER: &str = "None.";

impl StepInput<'_> {
    /// Joined choice-of-law passages, or a marker when extraction found none.
    fn sections(&self) -> String {
        match self.results.get(&StepKind::ColExtraction) {
            Some(StepResult::ColExtraction(p)) if !p.col_sections.is_empty() => {
                p.col_sections.join("\n\n")
            }
            _ => "No choice-of-law section was identified.".to_string(),
        }
    }

    fn theme_list(&self) -> Vec<String> {
        match self.results.get(&StepKind::ThemeClassification) {
            Some(StepResult::ThemeClassification(p)) if !p.themes.is_empty() => p.themes.clone(),
            _ => vec![themes::NA.to_string()],
        }
    }

    fn themes_joined(&self) -> String {
        self.theme_list().join(", ")
    }

    fn issue(&self) -> String {
        match self.results.get(&StepKind::ColIssue) {
            Some(StepResult::ColIssue(p)) => p.col_issue.clone(),
            _ => NONE_MARKER.to_string(),
        }
    }

    fn position(&self) -> String {
        match self.results.get(&StepKind::CourtsPosition) {
            Some(StepResult::CourtsPosition(p)) => p.courts_position.clone(),
            _ => NONE_MARKER.to_string(),
        }
    }

    fn facts(&self) -> String {
        match self.results.get(&StepKind::RelevantFacts) {
            Some(StepResult::RelevantFacts(p)) => p.relevant_facts.clone(),
            _ => NONE_MARKER.to_string(),
        }
    }

    fn provisions(&self) -> String {
        match self.results.get(&StepKind::PilProvisions) {
            Some(StepResult::PilProvisions(p)) if !p.pil_provisions.is_empty() => {
                p.pil_provisions.join("\n")
            }
            _ => NONE_MARKER.to_string(),
        }
    }

    fn obiter(&self) -> String {
        match self.results.get(&StepKind::ObiterDicta) {
            Some(StepResult::ObiterDicta(p)) => p.obiter_dicta.clone(),
            _ => NONE_MARKER.to_string(),
        }
    }

    fn dissent(&self) -> String {
        match self.results.get(&StepKind::DissentingOpinions) {
            Some(StepResult::DissentingOpinions(p)) => p.dissenting_opinions.clone(),
            _ => NONE_MARKER.to_string(),
        }
    }
}

fn phase_for(kind: StepKind) -> AnalysisPhase {
    match kind {
        StepKind::ColExtraction => AnalysisPhase::ColSection,
        StepKind::ThemeClassification => AnalysisPhase::Theme,
        _ => AnalysisPhase::Analysis,
    }
}

/// Keep only vocabulary themes, canonical spelling, first-seen order. An
/// answer with nothing usable collapses to NA.
fn sanitize_themes(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in raw {
        if let Some(canonical) = themes::canonical(name) {
            if !out.iter().any(|t| t == canonical) {
                out.push(canonical.to_string());
            }
        }
    }
    if out.is_empty() {
        vec![themes::NA.to_string()]
    } else {
        out
    }
}

async fn theme_step(
    template: &PromptTemplate,
    llm: &dyn LlmClient,
    model: &str,
    input: &StepInput<'_>,
) -> Result<StepResult, StepError> {
    let kind = StepKind::ThemeClassification;
    let sections = input.sections();
    let table = themes::definitions_table();
    let user = template.render(
        kind.as_str(),
        &[
            ("text", input.text),
            ("sections", &sections),
            ("themes_table", &table),
        ],
    )?;
    let system = system_prompt(AnalysisPhase::Theme, input.decision);
    match call_structured::<Themes>(llm, model, system, user, kind.as_str()).await {
        Ok(mut payload) => {
            payload.themes = sanitize_themes(&payload.themes);
            Ok(StepResult::ThemeClassification(payload))
        }
        Err(e) => {
            warn!(error = %e, "theme classification failed, falling back to NA");
            Ok(StepResult::ThemeClassification(Themes {
                themes: vec![themes::NA.to_string()],
                confidence: Confidence::Low,
                reasoning: format!("Theme classification failed: {e}"),
            }))
        }
    }
}

/// Run one analysis step end to end. Prompt resolution and rendering errors
/// surface as `StepError::Prompt` before any model call happens.
pub async fn run(
    kind: StepKind,
    llm: &dyn LlmClient,
    models: &ModelTable,
    registry: &PromptRegistry,
    input: &StepInput<'_>,
) -> Result<StepResult, StepError> {
    let template = registry.resolve(
        input.decision.legal_system,
        &input.decision.precise_jurisdiction,
        kind.as_str(),
    )?;
    let model = models.for_tier(kind.tier());
    let step = kind.as_str();
    let system = system_prompt(phase_for(kind), input.decision);

    match kind {
        StepKind::ColExtraction => {
            let user = template.render(step, &[("text", input.text)])?;
            let payload: ColSections = call_structured(llm, model, system, user, step).await?;
            Ok(StepResult::ColExtraction(payload))
        }
        StepKind::ThemeClassification => theme_step(template, llm, model, input).await,
        StepKind::CaseCitation => {
            let user = template.render(
                step,
                &[
                    ("text", input.text),
                    ("legal_system", input.decision.legal_system.as_str()),
                    ("jurisdiction", &input.decision.precise_jurisdiction),
                ],
            )?;
            let payload: Citation = call_structured(llm, model, system, user, step).await?;
            Ok(StepResult::CaseCitation(payload))
        }
        StepKind::RelevantFacts => {
            let sections = input.sections();
            let user = template.render(step, &[("text", input.text), ("sections", &sections)])?;
            let payload: RelevantFacts = call_structured(llm, model, system, user, step).await?;
            Ok(StepResult::RelevantFacts(payload))
        }
        StepKind::PilProvisions => {
            let sections = input.sections();
            let user = template.render(step, &[("text", input.text), ("sections", &sections)])?;
            let payload: PilProvisions = call_structured(llm, model, system, user, step).await?;
            Ok(StepResult::PilProvisions(payload))
        }
        StepKind::ColIssue => {
            let sections = input.sections();
            let selected = themes::filtered_table(&input.theme_list());
            let user = template.render(
                step,
                &[
                    ("text", input.text),
                    ("sections", &sections),
                    ("selected_themes_table", &selected),
                ],
            )?;
            let payload: ColIssue = call_structured(llm, model, system, user, step).await?;
            Ok(StepResult::ColIssue(payload))
        }
        StepKind::CourtsPosition => {
            let sections = input.sections();
            let themes_joined = input.themes_joined();
            let issue = input.issue();
            let user = template.render(
                step,
                &[
                    ("text", input.text),
                    ("sections", &sections),
                    ("themes", &themes_joined),
                    ("issue", &issue),
                ],
            )?;
            let payload: CourtsPosition = call_structured(llm, model, system, user, step).await?;
            Ok(StepResult::CourtsPosition(payload))
        }
        StepKind::ObiterDicta => {
            let sections = input.sections();
            let themes_joined = input.themes_joined();
            let issue = input.issue();
            let user = template.render(
                step,
                &[
                    ("text", input.text),
                    ("sections", &sections),
                    ("themes", &themes_joined),
                    ("issue", &issue),
                ],
            )?;
            let payload: ObiterDicta = call_structured(llm, model, system, user, step).await?;
            Ok(StepResult::ObiterDicta(payload))
        }
        StepKind::DissentingOpinions => {
            let sections = input.sections();
            let themes_joined = input.themes_joined();
            let issue = input.issue();
            let user = template.render(
                step,
                &[
                    ("text", input.text),
                    ("sections", &sections),
                    ("themes", &themes_joined),
                    ("issue", &issue),
                ],
            )?;
            let payload: DissentingOpinions =
                call_structured(llm, model, system, user, step).await?;
            Ok(StepResult::DissentingOpinions(payload))
        }
        StepKind::Abstract => {
            let themes_joined = input.themes_joined();
            let facts = input.facts();
            let provisions = input.provisions();
            let issue = input.issue();
            let position = input.position();
            let obiter = input.obiter();
            let dissent = input.dissent();
            let user = template.render(
                step,
                &[
                    ("text", input.text),
                    ("themes", &themes_joined),
                    ("facts", &facts),
                    ("provisions", &provisions),
                    ("issue", &issue),
                    ("position", &position),
                    ("obiter", &obiter),
                    ("dissent", &dissent),
                ],
            )?;
            let payload: CaseAbstract = call_structured(llm, model, system, user, step).await?;
            Ok(StepResult::Abstract(payload))
        }
    }
}
