//! The analysis orchestrator. Runs the step graph level by level, streams
//! events to the caller, and records completed steps through a sink. The
//! run itself never returns an error: everything that can go wrong is
//! either an event on the stream or a `RunOutcome`.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::llm::{LlmClient, ModelTable};
use crate::registry::PromptRegistry;
use crate::steps::{self, StepInput};
use crate::types::{AnalysisEvent, JurisdictionDecision, LegalSystem, StepKind, StepResult};

/// Event channel to the client. `emit` reports delivery: once the receiver
/// is gone the run treats itself as cancelled.
pub struct EventSink {
    tx: mpsc::UnboundedSender<AnalysisEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<AnalysisEvent>) -> Self {
        EventSink { tx }
    }

    fn emit(&self, event: AnalysisEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Receives completed step payloads for persistence. Failures are logged by
/// the pipeline and never abort a run.
#[async_trait]
pub trait StepSink: Send + Sync {
    async fn record_step(&self, kind: StepKind, payload: &Value) -> Result<()>;
}

/// Sink for runs without persistence.
pub struct NullSink;

#[async_trait]
impl StepSink for NullSink {
    async fn record_step(&self, _kind: StepKind, _payload: &Value) -> Result<()> {
        Ok(())
    }
}

/// How a run ended. `Failed` carries the fatal step and its message so the
/// caller can record them; `Cancelled` means the client went away and
/// nothing more should be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed { step: StepKind, error: String },
    Cancelled,
}

enum StepOutcome {
    Done,
    Failed(String),
    Cancelled,
}

pub struct CaseAnalyzer<'a> {
    pub llm: &'a dyn LlmClient,
    pub models: &'a ModelTable,
    pub registry: &'a PromptRegistry,
}

impl CaseAnalyzer<'_> {
    /// Drive one full analysis. `cached` holds previously persisted step
    /// results; cached steps are replayed as immediate completed events and
    /// their step functions never run.
    pub async fn run(
        &self,
        text: &str,
        decision: &JurisdictionDecision,
        cached: HashMap<StepKind, StepResult>,
        events: &EventSink,
        sink: &dyn StepSink,
    ) -> RunOutcome {
        let common_law = decision.legal_system == LegalSystem::CommonLaw
            || decision.precise_jurisdiction.eq_ignore_ascii_case("india");
        info!(
            jurisdiction = %decision.precise_jurisdiction,
            legal_system = %decision.legal_system,
            common_law_branch = common_law,
            cached_steps = cached.len(),
            "analysis run starting"
        );

        let mut results = cached;

        // col_extraction feeds everything else.
        let outcome = {
            let input = self.input(text, decision, &results);
            self.exec_step(StepKind::ColExtraction, &input, events, sink).await
        };
        match self.absorb(&mut results, vec![(StepKind::ColExtraction, outcome)]) {
            Absorbed::Continue => {}
            Absorbed::Stop(run) => return run,
        }

        // Fan-out over the extraction output.
        let group = {
            let input = self.input(text, decision, &results);
            let (a, b, c, d) = tokio::join!(
                self.exec_step(StepKind::ThemeClassification, &input, events, sink),
                self.exec_step(StepKind::CaseCitation, &input, events, sink),
                self.exec_step(StepKind::RelevantFacts, &input, events, sink),
                self.exec_step(StepKind::PilProvisions, &input, events, sink),
            );
            vec![
                (StepKind::ThemeClassification, a),
                (StepKind::CaseCitation, b),
                (StepKind::RelevantFacts, c),
                (StepKind::PilProvisions, d),
            ]
        };
        match self.absorb(&mut results, group) {
            Absorbed::Continue => {}
            Absorbed::Stop(run) => return run,
        }

        let outcome = {
            let input = self.input(text, decision, &results);
            self.exec_step(StepKind::ColIssue, &input, events, sink).await
        };
        match self.absorb(&mut results, vec![(StepKind::ColIssue, outcome)]) {
            Absorbed::Continue => {}
            Absorbed::Stop(run) => return run,
        }

        // The court's position, with the common-law extras when the branch
        // is active. Skipped steps never appear on the stream.
        let group = {
            let input = self.input(text, decision, &results);
            if common_law {
                let (p, o, d) = tokio::join!(
                    self.exec_step(StepKind::CourtsPosition, &input, events, sink),
                    self.exec_step(StepKind::ObiterDicta, &input, events, sink),
                    self.exec_step(StepKind::DissentingOpinions, &input, events, sink),
                );
                vec![
                    (StepKind::CourtsPosition, p),
                    (StepKind::ObiterDicta, o),
                    (StepKind::DissentingOpinions, d),
                ]
            } else {
                let p = self.exec_step(StepKind::CourtsPosition, &input, events, sink).await;
                vec![(StepKind::CourtsPosition, p)]
            }
        };
        match self.absorb(&mut results, group) {
            Absorbed::Continue => {}
            Absorbed::Stop(run) => return run,
        }

        let outcome = {
            let input = self.input(text, decision, &results);
            self.exec_step(StepKind::Abstract, &input, events, sink).await
        };
        match self.absorb(&mut results, vec![(StepKind::Abstract, outcome)]) {
            Absorbed::Continue => {}
            Absorbed::Stop(run) => return run,
        }

        // Terminal frame. A failed send here means the client missed the
        // finale, not that the analysis failed.
        events.emit(AnalysisEvent::analysis_complete());
        info!("analysis run completed");
        RunOutcome::Completed
    }

    fn input<'i>(
        &self,
        text: &'i str,
        decision: &'i JurisdictionDecision,
        results: &'i HashMap<StepKind, StepResult>,
    ) -> StepInput<'i> {
        StepInput {
            text,
            decision,
            results,
        }
    }

    /// Run one step: replay it from cache, or emit in_progress, invoke, and
    /// emit the result. Persists fresh completions through the sink.
    async fn exec_step(
        &self,
        kind: StepKind,
        input: &StepInput<'_>,
        events: &EventSink,
        sink: &dyn StepSink,
    ) -> (Option<StepResult>, StepOutcome) {
        if let Some(cached) = input.results.get(&kind) {
            debug!(step = %kind, "replaying cached step");
            let delivered = events.emit(AnalysisEvent::completed(kind, cached.to_value()));
            let outcome = if delivered {
                StepOutcome::Done
            } else {
                StepOutcome::Cancelled
            };
            return (None, outcome);
        }

        if !events.emit(AnalysisEvent::in_progress(kind)) {
            return (None, StepOutcome::Cancelled);
        }
        match steps::run(kind, self.llm, self.models, self.registry, input).await {
            Ok(result) => {
                let payload = result.to_value();
                if !events.emit(AnalysisEvent::completed(kind, payload.clone())) {
                    return (Some(result), StepOutcome::Cancelled);
                }
                if let Err(e) = sink.record_step(kind, &payload).await {
                    warn!(step = %kind, error = %e, "failed to persist step result");
                }
                (Some(result), StepOutcome::Done)
            }
            Err(e) => {
                let message = e.to_string();
                if !events.emit(AnalysisEvent::step_error(kind.as_str(), &message)) {
                    return (None, StepOutcome::Cancelled);
                }
                warn!(step = %kind, error = %message, "step failed");
                (None, StepOutcome::Failed(message))
            }
        }
    }

    /// Fold a group of step outcomes into the result map and decide whether
    /// the run goes on. Cancellation wins over failure; among failures the
    /// first fatal one in declaration order ends the run.
    fn absorb(
        &self,
        results: &mut HashMap<StepKind, StepResult>,
        group: Vec<(StepKind, (Option<StepResult>, StepOutcome))>,
    ) -> Absorbed {
        let mut fatal: Option<(StepKind, String)> = None;
        let mut cancelled = false;
        for (kind, (result, outcome)) in group {
            if let Some(r) = result {
                results.insert(kind, r);
            }
            match outcome {
                StepOutcome::Done => {}
                StepOutcome::Cancelled => cancelled = true,
                StepOutcome::Failed(message) => {
                    if kind.fatal() && fatal.is_none() {
                        fatal = Some((kind, message));
                    }
                }
            }
        }
        if cancelled {
            info!("analysis run cancelled by client");
            return Absorbed::Stop(RunOutcome::Cancelled);
        }
        if let Some((step, error)) = fatal {
            return Absorbed::Stop(RunOutcome::Failed { step, error });
        }
        Absorbed::Continue
    }
}

enum Absorbed {
    Continue,
    Stop(RunOutcome),
}
