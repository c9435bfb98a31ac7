use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use cold_core::{
    classify::{classify_jurisdiction, CLASSIFY_STEP},
    db::Db,
    pipeline::{CaseAnalyzer, EventSink, RunOutcome, StepSink},
    types::{Draft, JurisdictionDecision, ModerationStatus, StepKind},
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

use crate::auth::verify_bearer;
use crate::extract::{TextExtractor, Utf8Extractor};
use crate::AppState;

// ── Error helper ──────────────────────────────────────────────────────────

pub(crate) fn internal(e: impl std::fmt::Display) -> StatusCode {
    tracing::error!("internal error: {e}");
    StatusCode::INTERNAL_SERVER_ERROR
}

// ── Request body types ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(crate) struct UploadBody {
    pub file_name: String,
    pub blob_url: String,
}

#[derive(Deserialize)]
pub(crate) struct AnalyzeBody {
    pub draft_id: i64,
    pub jurisdiction: JurisdictionDecision,
    #[serde(default)]
    pub resume: bool,
}

#[derive(Deserialize)]
pub(crate) struct SubmitBody {
    pub draft_id: i64,
    pub submitted_data: Value,
}

// ── Persistence sink for one run ──────────────────────────────────────────

struct DbSink {
    db: Arc<Db>,
    draft_id: i64,
}

#[async_trait]
impl StepSink for DbSink {
    async fn record_step(&self, kind: StepKind, payload: &Value) -> anyhow::Result<()> {
        self.db.record_step(self.draft_id, kind, payload)
    }
}

// ── Ownership guard ───────────────────────────────────────────────────────

/// Load a draft for its owner. 404 unknown id, 403 wrong owner, 400 once
/// the draft is frozen by submission.
fn owned_draft(state: &AppState, id: i64, owner: &str) -> Result<Draft, StatusCode> {
    let draft = state
        .db
        .get_draft(id)
        .map_err(internal)?
        .ok_or(StatusCode::NOT_FOUND)?;
    if draft.user_email != owner {
        return Err(StatusCode::FORBIDDEN);
    }
    if draft.moderation_status.is_frozen() {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(draft)
}

// ── Handlers ──────────────────────────────────────────────────────────────

pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Fetch the uploaded blob, extract its text, classify the jurisdiction,
/// and open a draft.
pub(crate) async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<UploadBody>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let owner = verify_bearer(&headers, &state.config.jwt_secret)?;

    let resp = state.http.get(&body.blob_url).send().await.map_err(|e| {
        tracing::warn!(url = %body.blob_url, error = %e, "blob fetch failed");
        StatusCode::BAD_GATEWAY
    })?;
    if !resp.status().is_success() {
        tracing::warn!(url = %body.blob_url, status = %resp.status(), "blob fetch failed");
        return Err(StatusCode::BAD_GATEWAY);
    }
    if let Some(len) = resp.content_length() {
        if len > state.config.max_upload_bytes {
            return Err(StatusCode::PAYLOAD_TOO_LARGE);
        }
    }
    let bytes = resp.bytes().await.map_err(internal)?;
    if bytes.len() as u64 > state.config.max_upload_bytes {
        return Err(StatusCode::PAYLOAD_TOO_LARGE);
    }

    let text = Utf8Extractor.extract(&bytes).map_err(|e| {
        tracing::warn!(file = %body.file_name, error = %e, "text extraction failed");
        StatusCode::UNPROCESSABLE_ENTITY
    })?;

    let decision = classify_jurisdiction(
        state.llm.as_ref(),
        state.models.model_for(CLASSIFY_STEP),
        state.registry.as_ref(),
        &text,
        None,
    )
    .await;

    let draft_id = state
        .db
        .create_draft(&owner, &body.file_name, &text, None)
        .map_err(internal)?;
    state
        .db
        .update_jurisdiction(draft_id, &decision)
        .map_err(internal)?;
    tracing::info!(draft_id, owner = %owner, jurisdiction = %decision.precise_jurisdiction, "draft created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "draft_id": draft_id,
            "extracted_text": text,
            "jurisdiction": decision,
        })),
    ))
}

/// Run (or resume) the analysis and stream its events. The run itself is
/// spawned; dropping the response stream cancels it cooperatively and the
/// draft keeps whatever was already persisted.
pub(crate) async fn analyze(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<AnalyzeBody>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let owner = verify_bearer(&headers, &state.config.jwt_secret)?;
    let draft = owned_draft(&state, body.draft_id, &owner)?;

    let mut decision = body.jurisdiction;
    decision.user_confirmed = true;
    state
        .db
        .update_jurisdiction(draft.id, &decision)
        .map_err(internal)?;
    state
        .db
        .set_moderation_status(draft.id, ModerationStatus::Analyzing)
        .map_err(internal)?;
    state
        .db
        .set_model(draft.id, &state.config.default_model)
        .map_err(internal)?;

    let cached = if body.resume {
        state.db.get_step_results(draft.id).map_err(internal)?
    } else {
        HashMap::new()
    };
    tracing::info!(draft_id = draft.id, resume = body.resume, cached = cached.len(), "analysis requested");

    let (tx, rx) = mpsc::unbounded_channel();
    let events = EventSink::new(tx);
    let run_state = Arc::clone(&state);
    let draft_id = draft.id;
    let text = draft.text;
    tokio::spawn(async move {
        let analyzer = CaseAnalyzer {
            llm: run_state.llm.as_ref(),
            models: &run_state.models,
            registry: run_state.registry.as_ref(),
        };
        let sink = DbSink {
            db: Arc::clone(&run_state.db),
            draft_id,
        };
        let outcome = analyzer.run(&text, &decision, cached, &events, &sink).await;
        match outcome {
            RunOutcome::Completed => {
                if let Err(e) = run_state
                    .db
                    .set_moderation_status(draft_id, ModerationStatus::Completed)
                {
                    tracing::error!(draft_id, error = %e, "failed to mark draft completed");
                }
            }
            RunOutcome::Failed { step, error } => {
                if let Err(e) = run_state.db.record_error(draft_id, step.as_str(), &error) {
                    tracing::error!(draft_id, error = %e, "failed to record run error");
                }
                if let Err(e) = run_state
                    .db
                    .set_moderation_status(draft_id, ModerationStatus::Failed)
                {
                    tracing::error!(draft_id, error = %e, "failed to mark draft failed");
                }
            }
            RunOutcome::Cancelled => {
                tracing::info!(draft_id, "analysis cancelled by client");
            }
        }
    });

    let stream = UnboundedReceiverStream::new(rx).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(Event::default().data(data))
    });
    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    ))
}

/// Freeze the draft with the user-edited payload and hand it to moderation.
pub(crate) async fn submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SubmitBody>,
) -> Result<Json<Value>, StatusCode> {
    let owner = verify_bearer(&headers, &state.config.jwt_secret)?;
    let draft = owned_draft(&state, body.draft_id, &owner)?;

    state
        .db
        .set_submitted_data(draft.id, &body.submitted_data)
        .map_err(internal)?;
    state
        .db
        .set_moderation_status(draft.id, ModerationStatus::Pending)
        .map_err(internal)?;
    tracing::info!(draft_id = draft.id, owner = %owner, "draft submitted for moderation");

    Ok(Json(json!({
        "draft_id": draft.id,
        "status": "pending",
        "message": "Draft submitted for moderation.",
    })))
}

/// Recovery snapshot for the owner: jurisdiction, per-step results, and
/// the recorded error of a failed run.
pub(crate) async fn get_draft(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    let owner = verify_bearer(&headers, &state.config.jwt_secret)?;
    let draft = owned_draft(&state, id, &owner)?;

    let steps: Map<String, Value> = draft
        .step_results()
        .iter()
        .map(|(kind, result)| (kind.as_str().to_string(), result.to_value()))
        .collect();
    let error = draft
        .stored_error()
        .map(|(step, message)| json!({ "step": step, "message": message }));

    Ok(Json(json!({
        "draft_id": draft.id,
        "file_name": draft.file_name,
        "status": draft.moderation_status.as_str(),
        "jurisdiction": draft.stored_jurisdiction(),
        "steps": steps,
        "error": error,
        "text": draft.text,
    })))
}
