use cold_core::db::Db;
use cold_core::{
    Confidence, JurisdictionDecision, LegalSystem, ModerationStatus, StepKind, StepResult,
};
use serde_json::json;

fn open_db() -> (tempfile::TempDir, Db) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cold-test.db");
    let mut db = Db::open(path.to_str().unwrap()).unwrap();
    db.migrate().unwrap();
    (dir, db)
}

fn sample_draft(db: &Db) -> i64 {
    db.create_draft(
        "alice@example.org",
        "bge_132_iii_285.txt",
        "The Federal Supreme Court considers the choice of law clause valid.",
        Some("gpt-4o"),
    )
    .unwrap()
}

#[test]
fn create_and_fetch_draft() {
    let (_dir, db) = open_db();
    let id = sample_draft(&db);
    let draft = db.get_draft(id).unwrap().unwrap();
    assert_eq!(draft.id, id);
    assert_eq!(draft.user_email, "alice@example.org");
    assert_eq!(draft.file_name, "bge_132_iii_285.txt");
    assert_eq!(draft.model.as_deref(), Some("gpt-4o"));
    assert_eq!(draft.moderation_status, ModerationStatus::Draft);
    assert!(draft.analyzer.is_none());
    assert!(draft.submitted_data.is_none());

    assert!(db.get_draft(id + 1).unwrap().is_none());
}

#[test]
fn migrate_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cold-test.db");
    let mut db = Db::open(path.to_str().unwrap()).unwrap();
    db.migrate().unwrap();
    db.migrate().unwrap();
    let id = sample_draft(&db);
    assert!(db.get_draft(id).unwrap().is_some());
}

#[test]
fn jurisdiction_round_trips_through_analyzer_json() {
    let (_dir, db) = open_db();
    let id = sample_draft(&db);
    let decision = JurisdictionDecision {
        precise_jurisdiction: "Switzerland".into(),
        iso3_code: Some("CHE".into()),
        legal_system: LegalSystem::CivilLaw,
        confidence: Confidence::High,
        reasoning: "The heading names the Bundesgericht.".into(),
        user_confirmed: true,
    };
    db.update_jurisdiction(id, &decision).unwrap();
    let draft = db.get_draft(id).unwrap().unwrap();
    assert_eq!(draft.stored_jurisdiction(), Some(decision));
}

#[test]
fn record_step_merges_and_mirrors_citation() {
    let (_dir, db) = open_db();
    let id = sample_draft(&db);

    let sections = json!({
        "col_sections": ["Art. 116 PILA applies."],
        "confidence": "high",
        "reasoning": "Verbatim quote."
    });
    db.record_step(id, StepKind::ColExtraction, &sections).unwrap();

    let citation = json!({
        "citation": "BGE 132 III 285",
        "confidence": "medium",
        "reasoning": "Reported citation in the header."
    });
    db.record_step(id, StepKind::CaseCitation, &citation).unwrap();

    let draft = db.get_draft(id).unwrap().unwrap();
    assert_eq!(draft.case_citation.as_deref(), Some("BGE 132 III 285"));
    let analyzer = draft.analyzer.as_ref().unwrap();
    assert!(analyzer.get("col_extraction").is_some());
    assert!(analyzer.get("case_citation").is_some());

    let results = db.get_step_results(id).unwrap();
    assert_eq!(results.len(), 2);
    match results.get(&StepKind::ColExtraction) {
        Some(StepResult::ColExtraction(p)) => {
            assert_eq!(p.col_sections, vec!["Art. 116 PILA applies."]);
            assert_eq!(p.confidence, Confidence::High);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn record_error_round_trips() {
    let (_dir, db) = open_db();
    let id = sample_draft(&db);
    db.record_error(id, "col_issue", "llm call failed: boom").unwrap();
    let draft = db.get_draft(id).unwrap().unwrap();
    assert_eq!(
        draft.stored_error(),
        Some(("col_issue".to_string(), "llm call failed: boom".to_string()))
    );
}

#[test]
fn moderation_status_updates_column_and_mirror() {
    let (_dir, db) = open_db();
    let id = sample_draft(&db);
    db.set_moderation_status(id, ModerationStatus::Pending).unwrap();
    let draft = db.get_draft(id).unwrap().unwrap();
    assert_eq!(draft.moderation_status, ModerationStatus::Pending);
    let mirror = draft
        .analyzer
        .as_ref()
        .and_then(|a| a.get("moderation_status"))
        .and_then(|v| v.as_str());
    assert_eq!(mirror, Some("pending"));
}

#[test]
fn submitted_data_is_stored_separately() {
    let (_dir, db) = open_db();
    let id = sample_draft(&db);
    let sections = json!({
        "col_sections": ["Art. 116 PILA applies."],
        "confidence": "high",
        "reasoning": "Verbatim quote."
    });
    db.record_step(id, StepKind::ColExtraction, &sections).unwrap();

    let edited = json!({ "abstract": "User-polished abstract." });
    db.set_submitted_data(id, &edited).unwrap();

    let draft = db.get_draft(id).unwrap().unwrap();
    assert_eq!(draft.submitted_data, Some(edited));
    // the analyzer output is untouched by submission edits
    let analyzer = draft.analyzer.as_ref().unwrap();
    assert!(analyzer.get("col_extraction").is_some());
    assert!(analyzer.get("abstract").is_none());
}

#[test]
fn legacy_blob_rows_resume_without_analyzer_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cold-test.db");
    let mut db = Db::open(path.to_str().unwrap()).unwrap();
    db.migrate().unwrap();
    let id = sample_draft(&db);

    // Rows written by the previous generation of the analyzer carry their
    // results inside the data column; seed one directly.
    let legacy = json!({
        "analysis": {
            "relevant_facts": {
                "relevant_facts": "A Swiss buyer and an Italian seller.",
                "confidence": "medium",
                "reasoning": "Stated in the facts section."
            }
        }
    });
    let conn = rusqlite::Connection::open(path.to_str().unwrap()).unwrap();
    conn.execute(
        "UPDATE case_analyzer_drafts SET data = ?1 WHERE id = ?2",
        rusqlite::params![legacy.to_string(), id],
    )
    .unwrap();
    drop(conn);

    let results = db.get_step_results(id).unwrap();
    assert_eq!(results.len(), 1);
    match results.get(&StepKind::RelevantFacts) {
        Some(StepResult::RelevantFacts(p)) => {
            assert_eq!(p.relevant_facts, "A Swiss buyer and an Italian seller.");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    // A fresh step write lands in the analyzer column and takes precedence.
    let sections = json!({
        "col_sections": [],
        "confidence": "low",
        "reasoning": "No choice-of-law discussion."
    });
    db.record_step(id, StepKind::ColExtraction, &sections).unwrap();
    let results = db.get_step_results(id).unwrap();
    assert_eq!(results.len(), 1);
    assert!(results.contains_key(&StepKind::ColExtraction));
}

#[test]
fn writes_against_missing_drafts_fail() {
    let (_dir, db) = open_db();
    let err = db.record_error(999, "abstract", "boom").unwrap_err();
    assert!(err.to_string().contains("not found"));
    assert!(db.get_step_results(999).is_err());
}

#[test]
fn set_model_overwrites() {
    let (_dir, db) = open_db();
    let id = sample_draft(&db);
    db.set_model(id, "o4-mini").unwrap();
    let draft = db.get_draft(id).unwrap().unwrap();
    assert_eq!(draft.model.as_deref(), Some("o4-mini"));
}
