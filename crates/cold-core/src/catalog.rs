//! Bundled jurisdiction catalog. Canonical names, ISO 3166-1 alpha-3 codes,
//! legal-system family, and (for prominent jurisdictions) a short summary
//! used as system-prompt context. Read-only after first access.

use std::sync::OnceLock;

use serde::Deserialize;

use crate::types::LegalSystem;

const CATALOG_JSON: &str = include_str!("../data/jurisdictions.json");

#[derive(Debug, Clone, Deserialize)]
pub struct JurisdictionEntry {
    pub name: String,
    pub iso3: String,
    pub legal_system: LegalSystem,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

pub struct Catalog {
    entries: Vec<JurisdictionEntry>,
}

static CATALOG: OnceLock<Catalog> = OnceLock::new();

pub fn catalog() -> &'static Catalog {
    CATALOG.get_or_init(|| Catalog {
        entries: match serde_json::from_str(CATALOG_JSON) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(error = %e, "bundled jurisdiction catalog failed to parse");
                Vec::new()
            }
        },
    })
}

/// Case- and punctuation-insensitive key: lowercase alphanumerics only.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

impl Catalog {
    /// Exact canonical-name match first, then aliases. Matching ignores
    /// case and punctuation ("U.S.A." finds "United States").
    pub fn lookup(&self, name: &str) -> Option<&JurisdictionEntry> {
        let key = normalize(name);
        if key.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| normalize(&e.name) == key)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.aliases.iter().any(|a| normalize(a) == key))
            })
    }

    /// Lookup tolerating partial names: exact/alias match first, then a
    /// substring match in either direction on normalized names.
    pub fn lookup_fuzzy(&self, name: &str) -> Option<&JurisdictionEntry> {
        if let Some(entry) = self.lookup(name) {
            return Some(entry);
        }
        let key = normalize(name);
        if key.len() < 4 {
            return None;
        }
        self.entries.iter().find(|e| {
            let canonical = normalize(&e.name);
            canonical.contains(&key) || key.contains(&canonical)
        })
    }

    pub fn by_iso3(&self, code: &str) -> Option<&JurisdictionEntry> {
        self.entries
            .iter()
            .find(|e| e.iso3.eq_ignore_ascii_case(code.trim()))
    }

    pub fn all(&self) -> &[JurisdictionEntry] {
        &self.entries
    }

    /// Comma-separated canonical names, embedded in the classifier prompt.
    pub fn name_list(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn summary_for(&self, name: &str) -> Option<&str> {
        self.lookup(name).and_then(|e| e.summary.as_deref())
    }
}
