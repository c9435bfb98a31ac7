//! Prompt template registry. Populated once at startup from the domains
//! crate, read-only afterwards; lookups are pure and safe to share across
//! concurrent runs.

use std::collections::HashMap;

use thiserror::Error;

use crate::types::LegalSystem;

/// Template scope. Jurisdiction-specific templates hang off a scope; the
/// lookup chain collapses everything else onto Generic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptScope {
    Generic,
    CivilLaw,
    CommonLaw,
}

impl PromptScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptScope::Generic => "generic",
            PromptScope::CivilLaw => "civil-law",
            PromptScope::CommonLaw => "common-law",
        }
    }

    pub fn from_legal_system(system: LegalSystem) -> Self {
        match system {
            LegalSystem::CivilLaw => PromptScope::CivilLaw,
            LegalSystem::CommonLaw => PromptScope::CommonLaw,
            LegalSystem::NoCourtDecision | LegalSystem::Unknown => PromptScope::Generic,
        }
    }
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("no prompt registered for step {step} (scope {scope}, jurisdiction {jurisdiction:?})")]
    NotFound {
        scope: &'static str,
        jurisdiction: Option<String>,
        step: String,
    },
    #[error("prompt for step {step} is missing parameter {param}")]
    MissingParameter {
        step: String,
        param: &'static str,
    },
}

/// A prompt with its declared parameter names. Rendering verifies every
/// declared parameter is supplied before any substitution happens, so a
/// wiring mistake surfaces before an LLM call is made.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub text: &'static str,
    pub params: &'static [&'static str],
}

impl PromptTemplate {
    pub fn render(&self, step: &str, params: &[(&str, &str)]) -> Result<String, PromptError> {
        for required in self.params {
            if !params.iter().any(|(name, _)| name == required) {
                return Err(PromptError::MissingParameter {
                    step: step.to_string(),
                    param: required,
                });
            }
        }
        let mut out = self.text.to_string();
        for (name, value) in params {
            out = out.replace(&format!("{{{name}}}"), value);
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RegistryKey {
    scope: PromptScope,
    jurisdiction: Option<String>,
    step: String,
}

#[derive(Default)]
pub struct PromptRegistry {
    templates: HashMap<RegistryKey, PromptTemplate>,
}

fn norm_jurisdiction(j: &str) -> Option<String> {
    let trimmed = j.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        scope: PromptScope,
        jurisdiction: Option<&str>,
        step: &str,
        template: PromptTemplate,
    ) {
        self.templates.insert(
            RegistryKey {
                scope,
                jurisdiction: jurisdiction.and_then(norm_jurisdiction),
                step: step.to_string(),
            },
            template,
        );
    }

    /// Lookup chain: (scope, jurisdiction, step) → (scope, *, step) →
    /// (Generic, *, step).
    pub fn resolve(
        &self,
        system: LegalSystem,
        jurisdiction: &str,
        step: &str,
    ) -> Result<&PromptTemplate, PromptError> {
        let scope = PromptScope::from_legal_system(system);
        if let Some(j) = norm_jurisdiction(jurisdiction) {
            let key = RegistryKey {
                scope,
                jurisdiction: Some(j),
                step: step.to_string(),
            };
            if let Some(t) = self.templates.get(&key) {
                return Ok(t);
            }
        }
        let key = RegistryKey {
            scope,
            jurisdiction: None,
            step: step.to_string(),
        };
        if let Some(t) = self.templates.get(&key) {
            return Ok(t);
        }
        let key = RegistryKey {
            scope: PromptScope::Generic,
            jurisdiction: None,
            step: step.to_string(),
        };
        self.templates.get(&key).ok_or_else(|| PromptError::NotFound {
            scope: scope.as_str(),
            jurisdiction: norm_jurisdiction(jurisdiction),
            step: step.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    // ── Introspection (tooling only, never mutating) ──────────────────────

    pub fn keys(&self) -> Vec<(PromptScope, Option<&str>, &str)> {
        let mut keys: Vec<_> = self
            .templates
            .keys()
            .map(|k| (k.scope, k.jurisdiction.as_deref(), k.step.as_str()))
            .collect();
        keys.sort_by(|a, b| (a.2, a.0.as_str(), a.1).cmp(&(b.2, b.0.as_str(), b.1)));
        keys
    }

    pub fn for_scope(&self, scope: PromptScope) -> Vec<&str> {
        let mut steps: Vec<_> = self
            .templates
            .keys()
            .filter(|k| k.scope == scope)
            .map(|k| k.step.as_str())
            .collect();
        steps.sort_unstable();
        steps.dedup();
        steps
    }

    pub fn for_jurisdiction(&self, jurisdiction: &str) -> Vec<&str> {
        let key = norm_jurisdiction(jurisdiction);
        let mut steps: Vec<_> = self
            .templates
            .keys()
            .filter(|k| k.jurisdiction == key && key.is_some())
            .map(|k| k.step.as_str())
            .collect();
        steps.sort_unstable();
        steps
    }

    pub fn for_step(&self, step: &str) -> Vec<(PromptScope, Option<&str>)> {
        let mut scopes: Vec<_> = self
            .templates
            .keys()
            .filter(|k| k.step == step)
            .map(|k| (k.scope, k.jurisdiction.as_deref()))
            .collect();
        scopes.sort_by_key(|(s, j)| (s.as_str(), j.map(str::to_string)));
        scopes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERIC: PromptTemplate = PromptTemplate {
        text: "generic {text}",
        params: &["text"],
    };
    const CIVIL: PromptTemplate = PromptTemplate {
        text: "civil {text}",
        params: &["text"],
    };
    const INDIA: PromptTemplate = PromptTemplate {
        text: "india {text}",
        params: &["text"],
    };

    fn registry() -> PromptRegistry {
        let mut r = PromptRegistry::new();
        r.register(PromptScope::Generic, None, "col_issue", GENERIC);
        r.register(PromptScope::CivilLaw, None, "col_issue", CIVIL);
        r.register(PromptScope::CommonLaw, Some("India"), "col_issue", INDIA);
        r
    }

    #[test]
    fn fallback_chain_prefers_most_specific() {
        let r = registry();
        let t = r.resolve(LegalSystem::CommonLaw, "india", "col_issue").unwrap();
        assert_eq!(t.text, "india {text}");
        let t = r.resolve(LegalSystem::CivilLaw, "France", "col_issue").unwrap();
        assert_eq!(t.text, "civil {text}");
        let t = r.resolve(LegalSystem::CommonLaw, "Kenya", "col_issue").unwrap();
        assert_eq!(t.text, "generic {text}");
        let t = r.resolve(LegalSystem::Unknown, "", "col_issue").unwrap();
        assert_eq!(t.text, "generic {text}");
    }

    #[test]
    fn missing_template_is_a_typed_error() {
        let r = registry();
        let err = r.resolve(LegalSystem::CivilLaw, "France", "abstract").unwrap_err();
        match err {
            PromptError::NotFound { step, .. } => assert_eq!(step, "abstract"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn render_substitutes_all_occurrences() {
        let t = PromptTemplate {
            text: "A: {x}, again: {x}, json stays: {\"k\": 1}",
            params: &["x"],
        };
        let out = t.render("demo", &[("x", "v")]).unwrap();
        assert_eq!(out, "A: v, again: v, json stays: {\"k\": 1}");
    }

    #[test]
    fn render_rejects_missing_declared_param() {
        let t = PromptTemplate {
            text: "{a} {b}",
            params: &["a", "b"],
        };
        let err = t.render("demo", &[("a", "1")]).unwrap_err();
        match err {
            PromptError::MissingParameter { step, param } => {
                assert_eq!(step, "demo");
                assert_eq!(param, "b");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn introspection_lists_registered_shapes() {
        let r = registry();
        assert_eq!(r.len(), 3);
        assert_eq!(r.for_scope(PromptScope::CivilLaw), vec!["col_issue"]);
        assert_eq!(r.for_jurisdiction("INDIA"), vec!["col_issue"]);
        assert_eq!(r.for_step("col_issue").len(), 3);
        assert!(r.for_jurisdiction("").is_empty());
    }
}
