//! India overrides. Indian private international law is uncodified common
//! law applied by courts of a mixed heritage, and users correct the
//! classifier to civil law often enough that the overrides are registered
//! under both scopes.

use cold_core::registry::{PromptRegistry, PromptScope, PromptTemplate};

const COL_ISSUE: &str = "\
Formulate the choice-of-law issue this Indian decision resolves, as one question.\n\
Frame it in the terms Indian courts use: the proper law of the contract, the\n\
closest and most real connection, or the presumed intention of the parties.\n\
The issue must concern the applicable law, not the merits, and should reflect the\n\
themes below.\n\
\n\
Selected themes:\n\
{selected_themes_table}\n\
\n\
Choice-of-law passages:\n\
{sections}\n\
\n\
Decision:\n\
{text}";

const COURTS_POSITION: &str = "\
State this Indian court's answer to the choice-of-law issue below: the proper-law\n\
rule it applied, the Supreme Court and High Court precedents it followed or\n\
distinguished, and the resulting applicable law. Note where the court draws on\n\
English authorities, as Indian conflicts cases regularly do.\n\
\n\
Issue:\n\
{issue}\n\
\n\
Themes: {themes}\n\
\n\
Choice-of-law passages:\n\
{sections}\n\
\n\
Decision:\n\
{text}";

pub(crate) fn register(registry: &mut PromptRegistry) {
    // Registered under both scopes: the branch logic treats India as
    // common law even when the stored legal system says civil law.
    for scope in [PromptScope::CommonLaw, PromptScope::CivilLaw] {
        registry.register(
            scope,
            Some("India"),
            "col_issue",
            PromptTemplate {
                text: COL_ISSUE,
                params: &["text", "sections", "selected_themes_table"],
            },
        );
        registry.register(
            scope,
            Some("India"),
            "courts_position",
            PromptTemplate {
                text: COURTS_POSITION,
                params: &["text", "sections", "themes", "issue"],
            },
        );
    }
}
