//! Civil-law refinements. Codified conflict rules are the anchor here:
//! answers should cite articles of the governing statute or regulation and
//! treat earlier decisions as persuasive context only.

use cold_core::registry::{PromptRegistry, PromptScope, PromptTemplate};

const CITATION: &str = "\
State the citation of this decision as it is cited in {jurisdiction} (a\n\
{legal_system}). Prefer, in order: the official reporter citation, an ECLI, or the\n\
court name with date and docket number. Answer Unknown if the text carries no usable\n\
identifiers.\n\
\n\
Decision:\n\
{text}";

const PIL_PROVISIONS: &str = "\
List the codified private-international-law provisions this decision applies or\n\
interprets: articles of the national conflicts statute, EU regulations such as\n\
Rome I and Rome II, and international conventions. Cite each at the article level,\n\
the way the decision cites it, most important first. Include a court decision only\n\
where the court itself leans on it.\n\
Answer with an empty list if no provision is identified.\n\
\n\
Choice-of-law passages:\n\
{sections}\n\
\n\
Decision:\n\
{text}";

const COURTS_POSITION: &str = "\
State the court's answer to the choice-of-law issue below: which codified rule it\n\
applied, how it construed that rule, and the resulting applicable law. Track the\n\
court's own reading of the statute; earlier decisions matter only as the court\n\
invokes them.\n\
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
    registry.register(
        PromptScope::CivilLaw,
        None,
        "case_citation",
        PromptTemplate {
            text: CITATION,
            params: &["text", "legal_system", "jurisdiction"],
        },
    );
    registry.register(
        PromptScope::CivilLaw,
        None,
        "pil_provisions",
        PromptTemplate {
            text: PIL_PROVISIONS,
            params: &["text", "sections"],
        },
    );
    registry.register(
        PromptScope::CivilLaw,
        None,
        "courts_position",
        PromptTemplate {
            text: COURTS_POSITION,
            params: &["text", "sections", "themes", "issue"],
        },
    );
}
