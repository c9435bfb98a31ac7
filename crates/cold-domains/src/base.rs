//! Generic templates: the final fallback for every step, written to work
//! for any jurisdiction. Refined variants in the sibling modules override
//! these per legal system or per jurisdiction.

use cold_core::classify::CLASSIFY_STEP;
use cold_core::registry::{PromptRegistry, PromptScope, PromptTemplate};

const CLASSIFIER: &str = "\
Identify the jurisdiction this court decision comes from.\n\
\n\
Known jurisdictions:\n\
{jurisdictions}\n\
\n\
Decision text (may be truncated):\n\
{text}\n\
\n\
Answer with:\n\
1. legal_system_type: civil-law jurisdiction, common-law jurisdiction, or no court decision\n\
2. precise_jurisdiction: the deciding jurisdiction, preferably a name from the list, else Unknown\n\
3. iso3_code: the ISO 3166-1 alpha-3 code of that jurisdiction, or an empty string\n\
4. confidence (low, medium, or high) and a short reasoning grounded in the text";

const COL_EXTRACTION: &str = "\
Extract every passage of this decision that discusses which law governs the dispute:\n\
choice-of-law clauses, conflict-of-laws reasoning, the court's determination of the\n\
applicable law, and any discussion of party choice.\n\
Quote each passage verbatim, in document order. Return an empty list if the decision\n\
never discusses choice of law.\n\
\n\
Decision:\n\
{text}";

const THEME: &str = "\
Classify the choice-of-law discussion of this decision against the theme table.\n\
\n\
Theme table:\n\
{themes_table}\n\
\n\
Choice-of-law passages:\n\
{sections}\n\
\n\
Full decision for context:\n\
{text}\n\
\n\
Select every theme that the decision actually engages with, spelled exactly as in the\n\
table. Answer NA when none applies.";

const CITATION: &str = "\
State the citation of this decision as it would be cited in {jurisdiction}\n\
(a {legal_system}). Prefer the official reported citation; otherwise build the\n\
conventional case identifier from the court, date, and docket number in the text.\n\
Answer Unknown if the text carries no usable identifiers.\n\
\n\
Decision:\n\
{text}";

const RELEVANT_FACTS: &str = "\
Summarise the facts of this case that matter for the choice-of-law question: the\n\
parties and their locations, the transaction or events, any choice-of-law clause,\n\
and how the dispute reached this court.\n\
Write one connected paragraph. Do not discuss the legal analysis.\n\
\n\
Choice-of-law passages:\n\
{sections}\n\
\n\
Decision:\n\
{text}";

const PIL_PROVISIONS: &str = "\
List the private-international-law authorities this decision applies or interprets:\n\
statutory conflict rules, international conventions, and leading cases.\n\
One entry per authority, cited the way the decision cites it, most important first.\n\
Answer with an empty list if no such authority is identified.\n\
\n\
Choice-of-law passages:\n\
{sections}\n\
\n\
Decision:\n\
{text}";

const COL_ISSUE: &str = "\
Formulate the choice-of-law issue this decision resolves, as one question.\n\
The issue must concern the applicable law, not the merits of the dispute, and it\n\
should reflect the themes identified below.\n\
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
State the court's answer to the choice-of-law issue below: the rule it applied, how\n\
it reasoned, and the outcome on the applicable law. Stay with the court's own\n\
reasoning; do not add commentary.\n\
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

const OBITER_DICTA: &str = "\
Identify remarks in this decision about the choice-of-law issue that were not\n\
necessary for the holding: asides, hypotheticals, and observations on questions the\n\
court did not have to decide. Quote or closely paraphrase each remark.\n\
Answer None if the decision contains no such remarks.\n\
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

const DISSENTING_OPINIONS: &str = "\
Summarise any dissenting or separately concurring opinion in this decision insofar\n\
as it addresses the choice-of-law issue: who wrote it and where it departs from the\n\
majority. Answer None if the decision records no separate opinions.\n\
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

const ABSTRACT: &str = "\
Write an abstract of this decision for a choice-of-law case reporter, in at most\n\
200 words: the dispute in one sentence, the choice-of-law issue, the court's answer,\n\
and why the case matters for the themes listed.\n\
\n\
Themes: {themes}\n\
\n\
Facts:\n\
{facts}\n\
\n\
Provisions relied on:\n\
{provisions}\n\
\n\
Issue:\n\
{issue}\n\
\n\
Court's position:\n\
{position}\n\
\n\
Obiter dicta:\n\
{obiter}\n\
\n\
Dissenting opinions:\n\
{dissent}\n\
\n\
Decision:\n\
{text}";

pub(crate) fn register(registry: &mut PromptRegistry) {
    let generic = |registry: &mut PromptRegistry, step: &str, template: PromptTemplate| {
        registry.register(PromptScope::Generic, None, step, template);
    };

    generic(
        registry,
        CLASSIFY_STEP,
        PromptTemplate {
            text: CLASSIFIER,
            params: &["text", "jurisdictions"],
        },
    );
    generic(
        registry,
        "col_extraction",
        PromptTemplate {
            text: COL_EXTRACTION,
            params: &["text"],
        },
    );
    generic(
        registry,
        "theme_classification",
        PromptTemplate {
            text: THEME,
            params: &["text", "sections", "themes_table"],
        },
    );
    generic(
        registry,
        "case_citation",
        PromptTemplate {
            text: CITATION,
            params: &["text", "legal_system", "jurisdiction"],
        },
    );
    generic(
        registry,
        "relevant_facts",
        PromptTemplate {
            text: RELEVANT_FACTS,
            params: &["text", "sections"],
        },
    );
    generic(
        registry,
        "pil_provisions",
        PromptTemplate {
            text: PIL_PROVISIONS,
            params: &["text", "sections"],
        },
    );
    generic(
        registry,
        "col_issue",
        PromptTemplate {
            text: COL_ISSUE,
            params: &["text", "sections", "selected_themes_table"],
        },
    );
    generic(
        registry,
        "courts_position",
        PromptTemplate {
            text: COURTS_POSITION,
            params: &["text", "sections", "themes", "issue"],
        },
    );
    generic(
        registry,
        "obiter_dicta",
        PromptTemplate {
            text: OBITER_DICTA,
            params: &["text", "sections", "themes", "issue"],
        },
    );
    generic(
        registry,
        "dissenting_opinions",
        PromptTemplate {
            text: DISSENTING_OPINIONS,
            params: &["text", "sections", "themes", "issue"],
        },
    );
    generic(
        registry,
        "abstract",
        PromptTemplate {
            text: ABSTRACT,
            params: &[
                "text",
                "themes",
                "facts",
                "provisions",
                "issue",
                "position",
                "obiter",
                "dissent",
            ],
        },
    );
}
