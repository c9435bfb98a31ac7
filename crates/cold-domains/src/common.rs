//! Common-law refinements. Precedent does the work in these systems, so the
//! prompts press for the ratio of the decision, how earlier cases are
//! followed or distinguished, and who joined which opinion.

use cold_core::registry::{PromptRegistry, PromptScope, PromptTemplate};

const PIL_PROVISIONS: &str = "\
List the choice-of-law authorities this decision applies or interprets: leading\n\
precedents, statutory conflict rules, and any restatement or convention the court\n\
relies on. Cite each the way the decision cites it, most important first, and mark\n\
a precedent the court declines to follow as distinguished.\n\
Answer with an empty list if no such authority is identified.\n\
\n\
Choice-of-law passages:\n\
{sections}\n\
\n\
Decision:\n\
{text}";

const COURTS_POSITION: &str = "\
State the ratio decidendi of this decision on the choice-of-law issue below: the\n\
rule the court applied, the precedents it followed or distinguished on the way, and\n\
the resulting applicable law. Confine yourself to reasoning that was necessary for\n\
the holding.\n\
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
Separate the obiter dicta of this decision from its ratio on the choice-of-law\n\
issue below. Report only remarks that were unnecessary for the holding: views on\n\
hypothetical facts, commentary on precedents not applied, and observations on\n\
questions left open. Quote or closely paraphrase each remark.\n\
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
Report every dissenting or separately concurring opinion in this decision insofar\n\
as it addresses the choice-of-law issue below. For each: the judge who wrote it,\n\
whether it dissents or concurs, and where its choice-of-law reasoning departs from\n\
the majority.\n\
Answer None if the decision records no separate opinions.\n\
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
        PromptScope::CommonLaw,
        None,
        "pil_provisions",
        PromptTemplate {
            text: PIL_PROVISIONS,
            params: &["text", "sections"],
        },
    );
    registry.register(
        PromptScope::CommonLaw,
        None,
        "courts_position",
        PromptTemplate {
            text: COURTS_POSITION,
            params: &["text", "sections", "themes", "issue"],
        },
    );
    registry.register(
        PromptScope::CommonLaw,
        None,
        "obiter_dicta",
        PromptTemplate {
            text: OBITER_DICTA,
            params: &["text", "sections", "themes", "issue"],
        },
    );
    registry.register(
        PromptScope::CommonLaw,
        None,
        "dissenting_opinions",
        PromptTemplate {
            text: DISSENTING_OPINIONS,
            params: &["text", "sections", "themes", "issue"],
        },
    );
}
