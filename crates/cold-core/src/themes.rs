//! Closed choice-of-law theme vocabulary. Twelve tags plus the `NA`
//! fallback; read-only static data, shared by the theme classifier and the
//! prompt builders.

pub struct ThemeDef {
    pub name: &'static str,
    pub definition: &'static str,
}

pub const NA: &str = "NA";

pub const THEMES: [ThemeDef; 12] = [
    ThemeDef {
        name: "Party autonomy",
        definition: "The parties' freedom to choose the law governing their legal relationship.",
    },
    ThemeDef {
        name: "Tacit choice",
        definition: "A choice of law inferred from the contract terms or the circumstances of the case rather than stated expressly.",
    },
    ThemeDef {
        name: "Partial choice",
        definition: "A choice of law covering only part of the contract or relationship, the remainder being governed by other law.",
    },
    ThemeDef {
        name: "Absence of choice",
        definition: "Determination of the applicable law where the parties made no valid choice.",
    },
    ThemeDef {
        name: "Arbitration",
        definition: "Choice-of-law questions arising in or about arbitral proceedings, arbitration agreements, or awards.",
    },
    ThemeDef {
        name: "Freedom of Choice",
        definition: "The extent to which the forum admits a choice of law at all, and the outer limits it imposes on that freedom.",
    },
    ThemeDef {
        name: "Rules of Law",
        definition: "Designation of non-state rules, such as the UNIDROIT Principles or lex mercatoria, as the governing law.",
    },
    ThemeDef {
        name: "Dépeçage",
        definition: "Application of different laws to different parts of the same contract or relationship.",
    },
    ThemeDef {
        name: "Public policy",
        definition: "Refusal to apply the otherwise applicable law because the result would offend the forum's ordre public.",
    },
    ThemeDef {
        name: "Mandatory rules",
        definition: "Overriding provisions that claim application irrespective of the chosen or otherwise applicable law.",
    },
    ThemeDef {
        name: "Consumer contracts",
        definition: "Limits on choice of law protecting consumers as structurally weaker parties.",
    },
    ThemeDef {
        name: "Employment contracts",
        definition: "Limits on choice of law protecting employees as structurally weaker parties.",
    },
];

/// Canonical spelling for a model-produced label, or None when the label is
/// outside the vocabulary.
pub fn canonical(name: &str) -> Option<&'static str> {
    let trimmed = name.trim();
    if trimmed.eq_ignore_ascii_case(NA) {
        return Some(NA);
    }
    THEMES
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(trimmed))
        .map(|t| t.name)
}

/// The full name/definition table embedded in the theme-classification
/// prompt.
pub fn definitions_table() -> String {
    let mut out = String::new();
    for theme in &THEMES {
        out.push_str("- ");
        out.push_str(theme.name);
        out.push_str(": ");
        out.push_str(theme.definition);
        out.push('\n');
    }
    out.push_str("- NA: none of the themes above applies to this decision.\n");
    out
}

/// Definition rows for the selected themes only, used by col_issue. Falls
/// back to the NA row when nothing from the vocabulary was selected.
pub fn filtered_table(selected: &[String]) -> String {
    let mut out = String::new();
    for theme in &THEMES {
        if selected.iter().any(|s| s.eq_ignore_ascii_case(theme.name)) {
            out.push_str("- ");
            out.push_str(theme.name);
            out.push_str(": ");
            out.push_str(theme.definition);
            out.push('\n');
        }
    }
    if out.is_empty() {
        out.push_str("- NA: none of the themes above applies to this decision.\n");
    }
    out
}
