//! Formatting helpers for prompt sections (§4.F): every section is wrapped
//! in machine-inspectable delimiters so tests can assert on structure
//! without re-parsing the model's own prose.

/// Format a named section with raw/injected char counts and truncation flags.
pub fn format_section(name: &str, content: &str, raw_chars: usize, truncated: bool) -> String {
    let injected_chars = content.len();
    format!(
        "\
=== SECTION: {name} ===
RAW_CHARS: {raw_chars}
INJECTED_CHARS: {injected_chars}
TRUNCATED: {truncated}
--- BEGIN ---
{content}
--- END ---
"
    )
}

/// Format a section that is never truncated (persona, datetime, tool
/// results, fact-grounding directives — §4.F's protected categories).
pub fn format_protected_section(name: &str, content: &str) -> String {
    format!(
        "\
=== SECTION: {name} ===
--- BEGIN ---
{content}
--- END ---
"
    )
}
