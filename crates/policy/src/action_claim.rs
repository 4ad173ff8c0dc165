use std::sync::OnceLock;

use regex::Regex;

/// Phrases asserting a completed action, in Turkish and English. Matched
/// case-insensitively against the draft reply (§4.B, §4.H).
const CLAIM_PATTERNS_TR: &[&str] = &[
    r"g[öo]nderildi", r"kaydedildi", r"i[şs]lendi", r"tamamland[ıi]", r"olu[şs]turuldu",
];
const CLAIM_PATTERNS_EN: &[&str] = &[
    r"\bsent\b", r"\bsaved\b", r"\bprocessed\b", r"\bcompleted\b", r"\bcreated\b",
];

fn claim_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let joined = CLAIM_PATTERNS_TR
            .iter()
            .chain(CLAIM_PATTERNS_EN.iter())
            .cloned()
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!("(?i)({joined})")).expect("static action-claim pattern compiles")
    })
}

/// True when `text` asserts a completed action.
pub fn contains_action_claim(text: &str) -> bool {
    claim_regex().is_match(text)
}

/// Rewrites completed-action claims to a tentative form when no tool
/// succeeded in this turn (§4.B). Only called when the guardrail has
/// already determined no tool result backs the claim.
pub fn rewrite_action_claims(text: &str, is_turkish: bool) -> String {
    let replacement = if is_turkish { "işleme alınabilir" } else { "can be processed" };
    claim_regex().replace_all(text, replacement).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_claims_in_both_languages() {
        assert!(contains_action_claim("Talebiniz kaydedildi."));
        assert!(contains_action_claim("Your request was sent."));
        assert!(!contains_action_claim("Merhaba, nasıl yardımcı olabilirim?"));
    }

    #[test]
    fn rewrite_replaces_claim_with_tentative_form() {
        let rewritten = rewrite_action_claims("Talebiniz kaydedildi.", true);
        assert!(!contains_action_claim(&rewritten));
        assert!(rewritten.contains("işleme alınabilir"));
    }
}
