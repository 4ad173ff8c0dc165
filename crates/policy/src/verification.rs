use std::sync::OnceLock;

use regex::Regex;

/// "False-promise" phrases ("I'll get back to you shortly") that must never
/// appear once a tool has asked for identity verification (§4.B, §8 scenario 4).
const FALSE_PROMISE_PATTERNS: &[&str] = &[
    r"k[ıi]sa s[üu]rede d[öo]n[üu][şs]\s*yap",
    r"size d[öo]n[üu][şs]\s*sa[ğg]lanacak",
    r"i'?ll get back to you",
    r"we'?ll follow up shortly",
];

fn false_promise_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let joined = FALSE_PROMISE_PATTERNS.join("|");
        Regex::new(&format!("(?i)({joined})")).expect("static false-promise pattern compiles")
    })
}

/// Strips false-promise phrasing from a draft that is about to ask for
/// verification.
pub fn strip_false_promises(text: &str) -> String {
    false_promise_regex().replace_all(text, "").into_owned()
}

/// Builds the targeted verification question driven by `ask_for`, skipping
/// any field the user already supplied this turn (§4.B, §8 scenario 4).
pub fn verification_question(ask_for: &[String], already_supplied: &[String], is_turkish: bool) -> String {
    let missing: Vec<&String> = ask_for.iter().filter(|f| !already_supplied.contains(f)).collect();
    if missing.is_empty() {
        return String::new();
    }
    let fields = missing
        .iter()
        .map(|f| field_label(f, is_turkish))
        .collect::<Vec<_>>()
        .join(is_turkish.then_some(" ve ").unwrap_or(" and "));
    if is_turkish {
        format!("Kimliğinizi doğrulamak için {fields} paylaşabilir misiniz?")
    } else {
        format!("Could you share your {fields} so I can verify your identity?")
    }
}

fn field_label(field: &str, is_turkish: bool) -> String {
    match (field, is_turkish) {
        ("phone_last4", true) => "telefonunuzun son 4 hanesini".into(),
        ("phone_last4", false) => "phone number's last 4 digits".into(),
        ("name", true) => "ad soyad bilginizi".into(),
        ("name", false) => "full name".into(),
        (other, _) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_false_promise_phrases() {
        let text = "Kısa sürede dönüş yapılacaktır, teşekkürler.";
        let stripped = strip_false_promises(text);
        assert!(!stripped.to_lowercase().contains("dönüş yap"));
    }

    #[test]
    fn question_skips_already_supplied_fields() {
        let ask_for = vec!["phone_last4".to_string(), "name".to_string()];
        let q = verification_question(&ask_for, &["name".to_string()], true);
        assert!(q.contains("son 4 hanesini"));
        assert!(!q.contains("ad soyad"));
    }

    #[test]
    fn question_empty_when_nothing_missing() {
        let ask_for = vec!["name".to_string()];
        let q = verification_question(&ask_for, &["name".to_string()], false);
        assert!(q.is_empty());
    }
}
