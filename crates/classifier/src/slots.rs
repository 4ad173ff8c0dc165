use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

fn order_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bORD-\d{4,12}\b").unwrap())
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b0?5\d{2}[ -]?\d{3}[ -]?\d{2}[ -]?\d{2}\b").unwrap())
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\w.+-]+@[\w-]+\.[\w.-]+").unwrap())
}

fn vkn_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bVKN[:\s]*([0-9]{10})\b").unwrap())
}

/// Extracts structured slots (`order_number`, `phone`, `email`, `vkn`) from
/// free text using deterministic patterns (§4.D). `customer_name` is never
/// extracted heuristically — it must come from an authenticated collaborator.
pub fn extract_slots(text: &str) -> HashMap<String, String> {
    let mut slots = HashMap::new();
    if let Some(m) = order_number_regex().find(text) {
        slots.insert("order_number".to_string(), m.as_str().to_uppercase());
    }
    if let Some(m) = phone_regex().find(text) {
        slots.insert("phone".to_string(), m.as_str().to_string());
    }
    if let Some(m) = email_regex().find(text) {
        slots.insert("email".to_string(), m.as_str().to_lowercase());
    }
    if let Some(cap) = vkn_regex().captures(text) {
        slots.insert("vkn".to_string(), cap[1].to_string());
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_order_number_case_insensitively() {
        let slots = extract_slots("ord-999999999 siparişim ne durumda?");
        assert_eq!(slots.get("order_number").map(String::as_str), Some("ORD-999999999"));
    }

    #[test]
    fn extracts_phone_and_email() {
        let slots = extract_slots("Telefonum 0532 123 45 67, mail: a@b.com");
        assert_eq!(slots.get("phone").map(String::as_str), Some("0532 123 45 67"));
        assert_eq!(slots.get("email").map(String::as_str), Some("a@b.com"));
    }

    #[test]
    fn no_slots_in_plain_greeting() {
        let slots = extract_slots("Merhaba, nasılsınız?");
        assert!(slots.is_empty());
    }
}
