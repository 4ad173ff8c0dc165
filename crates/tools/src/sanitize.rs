//! Tool-result sanitizer (§4.G step e): drop excluded fields, strip HTML from
//! description-like fields, redact PII, apply the per-tool field whitelist,
//! and enforce a per-tool token cap.

use convo_domain::FieldWhitelist;

/// Fields never sent to the model regardless of whitelist, matched
/// case-insensitively against the key name (§4.G step e).
const EXCLUDED_FIELDS: &[&str] = &["created_at", "updated_at", "password", "token", "secret", "api_key", "metadata"];

/// `≈4 chars/token` estimate, matching the prompt budgeter (§4.F); the
/// per-tool cap is `~3k` tokens.
const CHARS_PER_TOKEN: usize = 4;
const DEFAULT_TOKEN_CAP: usize = 3_000;

fn strip_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn is_excluded(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    EXCLUDED_FIELDS.iter().any(|f| lower.contains(f))
}

fn is_description_like(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    lower.contains("description") || lower.contains("notes") || lower.contains("body")
}

fn sanitize_value(key: &str, value: serde_json::Value, known_phone_numbers: &[String]) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => {
            let s = if is_description_like(key) { strip_html(&s) } else { s };
            serde_json::Value::String(convo_policy::pii::redact_outbound_text(&s, known_phone_numbers))
        }
        other => other,
    }
}

/// Sanitize `data` per §4.G step e. Returns the sanitized value and the list
/// of required whitelist fields that were absent after filtering.
pub fn sanitize_result(whitelist: &FieldWhitelist, data: &serde_json::Value, known_phone_numbers: &[String]) -> (serde_json::Value, Vec<String>) {
    let serde_json::Value::Object(map) = data else {
        return (data.clone(), Vec::new());
    };

    let mut cleaned = serde_json::Map::new();
    for (k, v) in map {
        if is_excluded(k) {
            continue;
        }
        cleaned.insert(k.clone(), sanitize_value(k, v.clone(), known_phone_numbers));
    }

    let ordered_keys: Vec<&String> = whitelist
        .required
        .iter()
        .chain(whitelist.priority.iter())
        .chain(whitelist.optional.iter())
        .collect();

    let mut result = serde_json::Map::new();
    if ordered_keys.is_empty() {
        result = cleaned;
    } else {
        for key in &ordered_keys {
            if let Some(v) = cleaned.get(key.as_str()) {
                result.insert((*key).clone(), v.clone());
            }
        }
    }

    let missing_required: Vec<String> = whitelist.required.iter().filter(|k| !result.contains_key(k.as_str())).cloned().collect();

    let capped = enforce_token_cap(result, whitelist, DEFAULT_TOKEN_CAP);
    (serde_json::Value::Object(capped), missing_required)
}

/// Drop optional, then priority, fields (never required) until the
/// serialized size is under the token cap (§4.G step e).
fn enforce_token_cap(mut map: serde_json::Map<String, serde_json::Value>, whitelist: &FieldWhitelist, token_cap: usize) -> serde_json::Map<String, serde_json::Value> {
    let char_cap = token_cap * CHARS_PER_TOKEN;

    let estimate = |m: &serde_json::Map<String, serde_json::Value>| serde_json::Value::Object(m.clone()).to_string().len();

    for key in whitelist.optional.iter().rev() {
        if estimate(&map) <= char_cap {
            break;
        }
        map.remove(key);
    }
    for key in whitelist.priority.iter().rev() {
        if estimate(&map) <= char_cap {
            break;
        }
        map.remove(key);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitelist() -> FieldWhitelist {
        FieldWhitelist { required: vec!["order_number".into()], priority: vec!["status".into()], optional: vec!["notes".into()] }
    }

    #[test]
    fn excluded_fields_are_dropped() {
        let data = serde_json::json!({"order_number": "ORD-1", "status": "shipped", "password": "hunter2"});
        let (out, missing) = sanitize_result(&whitelist(), &data, &[]);
        assert!(out.get("password").is_none());
        assert!(missing.is_empty());
    }

    #[test]
    fn missing_required_is_flagged() {
        let data = serde_json::json!({"status": "shipped"});
        let (_, missing) = sanitize_result(&whitelist(), &data, &[]);
        assert_eq!(missing, vec!["order_number".to_string()]);
    }

    #[test]
    fn description_html_is_stripped() {
        let wl = FieldWhitelist { required: vec![], priority: vec![], optional: vec!["description".into()] };
        let data = serde_json::json!({"description": "<b>bold</b> text"});
        let (out, _) = sanitize_result(&wl, &data, &[]);
        assert_eq!(out.get("description").unwrap(), "bold text");
    }

    #[test]
    fn non_object_data_passes_through() {
        let data = serde_json::json!("just a string");
        let (out, missing) = sanitize_result(&whitelist(), &data, &[]);
        assert_eq!(out, data);
        assert!(missing.is_empty());
    }
}
