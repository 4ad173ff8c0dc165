use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single curated help link shown in `KbOnly` channel mode (§4.E route 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportLink {
    pub label: String,
    pub url: String,
}

/// Per-business knowledge-base and channel-mode configuration (§4.B tool-gating
/// rule 1, §4.E route 1, §8 scenario 6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbConfig {
    /// When true, tool-gating returns an empty allowlist and the router emits
    /// a direct response pointing at `support_links` instead of calling the LLM.
    #[serde(default)]
    pub kb_only: bool,
    /// Curated links keyed by language code (`"tr"`, `"en"`).
    #[serde(default = "d_support_links")]
    pub support_links: HashMap<String, Vec<SupportLink>>,
}

impl Default for KbConfig {
    fn default() -> Self {
        Self { kb_only: false, support_links: d_support_links() }
    }
}

fn d_support_links() -> HashMap<String, Vec<SupportLink>> {
    let mut map = HashMap::new();
    map.insert(
        "tr".into(),
        vec![SupportLink { label: "Destek Merkezi".into(), url: "https://support.example.com/tr".into() }],
    );
    map.insert(
        "en".into(),
        vec![SupportLink { label: "Help Center".into(), url: "https://support.example.com/en".into() }],
    );
    map
}
