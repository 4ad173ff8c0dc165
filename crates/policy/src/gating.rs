use std::collections::HashSet;

use convo_domain::{ActiveFlow, ToolCatalogEntry};

/// Selects the allowlist of tools exposed to the LLM for this turn (§4.B).
///
/// Rules, in order: `kb_only` channel mode always returns an empty list;
/// an active verification flow excludes stock/product tools; `StockCheck`
/// and `ProductInfo` exclude `customer_data_lookup`; `CallbackRequest`
/// exposes only `create_callback`. With no inferable flow, every catalog
/// tool is allowed.
pub fn gate_tools(
    catalog: &[ToolCatalogEntry],
    active_flow: Option<ActiveFlow>,
    kb_only: bool,
    verification_pending: bool,
) -> Vec<String> {
    if kb_only {
        return Vec::new();
    }

    if active_flow == Some(ActiveFlow::CallbackRequest) {
        return catalog
            .iter()
            .map(|t| t.name.clone())
            .filter(|n| n == "create_callback")
            .collect();
    }

    let mut excluded: HashSet<&str> = HashSet::new();
    if verification_pending {
        excluded.insert("stock_check");
        excluded.insert("product_info");
    }
    if matches!(active_flow, Some(ActiveFlow::StockCheck) | Some(ActiveFlow::ProductInfo)) {
        excluded.insert("customer_data_lookup");
    }

    catalog
        .iter()
        .map(|t| t.name.clone())
        .filter(|n| !excluded.contains(n.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(name: &str) -> ToolCatalogEntry {
        ToolCatalogEntry {
            name: name.into(),
            description: String::new(),
            parameter_schema: json!({}),
            preconditions: convo_domain::ToolPrecondition {
                required_slots: vec![],
                guidance_per_language: Default::default(),
            },
            field_whitelist: Default::default(),
        }
    }

    fn catalog() -> Vec<ToolCatalogEntry> {
        vec![
            entry("order_lookup"),
            entry("stock_check"),
            entry("product_info"),
            entry("customer_data_lookup"),
            entry("create_callback"),
        ]
    }

    #[test]
    fn kb_only_returns_empty() {
        assert!(gate_tools(&catalog(), None, true, false).is_empty());
    }

    #[test]
    fn callback_flow_restricts_to_create_callback() {
        let allowed = gate_tools(&catalog(), Some(ActiveFlow::CallbackRequest), false, false);
        assert_eq!(allowed, vec!["create_callback".to_string()]);
    }

    #[test]
    fn stock_flow_excludes_customer_data_lookup() {
        let allowed = gate_tools(&catalog(), Some(ActiveFlow::StockCheck), false, false);
        assert!(!allowed.contains(&"customer_data_lookup".to_string()));
        assert!(allowed.contains(&"stock_check".to_string()));
    }

    #[test]
    fn verification_pending_excludes_stock_and_product() {
        let allowed = gate_tools(&catalog(), None, false, true);
        assert!(!allowed.contains(&"stock_check".to_string()));
        assert!(!allowed.contains(&"product_info".to_string()));
        assert!(allowed.contains(&"order_lookup".to_string()));
    }

    #[test]
    fn no_flow_allows_everything() {
        let allowed = gate_tools(&catalog(), None, false, false);
        assert_eq!(allowed.len(), catalog().len());
    }
}
