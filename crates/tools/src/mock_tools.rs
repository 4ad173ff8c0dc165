//! Mock tool implementations (§1, §4.N): order lookup, stock check, callback
//! creation, customer data lookup. These stand in for the real order
//! system, inventory, and CRM collaborators that §1 scopes out, returning
//! canned fixtures keyed by the arguments the LLM supplied so integration
//! tests and the CLI harness can drive the tool loop deterministically.

use std::collections::HashMap;

use convo_domain::{FieldWhitelist, Result, StateEvent, ToolCatalogEntry, ToolPrecondition, ToolResult};

use crate::catalog::Tool;

pub struct OrderLookupTool {
    entry: ToolCatalogEntry,
    fixtures: HashMap<String, serde_json::Value>,
}

impl Default for OrderLookupTool {
    fn default() -> Self {
        let mut fixtures = HashMap::new();
        fixtures.insert(
            "ORD-1".to_string(),
            serde_json::json!({"order_number": "ORD-1", "status": "shipped", "carrier": "aras", "eta_days": 2}),
        );

        Self {
            entry: ToolCatalogEntry {
                name: "order_lookup".into(),
                description: "Look up an order by its order number.".into(),
                parameter_schema: serde_json::json!({
                    "type": "object",
                    "properties": {"order_number": {"type": "string"}},
                    "required": ["order_number"],
                }),
                preconditions: ToolPrecondition {
                    required_slots: vec!["order_number".into()],
                    guidance_per_language: HashMap::from([
                        ("tr".to_string(), "Sipariş numaranızı paylaşabilir misiniz?".to_string()),
                        ("en".to_string(), "Could you share your order number?".to_string()),
                    ]),
                },
                field_whitelist: FieldWhitelist { required: vec!["order_number".into(), "status".into()], priority: vec!["carrier".into(), "eta_days".into()], optional: vec![] },
            },
            fixtures,
        }
    }
}

#[async_trait::async_trait]
impl Tool for OrderLookupTool {
    fn entry(&self) -> &ToolCatalogEntry {
        &self.entry
    }

    async fn execute(&self, arguments: &serde_json::Value) -> Result<ToolResult> {
        let Some(order_number) = arguments.get("order_number").and_then(|v| v.as_str()) else {
            return Ok(ToolResult::need_more_info("order_lookup", "order number missing", vec!["order_number".into()]));
        };

        match self.fixtures.get(order_number) {
            Some(data) => {
                let mut result = ToolResult::ok("order_lookup", "order found", data.clone());
                result.state_events = Some(vec![StateEvent::SetAnchor { anchor_type: "Order".into(), truth: data.clone() }]);
                Ok(result)
            }
            None => Ok(ToolResult::not_found("order_lookup", "no order with that number was found")),
        }
    }
}

pub struct StockCheckTool {
    entry: ToolCatalogEntry,
    fixtures: HashMap<String, i64>,
}

impl Default for StockCheckTool {
    fn default() -> Self {
        let mut fixtures = HashMap::new();
        fixtures.insert("SKU-1".to_string(), 12);
        fixtures.insert("SKU-0".to_string(), 0);

        Self {
            entry: ToolCatalogEntry {
                name: "stock_check".into(),
                description: "Check current stock quantity for a product SKU.".into(),
                parameter_schema: serde_json::json!({
                    "type": "object",
                    "properties": {"sku": {"type": "string"}},
                    "required": ["sku"],
                }),
                preconditions: ToolPrecondition { required_slots: vec![], guidance_per_language: HashMap::new() },
                field_whitelist: FieldWhitelist { required: vec!["sku".into(), "quantity".into()], priority: vec![], optional: vec![] },
            },
            fixtures,
        }
    }
}

#[async_trait::async_trait]
impl Tool for StockCheckTool {
    fn entry(&self) -> &ToolCatalogEntry {
        &self.entry
    }

    async fn execute(&self, arguments: &serde_json::Value) -> Result<ToolResult> {
        let Some(sku) = arguments.get("sku").and_then(|v| v.as_str()) else {
            return Ok(ToolResult::need_more_info("stock_check", "sku missing", vec!["sku".into()]));
        };

        match self.fixtures.get(sku) {
            Some(qty) => {
                let data = serde_json::json!({"sku": sku, "quantity": qty});
                let mut result = ToolResult::ok("stock_check", format!("{qty} units in stock"), data.clone());
                result.state_events = Some(vec![StateEvent::SetAnchor { anchor_type: "Stock".into(), truth: data }, StateEvent::ClearVerification]);
                Ok(result)
            }
            None => Ok(ToolResult::not_found("stock_check", "no product with that SKU was found")),
        }
    }
}

pub struct CreateCallbackTool {
    entry: ToolCatalogEntry,
}

impl Default for CreateCallbackTool {
    fn default() -> Self {
        Self {
            entry: ToolCatalogEntry {
                name: "create_callback".into(),
                description: "Schedule a callback from a human agent.".into(),
                parameter_schema: serde_json::json!({
                    "type": "object",
                    "properties": {"phone": {"type": "string"}, "reason": {"type": "string"}},
                    "required": ["phone"],
                }),
                preconditions: ToolPrecondition {
                    required_slots: vec!["phone".into()],
                    guidance_per_language: HashMap::from([
                        ("tr".to_string(), "Sizi arayabilmemiz için telefon numaranızı paylaşır mısınız?".to_string()),
                        ("en".to_string(), "Could you share a phone number we can call you back on?".to_string()),
                    ]),
                },
                field_whitelist: FieldWhitelist { required: vec!["callback_id".into()], priority: vec![], optional: vec![] },
            },
        }
    }
}

#[async_trait::async_trait]
impl Tool for CreateCallbackTool {
    fn entry(&self) -> &ToolCatalogEntry {
        &self.entry
    }

    async fn execute(&self, arguments: &serde_json::Value) -> Result<ToolResult> {
        let Some(phone) = arguments.get("phone").and_then(|v| v.as_str()) else {
            return Ok(ToolResult::need_more_info("create_callback", "phone number missing", vec!["phone".into()]));
        };

        let callback_id = format!("CB-{:08x}", seeded_hash(phone));
        let data = serde_json::json!({"callback_id": callback_id});
        Ok(ToolResult::ok("create_callback", "callback scheduled", data))
    }
}

pub struct CustomerDataLookupTool {
    entry: ToolCatalogEntry,
}

impl Default for CustomerDataLookupTool {
    fn default() -> Self {
        Self {
            entry: ToolCatalogEntry {
                name: "customer_data_lookup".into(),
                description: "Look up customer account details by phone or VKN.".into(),
                parameter_schema: serde_json::json!({
                    "type": "object",
                    "properties": {"phone": {"type": "string"}, "vkn": {"type": "string"}},
                }),
                preconditions: ToolPrecondition { required_slots: vec![], guidance_per_language: HashMap::new() },
                field_whitelist: FieldWhitelist { required: vec!["account_id".into()], priority: vec!["plan".into()], optional: vec!["notes".into()] },
            },
        }
    }
}

#[async_trait::async_trait]
impl Tool for CustomerDataLookupTool {
    fn entry(&self) -> &ToolCatalogEntry {
        &self.entry
    }

    async fn execute(&self, arguments: &serde_json::Value) -> Result<ToolResult> {
        let identifier = arguments.get("phone").or_else(|| arguments.get("vkn")).and_then(|v| v.as_str());
        let Some(identifier) = identifier else {
            return Ok(ToolResult::need_more_info("customer_data_lookup", "identifying field missing", vec!["phone".into()]));
        };

        let data = serde_json::json!({
            "account_id": format!("ACC-{:08x}", seeded_hash(identifier)),
            "plan": "standard",
        });
        let mut result = ToolResult::ok("customer_data_lookup", "account found", data);
        result.outcome = convo_domain::ToolOutcome::VerificationRequired;
        Ok(result)
    }
}

/// Deterministic, non-cryptographic fixture-id generator — not for security use.
fn seeded_hash(s: &str) -> u32 {
    s.bytes().fold(2166136261u32, |acc, b| (acc ^ b as u32).wrapping_mul(16777619))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn order_lookup_returns_ok_for_known_order() {
        let tool = OrderLookupTool::default();
        let result = tool.execute(&serde_json::json!({"order_number": "ORD-1"})).await.unwrap();
        assert_eq!(result.outcome, convo_domain::ToolOutcome::Ok);
    }

    #[tokio::test]
    async fn order_lookup_returns_not_found_for_unknown_order() {
        let tool = OrderLookupTool::default();
        let result = tool.execute(&serde_json::json!({"order_number": "ORD-999"})).await.unwrap();
        assert_eq!(result.outcome, convo_domain::ToolOutcome::NotFound);
    }

    #[tokio::test]
    async fn stock_check_zero_quantity_is_still_ok() {
        let tool = StockCheckTool::default();
        let result = tool.execute(&serde_json::json!({"sku": "SKU-0"})).await.unwrap();
        assert_eq!(result.outcome, convo_domain::ToolOutcome::Ok);
    }

    #[tokio::test]
    async fn create_callback_needs_phone() {
        let tool = CreateCallbackTool::default();
        let result = tool.execute(&serde_json::json!({})).await.unwrap();
        assert_eq!(result.outcome, convo_domain::ToolOutcome::NeedMoreInfo);
    }

    #[tokio::test]
    async fn customer_data_lookup_requires_verification() {
        let tool = CustomerDataLookupTool::default();
        let result = tool.execute(&serde_json::json!({"phone": "+905551112233"})).await.unwrap();
        assert_eq!(result.outcome, convo_domain::ToolOutcome::VerificationRequired);
    }
}
