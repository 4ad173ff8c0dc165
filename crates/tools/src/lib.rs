//! Concrete tool implementations and the tool catalog (§3, §4.G).
//!
//! The turn orchestrator never talks to a backend directly: every side
//! effect runs through a [`Tool`], resolved from a [`ToolCatalog`], sanitized
//! on the way back per §4.G step e. This crate ships the mock catalog (order
//! lookup, stock check, callback creation, customer data lookup) that makes
//! the orchestrator runnable standalone (§1) — real CRM/order-system/payment
//! backends are out of scope.

pub mod catalog;
pub mod mock_tools;
pub mod sanitize;

pub use catalog::{Tool, ToolCatalog};
pub use sanitize::sanitize_result;
