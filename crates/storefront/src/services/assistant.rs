//! Mock shopping assistant: MCP-style tools and a scripted agent turn.
//!
//! Tools are plain async functions over the same services the JSON API
//! uses. Input problems come back as a tool result with `is_error` set, the
//! way a tool call reports failure to an agent, rather than as HTTP errors.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use dukaan_core::{PageRequest, VariantId};

use crate::db::catalog::{ProductFilter, ProductSummary};
use crate::db::{CatalogRepository, ContentRepository, RepositoryError};
use crate::services::cart::{CartError, CartService, CartView};
use crate::services::rag::{Family, KnowledgeBase, clamp_top_k, dominant_family, embed};
use crate::services::tcs::TcsClient;
use crate::services::tracking::{TrackingError, track_order};

const DEFAULT_PRODUCT_LIMIT: u32 = 5;
const MAX_PRODUCT_LIMIT: u32 = 20;

static ORDER_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bDK-\d{8}-[A-Z0-9]{6}\b").expect("Invalid regex"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("Invalid regex")
});

/// Words that never make a useful catalog search term.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "you", "your", "have", "has", "any", "are", "can", "with", "what",
    "which", "show", "find", "want", "need", "looking", "buy", "get", "some", "please", "me",
    "do", "does", "how", "much", "price", "prices", "cost", "product", "products", "item",
    "items", "there", "this", "that", "about", "under", "cheap", "available", "stock",
];

/// A tool an agent may call.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    /// Whether calling the tool changes state (the caller's cart).
    pub mutates: bool,
}

/// Outcome of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub content: Value,
    pub is_error: bool,
}

impl ToolResult {
    fn ok(content: Value) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            content: json!({ "error": message.into() }),
            is_error: true,
        }
    }
}

/// Why a tool call failed.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ToolError {
    /// Message safe to hand to the agent.
    fn agent_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Cart(
                e @ (CartError::VariantNotFound(_)
                | CartError::OutOfStock(_)
                | CartError::LineNotFound(_)
                | CartError::InvalidQuantity),
            ) => e.to_string(),
            Self::Cart(_) | Self::Repository(_) => "the tool failed, try again later".to_string(),
        }
    }
}

/// The registry of tools, in a stable order.
#[must_use]
pub fn tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "search_products",
            description: "Search the catalog for active products by name or description. Returns slugs, price ranges and stock availability.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search text" },
                    "limit": {
                        "type": "integer",
                        "description": "Number of products (1-20, default 5)",
                        "minimum": 1,
                        "maximum": 20
                    },
                    "category": { "type": "string", "description": "Optional category filter" }
                },
                "required": ["query"]
            }),
            mutates: false,
        },
        Tool {
            name: "get_product",
            description: "Get one product with its variants (SKU, label, price, stock).",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "slug": { "type": "string", "description": "Product slug" }
                },
                "required": ["slug"]
            }),
            mutates: false,
        },
        Tool {
            name: "add_to_cart",
            description: "Add a variant to the shopper's cart. Quantity is clamped to stock and the per-line maximum.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "variant_id": { "type": "integer", "description": "Variant ID" },
                    "quantity": {
                        "type": "integer",
                        "description": "Units to add (default 1)",
                        "minimum": 1
                    }
                },
                "required": ["variant_id"]
            }),
            mutates: true,
        },
        Tool {
            name: "view_cart",
            description: "Show the shopper's cart with line totals and subtotal.",
            input_schema: json!({ "type": "object", "properties": {} }),
            mutates: false,
        },
        Tool {
            name: "list_shipping_methods",
            description: "List active shipping methods with fees, free-shipping thresholds and delivery estimates.",
            input_schema: json!({ "type": "object", "properties": {} }),
            mutates: false,
        },
        Tool {
            name: "track_order",
            description: "Look up an order by order number and the email used at checkout, including courier tracking.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "order_number": { "type": "string", "description": "e.g. DK-20260301-AB12CD" },
                    "email": { "type": "string", "description": "Email used at checkout" }
                },
                "required": ["order_number", "email"]
            }),
            mutates: false,
        },
        Tool {
            name: "search_knowledge",
            description: "Search store policies and help articles (shipping, returns, payments, careers, branches).",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Question or keywords" },
                    "top_k": {
                        "type": "integer",
                        "description": "Number of articles (1-10, default 3)",
                        "minimum": 1,
                        "maximum": 10
                    }
                },
                "required": ["query"]
            }),
            mutates: false,
        },
    ]
}

/// Whether a tool with this name exists.
#[must_use]
pub fn is_known_tool(name: &str) -> bool {
    tools().iter().any(|tool| tool.name == name)
}

fn required_str<'v>(input: &'v Value, key: &str) -> Result<&'v str, ToolError> {
    input[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidInput(format!("'{key}' is required")))
}

fn optional_positive(input: &Value, key: &str) -> Result<Option<u64>, ToolError> {
    match &input[key] {
        Value::Null => Ok(None),
        value => value
            .as_u64()
            .filter(|n| *n >= 1)
            .map(Some)
            .ok_or_else(|| ToolError::InvalidInput(format!("'{key}' must be a positive integer"))),
    }
}

fn summarize_products(products: &[ProductSummary]) -> Value {
    let summaries: Vec<Value> = products
        .iter()
        .map(|p| {
            json!({
                "slug": p.slug,
                "name": p.name,
                "category": p.category,
                "price_min": p.min_price,
                "price_max": p.max_price,
                "in_stock": p.in_stock(),
            })
        })
        .collect();

    json!({
        "count": summaries.len(),
        "products": summaries,
    })
}

fn summarize_cart(cart: &CartView) -> Value {
    let lines: Vec<Value> = cart
        .lines
        .iter()
        .map(|line| {
            json!({
                "variant_id": line.variant_id,
                "name": line.product_name,
                "label": line.label,
                "quantity": line.quantity,
                "line_total": line.line_total,
            })
        })
        .collect();

    json!({
        "lines": lines,
        "item_count": cart.item_count,
        "subtotal": cart.subtotal,
        "currency": cart.currency,
    })
}

/// Executes tools on behalf of one caller.
pub struct ToolExecutor<'a> {
    pool: &'a PgPool,
    cart: CartService<'a>,
    tcs: &'a TcsClient,
    knowledge: &'a KnowledgeBase,
}

impl<'a> ToolExecutor<'a> {
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        cart: CartService<'a>,
        tcs: &'a TcsClient,
        knowledge: &'a KnowledgeBase,
    ) -> Self {
        Self {
            pool,
            cart,
            tcs,
            knowledge,
        }
    }

    /// Run a tool. `None` when no tool has that name.
    #[instrument(skip(self, input), fields(tool_name = %name))]
    pub async fn execute(&self, name: &str, input: &Value) -> Option<ToolResult> {
        let outcome = match name {
            "search_products" => self.search_products(input).await,
            "get_product" => self.get_product(input).await,
            "add_to_cart" => self.add_to_cart(input).await,
            "view_cart" => self.view_cart().await,
            "list_shipping_methods" => self.list_shipping_methods().await,
            "track_order" => self.track_order(input).await,
            "search_knowledge" => self.search_knowledge(input),
            _ => return None,
        };

        Some(match outcome {
            Ok(content) => ToolResult::ok(content),
            Err(e) => {
                if matches!(
                    e,
                    ToolError::Repository(_)
                        | ToolError::Cart(CartError::Repository(_) | CartError::Session(_))
                ) {
                    tracing::error!(error = %e, "Tool execution failed");
                } else {
                    tracing::debug!(error = %e, "Tool rejected input");
                }
                ToolResult::error(e.agent_message())
            }
        })
    }

    async fn search_products(&self, input: &Value) -> Result<Value, ToolError> {
        let query = required_str(input, "query")?;
        let limit = optional_positive(input, "limit")?
            .map(|n| u32::try_from(n).unwrap_or(MAX_PRODUCT_LIMIT));
        let filter = ProductFilter {
            q: Some(query.to_string()),
            category: input["category"]
                .as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            ..ProductFilter::default()
        };
        let page = PageRequest::new(Some(1), limit, DEFAULT_PRODUCT_LIMIT, MAX_PRODUCT_LIMIT);

        let (products, _) = CatalogRepository::new(self.pool)
            .list_active(&filter, page)
            .await?;
        Ok(summarize_products(&products))
    }

    async fn get_product(&self, input: &Value) -> Result<Value, ToolError> {
        let slug = required_str(input, "slug")?;
        let detail = CatalogRepository::new(self.pool)
            .get_active_by_slug(slug)
            .await?
            .ok_or_else(|| ToolError::NotFound(format!("no product with slug '{slug}'")))?;

        let variants: Vec<Value> = detail
            .variants
            .iter()
            .map(|v| {
                json!({
                    "variant_id": v.id,
                    "sku": v.sku,
                    "label": v.label,
                    "price": v.price,
                    "stock": v.stock,
                })
            })
            .collect();

        Ok(json!({
            "slug": detail.product.slug,
            "name": detail.product.name,
            "description": detail.product.description,
            "category": detail.product.category,
            "variants": variants,
        }))
    }

    async fn add_to_cart(&self, input: &Value) -> Result<Value, ToolError> {
        let variant_id = input["variant_id"]
            .as_i64()
            .and_then(|id| i32::try_from(id).ok())
            .map(VariantId::new)
            .ok_or_else(|| ToolError::InvalidInput("'variant_id' must be an integer".to_string()))?;
        let quantity = optional_positive(input, "quantity")?
            .map_or(1, |n| u32::try_from(n).unwrap_or(u32::MAX));

        let cart = self.cart.add(variant_id, quantity).await?;
        Ok(summarize_cart(&cart))
    }

    async fn view_cart(&self) -> Result<Value, ToolError> {
        let cart = self.cart.view().await?;
        Ok(summarize_cart(&cart))
    }

    async fn list_shipping_methods(&self) -> Result<Value, ToolError> {
        let methods = ContentRepository::new(self.pool)
            .active_shipping_methods()
            .await?;
        let summaries: Vec<Value> = methods
            .iter()
            .map(|m| {
                json!({
                    "id": m.id,
                    "name": m.name,
                    "kind": m.kind,
                    "fee": m.fee,
                    "free_shipping_threshold": m.free_shipping_threshold,
                    "estimated_days_min": m.estimated_days_min,
                    "estimated_days_max": m.estimated_days_max,
                })
            })
            .collect();
        Ok(json!({ "methods": summaries }))
    }

    async fn track_order(&self, input: &Value) -> Result<Value, ToolError> {
        let order_number = required_str(input, "order_number")?;
        let email = required_str(input, "email")?;

        match track_order(self.pool, self.tcs, order_number, email).await {
            Ok(tracked) => Ok(json!({
                "order_number": tracked.order.order.order_number,
                "status": tracked.order.order.status,
                "total": tracked.order.order.total,
                "tracking_number": tracked.order.order.tracking_number,
                "courier": tracked.order.order.courier,
                "tracking": tracked.tracking,
                "tracking_error": tracked.tracking_error,
            })),
            Err(TrackingError::NotFound) => Err(ToolError::NotFound(
                "no order matches that order number and email".to_string(),
            )),
            Err(TrackingError::Repository(e)) => Err(e.into()),
        }
    }

    fn search_knowledge(&self, input: &Value) -> Result<Value, ToolError> {
        let query = required_str(input, "query")?;
        let top_k = optional_positive(input, "top_k")?
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX));
        let hits = self.knowledge.search(query, clamp_top_k(top_k));
        Ok(json!({ "results": hits }))
    }

    /// One scripted agent turn: classify, call tools, answer from a template.
    pub async fn ask(&self, message: &str) -> AskResponse {
        let plan = plan_turn(message);
        let mut tool_calls = Vec::with_capacity(plan.calls.len());

        for (name, input) in plan.calls {
            let result = self
                .execute(name, &input)
                .await
                .unwrap_or_else(|| ToolResult::error(format!("unknown tool {name}")));
            tool_calls.push(ToolCall {
                name: name.to_string(),
                input,
                result,
            });
        }

        let answer = compose_answer(plan.intent, &tool_calls);
        AskResponse {
            intent: plan.intent,
            tool_calls,
            answer,
        }
    }
}

/// Coarse intent of a shopper message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Products,
    Orders,
    Policies,
}

/// A tool call made during an agent turn.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCall {
    pub name: String,
    pub input: Value,
    pub result: ToolResult,
}

/// Result of [`ToolExecutor::ask`].
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub intent: Intent,
    pub tool_calls: Vec<ToolCall>,
    pub answer: String,
}

/// Intent plus the tool calls to make, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnPlan {
    pub intent: Intent,
    pub calls: Vec<(&'static str, Value)>,
}

/// Classify a message from its pseudo-embedding.
///
/// An order number in the text always means an order question.
#[must_use]
pub fn classify(message: &str) -> Intent {
    if ORDER_NUMBER_RE.is_match(message) {
        return Intent::Orders;
    }
    match dominant_family(&embed(message)) {
        Some(Family::Products | Family::Pricing) => Intent::Products,
        Some(Family::Orders) => Intent::Orders,
        _ => Intent::Policies,
    }
}

/// First word of the message worth searching the catalog for.
fn product_term(message: &str) -> Option<String> {
    message
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .find(|word| word.chars().count() >= 3 && !STOPWORDS.contains(&word.as_str()))
}

/// Decide which tools to call for a message.
#[must_use]
pub fn plan_turn(message: &str) -> TurnPlan {
    let message = message.trim();
    let intent = classify(message);
    let mut calls = vec![("search_knowledge", json!({ "query": message }))];

    match intent {
        Intent::Products => {
            let query = product_term(message).unwrap_or_else(|| message.to_string());
            calls.push(("search_products", json!({ "query": query })));
        }
        Intent::Orders => {
            if let (Some(number), Some(email)) =
                (ORDER_NUMBER_RE.find(message), EMAIL_RE.find(message))
            {
                calls.push((
                    "track_order",
                    json!({
                        "order_number": number.as_str().to_uppercase(),
                        "email": email.as_str(),
                    }),
                ));
            }
        }
        Intent::Policies => {}
    }

    TurnPlan { intent, calls }
}

fn compose_answer(intent: Intent, calls: &[ToolCall]) -> String {
    let result_of = |name: &str| {
        calls
            .iter()
            .find(|call| call.name == name && !call.result.is_error)
            .map(|call| &call.result.content)
    };

    let article = result_of("search_knowledge")
        .and_then(|content| content["results"].get(0))
        .and_then(|hit| hit["title"].as_str());

    match intent {
        Intent::Products => {
            let count = result_of("search_products")
                .and_then(|content| content["count"].as_u64())
                .unwrap_or(0);
            match count {
                0 => "I couldn't find matching products. Try a different word or browse a category.".to_string(),
                1 => "I found 1 product that matches. Open it to pick a size.".to_string(),
                n => format!("I found {n} products that match. Open one to pick a size."),
            }
        }
        Intent::Orders => {
            if let Some(order) = result_of("track_order") {
                let number = order["order_number"].as_str().unwrap_or_default();
                let status = order["status"].as_str().unwrap_or("unknown");
                format!("Order {number} is currently {status}.")
            } else if calls.iter().any(|call| call.name == "track_order") {
                "I couldn't find an order with that number and email.".to_string()
            } else {
                "Share your order number (like DK-20260301-AB12CD) and the email used at checkout, and I'll look it up.".to_string()
            }
        }
        Intent::Policies => article.map_or_else(
            || "I'm not sure about that one. Our support team can help by phone or email.".to_string(),
            |title| format!("This might help: \"{title}\"."),
        ),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names_are_unique() {
        let tools = tools();
        assert_eq!(tools.len(), 7);
        for (i, tool) in tools.iter().enumerate() {
            assert!(tools.iter().skip(i + 1).all(|other| other.name != tool.name));
            assert_eq!(tool.input_schema["type"], "object");
        }
        let mutating: Vec<_> = tools.iter().filter(|t| t.mutates).map(|t| t.name).collect();
        assert_eq!(mutating, vec!["add_to_cart"]);
    }

    #[test]
    fn test_is_known_tool() {
        assert!(is_known_tool("track_order"));
        assert!(!is_known_tool("delete_everything"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("do you have lawn suits in size M?"), Intent::Products);
        assert_eq!(classify("where is my order"), Intent::Orders);
        assert_eq!(classify("what is your refund policy"), Intent::Policies);
        assert_eq!(classify("status of dk-20260301-ab12cd please"), Intent::Orders);
        assert_eq!(classify("hello"), Intent::Policies);
    }

    #[test]
    fn test_plan_tracks_when_number_and_email_present() {
        let plan = plan_turn("Where is DK-20260301-AB12CD? I used sana@example.pk");
        assert_eq!(plan.intent, Intent::Orders);
        let names: Vec<_> = plan.calls.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["search_knowledge", "track_order"]);
        assert_eq!(plan.calls[1].1["order_number"], "DK-20260301-AB12CD");
        assert_eq!(plan.calls[1].1["email"], "sana@example.pk");
    }

    #[test]
    fn test_plan_products_extracts_term() {
        let plan = plan_turn("show me lawn suits");
        assert_eq!(plan.intent, Intent::Products);
        assert_eq!(plan.calls[1], ("search_products", json!({ "query": "lawn" })));
    }

    #[test]
    fn test_plan_orders_without_details_only_searches_knowledge() {
        let plan = plan_turn("how do I track my order");
        assert_eq!(plan.intent, Intent::Orders);
        assert_eq!(plan.calls.len(), 1);
    }

    #[test]
    fn test_input_helpers() {
        let input = json!({ "query": "  ", "limit": 0, "top_k": 4 });
        assert!(required_str(&input, "query").is_err());
        assert!(required_str(&input, "missing").is_err());
        assert!(optional_positive(&input, "limit").is_err());
        assert_eq!(optional_positive(&input, "top_k").unwrap(), Some(4));
        assert_eq!(optional_positive(&input, "absent").unwrap(), None);
    }

    #[test]
    fn test_compose_answer_for_missing_order() {
        let calls = vec![ToolCall {
            name: "track_order".into(),
            input: json!({}),
            result: ToolResult::error("no order"),
        }];
        assert!(compose_answer(Intent::Orders, &calls).contains("couldn't find"));
    }

    #[test]
    fn test_compose_answer_policies_uses_top_article() {
        let calls = vec![ToolCall {
            name: "search_knowledge".into(),
            input: json!({}),
            result: ToolResult::ok(json!({ "results": [{ "title": "Returns and exchanges" }] })),
        }];
        assert_eq!(
            compose_answer(Intent::Policies, &calls),
            "This might help: \"Returns and exchanges\"."
        );
    }
}
