//! The assistant's local tools.
//!
//! The model can ask for exactly two lookups by replying with a JSON
//! directive (see [`directive`]):
//!
//! - `get_product_details(product_name?, product_id?)` - one catalog product
//! - `get_order_details(order_id)` - one of the caller's orders with its line items
//!
//! A recognized directive becomes a [`ToolCall`], which the [`ToolExecutor`]
//! resolves against a [`crate::db::CatalogLookup`] into a [`ToolOutput`]. The
//! output is serialized into a tool turn for the second completion pass.

pub mod directive;
mod executor;

use rust_decimal::Decimal;
use serde::Serialize;

use shopchat_core::{OrderId, ProductId};

use crate::db::ProductQuery;
use crate::models::{OrderSummary, ProductSummary};

pub use directive::{Directive, DirectiveError, parse_reply};
pub use executor::ToolExecutor;

/// Wire name of the product lookup.
pub const GET_PRODUCT_DETAILS: &str = "get_product_details";

/// Wire name of the order lookup.
pub const GET_ORDER_DETAILS: &str = "get_order_details";

/// Message attached to a tool output that found nothing.
pub const NOT_FOUND_MESSAGE: &str = "No matching record was found.";

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    /// `get_product_details`
    ProductDetails(ProductDetailsParams),
    /// `get_order_details`
    OrderDetails(OrderDetailsParams),
    /// Any other function name. Resolves to "no data".
    Unsupported {
        /// The name the model asked for.
        function_name: String,
    },
}

impl ToolCall {
    /// The function name as the model knows it.
    #[must_use]
    pub fn function_name(&self) -> &str {
        match self {
            Self::ProductDetails(_) => GET_PRODUCT_DETAILS,
            Self::OrderDetails(_) => GET_ORDER_DETAILS,
            Self::Unsupported { function_name } => function_name,
        }
    }
}

/// Parameters of `get_product_details`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDetailsParams {
    pub product_id: Option<ProductId>,
    pub product_name: Option<String>,
}

impl ProductDetailsParams {
    /// The lookup to run. `product_id` wins over `product_name`; a blank name
    /// counts as absent.
    #[must_use]
    pub fn query(&self) -> Option<ProductQuery> {
        if let Some(id) = self.product_id {
            return Some(ProductQuery::ById(id));
        }

        self.product_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| ProductQuery::ByName(name.to_string()))
    }
}

/// Parameters of `get_order_details`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderDetailsParams {
    pub order_id: Option<OrderId>,
    /// A `user_id` the model put in the parameters. Never used for the lookup.
    pub supplied_user_id: Option<String>,
}

/// Result of running a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    Product(ProductSummary),
    Order(OrderSummary),
    NotFound,
}

#[derive(Serialize)]
struct ToolOutputEnvelope<'a> {
    function_name: &'a str,
    result: ToolResult<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ToolResult<'a> {
    Product(&'a ProductSummary),
    Order(OrderResult<'a>),
    None,
}

/// An order summary with its computed total alongside.
#[derive(Serialize)]
struct OrderResult<'a> {
    #[serde(flatten)]
    order: &'a OrderSummary,
    total: Decimal,
}

impl ToolOutput {
    /// Whether the lookup found nothing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Serialize for the tool turn:
    /// `{"function_name": ..., "result": <summary|null>, "message"?: ...}`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render(&self, function_name: &str) -> Result<String, serde_json::Error> {
        let (result, message) = match self {
            Self::Product(product) => (ToolResult::Product(product), None),
            Self::Order(order) => (
                ToolResult::Order(OrderResult {
                    order,
                    total: order.total(),
                }),
                None,
            ),
            Self::NotFound => (ToolResult::None, Some(NOT_FOUND_MESSAGE)),
        };

        serde_json::to_string(&ToolOutputEnvelope {
            function_name,
            result,
            message,
        })
    }
}
