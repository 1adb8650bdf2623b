//! Tool execution against the catalog.

use tracing::{debug, instrument};

use shopchat_core::UserId;

use crate::db::{CatalogLookup, RepositoryError};

use super::{OrderDetailsParams, ProductDetailsParams, ToolCall, ToolOutput};

/// Runs tool calls on behalf of one customer.
///
/// Order lookups are always scoped to the customer the executor was built
/// for, whatever the model puts in the parameters.
pub struct ToolExecutor<'a> {
    catalog: &'a dyn CatalogLookup,
    caller: UserId,
}

impl<'a> ToolExecutor<'a> {
    /// Create an executor for `caller`.
    #[must_use]
    pub fn new(catalog: &'a dyn CatalogLookup, caller: UserId) -> Self {
        Self { catalog, caller }
    }

    /// Run a tool call. A lookup miss is [`ToolOutput::NotFound`], not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the underlying store fails.
    #[instrument(skip(self, call), fields(function = call.function_name(), user_id = %self.caller))]
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, RepositoryError> {
        let output = match call {
            ToolCall::ProductDetails(params) => self.get_product_details(params).await?,
            ToolCall::OrderDetails(params) => self.get_order_details(params).await?,
            ToolCall::Unsupported { function_name } => {
                debug!(%function_name, "Unsupported tool requested");
                ToolOutput::NotFound
            }
        };

        debug!(found = !output.is_not_found(), "Tool executed");
        Ok(output)
    }

    async fn get_product_details(
        &self,
        params: &ProductDetailsParams,
    ) -> Result<ToolOutput, RepositoryError> {
        let Some(query) = params.query() else {
            return Ok(ToolOutput::NotFound);
        };

        Ok(self
            .catalog
            .find_product(&query)
            .await?
            .map_or(ToolOutput::NotFound, ToolOutput::Product))
    }

    async fn get_order_details(
        &self,
        params: &OrderDetailsParams,
    ) -> Result<ToolOutput, RepositoryError> {
        if let Some(supplied) = &params.supplied_user_id {
            debug!(supplied_user_id = %supplied, "Ignoring model-supplied user_id");
        }

        let Some(order_id) = params.order_id else {
            return Ok(ToolOutput::NotFound);
        };

        Ok(self
            .catalog
            .find_order(order_id, self.caller)
            .await?
            .map_or(ToolOutput::NotFound, ToolOutput::Order))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use shopchat_core::{OrderId, ProductId};

    use super::*;
    use crate::db::ProductQuery;
    use crate::models::{OrderSummary, ProductSummary};

    #[derive(Default)]
    struct RecordingCatalog {
        order_lookups: Mutex<Vec<(OrderId, UserId)>>,
        fail: bool,
    }

    #[async_trait]
    impl CatalogLookup for RecordingCatalog {
        async fn find_product(
            &self,
            query: &ProductQuery,
        ) -> Result<Option<ProductSummary>, RepositoryError> {
            if self.fail {
                return Err(RepositoryError::DataCorruption("boom".to_string()));
            }
            Ok(match query {
                ProductQuery::ById(id) if id.as_i32() == 1 => Some(ProductSummary {
                    product_id: *id,
                    name: "Canvas Tote".to_string(),
                    category: None,
                    brand: None,
                    price: Decimal::new(2500, 2),
                    department: None,
                    sku: None,
                }),
                _ => None,
            })
        }

        async fn find_order(
            &self,
            order_id: OrderId,
            user_id: UserId,
        ) -> Result<Option<OrderSummary>, RepositoryError> {
            self.order_lookups
                .lock()
                .expect("lock")
                .push((order_id, user_id));
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_order_lookup_uses_caller() {
        let catalog = RecordingCatalog::default();
        let executor = ToolExecutor::new(&catalog, UserId::new(1));

        let call = ToolCall::OrderDetails(OrderDetailsParams {
            order_id: Some(OrderId::new(77)),
            supplied_user_id: Some("2".to_string()),
        });
        let output = executor.execute(&call).await.expect("execute");

        assert_eq!(output, ToolOutput::NotFound);
        assert_eq!(
            *catalog.order_lookups.lock().expect("lock"),
            vec![(OrderId::new(77), UserId::new(1))]
        );
    }

    #[tokio::test]
    async fn test_missing_order_id_skips_lookup() {
        let catalog = RecordingCatalog::default();
        let executor = ToolExecutor::new(&catalog, UserId::new(1));

        let output = executor
            .execute(&ToolCall::OrderDetails(OrderDetailsParams::default()))
            .await
            .expect("execute");

        assert_eq!(output, ToolOutput::NotFound);
        assert!(catalog.order_lookups.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_product_found() {
        let catalog = RecordingCatalog::default();
        let executor = ToolExecutor::new(&catalog, UserId::new(1));

        let output = executor
            .execute(&ToolCall::ProductDetails(ProductDetailsParams {
                product_id: Some(ProductId::new(1)),
                product_name: None,
            }))
            .await
            .expect("execute");

        assert!(matches!(output, ToolOutput::Product(p) if p.name == "Canvas Tote"));
    }

    #[tokio::test]
    async fn test_unsupported_is_not_found() {
        let catalog = RecordingCatalog::default();
        let executor = ToolExecutor::new(&catalog, UserId::new(1));

        let output = executor
            .execute(&ToolCall::Unsupported {
                function_name: "cancel_order".to_string(),
            })
            .await
            .expect("execute");

        assert!(output.is_not_found());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let catalog = RecordingCatalog {
            fail: true,
            ..RecordingCatalog::default()
        };
        let executor = ToolExecutor::new(&catalog, UserId::new(1));

        let result = executor
            .execute(&ToolCall::ProductDetails(ProductDetailsParams {
                product_id: None,
                product_name: Some("tote".to_string()),
            }))
            .await;

        assert!(result.is_err());
    }
}
