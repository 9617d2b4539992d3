use crate::errors::AppError;
use ordernest_types::domain::order::{
    CreateOrderRequest, Order, OrderListFilter, OrderPage, OrderReceipt,
};
use ordernest_types::domain::pagination::Pagination;
use ordernest_types::ports::order_repository::{OrderRepository, RepoError};

pub struct OrderService<R: OrderRepository> {
    repo: R,
}

fn internal(e: RepoError) -> AppError {
    AppError::Internal(anyhow::anyhow!(e.to_string()))
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
        created_by: u64,
    ) -> Result<OrderReceipt, AppError> {
        tracing::info!(created_by, "create order request received");
        if created_by == 0 {
            tracing::warn!("create order rejected: no acting user");
            return Err(AppError::Unauthenticated);
        }

        let order = Order::new(request, created_by).map_err(|fields| {
            tracing::warn!(created_by, fields = fields.len(), "create order validation failed");
            AppError::Validation(fields)
        })?;

        let receipt = self.repo.create(order).await.map_err(|e| {
            tracing::error!(error = %e, "order repository create failed");
            internal(e)
        })?;
        tracing::info!(consignment_id = %receipt.consignment_id, "order created");
        Ok(receipt)
    }

    pub async fn get_order(&self, consignment_id: &str) -> Result<Order, AppError> {
        match self.repo.get(consignment_id).await.map_err(internal)? {
            Some(o) => Ok(o),
            None => Err(AppError::NotFound(format!("order {}", consignment_id))),
        }
    }

    /// Moves the order to Canceled. Cancelling an already canceled order
    /// succeeds again.
    pub async fn cancel_order(&self, consignment_id: &str, user_id: u64) -> Result<(), AppError> {
        tracing::info!(consignment_id, user_id, "cancel order request received");
        match self.repo.cancel(consignment_id, user_id).await {
            Ok(()) => {
                tracing::info!(consignment_id, "order canceled");
                Ok(())
            }
            Err(RepoError::NotFound) => {
                tracing::warn!(consignment_id, "cancel requested for unknown order");
                Err(AppError::NotFound(format!("order {}", consignment_id)))
            }
            Err(e) => {
                tracing::error!(error = %e, "order repository cancel failed");
                Err(internal(e))
            }
        }
    }

    pub async fn list_orders(&self, filter: OrderListFilter) -> Result<OrderPage, AppError> {
        let page = Pagination::normalize(filter.limit, filter.page);
        tracing::info!(
            created_by = filter.created_by,
            transfer_status = filter.transfer_status,
            archive = filter.archive,
            limit = page.limit,
            page = page.page,
            "list orders request received"
        );

        let (data, total) = self.repo.list(&filter, &page).await.map_err(|e| {
            tracing::error!(error = %e, "order repository list failed");
            internal(e)
        })?;

        let result = OrderPage {
            total_in_page: data.len() as u64,
            data,
            total,
            current_page: page.page as u64,
            per_page: page.limit as u64,
            last_page: page.total_pages(total),
        };
        tracing::info!(total, "list orders success");
        Ok(result)
    }
}
