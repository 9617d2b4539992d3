use std::str::FromStr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::auth::AuthUser;
use super::server::AppState;
use crate::application::token_service::TokenBundle;
use crate::errors::AppError;
use ordernest_types::domain::order::{
    CreateOrderRequest, Order, OrderListFilter, OrderPage, OrderReceipt,
};
use ordernest_types::domain::pagination::MAX_PAGE_SIZE;
use ordernest_types::domain::user::{Credentials, UserView};
use ordernest_types::ports::order_repository::OrderRepository;
use ordernest_types::ports::user_repository::UserRepository;

const CANCEL_FAILED: &str = "Unable to cancel order, please contact support";

/// Success body shared by every route except login.
#[derive(Debug, Serialize)]
pub(crate) struct Envelope<T> {
    message: String,
    #[serde(rename = "type")]
    kind: &'static str,
    code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

type Reply<T> = Result<(StatusCode, Json<Envelope<T>>), AppError>;

fn success<T: Serialize>(code: StatusCode, message: &str, data: Option<T>) -> Reply<T> {
    Ok((
        code,
        Json(Envelope {
            message: message.to_string(),
            kind: "success",
            code: code.as_u16(),
            data,
        }),
    ))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "request body rejected");
        AppError::BadRequest("invalid payload".into())
    })
}

pub(crate) async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

pub(crate) async fn register<R>(
    State(state): State<AppState<R>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Reply<UserView>
where
    R: OrderRepository + UserRepository,
{
    let credentials = json_body(payload)?;
    let user = state
        .auth
        .register(&credentials.username, &credentials.password)
        .await?;
    success(
        StatusCode::CREATED,
        "User registered successfully",
        Some(UserView::from(user)),
    )
}

pub(crate) async fn login<R>(
    State(state): State<AppState<R>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<TokenBundle>, AppError>
where
    R: OrderRepository + UserRepository,
{
    let credentials = json_body(payload)?;
    let bundle = state
        .auth
        .login(&credentials.username, &credentials.password)
        .await?;
    Ok(Json(bundle))
}

pub(crate) async fn logout(user: AuthUser) -> Reply<()> {
    tracing::info!(user_id = user.user_id, "logout");
    success(StatusCode::OK, "Successfully logged out", None)
}

pub(crate) async fn create_order<R>(
    State(state): State<AppState<R>>,
    user: AuthUser,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Reply<OrderReceipt>
where
    R: OrderRepository + UserRepository,
{
    let request = json_body(payload)?;
    let receipt = state.orders.create_order(request, user.user_id).await?;
    success(
        StatusCode::CREATED,
        "Order Created Successfully",
        Some(receipt),
    )
}

/// Raw query values; anything unparsable falls back to its default.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    limit: Option<String>,
    page: Option<String>,
    transfer_status: Option<String>,
    archive: Option<String>,
}

fn lenient<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

impl ListParams {
    fn into_filter(self, created_by: u64) -> OrderListFilter {
        OrderListFilter {
            created_by,
            // Defaults to 1 so new orders are listed; older query parsing used 0.
            transfer_status: lenient(self.transfer_status.as_deref(), 1),
            archive: lenient(self.archive.as_deref(), 0),
            limit: lenient(self.limit.as_deref(), MAX_PAGE_SIZE),
            page: lenient(self.page.as_deref(), 1),
        }
    }
}

pub(crate) async fn list_orders<R>(
    State(state): State<AppState<R>>,
    user: AuthUser,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Reply<OrderPage>
where
    R: OrderRepository + UserRepository,
{
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let page = state
        .orders
        .list_orders(params.into_filter(user.user_id))
        .await?;
    success(StatusCode::OK, "Orders successfully fetched", Some(page))
}

pub(crate) async fn get_order<R>(
    State(state): State<AppState<R>>,
    _user: AuthUser,
    Path(consignment_id): Path<String>,
) -> Reply<Order>
where
    R: OrderRepository + UserRepository,
{
    let order = state.orders.get_order(&consignment_id).await?;
    success(StatusCode::OK, "Order successfully fetched", Some(order))
}

pub(crate) async fn cancel_order<R>(
    State(state): State<AppState<R>>,
    user: AuthUser,
    Path(consignment_id): Path<String>,
) -> Reply<()>
where
    R: OrderRepository + UserRepository,
{
    state
        .orders
        .cancel_order(&consignment_id, user.user_id)
        .await
        .map_err(|e| {
            tracing::warn!(%consignment_id, error = %e, "cancel order failed");
            AppError::BadRequest(CANCEL_FAILED.into())
        })?;
    success(StatusCode::OK, "Order Cancelled Successfully", None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn params(limit: &str, page: &str, transfer: &str, archive: &str) -> ListParams {
        ListParams {
            limit: Some(limit.into()),
            page: Some(page.into()),
            transfer_status: Some(transfer.into()),
            archive: Some(archive.into()),
        }
    }

    #[test]
    fn missing_params_take_defaults() {
        let filter = ListParams::default().into_filter(7);
        assert_eq!(
            filter,
            OrderListFilter {
                created_by: 7,
                transfer_status: 1,
                archive: 0,
                limit: 10,
                page: 1,
            }
        );
    }

    #[rstest]
    #[case(params("5", "2", "0", "1"), 5, 2, 0, 1)]
    #[case(params("abc", "x", "-1", "300"), 10, 1, 1, 0)]
    #[case(params(" 3 ", "", "1", "0"), 3, 1, 1, 0)]
    #[case(params("-4", "-9", "1", "0"), -4, -9, 1, 0)]
    fn values_parse_leniently(
        #[case] raw: ListParams,
        #[case] limit: i64,
        #[case] page: i64,
        #[case] transfer_status: u8,
        #[case] archive: u8,
    ) {
        let filter = raw.into_filter(1);
        assert_eq!(filter.limit, limit);
        assert_eq!(filter.page, page);
        assert_eq!(filter.transfer_status, transfer_status);
        assert_eq!(filter.archive, archive);
    }

    #[test]
    fn envelope_omits_absent_data() {
        let (code, Json(body)) = success::<()>(StatusCode::OK, "done", None).unwrap();
        assert_eq!(code, StatusCode::OK);
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "message": "done", "type": "success", "code": 200 })
        );
    }
}
