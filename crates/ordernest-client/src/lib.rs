use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use ordernest_types::domain::order::{CreateOrderRequest, Order, OrderPage, OrderReceipt};
use ordernest_types::domain::user::{Credentials, UserView};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct NestClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
    token: Option<String>,
}

/// Typed client for the `/api/v1` surface. Success envelopes are unwrapped;
/// error bodies come back as [`ApiError`].
#[derive(Clone)]
pub struct NestClient {
    base: Url,
    client: reqwest::Client,
    token: Option<String>,
}

/// Tokens returned by `login`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub jti: String,
}

/// Query for `GET /orders/all`; unset values use the server defaults.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_status: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<u8>,
}

/// A non-2xx answer from the API.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

impl NestClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<NestClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(NestClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
            token: None,
        })
    }

    /// Same connection pool, different caller.
    pub fn with_token(&self, access_token: impl Into<String>) -> Self {
        Self {
            base: self.base.clone(),
            client: self.client.clone(),
            token: Some(access_token.into()),
        }
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub async fn health(&self) -> anyhow::Result<()> {
        self.client
            .get(self.url("health")?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn register(&self, username: &str, password: &str) -> anyhow::Result<UserView> {
        let res = self
            .client
            .post(self.url("api/v1/register")?)
            .json(&credentials(username, password))
            .send()
            .await?;
        required(unwrap_envelope(res).await?)
    }

    pub async fn login(&self, username: &str, password: &str) -> anyhow::Result<TokenBundle> {
        let res = self
            .client
            .post(self.url("api/v1/login")?)
            .json(&credentials(username, password))
            .send()
            .await?;
        let res = check(res).await?;
        Ok(res.json().await?)
    }

    pub async fn logout(&self) -> anyhow::Result<()> {
        let res = self
            .authorized(self.client.get(self.url("api/v1/logout")?))
            .send()
            .await?;
        unwrap_envelope::<serde::de::IgnoredAny>(res).await?;
        Ok(())
    }

    pub async fn create_order(&self, req: &CreateOrderRequest) -> anyhow::Result<OrderReceipt> {
        let res = self
            .authorized(self.client.post(self.url("api/v1/orders")?))
            .json(req)
            .send()
            .await?;
        required(unwrap_envelope(res).await?)
    }

    pub async fn list_orders(&self, query: &ListQuery) -> anyhow::Result<OrderPage> {
        let res = self
            .authorized(self.client.get(self.url("api/v1/orders/all")?))
            .query(query)
            .send()
            .await?;
        required(unwrap_envelope(res).await?)
    }

    pub async fn get_order(&self, consignment_id: &str) -> anyhow::Result<Order> {
        let res = self
            .authorized(
                self.client
                    .get(self.url(&format!("api/v1/orders/{consignment_id}"))?),
            )
            .send()
            .await?;
        required(unwrap_envelope(res).await?)
    }

    pub async fn cancel_order(&self, consignment_id: &str) -> anyhow::Result<()> {
        let res = self
            .authorized(
                self.client
                    .put(self.url(&format!("api/v1/orders/{consignment_id}/cancel"))?),
            )
            .send()
            .await?;
        unwrap_envelope::<serde::de::IgnoredAny>(res).await?;
        Ok(())
    }
}

fn credentials(username: &str, password: &str) -> Credentials {
    Credentials {
        username: username.to_string(),
        password: password.to_string(),
    }
}

async fn check(res: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body: ErrorBody = res.json().await.unwrap_or(ErrorBody {
        message: status.canonical_reason().unwrap_or("request failed").to_string(),
        errors: BTreeMap::new(),
    });
    tracing::debug!(%status, message = %body.message, "api request failed");
    Err(ApiError {
        status,
        message: body.message,
        errors: body.errors,
    }
    .into())
}

async fn unwrap_envelope<T: DeserializeOwned>(res: reqwest::Response) -> anyhow::Result<Option<T>> {
    let envelope: Envelope<T> = check(res).await?.json().await?;
    Ok(envelope.data)
}

fn required<T>(data: Option<T>) -> anyhow::Result<T> {
    data.context("response envelope carried no data")
}

impl NestClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        if header_name == AUTHORIZATION {
            anyhow::bail!("use with_bearer to set the authorization header");
        }
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_bearer(mut self, access_token: impl Into<String>) -> Self {
        self.token = Some(access_token.into());
        self
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<NestClient> {
        if let Some(client) = self.client {
            return Ok(NestClient {
                base: self.base,
                client,
                token: self.token,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(NestClient {
            base: self.base,
            client,
            token: self.token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use ordernest_types::domain::order::OrderStatus;
    use serde_json::json;

    fn sample_order(consignment_id: &str) -> serde_json::Value {
        let now = chrono::Utc::now();
        json!({
            "id": 1,
            "consignment_id": consignment_id,
            "merchant_order_id": "INV-1",
            "recipient_name": "Karim",
            "recipient_address": "Banani",
            "recipient_phone": "01711223344",
            "description": "",
            "instruction": "",
            "amount_to_collect": 1000,
            "delivery_fee": 60.0,
            "cod_fee": 10.0,
            "total_fee": 70.0,
            "promo_discount": 0,
            "discount": 0,
            "order_type_id": 1,
            "order_type": "Delivery",
            "item_type": "Parcel",
            "status": "Pending",
            "transfer_status": 1,
            "archive": 0,
            "created_by": 7,
            "updated_by": 7,
            "created_at": now,
            "updated_at": now,
        })
    }

    #[tokio::test]
    async fn login_returns_the_raw_token_bundle() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/login")
                .json_body(json!({ "username": "shop", "password": "pw" }));
            then.status(200).json_body(json!({
                "access_token": "a",
                "refresh_token": "r",
                "token_type": "Bearer",
                "expires_in": 900,
                "jti": "j",
            }));
        });

        let client = NestClient::new(&server.base_url()).unwrap();
        let bundle = client.login("shop", "pw").await.unwrap();
        assert_eq!(bundle.access_token, "a");
        assert_eq!(bundle.expires_in, 900);
        mock.assert();
    }

    #[tokio::test]
    async fn create_and_get_unwrap_envelopes_and_send_bearer() {
        let server = MockServer::start();
        let consignment_id = uuid::Uuid::new_v4().to_string();

        let create_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/orders")
                .header("authorization", "Bearer tok");
            then.status(201).json_body(json!({
                "message": "Order Created Successfully",
                "type": "success",
                "code": 201,
                "data": {
                    "consignment_id": consignment_id,
                    "merchant_order_id": "INV-1",
                    "order_status": "Pending",
                    "delivery_fee": 60.0
                }
            }));
        });
        let get_mock = server.mock(|when, then| {
            when.method(GET)
                .path(format!("/api/v1/orders/{consignment_id}"))
                .header("authorization", "Bearer tok");
            then.status(200).json_body(json!({
                "message": "Order successfully fetched",
                "type": "success",
                "code": 200,
                "data": sample_order(&consignment_id)
            }));
        });

        let client = NestClient::new(&server.base_url()).unwrap().with_token("tok");
        let receipt = client
            .create_order(&CreateOrderRequest::default())
            .await
            .unwrap();
        assert_eq!(receipt.consignment_id, consignment_id);
        assert_eq!(receipt.order_status, OrderStatus::Pending);

        let order = client.get_order(&consignment_id).await.unwrap();
        assert_eq!(order.total_fee, 70.0);
        assert_eq!(order.created_by, 7);

        create_mock.assert();
        get_mock.assert();
    }

    #[tokio::test]
    async fn list_passes_paging_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/orders/all")
                .query_param("limit", "5")
                .query_param("page", "2");
            then.status(200).json_body(json!({
                "message": "Orders successfully fetched",
                "type": "success",
                "code": 200,
                "data": {
                    "data": [],
                    "total": 6,
                    "current_page": 2,
                    "per_page": 5,
                    "total_in_page": 0,
                    "last_page": 2
                }
            }));
        });

        let client = NestClient::builder(&server.base_url())
            .unwrap()
            .with_bearer("tok")
            .with_timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let page = client
            .list_orders(&ListQuery {
                limit: Some(5),
                page: Some(2),
                ..ListQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 6);
        assert_eq!(page.last_page, 2);
        mock.assert();
    }

    #[tokio::test]
    async fn error_bodies_surface_as_api_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/orders");
            then.status(422).json_body(json!({
                "message": "validation failed",
                "type": "error",
                "code": 422,
                "errors": { "store_id": ["The store id field is required."] }
            }));
        });
        server.mock(|when, then| {
            when.method(httpmock::Method::PUT).path("/api/v1/orders/x/cancel");
            then.status(400).json_body(json!({
                "message": "Unable to cancel order, please contact support",
                "type": "error",
                "code": 400
            }));
        });

        let client = NestClient::new(&server.base_url()).unwrap();
        let err = client
            .create_order(&CreateOrderRequest::default())
            .await
            .unwrap_err();
        let api = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.errors["store_id"].len(), 1);

        let err = client.cancel_order("x").await.unwrap_err();
        let api = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.message, "Unable to cancel order, please contact support");
    }

    #[tokio::test]
    async fn logout_accepts_an_envelope_without_data() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/v1/logout");
            then.status(200).json_body(json!({
                "message": "Successfully logged out",
                "type": "success",
                "code": 200
            }));
        });
        let client = NestClient::new(&server.base_url()).unwrap().with_token("t");
        client.logout().await.unwrap();
        mock.assert();
    }

    #[test]
    fn authorization_must_go_through_with_bearer() {
        let res = NestClient::builder("http://localhost/")
            .unwrap()
            .with_header("Authorization", "Bearer x");
        assert!(res.is_err());
    }
}
