use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::pricing::compute_fees;
use crate::domain::validation::FieldErrors;

pub const ORDER_TYPE: &str = "Delivery";
pub const ITEM_TYPE: &str = "Parcel";
pub const ORDER_TYPE_ID: i64 = 1;
pub const DELIVERY_TYPE_NORMAL: u32 = 48;
pub const ITEM_TYPE_PARCEL: u32 = 2;

static NATIONAL_MOBILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^01[3-9][0-9]{8}$")
        .unwrap_or_else(|error| panic!("mobile number regex failed to compile: {error}"))
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Canceled => "Canceled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Canceled" => Ok(OrderStatus::Canceled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Merchant payload for a new consignment. Every field is optional on the
/// wire so that a missing field is reported as a validation message rather
/// than a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(required)]
    pub store_id: Option<u64>,
    pub merchant_order_id: Option<String>,
    #[validate(required, length(min = 1, code = "required"))]
    pub recipient_name: Option<String>,
    #[validate(required, regex(path = *NATIONAL_MOBILE, code = "phone"))]
    pub recipient_phone: Option<String>,
    #[validate(required, length(min = 1, code = "required"))]
    pub recipient_address: Option<String>,
    #[validate(required)]
    pub recipient_city: Option<u32>,
    #[validate(required)]
    pub recipient_zone: Option<u32>,
    pub recipient_area: Option<u32>,
    #[validate(required, range(min = 48, max = 48, code = "eq"))]
    pub delivery_type: Option<u32>,
    #[validate(required, range(min = 2, max = 2, code = "eq"))]
    pub item_type: Option<u32>,
    pub special_instruction: Option<String>,
    #[validate(required, range(min = 1, max = 1, code = "eq"))]
    pub item_quantity: Option<u32>,
    #[validate(required, range(exclusive_min = 0.0, max = 200.0))]
    pub item_weight: Option<f64>,
    #[validate(required, range(min = 0))]
    pub amount_to_collect: Option<i64>,
    pub item_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: u64,
    pub consignment_id: String,
    pub merchant_order_id: String,
    pub recipient_name: String,
    pub recipient_address: String,
    pub recipient_phone: String,
    pub description: String,
    pub instruction: String,
    pub amount_to_collect: i64,
    pub delivery_fee: f64,
    pub cod_fee: f64,
    pub total_fee: f64,
    pub promo_discount: i64,
    pub discount: i64,
    pub order_type_id: i64,
    pub order_type: String,
    pub item_type: String,
    pub status: OrderStatus,
    pub transfer_status: u8,
    pub archive: u8,
    pub created_by: u64,
    pub updated_by: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Validates the request and builds a priced, pending order with a fresh
    /// consignment id. The row id stays 0 until the repository assigns one.
    pub fn new(request: CreateOrderRequest, created_by: u64) -> Result<Self, FieldErrors> {
        request.validate().map_err(FieldErrors::from)?;

        let item_weight = request.item_weight.unwrap_or_default();
        let recipient_city = request.recipient_city.unwrap_or_default();
        let amount_to_collect = request.amount_to_collect.unwrap_or_default();
        let fees = compute_fees(item_weight, recipient_city, amount_to_collect);

        let now = Utc::now();
        Ok(Self {
            id: 0,
            consignment_id: Uuid::new_v4().to_string(),
            merchant_order_id: request.merchant_order_id.unwrap_or_default(),
            recipient_name: request.recipient_name.unwrap_or_default(),
            recipient_address: request.recipient_address.unwrap_or_default(),
            recipient_phone: request.recipient_phone.unwrap_or_default(),
            description: request.item_description.unwrap_or_default(),
            instruction: request.special_instruction.unwrap_or_default(),
            amount_to_collect,
            delivery_fee: fees.delivery_fee,
            cod_fee: fees.cod_fee,
            total_fee: fees.total_fee,
            promo_discount: 0,
            discount: 0,
            order_type_id: ORDER_TYPE_ID,
            order_type: ORDER_TYPE.to_string(),
            item_type: ITEM_TYPE.to_string(),
            status: OrderStatus::Pending,
            transfer_status: 1,
            archive: 0,
            created_by,
            updated_by: created_by,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn cancel(&mut self, user_id: u64) {
        self.status = OrderStatus::Canceled;
        self.updated_by = user_id;
        self.updated_at = Utc::now();
    }

    pub fn receipt(&self) -> OrderReceipt {
        OrderReceipt {
            consignment_id: self.consignment_id.clone(),
            merchant_order_id: self.merchant_order_id.clone(),
            order_status: self.status,
            delivery_fee: self.delivery_fee,
        }
    }
}

/// What the caller learns about a freshly persisted order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderReceipt {
    pub consignment_id: String,
    pub merchant_order_id: String,
    pub order_status: OrderStatus,
    pub delivery_fee: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderListFilter {
    pub created_by: u64,
    pub transfer_status: u8,
    pub archive: u8,
    pub limit: i64,
    pub page: i64,
}

impl OrderListFilter {
    pub fn matches(&self, order: &Order) -> bool {
        order.created_by == self.created_by
            && order.transfer_status == self.transfer_status
            && order.archive == self.archive
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderPage {
    pub data: Vec<Order>,
    pub total: u64,
    pub current_page: u64,
    pub per_page: u64,
    pub total_in_page: u64,
    pub last_page: u64,
}
