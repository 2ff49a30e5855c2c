//! Sales and purchase order headers with their line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "sales_order_status")]
pub enum SalesOrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
}

impl SalesOrderStatus {
    /// Statuses that still await fulfilment.
    pub const OPEN: [SalesOrderStatus; 2] = [SalesOrderStatus::Pending, SalesOrderStatus::Confirmed];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "purchase_order_status")]
pub enum PurchaseOrderStatus {
    Ordered,
    Received,
    Cancelled,
}

/// Sales order header row.
#[derive(Debug, Clone, FromRow)]
pub struct SalesOrder {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub order_date: DateTime<Utc>,
    pub status: SalesOrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sales order line item. `material_id` is a soft reference and may dangle.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderItem {
    #[serde(skip)]
    pub sales_order_id: Uuid,
    #[serde(rename = "material")]
    pub material_id: Uuid,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Purchase order header row.
#[derive(Debug, Clone, FromRow)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub order_date: DateTime<Utc>,
    pub status: PurchaseOrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Purchase order line item.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderItem {
    #[serde(skip)]
    pub purchase_order_id: Uuid,
    #[serde(rename = "material")]
    pub material_id: Uuid,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
}
