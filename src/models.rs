//! Read-only document models for the collections the reports consume.
//!
//! Nothing here is ever written back; every struct is a snapshot of a
//! stored document at query time. Fields the source documents sometimes
//! omit are optional, and unknown fields are ignored.

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A customer-organization partition within the shared schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

/// An outbound order. The `_id` encodes creation time, which is what the
/// report window range queries rely on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(rename = "orderId", default)]
    pub order_id: Option<String>,
    /// Millisecond Unix epoch.
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(rename = "orderStatus", default)]
    pub order_status: Option<String>,
    #[serde(default)]
    pub tenant: Option<String>,
}

/// One line of an order; `order` references the parent's `_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineItemDoc {
    pub order: ObjectId,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(rename = "lotId", default)]
    pub lot_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// A unit of received inventory. `consignmentId` is stored as a hex
/// string, not a native ObjectId.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(rename = "lotId", default)]
    pub lot_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(rename = "consignmentId", default)]
    pub consignment_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "typeOfBatch", default)]
    pub type_of_batch: Option<String>,
    /// Millisecond Unix epoch.
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<i64>,
}

/// A received-goods record grouping one or more batches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsignmentDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(rename = "orderId", default)]
    pub order_id: Option<String>,
}
