//! In-memory joins and row assembly.
//!
//! Both reports follow the same two-stage shape: fetch parents by window,
//! fetch children by parent reference, then join here by key lookup. A
//! child whose parent is absent from the fetched set is dropped, not an
//! error; the drop count is surfaced so callers can log it.

use std::collections::HashMap;

use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use serde::Serialize;

use crate::errors::ServiceError;
use crate::models::{BatchDoc, ConsignmentDoc, OrderDoc, OrderLineItemDoc};

use super::date_range::epoch_ms_to_date;

/// One output row; both reports share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub order_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub sku: Option<String>,
    pub lot_id: Option<String>,
    pub quantity: Option<i64>,
}

/// Join result: assembled rows plus the number of child records skipped
/// because their parent was absent from the fetched set.
#[derive(Debug)]
pub struct JoinOutcome {
    pub rows: Vec<ReportRow>,
    pub dropped: usize,
}

/// Explodes orders into one row per line item.
///
/// A line item referencing an order outside `orders` (cancelled, outside
/// the window, or simply missing) is skipped.
pub fn outbound_rows(orders: &[OrderDoc], line_items: &[OrderLineItemDoc]) -> JoinOutcome {
    let by_id: HashMap<ObjectId, &OrderDoc> = orders.iter().map(|o| (o.id, o)).collect();

    let mut rows = Vec::with_capacity(line_items.len());
    let mut dropped = 0;
    for item in line_items {
        let Some(order) = by_id.get(&item.order) else {
            dropped += 1;
            continue;
        };
        rows.push(ReportRow {
            order_id: order.order_id.clone(),
            date: order.created_at.and_then(epoch_ms_to_date),
            sku: item.sku.clone(),
            lot_id: item.lot_id.clone(),
            quantity: item.quantity,
        });
    }

    JoinOutcome { rows, dropped }
}

/// Parses the consignment references carried by the batches into native
/// ids for the second fetch.
///
/// Fails on the first value that is not a 24-character hex ObjectId; the
/// whole report aborts rather than emitting partial data.
pub fn consignment_object_ids(batches: &[BatchDoc]) -> Result<Vec<ObjectId>, ServiceError> {
    batches
        .iter()
        .filter_map(|b| b.consignment_id.as_deref())
        .map(|raw| {
            ObjectId::parse_str(raw).map_err(|e| {
                ServiceError::MalformedReference(format!("consignmentId {:?}: {}", raw, e))
            })
        })
        .collect()
}

/// Matches each batch to its consignment by stringified id.
pub fn inbound_rows(batches: &[BatchDoc], consignments: &[ConsignmentDoc]) -> JoinOutcome {
    let by_id: HashMap<String, &ConsignmentDoc> = consignments
        .iter()
        .map(|c| (c.id.to_hex(), c))
        .collect();

    let mut rows = Vec::with_capacity(batches.len());
    let mut dropped = 0;
    for batch in batches {
        let Some(consignment) = batch
            .consignment_id
            .as_ref()
            .and_then(|id| by_id.get(id))
        else {
            dropped += 1;
            continue;
        };
        rows.push(ReportRow {
            order_id: consignment.order_id.clone(),
            date: batch.created_at.and_then(epoch_ms_to_date),
            sku: batch.sku.clone(),
            lot_id: batch.lot_id.clone(),
            quantity: batch.quantity,
        });
    }

    JoinOutcome { rows, dropped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn order(id: ObjectId, order_id: &str, created_ms: i64) -> OrderDoc {
        OrderDoc {
            id,
            order_id: Some(order_id.to_string()),
            created_at: Some(created_ms),
            customer: None,
            warehouse: None,
            order_status: None,
            tenant: None,
        }
    }

    fn line_item(order: ObjectId, sku: &str, lot: &str, quantity: i64) -> OrderLineItemDoc {
        OrderLineItemDoc {
            order,
            sku: Some(sku.to_string()),
            lot_id: Some(lot.to_string()),
            quantity: Some(quantity),
        }
    }

    fn batch(consignment_id: Option<&str>, sku: &str, lot: &str, quantity: i64) -> BatchDoc {
        BatchDoc {
            id: ObjectId::new(),
            sku: Some(sku.to_string()),
            lot_id: Some(lot.to_string()),
            quantity: Some(quantity),
            consignment_id: consignment_id.map(str::to_string),
            status: Some("COMPLETED".to_string()),
            type_of_batch: Some("RECEIVING".to_string()),
            created_at: Some(1_738_368_000_000), // 2025-02-01T00:00:00Z
        }
    }

    #[test]
    fn one_order_one_line_item_one_row() {
        let oid = ObjectId::new();
        let created = Utc
            .with_ymd_and_hms(2025, 2, 1, 8, 30, 0)
            .unwrap()
            .timestamp_millis();
        let outcome = outbound_rows(
            &[order(oid, "O1", created)],
            &[line_item(oid, "S1", "L1", 3)],
        );

        assert_eq!(outcome.dropped, 0);
        assert_eq!(
            outcome.rows,
            vec![ReportRow {
                order_id: Some("O1".to_string()),
                date: chrono::NaiveDate::from_ymd_opt(2025, 2, 1),
                sku: Some("S1".to_string()),
                lot_id: Some("L1".to_string()),
                quantity: Some(3),
            }]
        );
    }

    #[test]
    fn line_item_without_fetched_order_is_dropped() {
        let known = ObjectId::new();
        let unknown = ObjectId::new();
        let outcome = outbound_rows(
            &[order(known, "O1", 1_738_368_000_000)],
            &[
                line_item(known, "S1", "L1", 3),
                line_item(unknown, "S2", "L2", 5),
            ],
        );

        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.dropped, 1);
        assert_eq!(outcome.rows[0].sku.as_deref(), Some("S1"));
    }

    #[test]
    fn join_is_idempotent_over_identical_inputs() {
        let oid = ObjectId::new();
        let orders = vec![order(oid, "O1", 1_738_368_000_000)];
        let items = vec![line_item(oid, "S1", "L1", 3)];

        let first = outbound_rows(&orders, &items);
        let second = outbound_rows(&orders, &items);
        assert_eq!(first.rows, second.rows);
    }

    #[test]
    fn batch_rows_take_order_id_from_the_consignment() {
        let consignment = ConsignmentDoc {
            id: ObjectId::new(),
            order_id: Some("PO-77".to_string()),
        };
        let hex = consignment.id.to_hex();
        let outcome = inbound_rows(&[batch(Some(&hex), "S9", "L9", 12)], &[consignment]);

        assert_eq!(outcome.dropped, 0);
        assert_eq!(outcome.rows.len(), 1);
        let row = &outcome.rows[0];
        assert_eq!(row.order_id.as_deref(), Some("PO-77"));
        assert_eq!(row.sku.as_deref(), Some("S9"));
        assert_eq!(row.quantity, Some(12));
        assert_eq!(row.date, chrono::NaiveDate::from_ymd_opt(2025, 2, 1));
    }

    #[test]
    fn batch_without_fetched_consignment_is_dropped() {
        let other = ConsignmentDoc {
            id: ObjectId::new(),
            order_id: Some("PO-1".to_string()),
        };
        let orphan_hex = ObjectId::new().to_hex();
        let outcome = inbound_rows(&[batch(Some(&orphan_hex), "S1", "L1", 1)], &[other]);

        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.dropped, 1);
    }

    #[test]
    fn malformed_consignment_reference_fails_the_report() {
        let result = consignment_object_ids(&[batch(Some("not-a-hex-object-id!"), "S1", "L1", 1)]);
        match result {
            Err(ServiceError::MalformedReference(msg)) => {
                assert!(msg.contains("consignmentId"));
            }
            other => panic!("expected MalformedReference, got {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn valid_consignment_references_parse() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        let ids = consignment_object_ids(&[
            batch(Some(&a.to_hex()), "S1", "L1", 1),
            batch(Some(&b.to_hex()), "S2", "L2", 2),
        ])
        .unwrap();
        assert_eq!(ids, vec![a, b]);
    }
}
