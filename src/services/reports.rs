//! Report generation against the regional databases.

use chrono::NaiveDateTime;
use futures::TryStreamExt;
use mongodb::{bson::doc, Collection};
use tracing::{debug, info, instrument, warn};

use crate::{
    config::AppConfig,
    db::RegionalDatabases,
    errors::ServiceError,
    models::{BatchDoc, ConsignmentDoc, OrderDoc, OrderLineItemDoc},
    reports::{
        date_range::object_id_bounds,
        rows::{consignment_object_ids, inbound_rows, outbound_rows, ReportRow},
        xlsx::{write_workbook, INBOUND_COLUMNS, OUTBOUND_COLUMNS},
    },
};

/// Batch statuses that count as received inventory.
const INBOUND_BATCH_STATUSES: [&str; 3] = ["COMPLETED", "PUTAWAY_STARTED", "PUTAWAY_COMPLETED"];

/// One generated report: the spreadsheet plus its preview rows.
#[derive(Debug)]
pub struct ReportOutput {
    pub bytes: Vec<u8>,
    pub rows: Vec<ReportRow>,
    /// Child records skipped because their parent was absent from the
    /// fetched set.
    pub dropped: usize,
}

/// The outbound/inbound pair for one date window.
#[derive(Debug)]
pub struct GeneratedReports {
    pub outbound: ReportOutput,
    pub inbound: ReportOutput,
}

/// Generates warehouse movement reports for one tenant/customer/warehouse
/// scope. Collections and scope are injected at startup, so the service is
/// testable with substitute connections.
pub struct ReportService {
    tenant_id: String,
    customer_id: String,
    warehouse_id: String,
    orders: Collection<OrderDoc>,
    order_line_items: Collection<OrderLineItemDoc>,
    batches: Collection<BatchDoc>,
    consignments: Collection<ConsignmentDoc>,
}

impl ReportService {
    pub fn new(db: &RegionalDatabases, config: &AppConfig, tenant_id: String) -> Self {
        Self {
            tenant_id,
            customer_id: config.customer_id.clone(),
            warehouse_id: config.warehouse_id.clone(),
            orders: db.orders(),
            order_line_items: db.order_line_items(),
            batches: db.batches(),
            consignments: db.consignments(),
        }
    }

    /// Non-cancelled orders in the window, exploded to one row per line
    /// item. All-or-nothing: any query failure aborts the report.
    #[instrument(skip(self))]
    pub async fn generate_outbound_report(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<ReportOutput, ServiceError> {
        let (start_id, end_id) = object_id_bounds(start, end);

        let orders: Vec<OrderDoc> = self
            .orders
            .find(doc! {
                "tenant": &self.tenant_id,
                "_id": { "$gte": start_id, "$lte": end_id },
                "customer": &self.customer_id,
                "warehouse": &self.warehouse_id,
                "orderStatus": { "$ne": "CANCELLED" },
            })
            .await?
            .try_collect()
            .await?;
        debug!(orders = orders.len(), "Fetched orders in window");

        let order_ids: Vec<_> = orders.iter().map(|o| o.id).collect();
        let line_items: Vec<OrderLineItemDoc> = self
            .order_line_items
            .find(doc! { "order": { "$in": order_ids } })
            .await?
            .try_collect()
            .await?;
        debug!(line_items = line_items.len(), "Fetched order line items");

        let outcome = outbound_rows(&orders, &line_items);
        if outcome.dropped > 0 {
            warn!(
                dropped = outcome.dropped,
                "Skipped line items without a matching fetched order"
            );
        }

        let bytes = write_workbook("Outbound", &OUTBOUND_COLUMNS, &outcome.rows)?;
        info!(rows = outcome.rows.len(), "Generated outbound report");

        Ok(ReportOutput {
            bytes,
            rows: outcome.rows,
            dropped: outcome.dropped,
        })
    }

    /// Received batches in the window matched to their consignments.
    #[instrument(skip(self))]
    pub async fn generate_inbound_report(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<ReportOutput, ServiceError> {
        let (start_id, end_id) = object_id_bounds(start, end);

        let batches: Vec<BatchDoc> = self
            .batches
            .find(doc! {
                "tenant": &self.tenant_id,
                "_id": { "$gte": start_id, "$lte": end_id },
                "customer": &self.customer_id,
                "warehouse": &self.warehouse_id,
                "typeOfBatch": "RECEIVING",
                "status": { "$in": INBOUND_BATCH_STATUSES.to_vec() },
                "consignmentId": { "$ne": null },
            })
            .await?
            .try_collect()
            .await?;
        debug!(batches = batches.len(), "Fetched receiving batches in window");

        let consignment_ids = consignment_object_ids(&batches)?;
        let consignments: Vec<ConsignmentDoc> = self
            .consignments
            .find(doc! {
                "_id": { "$in": consignment_ids },
                "tenant": &self.tenant_id,
                "customer": &self.customer_id,
                "warehouse": &self.warehouse_id,
            })
            .await?
            .try_collect()
            .await?;
        debug!(consignments = consignments.len(), "Fetched consignments");

        let outcome = inbound_rows(&batches, &consignments);
        if outcome.dropped > 0 {
            warn!(
                dropped = outcome.dropped,
                "Skipped batches without a matching fetched consignment"
            );
        }

        let bytes = write_workbook("Inbound", &INBOUND_COLUMNS, &outcome.rows)?;
        info!(rows = outcome.rows.len(), "Generated inbound report");

        Ok(ReportOutput {
            bytes,
            rows: outcome.rows,
            dropped: outcome.dropped,
        })
    }

    /// Generates the full pair for one window.
    #[instrument(skip(self))]
    pub async fn generate_all(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<GeneratedReports, ServiceError> {
        let outbound = self.generate_outbound_report(start, end).await?;
        let inbound = self.generate_inbound_report(start, end).await?;
        Ok(GeneratedReports { outbound, inbound })
    }
}
