//! Regional database connections.
//!
//! Both regions serve the same schema under one logical database name.
//! Clients are opened once at startup and shared for the process lifetime;
//! report generation is read-only and idempotent, so the handles need no
//! coordination.

use mongodb::{bson::doc, Client, Collection, Database};
use tracing::info;

use crate::{
    config::AppConfig,
    errors::ServiceError,
    models::{BatchDoc, ConsignmentDoc, OrderDoc, OrderLineItemDoc, TenantDoc},
    secrets,
};

/// The two regional deployments of the shared schema.
pub struct RegionalDatabases {
    north_america: Database,
    south_east: Database,
}

impl RegionalDatabases {
    /// Resolves both connection strings from the secret store and opens one
    /// client per region.
    pub async fn connect(config: &AppConfig) -> Result<Self, ServiceError> {
        let na = &config.regions.north_america;
        let se = &config.regions.south_east;

        let na_uri = secrets::fetch_connection_string(&na.aws_region, &na.secret_id).await?;
        let se_uri = secrets::fetch_connection_string(&se.aws_region, &se.secret_id).await?;

        let north_america_client = Client::with_uri_str(&na_uri).await?;
        let south_east_client = Client::with_uri_str(&se_uri).await?;

        info!(database = %config.database_name, "Opened regional database connections");

        Ok(Self::from_clients(
            north_america_client,
            south_east_client,
            &config.database_name,
        ))
    }

    /// Builds the pair from already-constructed clients. Used by tests to
    /// substitute connections without touching the secret store.
    pub fn from_clients(north_america: Client, south_east: Client, database_name: &str) -> Self {
        Self {
            north_america: north_america.database(database_name),
            south_east: south_east.database(database_name),
        }
    }

    /// Tenants live in the north-america region only.
    pub fn tenants(&self) -> Collection<TenantDoc> {
        self.north_america.collection("tenants")
    }

    pub fn orders(&self) -> Collection<OrderDoc> {
        self.south_east.collection("orders")
    }

    pub fn order_line_items(&self) -> Collection<OrderLineItemDoc> {
        self.south_east.collection("orderlineitems")
    }

    pub fn consignments(&self) -> Collection<ConsignmentDoc> {
        self.south_east.collection("consignments")
    }

    pub fn batches(&self) -> Collection<BatchDoc> {
        self.south_east.collection("batches")
    }

    /// Pings both regions; used by the readiness probe.
    pub async fn check_connection(&self) -> Result<(), ServiceError> {
        self.north_america.run_command(doc! { "ping": 1 }).await?;
        self.south_east.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
