//! Tenant resolution.

use mongodb::bson::doc;
use tracing::info;

use crate::{db::RegionalDatabases, errors::ServiceError};

/// Resolves the identifier of the configured tenant by name equality.
///
/// Runs once at startup; the stringified id scopes every subsequent report
/// query. A missing tenant is a startup failure, not something to retry.
pub async fn resolve_tenant_id(
    db: &RegionalDatabases,
    tenant_name: &str,
) -> Result<String, ServiceError> {
    let tenant = db
        .tenants()
        .find_one(doc! { "name": tenant_name })
        .await?
        .ok_or_else(|| ServiceError::TenantNotFound(tenant_name.to_string()))?;

    let tenant_id = tenant.id.to_hex();
    info!(tenant = tenant_name, tenant_id = %tenant_id, active = tenant.active, "Resolved tenant");

    Ok(tenant_id)
}
