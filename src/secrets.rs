//! Connection-string retrieval from AWS Secrets Manager.
//!
//! Credentials come from the SDK default provider chain (the
//! `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` environment variables in
//! deployment). There are no fallback credentials: any failure here aborts
//! startup.

use aws_config::{BehaviorVersion, Region};
use tracing::info;

use crate::errors::ServiceError;

/// Reads one connection-string secret from the given AWS region.
pub async fn fetch_connection_string(
    aws_region: &str,
    secret_id: &str,
) -> Result<String, ServiceError> {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(aws_region.to_string()))
        .load()
        .await;
    let client = aws_sdk_secretsmanager::Client::new(&sdk_config);

    let value = client
        .get_secret_value()
        .secret_id(secret_id)
        .send()
        .await
        .map_err(|e| {
            ServiceError::SecretsError(format!("failed to read secret in {}: {}", aws_region, e))
        })?;

    // Log the region only; the secret id may embed account details.
    info!(region = aws_region, "Resolved connection-string secret");

    value.secret_string().map(str::to_string).ok_or_else(|| {
        ServiceError::SecretsError(format!("secret in {} has no string payload", aws_region))
    })
}
