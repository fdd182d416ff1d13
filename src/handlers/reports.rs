use super::common::{map_service_error, success_response, validate_input};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::reports::{GeneratedReports, ReportOutput},
};
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Most recent generated pair, keyed by its window. Holds at most one
/// entry: requesting a different window replaces it, so changing the dates
/// and re-triggering always regenerates and memory stays bounded.
pub type ReportCache = Arc<DashMap<(NaiveDate, NaiveDate), Arc<GeneratedReports>>>;

/// Stores `reports` as the sole cached entry, discarding any other window.
fn cache_put(
    cache: &ReportCache,
    window: (NaiveDate, NaiveDate),
    reports: Arc<GeneratedReports>,
) {
    cache.retain(|key, _| *key == window);
    cache.insert(window, reports);
}

// Request and response DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct DateRangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateRangeParams {
    /// Resolves the window, falling back to the configured defaults when a
    /// date is omitted. Rejects start > end before any query is issued.
    pub fn resolve(
        &self,
        config: &crate::config::AppConfig,
    ) -> Result<(NaiveDate, NaiveDate), ApiError> {
        let start = parse_date(
            self.start_date
                .as_deref()
                .unwrap_or(&config.default_start_date),
            "start date",
        )?;
        let end = parse_date(
            self.end_date.as_deref().unwrap_or(&config.default_end_date),
            "end date",
        )?;

        if start > end {
            return Err(ApiError::BadRequest {
                message: "Start date must be before end date.".to_string(),
            });
        }

        Ok((start, end))
    }
}

fn parse_date(raw: &str, which: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| ApiError::BadRequest {
        message: format!("Invalid {} format: {}", which, e),
    })
}

/// Both window bounds sit at local midnight, so the inclusive upper bound
/// is midnight of the end date.
fn window_bounds(start: NaiveDate, end: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    (start.and_time(NaiveTime::MIN), end.and_time(NaiveTime::MIN))
}

#[derive(Debug, Serialize)]
struct ReportPreview {
    row_count: usize,
    dropped_rows: usize,
    rows: Vec<crate::reports::ReportRow>,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    start_date: NaiveDate,
    end_date: NaiveDate,
    outbound: ReportPreview,
    inbound: ReportPreview,
}

fn preview(output: &ReportOutput) -> ReportPreview {
    ReportPreview {
        row_count: output.rows.len(),
        dropped_rows: output.dropped,
        rows: output.rows.clone(),
    }
}

/// Returns the cached pair for the window, generating on first use.
async fn reports_for_window(
    state: &AppState,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Arc<GeneratedReports>, ApiError> {
    if let Some(cached) = state.report_cache.get(&(start, end)) {
        return Ok(cached.clone());
    }

    let (start_dt, end_dt) = window_bounds(start, end);
    let generated = state
        .reports
        .generate_all(start_dt, end_dt)
        .await
        .map_err(map_service_error)?;
    let generated = Arc::new(generated);
    cache_put(&state.report_cache, (start, end), generated.clone());

    Ok(generated)
}

// Handler functions

/// Generate (or serve cached) outbound and inbound reports for the window
async fn generate_reports(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Result<Response, ApiError> {
    validate_input(&params)?;
    let (start, end) = params.resolve(&state.config)?;

    let reports = reports_for_window(&state, start, end).await?;
    info!(%start, %end, "Reports ready");

    Ok(success_response(GenerateResponse {
        start_date: start,
        end_date: end,
        outbound: preview(&reports.outbound),
        inbound: preview(&reports.inbound),
    }))
}

/// Outbound preview rows
async fn outbound_preview(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Result<Response, ApiError> {
    validate_input(&params)?;
    let (start, end) = params.resolve(&state.config)?;
    let reports = reports_for_window(&state, start, end).await?;
    Ok(success_response(preview(&reports.outbound)))
}

/// Inbound preview rows
async fn inbound_preview(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Result<Response, ApiError> {
    validate_input(&params)?;
    let (start, end) = params.resolve(&state.config)?;
    let reports = reports_for_window(&state, start, end).await?;
    Ok(success_response(preview(&reports.inbound)))
}

/// Outbound spreadsheet download
async fn download_outbound(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Result<Response, ApiError> {
    validate_input(&params)?;
    let (start, end) = params.resolve(&state.config)?;
    let reports = reports_for_window(&state, start, end).await?;
    Ok(xlsx_attachment(
        "vault-outbound.xlsx",
        reports.outbound.bytes.clone(),
    ))
}

/// Inbound spreadsheet download
async fn download_inbound(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Result<Response, ApiError> {
    validate_input(&params)?;
    let (start, end) = params.resolve(&state.config)?;
    let reports = reports_for_window(&state, start, end).await?;
    Ok(xlsx_attachment(
        "vault-inbound.xlsx",
        reports.inbound.bytes.clone(),
    ))
}

fn xlsx_attachment(filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Creates the router for report endpoints
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", get(generate_reports))
        .route("/outbound", get(outbound_preview))
        .route("/outbound/download", get(download_outbound))
        .route("/inbound", get(inbound_preview))
        .route("/inbound/download", get(download_inbound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, RegionConfig, RegionsConfig};

    fn test_config() -> AppConfig {
        AppConfig {
            port: 8080,
            environment: "test".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            database_name: "platform-production".to_string(),
            tenant_name: "Vault".to_string(),
            customer_id: "64fda3c3823ef77f92d0af36".to_string(),
            warehouse_id: "63f204af4730a6193c250f5c".to_string(),
            default_start_date: "2025-01-30".to_string(),
            default_end_date: "2025-02-19".to_string(),
            regions: RegionsConfig {
                north_america: RegionConfig {
                    aws_region: "us-east-1".to_string(),
                    secret_id: "test-na".to_string(),
                },
                south_east: RegionConfig {
                    aws_region: "ap-southeast-1".to_string(),
                    secret_id: "test-se".to_string(),
                },
            },
        }
    }

    #[test]
    fn omitted_dates_fall_back_to_configured_defaults() {
        let params = DateRangeParams {
            start_date: None,
            end_date: None,
        };
        let (start, end) = params.resolve(&test_config()).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 1, 30).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 2, 19).unwrap());
    }

    #[test]
    fn start_after_end_is_rejected_with_the_dedicated_message() {
        let params = DateRangeParams {
            start_date: Some("2025-03-01".to_string()),
            end_date: Some("2025-02-01".to_string()),
        };
        match params.resolve(&test_config()) {
            Err(ApiError::BadRequest { message }) => {
                assert_eq!(message, "Start date must be before end date.");
            }
            other => panic!("expected BadRequest, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn equal_dates_are_a_valid_window() {
        let params = DateRangeParams {
            start_date: Some("2025-02-01".to_string()),
            end_date: Some("2025-02-01".to_string()),
        };
        assert!(params.resolve(&test_config()).is_ok());
    }

    #[test]
    fn malformed_dates_are_rejected() {
        let params = DateRangeParams {
            start_date: Some("01/30/2025".to_string()),
            end_date: None,
        };
        match params.resolve(&test_config()) {
            Err(ApiError::BadRequest { message }) => {
                assert!(message.contains("Invalid start date format"));
            }
            other => panic!("expected BadRequest, got {:?}", other.map(|_| ())),
        }
    }

    fn empty_reports() -> Arc<GeneratedReports> {
        let blank = || ReportOutput {
            bytes: Vec::new(),
            rows: Vec::new(),
            dropped: 0,
        };
        Arc::new(GeneratedReports {
            outbound: blank(),
            inbound: blank(),
        })
    }

    #[test]
    fn caching_a_new_window_discards_the_previous_one() {
        let cache: ReportCache = Arc::new(DashMap::new());
        let first = (
            NaiveDate::from_ymd_opt(2025, 1, 30).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 19).unwrap(),
        );
        let second = (
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        );

        cache_put(&cache, first, empty_reports());
        assert!(cache.contains_key(&first));

        cache_put(&cache, second, empty_reports());
        assert!(cache.contains_key(&second));
        assert!(!cache.contains_key(&first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn recaching_the_same_window_keeps_a_single_entry() {
        let cache: ReportCache = Arc::new(DashMap::new());
        let window = (
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        );

        cache_put(&cache, window, empty_reports());
        cache_put(&cache, window, empty_reports());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn windows_are_bounded_at_midnight() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 2, 19).unwrap();
        let (start_dt, end_dt) = window_bounds(start, end);
        assert_eq!(start_dt.time(), NaiveTime::MIN);
        assert_eq!(end_dt.time(), NaiveTime::MIN);
        assert_eq!(end_dt.date(), end);
    }
}
