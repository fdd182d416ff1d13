//! Vault Reports API Library
//!
//! Generates outbound and inbound warehouse movement reports for one
//! tenant/customer/warehouse scope over a caller-selected date window,
//! serving each as a downloadable spreadsheet plus a JSON preview.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod reports;
pub mod secrets;
pub mod services;
pub mod tenant;

use std::sync::Arc;

use axum::Router;
use dashmap::DashMap;

use crate::handlers::reports::ReportCache;

/// Shared application state: immutable configuration and the startup-built
/// context (connections, resolved tenant scope) every handler closes over.
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub db: Arc<db::RegionalDatabases>,
    pub reports: Arc<services::reports::ReportService>,
    pub report_cache: ReportCache,
}

impl AppState {
    pub fn new(
        config: config::AppConfig,
        db: Arc<db::RegionalDatabases>,
        reports: Arc<services::reports::ReportService>,
    ) -> Self {
        Self {
            config,
            db,
            reports,
            report_cache: Arc::new(DashMap::new()),
        }
    }
}

/// Versioned API surface: report generation, previews, downloads.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new().nest("/reports", handlers::reports::report_routes())
}
