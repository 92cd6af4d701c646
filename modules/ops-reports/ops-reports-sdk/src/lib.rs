//! Ops Reports SDK
//!
//! This crate provides the public contract of the ops-reports module:
//! - `OpsReportsApi` trait implemented by the module's local client
//! - Report and request models (`CallVolumeReport`, `InactivityReport`, `ProductivityReport`, ...)
//! - Error type (`OpsReportsError`)
//!
//! ```ignore
//! let api: Arc<dyn OpsReportsApi> = ops_reports::OpsReportsModule::init(config)?.client();
//! let report = api.inactivity_report(InactivityRequest { .. }).await?;
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod errors;
pub mod models;

pub use api::OpsReportsApi;
pub use errors::OpsReportsError;
pub use models::{
    CallVolumeReport, CallVolumeRow, CellValue, InactiveUser, InactivityReport,
    InactivityRequest, ProductivityReport, ProductivityRequest, ProductivitySummary, Ratio, Table,
    UserStats,
};
