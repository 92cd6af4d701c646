//! Ops Reports Module Implementation
//!
//! The public API is defined in `ops-reports-sdk` and re-exported here.

pub use ops_reports_sdk::{
    CallVolumeReport, InactivityReport, InactivityRequest, OpsReportsApi, OpsReportsError,
    ProductivityReport, ProductivityRequest, Table,
};

pub mod module;
pub use module::OpsReportsModule;

pub mod config;
pub use config::OpsReportsConfig;

pub mod local_client;

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
