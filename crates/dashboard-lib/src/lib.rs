//! Client-side state synchronization for the predictive-maintenance dashboard
//!
//! This crate provides:
//! - Canonical history queries built from filter, sort and page state
//! - Parameter form validation and prediction submission
//! - A display synchronizer that keeps stale responses off the screen
//! - Report assembly from the current display state
//! - HTTP clients for the history, prediction and report services

pub mod client;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod models;
pub mod observability;
pub mod pager;
pub mod query;
pub mod report;
pub mod service;
pub mod submitter;


pub use client::ApiClient;
pub use config::DashboardConfig;
pub use dashboard::{Dashboard, DashboardEvent, Services, Update};
pub use display::{
    ChartSeries, DisplaySnapshot, DisplaySynchronizer, HistoryTicket, MetricsPanel, RiskColor,
};
pub use error::DashboardError;
pub use models::*;
pub use observability::{DashboardMetrics, StructuredLogger};
pub use pager::HistoryPager;
pub use query::QueryDescriptor;
pub use report::{ChartRenderer, ReportAssembler, ReportRequest, SvgChartRenderer};
pub use submitter::{PredictionSubmitter, SubmissionDefaults};
