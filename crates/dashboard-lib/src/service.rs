//! Collaborator boundaries: the three remote services the dashboard talks to

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{HistoryPage, PredictionReply, PredictionRequest};
use crate::query::QueryDescriptor;
use crate::report::ReportRequest;

/// Read access to past predictions (`GET /history`)
#[async_trait]
pub trait HistoryService: Send + Sync {
    /// Fetch one page. An out-of-range page yields an empty page, not an error.
    async fn fetch_page(&self, query: &QueryDescriptor) -> Result<HistoryPage>;

    /// Fetch the CSV export for an export descriptor
    async fn export_csv(&self, query: &QueryDescriptor) -> Result<Vec<u8>>;
}

/// The prediction model behind `POST /predict`
#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionReply>;
}

/// Server-side document generation behind `POST /download-report`
#[async_trait]
pub trait ReportService: Send + Sync {
    async fn download_report(&self, request: &ReportRequest) -> Result<Vec<u8>>;
}
