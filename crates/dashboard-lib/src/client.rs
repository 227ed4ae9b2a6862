//! HTTP client for the history, prediction and report services

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::models::{HistoryPage, PredictionReply, PredictionRequest, PredictionResponse};
use crate::query::QueryDescriptor;
use crate::report::ReportRequest;
use crate::service::{HistoryService, PredictionService, ReportService};

const HISTORY: &str = "history";
const PREDICTION: &str = "prediction";
const REPORT: &str = "report";

/// reqwest-backed implementation of every service collaborator
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let mut base_url = Url::parse(base_url).context("Invalid API URL")?;
        // Url::join replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &DashboardConfig) -> anyhow::Result<Self> {
        Self::new(
            &config.api_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, service: &'static str, path: &str, query: Option<&QueryDescriptor>) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| DashboardError::transport(service, e))?;
        if let Some(query) = query {
            let encoded = query.to_query_string();
            url.set_query(Some(encoded.trim_start_matches('?')));
        }
        Ok(url)
    }

    async fn check(service: &'static str, response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(DashboardError::transport(
            service,
            format!("API error ({}): {}", status, body),
        ))
    }

    async fn get_json<T: DeserializeOwned>(&self, service: &'static str, url: Url) -> Result<T> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DashboardError::transport(service, e))?;
        let response = Self::check(service, response).await?;
        response
            .json()
            .await
            .map_err(|e| DashboardError::transport(service, format!("Failed to parse response: {}", e)))
    }

    async fn get_bytes(&self, service: &'static str, url: Url) -> Result<Vec<u8>> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DashboardError::transport(service, e))?;
        let response = Self::check(service, response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| DashboardError::transport(service, e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl HistoryService for ApiClient {
    async fn fetch_page(&self, query: &QueryDescriptor) -> Result<HistoryPage> {
        let url = self.url(HISTORY, "history", Some(query))?;
        self.get_json(HISTORY, url).await
    }

    async fn export_csv(&self, query: &QueryDescriptor) -> Result<Vec<u8>> {
        let url = self.url(HISTORY, "history", Some(query))?;
        self.get_bytes(HISTORY, url).await
    }
}

#[async_trait]
impl PredictionService for ApiClient {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionReply> {
        let url = self.url(PREDICTION, "predict", None)?;
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| DashboardError::transport(PREDICTION, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DashboardError::transport(PREDICTION, e))?;

        // Domain rejections may come back with a 4xx status and an `error` body
        match serde_json::from_str::<PredictionResponse>(&body) {
            Ok(parsed) if parsed.error.is_some() => Ok(PredictionReply::from(parsed)),
            Ok(parsed) if status.is_success() => Ok(PredictionReply::Accepted(parsed)),
            Ok(_) => Err(DashboardError::transport(
                PREDICTION,
                format!("API error ({}): {}", status, body),
            )),
            Err(e) if status.is_success() => Err(DashboardError::transport(
                PREDICTION,
                format!("Failed to parse response: {}", e),
            )),
            Err(_) => Err(DashboardError::transport(
                PREDICTION,
                format!("API error ({}): {}", status, body),
            )),
        }
    }
}

#[async_trait]
impl ReportService for ApiClient {
    async fn download_report(&self, request: &ReportRequest) -> Result<Vec<u8>> {
        let url = self.url(REPORT, "download-report", None)?;
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| DashboardError::transport(REPORT, e))?;
        let response = Self::check(REPORT, response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| DashboardError::transport(REPORT, e))?;
        Ok(bytes.to_vec())
    }
}
