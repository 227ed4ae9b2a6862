//! Dashboard session controller
//!
//! Owns the pager, submitter and display synchronizer. All state changes
//! happen on the owner; network calls run as spawned tasks that only do I/O
//! and post their completion back over a channel. `handle_event` applies
//! completions in arrival order.
//!
//! A new prediction while one is pending cancels and replaces it. The
//! generation counter drops any completion of the replaced submission that
//! was already queued before the abort landed.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::client::ApiClient;
use crate::config::DashboardConfig;
use crate::display::{DisplaySnapshot, DisplaySynchronizer, HistoryTicket};
use crate::error::{DashboardError, Result};
use crate::models::{FilterState, HistoryPage, PredictionForm, PredictionResult, SortOrder};
use crate::observability::{DashboardMetrics, StructuredLogger};
use crate::pager::HistoryPager;
use crate::report::{ChartRenderer, ReportAssembler, ReportRequest};
use crate::service::{HistoryService, PredictionService, ReportService};
use crate::submitter::{PredictionSubmitter, SubmissionDefaults};

/// Capacity of the completion channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The three remote collaborators
#[derive(Clone)]
pub struct Services {
    pub history: Arc<dyn HistoryService>,
    pub prediction: Arc<dyn PredictionService>,
    pub report: Arc<dyn ReportService>,
}

impl Services {
    /// Every collaborator served by one HTTP backend
    pub fn http(client: ApiClient) -> Self {
        let client = Arc::new(client);
        Self {
            history: client.clone(),
            prediction: client.clone(),
            report: client,
        }
    }
}

/// Completion of a network call, posted back to the owner
#[derive(Debug)]
pub enum DashboardEvent {
    HistoryLoaded {
        ticket: HistoryTicket,
        result: Result<HistoryPage>,
    },
    PredictionFinished {
        generation: u64,
        result: Result<PredictionResult>,
    },
}

/// What applying an event changed on screen
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Metrics panel shows a new prediction; a history refresh was issued
    PredictionApplied { refresh: HistoryTicket },
    /// History table and charts show a new page
    HistoryApplied { records: usize },
    /// History page answered a superseded request
    Discarded,
    /// Prediction completion from a cancelled submission
    Superseded,
}

pub struct Dashboard {
    config: DashboardConfig,
    services: Services,
    pager: HistoryPager,
    submitter: PredictionSubmitter,
    sync: DisplaySynchronizer,
    events_tx: mpsc::Sender<DashboardEvent>,
    events_rx: mpsc::Receiver<DashboardEvent>,
    generation: u64,
    pending_prediction: Option<JoinHandle<()>>,
    history_in_flight: usize,
    metrics: DashboardMetrics,
    logger: StructuredLogger,
}

impl Dashboard {
    pub fn new(config: DashboardConfig, services: Services, logger: StructuredLogger) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let submitter = PredictionSubmitter::new(
            services.prediction.clone(),
            SubmissionDefaults::from(&config),
        );
        logger.log_session_start(&config.api_url, config.page_size);

        Self {
            pager: HistoryPager::new(config.page_size),
            sync: DisplaySynchronizer::new(config.currency_symbol.clone()),
            submitter,
            services,
            config,
            events_tx,
            events_rx,
            generation: 0,
            pending_prediction: None,
            history_in_flight: 0,
            metrics: DashboardMetrics::new(),
            logger,
        }
    }

    /// Start from the given filters and sort order. Nothing is fetched.
    pub fn with_view(mut self, filters: FilterState, sort: SortOrder) -> Self {
        self.pager = HistoryPager::new(self.config.page_size).with_view(filters, sort);
        self
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn pager(&self) -> &HistoryPager {
        &self.pager
    }

    pub fn snapshot(&self) -> &DisplaySnapshot {
        self.sync.snapshot()
    }

    pub fn metrics(&self) -> &DashboardMetrics {
        &self.metrics
    }

    /// Calls whose completion has not been handled yet
    pub fn outstanding(&self) -> usize {
        self.history_in_flight + usize::from(self.pending_prediction.is_some())
    }

    pub fn prediction_pending(&self) -> bool {
        self.pending_prediction.is_some()
    }

    // History

    /// Re-fetch the page for the current pager state
    pub fn refresh_history(&mut self) -> HistoryTicket {
        let query = self.pager.refresh();
        self.issue_history(query)
    }

    pub fn set_sort(&mut self, order: SortOrder) -> Option<HistoryTicket> {
        self.pager.set_sort(order).map(|q| self.issue_history(q))
    }

    pub fn set_filters(&mut self, filters: FilterState) -> Option<HistoryTicket> {
        self.pager.set_filters(filters).map(|q| self.issue_history(q))
    }

    pub fn next_page(&mut self) -> Option<HistoryTicket> {
        self.pager.next_page().map(|q| self.issue_history(q))
    }

    pub fn prev_page(&mut self) -> Option<HistoryTicket> {
        self.pager.prev_page().map(|q| self.issue_history(q))
    }

    pub fn go_to_page(&mut self, page: u32) -> Option<HistoryTicket> {
        self.pager.go_to_page(page).map(|q| self.issue_history(q))
    }

    fn issue_history(&mut self, query: crate::query::QueryDescriptor) -> HistoryTicket {
        let ticket = self.sync.begin_history_request(query);
        self.history_in_flight += 1;
        self.metrics.inc_history_refreshes();
        self.logger
            .log_history_requested(ticket.seq(), &ticket.query().to_query_string());

        let service = self.services.history.clone();
        let tx = self.events_tx.clone();
        let metrics = self.metrics.clone();
        let origin = ticket.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let result = service.fetch_page(origin.query()).await;
            metrics.observe_latency("history", started.elapsed().as_secs_f64());
            // Receiver only disappears when the dashboard is dropped
            let _ = tx
                .send(DashboardEvent::HistoryLoaded {
                    ticket: origin,
                    result,
                })
                .await;
        });

        ticket
    }

    // Predictions

    /// Validate the form and issue the prediction. Returns the submission's generation.
    ///
    /// Validation failures return immediately and nothing is sent.
    pub fn submit_prediction(&mut self, form: &PredictionForm) -> Result<u64> {
        let request = self.submitter.validate(form)?;

        if let Some(pending) = self.pending_prediction.take() {
            pending.abort();
            self.metrics.inc_predictions_superseded();
            self.logger.log_prediction_superseded(self.generation);
        }

        self.generation += 1;
        let generation = self.generation;
        self.metrics.inc_predictions_submitted();
        self.logger
            .log_prediction_submitted(generation, request.machine_id.as_deref());

        let submitter = self.submitter.clone();
        let tx = self.events_tx.clone();
        let metrics = self.metrics.clone();
        self.pending_prediction = Some(tokio::spawn(async move {
            let started = Instant::now();
            let result = submitter.send(request).await;
            metrics.observe_latency("prediction", started.elapsed().as_secs_f64());
            let _ = tx
                .send(DashboardEvent::PredictionFinished { generation, result })
                .await;
        }));

        Ok(generation)
    }

    // Completions

    /// Wait for the next completion, or `None` if nothing is outstanding.
    pub async fn next_event(&mut self) -> Option<DashboardEvent> {
        if self.outstanding() == 0 {
            return None;
        }
        self.events_rx.recv().await
    }

    /// Apply one completion to the display.
    ///
    /// `Err` carries a user-visible failure; silent outcomes come back as
    /// `Update::Discarded` or `Update::Superseded`.
    pub fn handle_event(&mut self, event: DashboardEvent) -> Result<Update> {
        match event {
            DashboardEvent::HistoryLoaded { ticket, result } => self.on_history(ticket, result),
            DashboardEvent::PredictionFinished { generation, result } => {
                self.on_prediction(generation, result)
            }
        }
    }

    /// Handle completions until nothing is outstanding, collecting the outcomes.
    pub async fn settle(&mut self) -> Vec<Result<Update>> {
        let mut outcomes = Vec::new();
        while let Some(event) = self.next_event().await {
            outcomes.push(self.handle_event(event));
        }
        outcomes
    }

    fn on_history(&mut self, ticket: HistoryTicket, result: Result<HistoryPage>) -> Result<Update> {
        self.history_in_flight = self.history_in_flight.saturating_sub(1);
        let query = ticket.query().to_query_string();

        match result {
            Ok(page) => {
                let records = page.len();
                match self.sync.apply_history_page(page, &ticket) {
                    Ok(()) => {
                        self.logger.log_history_applied(ticket.seq(), &query, records);
                        Ok(Update::HistoryApplied { records })
                    }
                    Err(e) if e.is_silent() => {
                        self.metrics.inc_stale_responses();
                        self.logger.log_history_stale(ticket.seq(), &query);
                        Ok(Update::Discarded)
                    }
                    Err(e) => Err(e),
                }
            }
            Err(_) if !self.sync.is_current(&ticket) => {
                self.metrics.inc_stale_responses();
                self.logger.log_history_stale(ticket.seq(), &query);
                Ok(Update::Discarded)
            }
            Err(e) => {
                if matches!(e, DashboardError::Transport { .. }) {
                    self.metrics.inc_transport_errors("history");
                }
                self.logger
                    .log_history_failed(ticket.seq(), &query, &e.user_message());
                Err(e)
            }
        }
    }

    fn on_prediction(
        &mut self,
        generation: u64,
        result: Result<PredictionResult>,
    ) -> Result<Update> {
        if generation != self.generation {
            return Ok(Update::Superseded);
        }
        self.pending_prediction = None;

        let outcome = result.and_then(|prediction| {
            self.sync.apply_prediction(&prediction)?;
            Ok(prediction)
        });

        match outcome {
            Ok(prediction) => {
                self.metrics.inc_predictions_succeeded();
                self.logger.log_prediction_applied(
                    generation,
                    prediction.risk_level.as_str(),
                    prediction.health_score,
                );
                let refresh = self.refresh_history();
                Ok(Update::PredictionApplied { refresh })
            }
            Err(e) => {
                match &e {
                    DashboardError::Transport { .. } => {
                        self.metrics.inc_transport_errors("prediction")
                    }
                    _ => self.metrics.inc_predictions_rejected(),
                }
                self.sync.reset_to_placeholder();
                self.logger
                    .log_prediction_failed(generation, e.kind(), &e.user_message());
                Err(e)
            }
        }
    }

    // Reports and exports

    /// Package the current display state. Fails with `ReportNotReady` before charts have data.
    pub fn assemble_report(&self, renderer: &dyn ChartRenderer) -> Result<ReportRequest> {
        ReportAssembler::new(renderer, self.config.currency_symbol.clone())
            .assemble(self.sync.snapshot())
    }

    /// Assemble and send the report; returns the generated document.
    pub async fn download_report(&self, renderer: &dyn ChartRenderer) -> Result<Vec<u8>> {
        let request = self.assemble_report(renderer)?;
        let started = Instant::now();
        let result = self.services.report.download_report(&request).await;
        self.metrics
            .observe_latency("report", started.elapsed().as_secs_f64());

        match result {
            Ok(document) => {
                self.logger.log_report(document.len());
                Ok(document)
            }
            Err(e) => {
                self.metrics.inc_transport_errors("report");
                Err(e)
            }
        }
    }

    /// CSV export of the whole history under the current filters and sort order
    pub async fn export_csv(&self) -> Result<Vec<u8>> {
        let query = self.pager.export_query();
        let result = self.services.history.export_csv(&query).await;
        match result {
            Ok(bytes) => {
                self.logger.log_export(&query.to_query_string(), bytes.len());
                Ok(bytes)
            }
            Err(e) => {
                self.metrics.inc_transport_errors("history");
                Err(e)
            }
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        if let Some(pending) = self.pending_prediction.take() {
            pending.abort();
        }
    }
}
