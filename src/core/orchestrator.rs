//! Concurrent retrieval orchestrator - the engine's entry point
//!
//! Resolves missing span endpoints through boundary discovery, plans
//! hour-aligned windows, fetches them with bounded parallelism, and
//! reassembles the results into one deterministically ordered,
//! duplicate-free sequence.
//!
//! Workers only fetch; every completed page travels over a channel to
//! this task, which is the single owner of the flush buffer and the
//! recency set. That makes the flush-and-dedup step atomic with respect
//! to interleaved window completions: records reach the output (or the
//! streaming callback) in strict chunk-index order no matter which
//! windows finish first.

use crate::adapters::preferences::PreferenceStore;
use crate::config::HarvestConfig;
use crate::core::chunk::plan_windows;
use crate::core::discovery::BoundaryDiscovery;
use crate::core::hash::record_digest;
use crate::core::paginate::WindowPages;
use crate::core::recency::{RecencySet, DEFAULT_RECENCY_CAPACITY};
use crate::core::retry::RetryPolicy;
use crate::core::sort::sort_records;
use crate::core::summary::{ExportSummary, ProgressUpdate};
use crate::domain::{
    pick_chunk_mode, ChunkMode, HarvestError, PreferenceFilter, PreferenceRecord, Result,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};

/// Callback receiving ordered, deduplicated record batches
pub type ItemSink = Arc<dyn Fn(Vec<PreferenceRecord>) + Send + Sync>;

/// Callback receiving progress snapshots on page and chunk events
pub type ProgressSink = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// One retrieval request
///
/// Only the partition is required; every tuning knob falls back to the
/// configured default.
#[derive(Clone, Default)]
pub struct ExportRequest {
    pub partition: String,
    pub filter: Option<PreferenceFilter>,
    pub page_size: Option<u32>,
    pub window_concurrency: Option<usize>,
    pub max_chunks: Option<usize>,
    pub on_items: Option<ItemSink>,
    pub on_progress: Option<ProgressSink>,
}

impl ExportRequest {
    pub fn new(partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: PreferenceFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_window_concurrency(mut self, concurrency: usize) -> Self {
        self.window_concurrency = Some(concurrency);
        self
    }

    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = Some(max_chunks);
        self
    }

    /// Stream batches to a callback instead of materializing the list
    ///
    /// The returned record list is empty in this mode; batches are
    /// still delivered deduplicated and in chunk order.
    pub fn with_item_sink(mut self, sink: impl Fn(Vec<PreferenceRecord>) + Send + Sync + 'static) -> Self {
        self.on_items = Some(Arc::new(sink));
        self
    }

    pub fn with_progress_sink(
        mut self,
        sink: impl Fn(ProgressUpdate) + Send + Sync + 'static,
    ) -> Self {
        self.on_progress = Some(Arc::new(sink));
        self
    }
}

/// Result of a retrieval: the merged records plus run statistics
#[derive(Debug)]
pub struct ExportOutcome {
    /// Merged, deduplicated, sorted records (empty in streaming mode)
    pub records: Vec<PreferenceRecord>,

    /// Run statistics
    pub summary: ExportSummary,
}

/// Message from a window worker to the flush owner
enum WindowEvent {
    Page {
        index: usize,
        records: Vec<PreferenceRecord>,
    },
    Done {
        index: usize,
    },
    Failed {
        index: usize,
        error: HarvestError,
    },
}

/// Top-level retrieval engine
pub struct PreferenceExporter {
    store: Arc<dyn PreferenceStore>,
    retry: RetryPolicy,
    config: HarvestConfig,
}

impl PreferenceExporter {
    pub fn new(store: Arc<dyn PreferenceStore>, config: HarvestConfig) -> Self {
        let retry = RetryPolicy::new(&config.api.retry);
        Self {
            store,
            retry,
            config,
        }
    }

    /// Run one retrieval
    ///
    /// Any window's unrecoverable error aborts the retrieval unless
    /// `export.continue_on_window_error` is set, in which case the
    /// failed window is skipped and recorded on the summary.
    pub async fn export(&self, request: ExportRequest) -> Result<ExportOutcome> {
        let started = Instant::now();

        // Held constant for the whole retrieval
        let mode = pick_chunk_mode(request.filter.as_ref());
        let base_filter = request.filter.clone().unwrap_or_default();

        let page_size = request.page_size.unwrap_or(self.config.export.page_size);
        let concurrency = request
            .window_concurrency
            .unwrap_or(self.config.export.window_concurrency)
            .max(1);
        let max_chunks = request
            .max_chunks
            .unwrap_or(self.config.export.max_chunks)
            .max(1);

        let (lower, upper) = self
            .resolve_span(&request.partition, &base_filter, mode)
            .await?;
        let windows = plan_windows(lower, upper, max_chunks);

        let mut summary = ExportSummary::new();
        summary.chunks_planned = windows.len();

        tracing::info!(
            partition = %request.partition,
            mode = %mode,
            lower = %lower,
            upper = %upper,
            chunks = windows.len(),
            concurrency = concurrency,
            "Starting preference export"
        );

        if windows.is_empty() {
            let summary = summary.with_duration(started.elapsed());
            summary.log_summary();
            return Ok(ExportOutcome {
                records: Vec::new(),
                summary,
            });
        }

        let (tx, mut rx) = mpsc::channel::<WindowEvent>(concurrency * 4);
        let semaphore = Arc::new(Semaphore::new(concurrency));

        for (index, window) in windows.iter().enumerate() {
            let dispatch = window.dispatch_bounds();
            let filter =
                base_filter.scoped_to_window(mode, Some(dispatch.lower), Some(dispatch.upper));
            let tx = tx.clone();
            let semaphore = semaphore.clone();
            let store = self.store.clone();
            let retry = self.retry.clone();
            let partition = request.partition.clone();

            tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                let mut pages = WindowPages::new(store, retry, partition, Some(filter), page_size);
                loop {
                    match pages.next_page().await {
                        Ok(Some(records)) => {
                            if tx.send(WindowEvent::Page { index, records }).await.is_err() {
                                // Receiver gone; the export was aborted
                                return;
                            }
                        }
                        Ok(None) => {
                            let _ = tx.send(WindowEvent::Done { index }).await;
                            return;
                        }
                        Err(error) => {
                            let _ = tx.send(WindowEvent::Failed { index, error }).await;
                            return;
                        }
                    }
                }
            });
        }
        drop(tx);

        let mut flusher = ChunkFlusher::new(windows.len(), mode, request.on_items.clone());

        while let Some(event) = rx.recv().await {
            match event {
                WindowEvent::Page { index, records } => {
                    summary.records_fetched += records.len();
                    flusher.accept_page(index, records, &mut summary)?;
                    notify_progress(&request.on_progress, &summary);
                }
                WindowEvent::Done { index } => {
                    summary.chunks_completed += 1;
                    tracing::debug!(chunk_index = index, "Window complete");
                    flusher.complete_chunk(index, &mut summary)?;
                    notify_progress(&request.on_progress, &summary);
                }
                WindowEvent::Failed { index, error } => {
                    if self.config.export.continue_on_window_error {
                        tracing::warn!(
                            chunk_index = index,
                            error = %error,
                            "Window failed; skipping its results"
                        );
                        summary.add_window_error(index, error.to_string());
                        flusher.abandon_chunk(index, &mut summary)?;
                        notify_progress(&request.on_progress, &summary);
                    } else {
                        tracing::error!(
                            chunk_index = index,
                            error = %error,
                            "Window failed; aborting export"
                        );
                        return Err(error);
                    }
                }
            }
        }

        let mut records = flusher.into_output();
        sort_records(&mut records, mode);

        let summary = summary.with_duration(started.elapsed());
        summary.log_summary();

        Ok(ExportOutcome { records, summary })
    }

    /// Fill in whichever span endpoints the caller's filter omits
    async fn resolve_span(
        &self,
        partition: &str,
        filter: &PreferenceFilter,
        mode: ChunkMode,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let (after, before) = filter.bounds(mode);
        if let (Some(after), Some(before)) = (after, before) {
            return Ok((after, before));
        }

        let discovery = BoundaryDiscovery::new(
            self.store.clone(),
            self.retry.clone(),
            partition,
            filter.clone(),
            mode,
            self.config.discovery.max_lookback_days,
        );

        let lower = match after {
            Some(after) => after,
            None => discovery.find_earliest_day_with_data().await?,
        };
        // The latest day with data plus one day gives the exclusive
        // upper bound.
        let upper = match before {
            Some(before) => before,
            None => discovery.latest_day_with_data().await? + Duration::days(1),
        };
        Ok((lower, upper))
    }
}

fn notify_progress(sink: &Option<ProgressSink>, summary: &ExportSummary) {
    if let Some(sink) = sink {
        sink(summary.progress());
    }
}

/// Single-owner flush buffer and dedup state
///
/// Pages for the lowest incomplete chunk flush immediately; pages for
/// later chunks wait in per-chunk buffers until every lower-indexed
/// chunk has completed.
struct ChunkFlusher {
    mode: ChunkMode,
    on_items: Option<ItemSink>,
    buffers: Vec<Vec<PreferenceRecord>>,
    done: Vec<bool>,
    next_flush: usize,
    recency: RecencySet,
    output: Vec<PreferenceRecord>,
}

impl ChunkFlusher {
    fn new(chunk_count: usize, mode: ChunkMode, on_items: Option<ItemSink>) -> Self {
        Self {
            mode,
            on_items,
            buffers: (0..chunk_count).map(|_| Vec::new()).collect(),
            done: vec![false; chunk_count],
            next_flush: 0,
            recency: RecencySet::new(DEFAULT_RECENCY_CAPACITY),
            output: Vec::new(),
        }
    }

    fn accept_page(
        &mut self,
        index: usize,
        records: Vec<PreferenceRecord>,
        summary: &mut ExportSummary,
    ) -> Result<()> {
        if index == self.next_flush {
            self.flush_records(records, summary)
        } else {
            self.buffers[index].extend(records);
            Ok(())
        }
    }

    fn complete_chunk(&mut self, index: usize, summary: &mut ExportSummary) -> Result<()> {
        self.done[index] = true;
        self.advance(summary)
    }

    /// Drop a failed chunk's buffered records and let later chunks flush
    fn abandon_chunk(&mut self, index: usize, summary: &mut ExportSummary) -> Result<()> {
        self.buffers[index].clear();
        self.done[index] = true;
        self.advance(summary)
    }

    fn advance(&mut self, summary: &mut ExportSummary) -> Result<()> {
        while self.next_flush < self.done.len() && self.done[self.next_flush] {
            let pending = std::mem::take(&mut self.buffers[self.next_flush]);
            self.flush_records(pending, summary)?;
            self.next_flush += 1;

            // The newly current chunk may already have buffered pages
            if self.next_flush < self.done.len() {
                let pending = std::mem::take(&mut self.buffers[self.next_flush]);
                self.flush_records(pending, summary)?;
            }
        }
        Ok(())
    }

    fn flush_records(
        &mut self,
        records: Vec<PreferenceRecord>,
        summary: &mut ExportSummary,
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut fresh = Vec::with_capacity(records.len());
        for record in records {
            let digest = record_digest(&record)?;
            if self.recency.insert(digest) {
                fresh.push(record);
            } else {
                summary.duplicates_skipped += 1;
            }
        }
        summary.records_flushed += fresh.len();
        if fresh.is_empty() {
            return Ok(());
        }

        match &self.on_items {
            Some(sink) => {
                sort_records(&mut fresh, self.mode);
                sink(fresh);
            }
            None => self.output.extend(fresh),
        }
        Ok(())
    }

    fn into_output(self) -> Vec<PreferenceRecord> {
        self.output
    }
}
