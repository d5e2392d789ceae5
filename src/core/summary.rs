//! Export summary and progress reporting

use std::time::Duration;

/// Point-in-time progress of a running retrieval
///
/// Delivered to the optional progress callback on every page and every
/// chunk completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Windows planned for this retrieval
    pub chunks_planned: usize,

    /// Windows fully fetched so far
    pub chunks_completed: usize,

    /// Records fetched from the service, before dedup
    pub records_fetched: usize,

    /// Records emitted to the output, after dedup
    pub records_flushed: usize,
}

/// Error recorded for a window that failed after retries
///
/// Only present on the summary when `continue_on_window_error` is set;
/// otherwise the first window failure aborts the retrieval.
#[derive(Debug, Clone)]
pub struct WindowError {
    /// Index of the failed chunk in the plan
    pub chunk_index: usize,

    /// Error message
    pub message: String,
}

/// Summary of a completed retrieval
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// Windows the span was partitioned into
    pub chunks_planned: usize,

    /// Windows fully fetched
    pub chunks_completed: usize,

    /// Records fetched from the service, before dedup
    pub records_fetched: usize,

    /// Records emitted after dedup
    pub records_flushed: usize,

    /// Duplicates dropped by the recency set
    pub duplicates_skipped: usize,

    /// Duration of the retrieval
    pub duration: Duration,

    /// Windows skipped due to errors
    pub window_errors: Vec<WindowError>,
}

impl ExportSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record a skipped window
    pub fn add_window_error(&mut self, chunk_index: usize, message: String) {
        self.window_errors.push(WindowError {
            chunk_index,
            message,
        });
    }

    /// Whether every planned window was fetched
    pub fn is_complete(&self) -> bool {
        self.window_errors.is_empty() && self.chunks_completed == self.chunks_planned
    }

    /// Current progress snapshot
    pub fn progress(&self) -> ProgressUpdate {
        ProgressUpdate {
            chunks_planned: self.chunks_planned,
            chunks_completed: self.chunks_completed,
            records_fetched: self.records_fetched,
            records_flushed: self.records_flushed,
        }
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            chunks_planned = self.chunks_planned,
            chunks_completed = self.chunks_completed,
            records_fetched = self.records_fetched,
            records_flushed = self.records_flushed,
            duplicates_skipped = self.duplicates_skipped,
            duration_secs = self.duration.as_secs(),
            "Export completed"
        );

        if !self.window_errors.is_empty() {
            tracing::warn!(
                error_count = self.window_errors.len(),
                "Export completed with skipped windows"
            );
            for error in &self.window_errors {
                tracing::warn!(
                    chunk_index = error.chunk_index,
                    message = %error.message,
                    "Skipped window"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_starts_empty() {
        let summary = ExportSummary::new();
        assert_eq!(summary.chunks_planned, 0);
        assert_eq!(summary.records_flushed, 0);
        assert!(summary.window_errors.is_empty());
        assert!(summary.is_complete());
    }

    #[test]
    fn test_is_complete_requires_all_chunks() {
        let mut summary = ExportSummary::new();
        summary.chunks_planned = 3;
        summary.chunks_completed = 2;
        assert!(!summary.is_complete());

        summary.chunks_completed = 3;
        assert!(summary.is_complete());

        summary.add_window_error(1, "ETIMEDOUT".to_string());
        assert!(!summary.is_complete());
    }

    #[test]
    fn test_progress_snapshot_mirrors_counters() {
        let mut summary = ExportSummary::new();
        summary.chunks_planned = 4;
        summary.chunks_completed = 1;
        summary.records_fetched = 120;
        summary.records_flushed = 100;

        let progress = summary.progress();
        assert_eq!(progress.chunks_planned, 4);
        assert_eq!(progress.chunks_completed, 1);
        assert_eq!(progress.records_fetched, 120);
        assert_eq!(progress.records_flushed, 100);
    }

    #[test]
    fn test_with_duration() {
        let summary = ExportSummary::new().with_duration(Duration::from_secs(42));
        assert_eq!(summary.duration, Duration::from_secs(42));
    }
}
