//! Retrieval engine internals
//!
//! The pipeline reads bottom-up: [`retry`] wraps individual requests,
//! [`paginate`] walks one window's cursor chain, [`chunk`] plans the
//! windows, [`discovery`] finds span endpoints the caller left open,
//! and [`orchestrator`] runs the windows concurrently and reassembles
//! their pages through [`hash`]/[`recency`] dedup and [`sort`].

pub mod chunk;
pub mod discovery;
pub mod hash;
pub mod orchestrator;
pub mod paginate;
pub mod recency;
pub mod retry;
pub mod sort;
pub mod summary;

pub use chunk::{plan_windows, Window};
pub use discovery::BoundaryDiscovery;
pub use orchestrator::{ExportOutcome, ExportRequest, ItemSink, PreferenceExporter, ProgressSink};
pub use paginate::WindowPages;
pub use recency::{RecencySet, DEFAULT_RECENCY_CAPACITY};
pub use retry::{RetryPolicy, TRANSIENT_ERROR_SIGNATURES};
pub use sort::{compare_records, sort_records};
pub use summary::{ExportSummary, ProgressUpdate, WindowError};
