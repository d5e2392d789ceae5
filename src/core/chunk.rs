//! Window planning over a resolved time span
//!
//! Splits a `[lower, upper)` span on the active dimension into up to
//! `max_chunks` windows. Window starts are snapped to the top of the
//! hour and the chunk span is a whole number of hours, so every edge
//! except the truncated final upper bound stays hour-aligned.

use chrono::{DateTime, Duration, Timelike, Utc};

const HOUR_MS: i64 = 3_600_000;

/// A half-open `[lower, upper)` sub-range of the active dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub lower: DateTime<Utc>,
    pub upper: DateTime<Utc>,
}

impl Window {
    /// The bounds to actually dispatch for this window
    ///
    /// The service's `before` bound matches the boundary instant
    /// itself, so the planned upper bound is pulled back by 1ms to keep
    /// two adjacent windows from both matching a record sitting exactly
    /// on their shared edge. If that would invert the window the upper
    /// bound is clamped to the lower one, leaving a degenerate but
    /// well-formed empty window.
    pub fn dispatch_bounds(&self) -> Window {
        let upper = self.upper - Duration::milliseconds(1);
        Window {
            lower: self.lower,
            upper: upper.max(self.lower),
        }
    }
}

/// Truncate an instant to the top of its hour
pub fn snap_to_hour(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(instant)
}

/// Partition `[lower, upper)` into at most `max_chunks`-sized windows
///
/// The chunk span is `max(1 hour, ceil(total / max_chunks))` rounded up
/// to whole hours; the first window starts at the hour-snapped lower
/// bound, so the plan may contain one more window than `max_chunks`.
/// The final window is truncated at `upper`. A zero-width span plans
/// zero windows.
pub fn plan_windows(
    lower: DateTime<Utc>,
    upper: DateTime<Utc>,
    max_chunks: usize,
) -> Vec<Window> {
    if upper <= lower {
        return Vec::new();
    }
    let max_chunks = max_chunks.max(1) as i64;

    let total_ms = (upper - lower).num_milliseconds();
    let per_chunk_ms = (total_ms + max_chunks - 1) / max_chunks;
    let span_hours = ((per_chunk_ms + HOUR_MS - 1) / HOUR_MS).max(1);
    let span = Duration::milliseconds(span_hours * HOUR_MS);

    let mut windows = Vec::new();
    let mut cursor = snap_to_hour(lower);
    while cursor < upper {
        let end = (cursor + span).min(upper);
        windows.push(Window {
            lower: cursor,
            upper: end,
        });
        cursor = end;
    }

    tracing::debug!(
        lower = %lower,
        upper = %upper,
        window_count = windows.len(),
        span_hours = span_hours,
        "Planned retrieval windows"
    );

    windows
}
