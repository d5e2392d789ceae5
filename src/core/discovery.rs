//! Boundary discovery via single-record existence probes
//!
//! The preference service exposes no count or min/max endpoint, so a
//! missing span endpoint has to be found with limit-1 probes asking "is
//! there at least one record before instant X?". The earliest-side
//! search runs in three phases:
//!
//! 1. exponential backward jumps from the newest record's instant
//!    (seed offsets of 1, 7 and 30 days, doubling thereafter) until a
//!    probe comes back empty or the lookback cap is hit,
//! 2. a forward gallop from that empty bound with a geometrically
//!    growing step, capped at 8 iterations,
//! 3. binary tightening of the midpoint until the empty and found
//!    bounds are within a day of each other.
//!
//! An empty result set is a valid terminal state (both endpoints
//! default to the start of today); a probe that fails after retries
//! aborts discovery and surfaces the error.

use crate::adapters::preferences::{PreferenceStore, QueryRequest};
use crate::core::retry::RetryPolicy;
use crate::domain::{ChunkMode, PreferenceFilter, Result};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Backward jump seed offsets, in days, before doubling takes over
const BACKWARD_SEED_DAYS: [i64; 3] = [1, 7, 30];

/// Maximum forward-gallop probes before falling back to binary search
const GALLOP_BUDGET: usize = 8;

/// Truncate an instant to 00:00:00 UTC of its day
pub fn start_of_utc_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(instant)
}

/// Probe-based search for the endpoints of the data span
pub struct BoundaryDiscovery {
    store: Arc<dyn PreferenceStore>,
    retry: RetryPolicy,
    partition: String,
    base_filter: PreferenceFilter,
    mode: ChunkMode,
    max_lookback_days: i64,
}

impl BoundaryDiscovery {
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        retry: RetryPolicy,
        partition: impl Into<String>,
        base_filter: PreferenceFilter,
        mode: ChunkMode,
        max_lookback_days: i64,
    ) -> Self {
        Self {
            store,
            retry,
            partition: partition.into(),
            base_filter,
            mode,
            max_lookback_days: max_lookback_days.max(1),
        }
    }

    /// UTC start-of-day of the earliest instant with data
    ///
    /// Returns the start of today when the service holds no records at
    /// all for this filter.
    pub async fn find_earliest_day_with_data(&self) -> Result<DateTime<Utc>> {
        let Some(anchor) = self.newest_instant().await? else {
            tracing::info!(
                partition = %self.partition,
                "No records found; earliest day defaults to start of today"
            );
            return Ok(start_of_utc_day(Utc::now()));
        };

        let (mut empty, mut found) = self.backward_jump(anchor).await?;
        (empty, found) = self.forward_gallop(empty, found).await?;

        while found - empty > Duration::days(1) {
            let mid = empty + (found - empty) / 2;
            match self.probe_before(mid).await? {
                Some(hit) => found = found.min(hit),
                None => empty = mid,
            }
        }

        let earliest = start_of_utc_day(found);
        tracing::info!(
            partition = %self.partition,
            mode = %self.mode,
            earliest_day = %earliest,
            "Resolved earliest day with data"
        );
        Ok(earliest)
    }

    /// UTC start-of-day of the newest record's instant
    ///
    /// The caller adds one day to obtain an exclusive upper bound.
    /// Defaults to the start of today on an empty result set.
    pub async fn latest_day_with_data(&self) -> Result<DateTime<Utc>> {
        let latest = match self.newest_instant().await? {
            Some(instant) => start_of_utc_day(instant),
            None => start_of_utc_day(Utc::now()),
        };
        tracing::info!(
            partition = %self.partition,
            mode = %self.mode,
            latest_day = %latest,
            "Resolved latest day with data"
        );
        Ok(latest)
    }

    /// Probe backwards from the anchor until a bound with no data
    ///
    /// Returns `(empty, found)`: a bound with no record before it, and
    /// the earliest record instant seen so far. If the lookback cap is
    /// exceeded the capped probe point is accepted as the empty bound
    /// regardless of what the probe returned.
    async fn backward_jump(
        &self,
        anchor: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let mut found = anchor;
        let mut seeds = BACKWARD_SEED_DAYS.iter();
        let mut offset_days = 0;

        loop {
            offset_days = match seeds.next() {
                Some(&seed) => seed,
                None => offset_days * 2,
            };
            let capped = offset_days >= self.max_lookback_days;
            let bound = anchor - Duration::days(offset_days.min(self.max_lookback_days));

            match self.probe_before(bound).await? {
                Some(hit) => {
                    found = found.min(hit);
                    if capped {
                        tracing::debug!(
                            bound = %bound,
                            lookback_days = self.max_lookback_days,
                            "Lookback cap reached; accepting bound as empty"
                        );
                        return Ok((bound, found));
                    }
                }
                None => return Ok((bound, found)),
            }
        }
    }

    /// Advance the empty bound forward with a geometrically growing step
    ///
    /// Bounded to [`GALLOP_BUDGET`] probes so pathological data
    /// densities can't stall discovery; binary tightening finishes the
    /// job afterwards.
    async fn forward_gallop(
        &self,
        mut empty: DateTime<Utc>,
        mut found: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let mut step = ((found - empty) / 64).max(Duration::days(1));

        for _ in 0..GALLOP_BUDGET {
            if found - empty <= Duration::days(1) {
                break;
            }
            let probe_at = (empty + step).min(found);
            match self.probe_before(probe_at).await? {
                Some(hit) => {
                    found = found.min(hit);
                    step = (step / 2).max(Duration::days(1));
                }
                None => {
                    empty = probe_at;
                    step = step * 2;
                }
            }
        }

        Ok((empty, found))
    }

    /// Newest record instant matching the base filter, unbounded
    async fn newest_instant(&self) -> Result<Option<DateTime<Utc>>> {
        let filter = self.base_filter.scoped_to_window(self.mode, None, None);
        let request = QueryRequest::new(1, Some(filter), None);
        let page = self
            .retry
            .execute("newest-anchor probe", || {
                self.store.query(&self.partition, &request)
            })
            .await?;
        Ok(page.nodes.first().map(|r| self.record_instant(r)))
    }

    /// "Is there at least one record before `bound`?" — returns the
    /// hit's own instant when there is
    async fn probe_before(&self, bound: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        let filter = self
            .base_filter
            .scoped_to_window(self.mode, None, Some(bound));
        let request = QueryRequest::new(1, Some(filter), None);
        let page = self
            .retry
            .execute("existence probe", || {
                self.store.query(&self.partition, &request)
            })
            .await?;

        let hit = page.nodes.first().map(|r| self.record_instant(r));
        tracing::trace!(bound = %bound, hit = ?hit, "Existence probe");
        Ok(hit)
    }

    fn record_instant(&self, record: &crate::domain::PreferenceRecord) -> DateTime<Utc> {
        self.mode.instant_of(record).unwrap_or(record.timestamp)
    }
}
