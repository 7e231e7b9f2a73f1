//! Abstract row store trait.
//!
//! Implemented by [`MemoryRowStore`](crate::MemoryRowStore) in-process and by
//! whatever columnar backend a deployment plugs in. All operations look
//! synchronous but may be long-running I/O; callers own their timeouts.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use rowvid_protocol::error::StoreError;
use rowvid_protocol::metadata::AggregateMetadata;
use rowvid_protocol::record::RowValues;
use rowvid_protocol::types::VideoId;

/// Metrics tracked by a store implementation.
pub struct StoreMetrics {
    pub appends: AtomicU64,
    pub rows_appended: AtomicU64,
    pub queries: AtomicU64,
    pub failures: AtomicU64,
}

impl StoreMetrics {
    /// Create new zeroed metrics.
    pub fn new() -> Self {
        Self {
            appends: AtomicU64::new(0),
            rows_appended: AtomicU64::new(0),
            queries: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Record a bulk append.
    pub fn record_append(&self, rows: usize) {
        self.appends.fetch_add(1, Ordering::Relaxed);
        self.rows_appended.fetch_add(rows as u64, Ordering::Relaxed);
    }

    /// Record a query of any kind.
    pub fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed operation.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for StoreMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Abstract columnar store holding pixel rows.
///
/// Methods are declared as `impl Future + Send` (rather than bare
/// `async fn`) because the playback engine runs fetches inside spawned
/// tasks; implementations can still be written with `async fn`.
pub trait RowStore: Send + Sync + 'static {
    /// Cheap connectivity check (the equivalent of `SELECT 1`).
    fn ping(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Bulk-append rows. Re-appending an existing `(video_id, frame_id, x,
    /// y)` key overwrites rather than duplicating.
    fn append(&self, rows: &[RowValues]) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All rows for one frame of one video, in unspecified order.
    fn query_frame(
        &self,
        video_id: &VideoId,
        frame_id: u64,
    ) -> impl Future<Output = Result<Vec<RowValues>, StoreError>> + Send;

    /// Every video id with at least one row.
    fn distinct_videos(&self) -> impl Future<Output = Result<Vec<VideoId>, StoreError>> + Send;

    /// Aggregates over one video's rows, or `None` if it has no rows.
    fn aggregate_metadata(
        &self,
        video_id: &VideoId,
    ) -> impl Future<Output = Result<Option<AggregateMetadata>, StoreError>> + Send;
}
