//! In-process row store with injectable latency and failures.
//!
//! Backs unit and integration tests, and local `rowvid` runs that don't
//! have a real columnar backend attached. Latency is applied with
//! `tokio::time::sleep`, so tests running under a paused clock stay
//! deterministic.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rowvid_protocol::error::StoreError;
use rowvid_protocol::metadata::AggregateMetadata;
use rowvid_protocol::record::RowValues;
use rowvid_protocol::types::VideoId;

use crate::row_store::{RowStore, StoreMetrics};

#[derive(Default)]
struct Inner {
    /// Rows per video, keyed by `(frame_id, x, y)` so re-appends upsert.
    videos: HashMap<String, BTreeMap<(u64, u32, u32), RowValues>>,
    /// Scripted failures, consumed one per operation.
    fail_queue: VecDeque<StoreError>,
    /// Artificial delay applied before every operation.
    latency: Duration,
}

/// Shared in-process store. Cloning hands out another handle to the same
/// data, like a second connection to the same database.
#[derive(Clone)]
pub struct MemoryRowStore {
    inner: Arc<Mutex<Inner>>,
    pub metrics: Arc<StoreMetrics>,
}

impl MemoryRowStore {
    /// Create an empty store with no artificial latency.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            metrics: Arc::new(StoreMetrics::new()),
        }
    }

    /// Delay every subsequent operation (on every handle) by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.inner.lock().unwrap().latency = latency;
    }

    /// Script the next operation to fail with `error`. Queued failures are
    /// consumed in order, one per operation.
    pub fn fail_next(&self, error: StoreError) {
        self.inner.lock().unwrap().fail_queue.push_back(error);
    }

    /// Total rows held across all videos.
    pub fn row_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.videos.values().map(|v| v.len()).sum()
    }

    async fn settle(&self) -> Result<(), StoreError> {
        let latency = self.inner.lock().unwrap().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let scripted = self.inner.lock().unwrap().fail_queue.pop_front();
        if let Some(error) = scripted {
            self.metrics.record_failure();
            tracing::debug!(error = %error, "memory store: scripted failure");
            return Err(error);
        }
        Ok(())
    }
}

impl Default for MemoryRowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RowStore for MemoryRowStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.settle().await
    }

    async fn append(&self, rows: &[RowValues]) -> Result<(), StoreError> {
        self.settle().await?;
        let mut inner = self.inner.lock().unwrap();
        for row in rows {
            inner
                .videos
                .entry(row.video_id.clone())
                .or_default()
                .insert((row.frame_id, row.x, row.y), row.clone());
        }
        self.metrics.record_append(rows.len());
        tracing::trace!(rows = rows.len(), "memory store: appended");
        Ok(())
    }

    async fn query_frame(
        &self,
        video_id: &VideoId,
        frame_id: u64,
    ) -> Result<Vec<RowValues>, StoreError> {
        self.settle().await?;
        self.metrics.record_query();
        let inner = self.inner.lock().unwrap();
        let rows = inner
            .videos
            .get(video_id.as_str())
            .map(|rows| {
                rows.range((frame_id, 0, 0)..(frame_id + 1, 0, 0))
                    .map(|(_, row)| row.clone())
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    async fn distinct_videos(&self) -> Result<Vec<VideoId>, StoreError> {
        self.settle().await?;
        self.metrics.record_query();
        let inner = self.inner.lock().unwrap();
        let mut ids: Vec<VideoId> = inner.videos.keys().map(|k| VideoId(k.clone())).collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(ids)
    }

    async fn aggregate_metadata(
        &self,
        video_id: &VideoId,
    ) -> Result<Option<AggregateMetadata>, StoreError> {
        self.settle().await?;
        self.metrics.record_query();
        let inner = self.inner.lock().unwrap();
        let Some(rows) = inner.videos.get(video_id.as_str()) else {
            return Ok(None);
        };
        if rows.is_empty() {
            return Ok(None);
        }

        let mut agg = AggregateMetadata {
            max_x: 0,
            max_y: 0,
            distinct_frame_count: 0,
            has_color: false,
            max_value: None,
        };
        let mut last_frame = None;
        for ((frame_id, x, y), row) in rows {
            agg.max_x = agg.max_x.max(*x);
            agg.max_y = agg.max_y.max(*y);
            if last_frame != Some(*frame_id) {
                agg.distinct_frame_count += 1;
                last_frame = Some(*frame_id);
            }
            if row.r.is_some() {
                agg.has_color = true;
            }
            if let Some(value) = row.value {
                agg.max_value = Some(agg.max_value.map_or(value, |m: u8| m.max(value)));
            }
        }
        Ok(Some(agg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(video: &str, frame_id: u64, x: u32, y: u32, value: u8) -> RowValues {
        RowValues {
            frame_id,
            x,
            y,
            value: Some(value),
            r: None,
            g: None,
            b: None,
            video_id: video.to_string(),
            processed_at: 0,
        }
    }

    fn color_row(video: &str, frame_id: u64, x: u32, y: u32) -> RowValues {
        RowValues {
            frame_id,
            x,
            y,
            value: None,
            r: Some(1),
            g: Some(2),
            b: Some(3),
            video_id: video.to_string(),
            processed_at: 0,
        }
    }

    #[tokio::test]
    async fn append_and_query_frame() {
        let store = MemoryRowStore::new();
        store
            .append(&[row("v", 0, 0, 0, 5), row("v", 0, 1, 0, 6), row("v", 1, 0, 0, 7)])
            .await
            .unwrap();

        let frame0 = store.query_frame(&VideoId::from("v"), 0).await.unwrap();
        assert_eq!(frame0.len(), 2);
        let frame1 = store.query_frame(&VideoId::from("v"), 1).await.unwrap();
        assert_eq!(frame1.len(), 1);
        let frame2 = store.query_frame(&VideoId::from("v"), 2).await.unwrap();
        assert!(frame2.is_empty());
    }

    #[tokio::test]
    async fn reappend_upserts_instead_of_duplicating() {
        let store = MemoryRowStore::new();
        store.append(&[row("v", 0, 0, 0, 5)]).await.unwrap();
        store.append(&[row("v", 0, 0, 0, 9)]).await.unwrap();

        let rows = store.query_frame(&VideoId::from("v"), 0).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, Some(9));
    }

    #[tokio::test]
    async fn distinct_videos_sorted() {
        let store = MemoryRowStore::new();
        store
            .append(&[row("b", 0, 0, 0, 1), row("a", 0, 0, 0, 1)])
            .await
            .unwrap();
        let ids = store.distinct_videos().await.unwrap();
        assert_eq!(ids, vec![VideoId::from("a"), VideoId::from("b")]);
    }

    #[tokio::test]
    async fn aggregate_counts_distinct_frames_and_extents() {
        let store = MemoryRowStore::new();
        store
            .append(&[
                row("v", 0, 3, 1, 1),
                row("v", 0, 0, 4, 1),
                row("v", 2, 1, 1, 1),
            ])
            .await
            .unwrap();

        let agg = store
            .aggregate_metadata(&VideoId::from("v"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(agg.max_x, 3);
        assert_eq!(agg.max_y, 4);
        assert_eq!(agg.distinct_frame_count, 2);
        assert!(!agg.has_color);
        assert_eq!(agg.max_value, Some(1));
    }

    #[tokio::test]
    async fn aggregate_detects_color() {
        let store = MemoryRowStore::new();
        store.append(&[color_row("v", 0, 0, 0)]).await.unwrap();
        let agg = store
            .aggregate_metadata(&VideoId::from("v"))
            .await
            .unwrap()
            .unwrap();
        assert!(agg.has_color);
        assert_eq!(agg.max_value, None);
    }

    #[tokio::test]
    async fn aggregate_for_unknown_video_is_none() {
        let store = MemoryRowStore::new();
        assert!(
            store
                .aggregate_metadata(&VideoId::from("missing"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn scripted_failure_consumed_once() {
        let store = MemoryRowStore::new();
        store.fail_next(StoreError::QueryFailed("scripted".into()));

        assert!(store.ping().await.is_err());
        assert!(store.ping().await.is_ok());
        assert_eq!(
            store
                .metrics
                .failures
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn latency_applies_under_virtual_clock() {
        let store = MemoryRowStore::new();
        store.append(&[row("v", 0, 0, 0, 1)]).await.unwrap();

        store.set_latency(Duration::from_millis(250));
        let start = tokio::time::Instant::now();
        let rows = store.query_frame(&VideoId::from("v"), 0).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(start.elapsed() >= Duration::from_millis(250));
    }
}
