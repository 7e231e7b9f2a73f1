//! Playback session: explicit connection handle over a row store.
//!
//! Replaces any notion of a global "current connection": every operation
//! goes through a `Session`, whose creation verifies connectivity and whose
//! drop tears everything down.

use std::sync::Arc;

use rowvid_protocol::config::PlaybackConfig;
use rowvid_protocol::error::StoreError;
use rowvid_protocol::metadata::VideoMetadata;
use rowvid_protocol::types::VideoId;
use rowvid_store::RowStore;

use crate::controller::PlaybackController;

/// A verified connection to a row store, from which playback controllers
/// are started.
pub struct Session<S: RowStore> {
    store: Arc<S>,
}

impl<S: RowStore> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl<S: RowStore> Session<S> {
    /// Connect by pinging the store. Fails with the store's error if it is
    /// unreachable.
    pub async fn connect(store: S) -> Result<Self, StoreError> {
        store.ping().await?;
        tracing::info!("session connected");
        Ok(Self {
            store: Arc::new(store),
        })
    }

    /// Every video with at least one encoded row.
    pub async fn list_videos(&self) -> Result<Vec<VideoId>, StoreError> {
        self.store.distinct_videos().await
    }

    /// Derive playback metadata for one video.
    ///
    /// A video with no rows is reported as a query failure; an encode job
    /// that hasn't flushed anything yet is not playable.
    pub async fn load_metadata(&self, video_id: &VideoId) -> Result<VideoMetadata, StoreError> {
        let agg = self
            .store
            .aggregate_metadata(video_id)
            .await?
            .ok_or_else(|| StoreError::QueryFailed(format!("no rows for video {video_id}")))?;
        Ok(VideoMetadata::derive(video_id.clone(), &agg))
    }

    /// Start a playback controller sharing this session's store.
    pub fn start_playback(&self, config: PlaybackConfig) -> PlaybackController {
        PlaybackController::start(self.store.clone(), config)
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}
