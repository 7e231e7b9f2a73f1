//! Playback controller: state machine, tick timer, and request-token
//! ordering.
//!
//! `PlaybackController` is a handle over a spawned event loop. The loop is
//! the only owner of the frame index, the cache, and the tick timer, so all
//! state transitions are serialized through it. Row fetches run as spawned
//! tasks that report back over a channel tagged with a monotonically
//! increasing request token; a result whose token is no longer current is
//! discarded, which is the whole cancellation mechanism — no real I/O
//! cancellation, only result suppression (last-request-wins).
//!
//! The disconnected state lives outside this type: a controller exists only
//! while a [`Session`](crate::Session) is connected, and stopping it tears
//! the loop down.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Interval, MissedTickBehavior};

use rowvid_codec::assemble;
use rowvid_protocol::config::PlaybackConfig;
use rowvid_protocol::error::StoreError;
use rowvid_protocol::metadata::{AggregateMetadata, VideoMetadata};
use rowvid_protocol::record::RowValues;
use rowvid_protocol::types::{RasterFrame, VideoId};
use rowvid_store::RowStore;

use crate::cache::FrameCache;

/// Commands accepted by the playback event loop.
#[derive(Debug, Clone)]
pub enum PlaybackCommand {
    /// Switch to a video: invalidates the cache, queries metadata, and
    /// pauses at frame 0 once metadata resolves.
    Load(VideoId),
    Play,
    Pause,
    /// Manual scrub to a frame index (wrapped into range).
    Seek(u64),
}

/// Events emitted by the playback event loop.
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    MetadataLoaded(VideoMetadata),
    /// An assembled frame ready for the render sink. Only the most recently
    /// requested frame is ever delivered.
    FrameReady {
        video_id: VideoId,
        frame_id: u64,
        frame: RasterFrame,
    },
    StateChanged(PlaybackState),
    /// A store failure was reported; playback paused (or returned to idle
    /// if no video was loaded yet) rather than terminating the session.
    StoreFailed(StoreError),
}

/// Observable playback states.
///
/// `Seeking` is transient: entered from Playing/Paused on a manual scrub
/// and left for the pre-seek state once the target frame renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Paused,
    Seeking,
}

/// Metrics for observability and test assertions.
pub struct PlaybackMetrics {
    pub frames_rendered: AtomicU64,
    pub stale_results_discarded: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub store_timeouts: AtomicU64,
}

impl PlaybackMetrics {
    fn new() -> Self {
        Self {
            frames_rendered: AtomicU64::new(0),
            stale_results_discarded: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            store_timeouts: AtomicU64::new(0),
        }
    }
}

/// Result of a spawned fetch task, tagged with its request token.
enum FetchOutcome {
    Metadata {
        token: u64,
        video_id: VideoId,
        result: Result<Option<AggregateMetadata>, StoreError>,
    },
    Frame {
        token: u64,
        frame_id: u64,
        result: Result<Vec<RowValues>, StoreError>,
    },
}

/// Handle over the playback event loop.
pub struct PlaybackController {
    cmd_tx: mpsc::UnboundedSender<PlaybackCommand>,
    event_rx: mpsc::UnboundedReceiver<PlaybackEvent>,
    shutdown_tx: watch::Sender<bool>,
    /// Metrics counters, shared with the loop.
    pub metrics: Arc<PlaybackMetrics>,
}

impl PlaybackController {
    /// Spawn the event loop over `store` and return its handle.
    pub fn start<S: RowStore>(store: Arc<S>, config: PlaybackConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let metrics = Arc::new(PlaybackMetrics::new());

        let event_loop = EventLoop {
            store,
            config,
            event_tx,
            fetch_tx,
            metrics: metrics.clone(),
            state: PlaybackState::Idle,
            resume: PlaybackState::Paused,
            video: None,
            frame_index: 0,
            current_token: 0,
        };
        tokio::spawn(event_loop.run(cmd_rx, fetch_rx, shutdown_rx));

        Self {
            cmd_tx,
            event_rx,
            shutdown_tx,
            metrics,
        }
    }

    /// Select a video for playback.
    pub fn load(&self, video_id: VideoId) {
        self.send(PlaybackCommand::Load(video_id));
    }

    /// Start the tick timer (Paused -> Playing).
    pub fn play(&self) {
        self.send(PlaybackCommand::Play);
    }

    /// Stop the tick timer. Does not suppress an in-flight fetch.
    pub fn pause(&self) {
        self.send(PlaybackCommand::Pause);
    }

    /// Scrub to a frame index.
    pub fn seek(&self, frame_index: u64) {
        self.send(PlaybackCommand::Seek(frame_index));
    }

    /// Receive the next playback event. Returns `None` after shutdown.
    pub async fn recv_event(&mut self) -> Option<PlaybackEvent> {
        self.event_rx.recv().await
    }

    /// Signal the event loop to shut down.
    pub fn stop(&self) {
        tracing::info!("stopping playback controller");
        let _ = self.shutdown_tx.send(true);
    }

    fn send(&self, cmd: PlaybackCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::warn!("playback command channel closed");
        }
    }
}

struct EventLoop<S: RowStore> {
    store: Arc<S>,
    config: PlaybackConfig,
    event_tx: mpsc::UnboundedSender<PlaybackEvent>,
    fetch_tx: mpsc::UnboundedSender<FetchOutcome>,
    metrics: Arc<PlaybackMetrics>,
    state: PlaybackState,
    /// State to restore when a seek completes (Playing or Paused).
    resume: PlaybackState,
    video: Option<VideoMetadata>,
    frame_index: u64,
    /// Token of the most recently issued request; anything older is stale.
    current_token: u64,
}

impl<S: RowStore> EventLoop<S> {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<PlaybackCommand>,
        mut fetch_rx: mpsc::UnboundedReceiver<FetchOutcome>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut cache = FrameCache::new(self.config.cache_capacity);
        let mut ticker: Option<Interval> = None;

        tracing::debug!("playback event loop started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("playback event loop shutting down");
                        break;
                    }
                }

                Some(cmd) = cmd_rx.recv() => {
                    self.handle_command(cmd, &mut cache, &mut ticker);
                }

                Some(outcome) = fetch_rx.recv() => {
                    self.handle_outcome(outcome, &mut cache, &mut ticker);
                }

                _ = next_tick(&mut ticker) => {
                    self.handle_tick(&mut cache);
                }
            }
        }
    }

    fn handle_command(
        &mut self,
        cmd: PlaybackCommand,
        cache: &mut FrameCache,
        ticker: &mut Option<Interval>,
    ) {
        match cmd {
            PlaybackCommand::Load(video_id) => {
                tracing::info!(video_id = %video_id, "loading video");
                *ticker = None;
                cache.clear();
                self.video = None;
                self.frame_index = 0;
                self.set_state(PlaybackState::Loading);
                self.request_metadata(video_id);
            }

            PlaybackCommand::Play => match self.state {
                PlaybackState::Paused => {
                    self.set_state(PlaybackState::Playing);
                    *ticker = Some(make_ticker(self.config.tick_interval()));
                }
                PlaybackState::Seeking => {
                    self.resume = PlaybackState::Playing;
                    *ticker = Some(make_ticker(self.config.tick_interval()));
                }
                _ => {
                    tracing::debug!(state = ?self.state, "ignoring play");
                }
            },

            PlaybackCommand::Pause => match self.state {
                PlaybackState::Playing => {
                    *ticker = None;
                    self.set_state(PlaybackState::Paused);
                }
                PlaybackState::Seeking => {
                    self.resume = PlaybackState::Paused;
                    *ticker = None;
                }
                _ => {
                    tracing::debug!(state = ?self.state, "ignoring pause");
                }
            },

            PlaybackCommand::Seek(index) => match self.state {
                PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Seeking => {
                    let Some(meta) = self.video.clone() else {
                        return;
                    };
                    let target = wrap_index(index, meta.total_frames);
                    tracing::debug!(target, "seeking");
                    if self.state != PlaybackState::Seeking {
                        self.resume = self.state;
                    }
                    self.set_state(PlaybackState::Seeking);
                    self.frame_index = target;
                    self.request_frame(&meta, target, cache);
                }
                // Metadata not resolved yet: remember the target, the
                // post-load fetch picks it up.
                PlaybackState::Loading => {
                    self.frame_index = index;
                }
                PlaybackState::Idle => {
                    tracing::debug!("ignoring seek with no video loaded");
                }
            },
        }
    }

    fn handle_outcome(
        &mut self,
        outcome: FetchOutcome,
        cache: &mut FrameCache,
        ticker: &mut Option<Interval>,
    ) {
        match outcome {
            FetchOutcome::Metadata {
                token,
                video_id,
                result,
            } => {
                if token != self.current_token {
                    self.metrics
                        .stale_results_discarded
                        .fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(token, current = self.current_token, "stale metadata result");
                    return;
                }
                self.handle_metadata(video_id, result, cache);
            }

            FetchOutcome::Frame {
                token,
                frame_id,
                result,
            } => {
                if token != self.current_token {
                    self.metrics
                        .stale_results_discarded
                        .fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(
                        token,
                        current = self.current_token,
                        frame_id,
                        "discarding stale fetch result"
                    );
                    return;
                }
                self.handle_frame(frame_id, result, cache, ticker);
            }
        }
    }

    fn handle_metadata(
        &mut self,
        video_id: VideoId,
        result: Result<Option<AggregateMetadata>, StoreError>,
        cache: &mut FrameCache,
    ) {
        match result {
            Ok(Some(agg)) => {
                let meta = VideoMetadata::derive(video_id, &agg);
                tracing::info!(
                    video_id = %meta.video_id,
                    width = meta.width,
                    height = meta.height,
                    total_frames = meta.total_frames,
                    mode = %meta.mode,
                    "metadata loaded"
                );
                self.emit(PlaybackEvent::MetadataLoaded(meta.clone()));
                // A seek issued during Loading may have moved the index.
                self.frame_index = wrap_index(self.frame_index, meta.total_frames);
                self.video = Some(meta.clone());
                self.set_state(PlaybackState::Paused);
                self.request_frame(&meta, self.frame_index, cache);
            }
            Ok(None) => {
                tracing::warn!(video_id = %video_id, "video has no rows");
                self.emit(PlaybackEvent::StoreFailed(StoreError::QueryFailed(
                    format!("no rows for video {video_id}"),
                )));
                self.set_state(PlaybackState::Idle);
            }
            Err(e) => {
                if e == StoreError::Timeout {
                    self.metrics.store_timeouts.fetch_add(1, Ordering::Relaxed);
                }
                tracing::warn!(video_id = %video_id, error = %e, "metadata query failed");
                self.emit(PlaybackEvent::StoreFailed(e));
                self.set_state(PlaybackState::Idle);
            }
        }
    }

    fn handle_frame(
        &mut self,
        frame_id: u64,
        result: Result<Vec<RowValues>, StoreError>,
        cache: &mut FrameCache,
        ticker: &mut Option<Interval>,
    ) {
        let Some(meta) = self.video.clone() else {
            return;
        };
        match result {
            Ok(rows) => {
                let frame = assemble(&rows, meta.width, meta.height, meta.mode, frame_id);
                cache.insert(meta.video_id.clone(), frame_id, frame.clone());
                self.deliver_frame(meta.video_id, frame_id, frame);
            }
            Err(e) => {
                if e == StoreError::Timeout {
                    self.metrics.store_timeouts.fetch_add(1, Ordering::Relaxed);
                }
                tracing::warn!(frame_id, error = %e, "frame fetch failed, pausing");
                *ticker = None;
                self.set_state(PlaybackState::Paused);
                self.emit(PlaybackEvent::StoreFailed(e));
            }
        }
    }

    fn handle_tick(&mut self, cache: &mut FrameCache) {
        let Some(meta) = self.video.clone() else {
            return;
        };
        if meta.total_frames == 0 {
            return;
        }
        // Wraps at the last frame, never errors.
        self.frame_index = (self.frame_index + 1) % meta.total_frames;
        self.request_frame(&meta, self.frame_index, cache);
    }

    /// Issue a frame request, superseding whatever was in flight.
    ///
    /// The token is bumped even on a cache hit so that an older outstanding
    /// fetch can no longer render over the newer frame.
    fn request_frame(&mut self, meta: &VideoMetadata, frame_id: u64, cache: &mut FrameCache) {
        self.current_token += 1;

        if let Some(frame) = cache.get(&meta.video_id, frame_id) {
            self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(frame_id, "cache hit");
            self.deliver_frame(meta.video_id.clone(), frame_id, frame);
            return;
        }
        self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);

        let token = self.current_token;
        let store = self.store.clone();
        let tx = self.fetch_tx.clone();
        let video_id = meta.video_id.clone();
        let timeout = self.config.query_timeout;
        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, store.query_frame(&video_id, frame_id))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout),
            };
            let _ = tx.send(FetchOutcome::Frame {
                token,
                frame_id,
                result,
            });
        });
    }

    fn request_metadata(&mut self, video_id: VideoId) {
        self.current_token += 1;
        let token = self.current_token;
        let store = self.store.clone();
        let tx = self.fetch_tx.clone();
        let timeout = self.config.query_timeout;
        tokio::spawn(async move {
            let result =
                match tokio::time::timeout(timeout, store.aggregate_metadata(&video_id)).await {
                    Ok(result) => result,
                    Err(_) => Err(StoreError::Timeout),
                };
            let _ = tx.send(FetchOutcome::Metadata {
                token,
                video_id,
                result,
            });
        });
    }

    fn deliver_frame(&mut self, video_id: VideoId, frame_id: u64, frame: RasterFrame) {
        self.metrics.frames_rendered.fetch_add(1, Ordering::Relaxed);
        self.emit(PlaybackEvent::FrameReady {
            video_id,
            frame_id,
            frame,
        });
        if self.state == PlaybackState::Seeking {
            self.set_state(self.resume);
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "playback state changed");
            self.state = state;
            self.emit(PlaybackEvent::StateChanged(state));
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!("playback event receiver dropped");
        }
    }
}

/// The first tick fires one interval after play, not immediately.
fn make_ticker(interval: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        // No timer while not playing; pend forever.
        None => std::future::pending::<()>().await,
    }
}

fn wrap_index(index: u64, total_frames: u64) -> u64 {
    if total_frames == 0 { 0 } else { index % total_frames }
}
