//! Bounded frame cache with least-recently-used eviction.
//!
//! Keyed by `(video_id, frame_id)`, write-through (filled on every
//! successful assembly), and invalidated wholesale on video switch.

use std::collections::HashMap;

use rowvid_protocol::types::{RasterFrame, VideoId};

struct CachedFrame {
    frame: RasterFrame,
    last_access: u64,
}

/// Bounded LRU cache of assembled frames.
///
/// A capacity of zero disables caching entirely.
pub struct FrameCache {
    capacity: usize,
    access_counter: u64,
    entries: HashMap<(VideoId, u64), CachedFrame>,
}

impl FrameCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            access_counter: 0,
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a frame, updating its recency on hit.
    pub fn get(&mut self, video_id: &VideoId, frame_id: u64) -> Option<RasterFrame> {
        self.access_counter += 1;
        let counter = self.access_counter;
        let entry = self.entries.get_mut(&(video_id.clone(), frame_id))?;
        entry.last_access = counter;
        Some(entry.frame.clone())
    }

    /// Insert a frame, evicting the least-recently-used entry if full.
    pub fn insert(&mut self, video_id: VideoId, frame_id: u64, frame: RasterFrame) {
        if self.capacity == 0 {
            return;
        }

        if !self.entries.contains_key(&(video_id.clone(), frame_id)) {
            while self.entries.len() >= self.capacity {
                self.evict_lru();
            }
        }

        self.access_counter += 1;
        self.entries.insert(
            (video_id, frame_id),
            CachedFrame {
                frame,
                last_access: self.access_counter,
            },
        );
    }

    /// Drop every entry (video switch).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict_lru(&mut self) {
        if let Some(key) = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| key.clone())
        {
            self.entries.remove(&key);
            tracing::trace!(video_id = %key.0, frame_id = key.1, "evicted cached frame");
        }
    }
}

#[cfg(test)]
mod tests {
    use rowvid_protocol::types::Pixel;

    use super::*;

    fn frame(frame_id: u64) -> RasterFrame {
        RasterFrame::filled(frame_id, 2, 2, Pixel::gray(frame_id as u8))
    }

    fn vid(name: &str) -> VideoId {
        VideoId::from(name)
    }

    #[test]
    fn insert_and_get() {
        let mut cache = FrameCache::new(4);
        cache.insert(vid("v"), 0, frame(0));
        assert_eq!(cache.get(&vid("v"), 0), Some(frame(0)));
        assert_eq!(cache.get(&vid("v"), 1), None);
        assert_eq!(cache.get(&vid("w"), 0), None);
    }

    #[test]
    fn eviction_follows_lru_order() {
        let mut cache = FrameCache::new(3);
        cache.insert(vid("v"), 0, frame(0));
        cache.insert(vid("v"), 1, frame(1));
        cache.insert(vid("v"), 2, frame(2));

        // Touch frame 0 so frame 1 becomes the LRU entry.
        let _ = cache.get(&vid("v"), 0);

        cache.insert(vid("v"), 3, frame(3));
        assert!(cache.get(&vid("v"), 0).is_some());
        assert!(cache.get(&vid("v"), 1).is_none());
        assert!(cache.get(&vid("v"), 2).is_some());
        assert!(cache.get(&vid("v"), 3).is_some());
    }

    #[test]
    fn reinserting_same_key_does_not_evict() {
        let mut cache = FrameCache::new(2);
        cache.insert(vid("v"), 0, frame(0));
        cache.insert(vid("v"), 1, frame(1));
        cache.insert(vid("v"), 0, frame(9));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&vid("v"), 0), Some(frame(9)));
        assert!(cache.get(&vid("v"), 1).is_some());
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut cache = FrameCache::new(2);
        cache.insert(vid("v"), 0, frame(0));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&vid("v"), 0).is_none());
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let mut cache = FrameCache::new(0);
        cache.insert(vid("v"), 0, frame(0));
        assert!(cache.is_empty());
    }
}
