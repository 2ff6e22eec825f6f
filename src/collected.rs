use std::collections::HashSet;

use crate::video_url::VideoUrl;

/// Discovered videos in first-seen order, without duplicates.
#[derive(Debug, Default, Clone)]
pub struct CollectedSet {
    entries: Vec<VideoUrl>,
    seen: HashSet<VideoUrl>,
}

impl CollectedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `url` unless an equal entry is already present. Returns true when added.
    pub fn insert(&mut self, url: VideoUrl) -> bool {
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.entries.push(url);
        true
    }

    /// Drop any later duplicates, keeping the first occurrence.
    pub fn dedup(&mut self) {
        let mut seen = HashSet::with_capacity(self.entries.len());
        self.entries.retain(|url| seen.insert(url.clone()));
        self.seen = seen;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoUrl> {
        self.entries.iter()
    }

    /// The first `max` entries in discovery order.
    pub fn into_truncated(mut self, max: usize) -> Vec<VideoUrl> {
        self.entries.truncate(max);
        self.entries
    }
}
