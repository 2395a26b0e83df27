//! Console rendering of announcements.

use dinner_core::{Announcement, AnnouncementSink};
use tracing::info;

/// Renders every announcement as an INFO event.
#[derive(Debug, Default)]
pub struct TracingSink {
    delivered: u64,
}

impl TracingSink {
    /// Creates a sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of announcements rendered so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl AnnouncementSink for TracingSink {
    fn deliver(&mut self, announcement: Announcement) {
        self.delivered += 1;
        info!(target: "announce", "{}", announcement);
    }
}
