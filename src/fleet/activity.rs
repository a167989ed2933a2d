//! Last-activity tracking for idle detection.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct IdleEpisode {
    last_activity: Instant,
    /// When a stop was last issued in this episode.
    stopped_at: Option<Instant>,
}

impl IdleEpisode {
    fn fresh() -> Self {
        Self { last_activity: Instant::now(), stopped_at: None }
    }
}

/// Per-backend idle clocks.
///
/// A backend seen for the first time starts its clock at "now", giving it a
/// full grace window.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    episodes: DashMap<String, IdleEpisode>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the idle clock and start a new episode.
    pub fn record_activity(&self, id: &str) {
        self.episodes.insert(id.to_string(), IdleEpisode::fresh());
    }

    pub fn last_activity(&self, id: &str) -> Instant {
        self.episodes
            .entry(id.to_string())
            .or_insert_with(IdleEpisode::fresh)
            .last_activity
    }

    /// Time since the last recorded activity.
    pub fn idle_for(&self, id: &str) -> Duration {
        self.last_activity(id).elapsed()
    }

    /// Record that a stop was issued in the current episode.
    ///
    /// Calling again restarts the stop clock without touching `last_activity`.
    pub fn mark_stopped(&self, id: &str) {
        self.episodes
            .entry(id.to_string())
            .or_insert_with(IdleEpisode::fresh)
            .stopped_at = Some(Instant::now());
    }

    pub fn stop_issued(&self, id: &str) -> bool {
        self.since_stop(id).is_some()
    }

    /// Time since the last stop in this episode, if one was issued.
    pub fn since_stop(&self, id: &str) -> Option<Duration> {
        self.episodes
            .get(id)
            .and_then(|episode| episode.stopped_at)
            .map(|at| at.elapsed())
    }
}
