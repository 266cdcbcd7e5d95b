//! Cooperative bounding-box stability polling.
//!
//! Automation actions should only fire once an element has stopped moving
//! (menus sliding in, layout settling after a font load). The engine itself
//! has no event loop, so stability is modeled as a state machine the
//! embedder feeds one observation per animation frame: the element's current
//! bounding box, or `None` once it has left the tree.

use tarsier_common::geometry::Rect;

/// Configuration for a stability poll.
#[derive(Debug, Clone, Copy)]
pub struct StabilityPollConfig {
    /// Number of consecutive identical boxes required before the element is
    /// considered stable. The first observation seeds the comparison, so a
    /// value of 2 needs three frames minimum.
    pub required_stable_frames: u32,
    /// Minimum number of observations between successive comparisons. A
    /// value of 1 compares every frame; larger values skip frames, which
    /// embedders use to cap polling cost on busy pages.
    pub min_check_interval: u32,
}

impl Default for StabilityPollConfig {
    fn default() -> Self {
        Self {
            required_stable_frames: 2,
            min_check_interval: 1,
        }
    }
}

/// Outcome of feeding one observation to a [`StabilityPoll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// Not enough consecutive stable frames yet; keep feeding observations.
    Pending,
    /// The box held still for the required number of consecutive checks.
    Stable,
    /// The element disconnected mid-poll; the wait must be abandoned.
    Disconnected,
}

/// Poll-until-stable state machine.
///
/// ```
/// use tarsier_common::geometry::Rect;
/// use tarsier_dom::{PollStatus, StabilityPoll};
///
/// let mut poll = StabilityPoll::default();
/// let rect = Rect::new(0.0, 0.0, 100.0, 20.0);
/// assert_eq!(poll.observe(Some(rect)), PollStatus::Pending);
/// assert_eq!(poll.observe(Some(rect)), PollStatus::Pending);
/// assert_eq!(poll.observe(Some(rect)), PollStatus::Stable);
/// ```
#[derive(Debug, Default)]
pub struct StabilityPoll {
    config: StabilityPollConfig,
    last_box: Option<Rect>,
    stable_streak: u32,
    frames_since_check: u32,
    done: bool,
}

impl StabilityPoll {
    /// Create a poll with the given configuration.
    #[must_use]
    pub fn new(config: StabilityPollConfig) -> Self {
        Self {
            config,
            last_box: None,
            stable_streak: 0,
            frames_since_check: 0,
            done: false,
        }
    }

    /// Feed one per-frame observation. `None` means the element is no longer
    /// connected. Once `Stable` or `Disconnected` has been returned the poll
    /// is finished and further observations repeat that verdict.
    pub fn observe(&mut self, current: Option<Rect>) -> PollStatus {
        if self.done {
            return if self.last_box.is_some() {
                PollStatus::Stable
            } else {
                PollStatus::Disconnected
            };
        }

        let Some(rect) = current else {
            self.done = true;
            self.last_box = None;
            return PollStatus::Disconnected;
        };

        self.frames_since_check += 1;
        if self.frames_since_check < self.config.min_check_interval {
            return PollStatus::Pending;
        }
        self.frames_since_check = 0;

        match self.last_box {
            Some(previous) if previous == rect => {
                self.stable_streak += 1;
                if self.stable_streak >= self.config.required_stable_frames {
                    self.done = true;
                    return PollStatus::Stable;
                }
            }
            _ => {
                self.stable_streak = 0;
                self.last_box = Some(rect);
            }
        }
        PollStatus::Pending
    }
}
