// Lucky Draw Client - Countdown and draw eligibility
//
// Advisory only: the draw program re-checks the deadline when the draw is
// submitted. These helpers exist to avoid obviously invalid submissions
// and to drive display state.
use std::fmt;
use std::time::Duration;

use crate::projector::PoolView;
use crate::state::PoolStatus;

/// True iff the pool is active and its deadline has been reached
pub fn is_eligible_for_draw(pool: &PoolView, now_ms: u64) -> bool {
    pool.status == PoolStatus::Active && now_ms >= pool.end_time
}

/// Time left until the deadline, clamped to zero
pub fn time_remaining(pool: &PoolView, now_ms: u64) -> Duration {
    Duration::from_millis(pool.end_time.saturating_sub(now_ms))
}

/// Render a duration as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.as_secs();
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}

/// What a pool card shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Accepting tickets
    Live,
    /// Deadline passed with tickets sold, waiting for a keeper
    ReadyToDraw,
    /// Drawn, closed, or expired with no tickets
    Ended,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Live => "LIVE",
            Phase::ReadyToDraw => "READY TO DRAW",
            Phase::Ended => "ENDED",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn phase(pool: &PoolView, now_ms: u64) -> Phase {
    if pool.status.is_terminal() {
        return Phase::Ended;
    }
    if !is_eligible_for_draw(pool, now_ms) {
        return Phase::Live;
    }
    if pool.participants.is_empty() {
        Phase::Ended
    } else {
        Phase::ReadyToDraw
    }
}

/// Status to display once time is taken into account: an active pool past
/// its deadline with no tickets reads as closed, with no winner.
pub fn effective_status(pool: &PoolView, now_ms: u64) -> PoolStatus {
    if is_eligible_for_draw(pool, now_ms) && pool.participants.is_empty() {
        PoolStatus::Closed
    } else {
        pool.status
    }
}
