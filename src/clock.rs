use web_time::{Duration, Instant};

use crate::types::Color;

pub const DEFAULT_CLOCK_SECONDS: u32 = 1800;
const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    TimedOut(Color),
}

/// Per-side countdown polled from the frame loop.
///
/// Reaching zero always latches `timed_out`. Whether that ends the game is
/// decided by `enforced`, which can be toggled at any time.
#[derive(Debug, Clone)]
pub struct Clock {
    initial: u32,
    remaining: [u32; 2],
    last_tick: Instant,
    enforced: bool,
    timed_out: Option<Color>,
}

impl Clock {
    pub fn new(seconds: u32, enforced: bool, now: Instant) -> Self {
        Self {
            initial: seconds,
            remaining: [seconds; 2],
            last_tick: now,
            enforced,
            timed_out: None,
        }
    }

    pub fn reset(&mut self, now: Instant) {
        self.remaining = [self.initial; 2];
        self.last_tick = now;
        self.timed_out = None;
    }

    /// Charges every whole second elapsed since the last charge to `active`.
    pub fn tick(&mut self, active: Color, now: Instant) -> Option<ClockEvent> {
        if self.timed_out.is_some() {
            self.last_tick = now;
            return None;
        }
        while now.saturating_duration_since(self.last_tick) >= TICK {
            self.last_tick += TICK;
            let remaining = &mut self.remaining[active.index()];
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                self.timed_out = Some(active);
                self.last_tick = now;
                return Some(ClockEvent::TimedOut(active));
            }
        }
        None
    }

    /// Drops elapsed time without charging anyone, e.g. while the game is over.
    pub fn hold(&mut self, now: Instant) {
        self.last_tick = now;
    }

    pub fn remaining(&self, color: Color) -> u32 {
        self.remaining[color.index()]
    }

    pub fn is_enforced(&self) -> bool {
        self.enforced
    }

    pub fn set_enforced(&mut self, enforced: bool) {
        self.enforced = enforced;
    }

    pub fn timed_out(&self) -> Option<Color> {
        self.timed_out
    }

    /// A timeout that happened while enforcement was off and has not ended
    /// the game yet.
    pub fn has_latent_timeout(&self) -> bool {
        self.timed_out.is_some() && !self.enforced
    }

    pub fn display(&self, color: Color) -> String {
        format_time(self.remaining(color))
    }
}

/// `m:ss`.
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
