use std::time::{Duration, Instant};

/// Timing snapshot handed out when the gate fires.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time since the previous tick that fired, in seconds. One interval
    /// when there was no previous tick.
    pub dt: f32,

    /// Whether `dt` was measured against a previous tick.
    pub measured: bool,

    /// Timestamp the tick was taken at.
    pub now: Instant,

    /// Count of ticks that fired before this one.
    pub frame_index: u64,
}

impl FrameTime {
    /// Instantaneous rate implied by `dt`, rounded to the nearest integer.
    ///
    /// `None` for the first tick after construction or [`FrameGate::reset`].
    pub fn measured_fps(&self) -> Option<u32> {
        (self.measured && self.dt > 0.0).then(|| (1.0 / self.dt).round() as u32)
    }
}

/// Fixed-rate gate: a tick fires only once at least `1000 / fps` ms have
/// elapsed since the last tick that fired.
#[derive(Debug, Clone)]
pub struct FrameGate {
    interval: Duration,
    last: Option<Instant>,
    frame_index: u64,
}

impl FrameGate {
    /// `fps` of zero is treated as one.
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Self::interval_for(fps),
            last: None,
            frame_index: 0,
        }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.interval = Self::interval_for(fps);
    }

    /// Forgets the baseline; the next tick fires unconditionally.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Time left until the gate would fire, zero if it is already open.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last {
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Returns `Some` when enough time has elapsed, advancing the baseline.
    ///
    /// The very first tick always fires, unmeasured, with `dt` equal to one
    /// interval.
    pub fn tick(&mut self, now: Instant) -> Option<FrameTime> {
        let (dt, measured) = match self.last {
            Some(last) => {
                let elapsed = now.saturating_duration_since(last);
                if elapsed < self.interval {
                    return None;
                }
                (elapsed, true)
            }
            None => (self.interval, false),
        };

        self.last = Some(now);
        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            measured,
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        Some(ft)
    }

    fn interval_for(fps: u32) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(fps.max(1)))
    }
}
