//! Time-based debounce filter
//!
//! The filter follows a raw boolean and commits to a new stable value only once
//! the raw value has stayed unchanged for the configured interval. Alongside the
//! stable value it tracks how long the current stable state has lasted and how
//! long the previous one lasted, so callers can classify a press at the moment
//! it ends.
//!
//! All timestamps are `u32` milliseconds and compared with wrapping arithmetic.

/// Debounced view of a noisy boolean signal
#[derive(Clone, Copy, Debug)]
pub struct Debouncer {
    interval_ms: u16,
    /// Committed value
    stable: bool,
    /// Last raw value seen
    unstable: bool,
    /// Whether the last `update` committed a new value
    changed: bool,
    /// When the raw value last changed (or last committed)
    raw_since: u32,
    /// When the stable value last changed
    stable_since: u32,
    previous_duration: u32,
    /// Timestamp of the last `update`
    now: u32,
}

impl Debouncer {
    /// Create a filter that starts settled on `initial` at `now_ms`
    pub const fn new(interval_ms: u16, initial: bool, now_ms: u32) -> Self {
        Self {
            interval_ms,
            stable: initial,
            unstable: initial,
            changed: false,
            raw_since: now_ms,
            stable_since: now_ms,
            previous_duration: 0,
            now: now_ms,
        }
    }

    /// Feed one raw sample taken at `now_ms`
    ///
    /// Returns `true` if the stable value changed on this call.
    pub fn update(&mut self, raw: bool, now_ms: u32) -> bool {
        self.now = now_ms;
        self.changed = false;

        if raw != self.unstable {
            // Raw edge: restart the settle timer
            self.unstable = raw;
            self.raw_since = now_ms;
        } else if raw != self.stable
            && now_ms.wrapping_sub(self.raw_since) >= u32::from(self.interval_ms)
        {
            self.raw_since = now_ms;
            self.commit(raw, now_ms);
        }

        self.changed
    }

    fn commit(&mut self, value: bool, now_ms: u32) {
        self.stable = value;
        self.changed = true;
        self.previous_duration = now_ms.wrapping_sub(self.stable_since);
        self.stable_since = now_ms;
    }

    /// Current stable value
    pub fn is_active(&self) -> bool {
        self.stable
    }

    /// Whether the last update committed a new stable value
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// The stable value went from inactive to active on the last update
    pub fn activated(&self) -> bool {
        self.changed && self.stable
    }

    /// The stable value went from active to inactive on the last update
    pub fn deactivated(&self) -> bool {
        self.changed && !self.stable
    }

    /// Milliseconds spent in the current stable state, as of the last update
    pub fn current_duration(&self) -> u32 {
        self.now.wrapping_sub(self.stable_since)
    }

    /// Milliseconds spent in the stable state that was exited most recently
    pub fn previous_duration(&self) -> u32 {
        self.previous_duration
    }

    /// Configured settle interval
    pub fn interval_ms(&self) -> u16 {
        self.interval_ms
    }
}
