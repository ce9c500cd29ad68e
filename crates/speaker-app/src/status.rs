//! Periodic status report for the serial log.

use core::fmt;

use crate::metadata::Metadata;

/// Time between two status reports
pub const STATUS_INTERVAL_MS: u32 = 2_000;

/// Interval gate driven by the control loop's clock
#[derive(Debug, Clone, Copy)]
pub struct StatusReporter {
    interval_ms: u32,
    last_ms: u32,
}

impl StatusReporter {
    /// Start timing at `now_ms`; the first report is due one interval later
    pub fn new(interval_ms: u32, now_ms: u32) -> Self {
        Self {
            interval_ms,
            last_ms: now_ms,
        }
    }

    /// Returns `true` once more than the interval has passed since the last
    /// report, and restarts the interval.
    pub fn due(&mut self, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_ms) > self.interval_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }
}

/// Snapshot rendered into the status log line
pub struct StatusReport<'a> {
    pub battery_voltage: Option<f32>,
    pub metadata: &'a Metadata,
}

impl fmt::Display for StatusReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = self.metadata;
        writeln!(f, "Metadata:")?;
        match self.battery_voltage {
            Some(volts) => writeln!(f, "Battery voltage: {:.3} V", volts)?,
            None => writeln!(f, "Battery voltage: n/a")?,
        }
        writeln!(f, "Playing: {}", meta.is_playing())?;
        writeln!(f, "Title: {}", meta.title)?;
        writeln!(f, "Artist: {}", meta.artist)?;
        writeln!(f, "Album: {}", meta.album)?;
        writeln!(f, "Playtime: {}", meta.playtime_ms)?;
        writeln!(f, "Position: {}", meta.position_ms)?;
        write!(f, "Volume: {}", meta.volume)
    }
}
