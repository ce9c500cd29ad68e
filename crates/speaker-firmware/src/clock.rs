use esp_idf_svc::sys;

use speaker_input::Clock;

/// Milliseconds since boot from the high-resolution ESP timer
///
/// Truncated to `u32`, so it wraps after about 49.7 days.
#[derive(Debug, Default, Clone, Copy)]
pub struct EspClock;

impl Clock for EspClock {
    fn now_ms(&self) -> u32 {
        let micros = unsafe { sys::esp_timer_get_time() };
        (micros / 1_000) as u32
    }
}
