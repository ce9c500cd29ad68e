//! Oversampling battery gauge
//!
//! The battery is measured through a resistive divider on an ADC pin. Single
//! conversions are noisy, so the gauge collects a full window of raw
//! millivolt samples and publishes one block average per window:
//!
//! ```text
//! voltage = mean(samples) / 1000 / factor
//! factor  = lower / (upper + lower)
//! ```
//!
//! The published value is a plateau: it changes exactly once every
//! `capacity` samples and is `None` until the first window completes.

use alloc::vec;
use alloc::vec::Vec;

use crate::config::{GaugeConfig, VoltageDivider};
use crate::error::Error;
use crate::hal::MillivoltSource;

/// Block-averaging voltage estimator
#[derive(Clone, Debug)]
pub struct BatteryGauge {
    /// Ring buffer of raw readings in millivolts
    samples: Vec<u32>,
    /// Next slot to fill
    write_index: usize,
    divider: VoltageDivider,
    /// Estimate from the last completed window
    voltage: Option<f32>,
}

impl BatteryGauge {
    pub fn new(config: GaugeConfig) -> Self {
        Self {
            // A hand-assembled config can bypass the builder check.
            samples: vec![0; config.capacity.max(1)],
            write_index: 0,
            divider: config.divider,
            voltage: None,
        }
    }

    /// Store one raw reading
    ///
    /// Returns the new estimate when this sample completes a window.
    pub fn ingest(&mut self, millivolts: u32) -> Option<f32> {
        if let Some(slot) = self.samples.get_mut(self.write_index) {
            *slot = millivolts;
        }
        self.write_index += 1;
        if self.write_index < self.samples.len() {
            return None;
        }

        self.write_index = 0;
        let voltage = self.window_voltage();
        self.voltage = Some(voltage);
        log::debug!("battery: {:.3} V over {} samples", voltage, self.samples.len());
        Some(voltage)
    }

    fn window_voltage(&self) -> f32 {
        // f32 holds 10k samples of ~3300 mV without overflow
        let sum: f32 = self.samples.iter().map(|&mv| mv as f32).sum();
        let mean_mv = sum / self.samples.len() as f32;
        mean_mv / 1000.0 / self.divider.factor()
    }

    /// Battery voltage in volts from the last completed window
    pub fn voltage(&self) -> Option<f32> {
        self.voltage
    }

    /// Samples per window
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Samples collected towards the next window
    pub fn pending(&self) -> usize {
        self.write_index
    }

    pub fn divider(&self) -> VoltageDivider {
        self.divider
    }
}

impl Default for BatteryGauge {
    fn default() -> Self {
        Self::new(GaugeConfig::default())
    }
}

/// Battery gauge fed from an ADC channel
pub struct BatteryMonitor<A> {
    source: A,
    gauge: BatteryGauge,
}

impl<A> BatteryMonitor<A>
where
    A: MillivoltSource,
{
    pub fn new(source: A, config: GaugeConfig) -> Self {
        Self {
            source,
            gauge: BatteryGauge::new(config),
        }
    }

    /// Take one sample from the ADC and feed it to the gauge
    ///
    /// Returns the new estimate when this sample completes a window.
    pub fn update(&mut self) -> Result<Option<f32>, Error<A::Error>> {
        let millivolts = self.source.read_millivolts().map_err(Error::Adc)?;
        Ok(self.gauge.ingest(millivolts))
    }

    /// Battery voltage in volts from the last completed window
    pub fn voltage(&self) -> Option<f32> {
        self.gauge.voltage()
    }

    pub fn gauge(&self) -> &BatteryGauge {
        &self.gauge
    }

    pub fn into_source(self) -> A {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GaugeBuilder;

    fn gauge(capacity: usize) -> BatteryGauge {
        BatteryGauge::new(GaugeBuilder::new().capacity(capacity).build().unwrap())
    }

    fn expected(mean_mv: f32) -> f32 {
        mean_mv / 1000.0 / VoltageDivider::REFERENCE.factor()
    }

    #[test]
    fn undefined_until_first_window() {
        let mut g = gauge(4);
        assert_eq!(g.voltage(), None);
        for _ in 0..3 {
            assert_eq!(g.ingest(3000), None);
        }
        assert_eq!(g.voltage(), None);
        assert_eq!(g.pending(), 3);
        assert!(g.ingest(3000).is_some());
        assert_eq!(g.pending(), 0);
    }

    #[test]
    fn three_sample_window() {
        let mut g = gauge(3);
        g.ingest(3000);
        g.ingest(3300);
        let v = g.ingest(3150).unwrap();
        assert!((v - expected(3150.0)).abs() < 1e-4);
        assert!((v - 13.1935).abs() < 1e-3);
    }

    #[test]
    fn estimate_holds_between_flushes() {
        let mut g = gauge(3);
        for mv in [3000, 3000, 3000] {
            g.ingest(mv);
        }
        let first = g.voltage().unwrap();

        g.ingest(4000);
        g.ingest(4000);
        assert_eq!(g.voltage(), Some(first));

        let second = g.ingest(4000).unwrap();
        assert!((second - expected(4000.0)).abs() < 1e-4);
        assert_eq!(g.voltage(), Some(second));
    }

    #[test]
    fn window_does_not_mix_old_samples() {
        let mut g = gauge(2);
        g.ingest(1000);
        g.ingest(1000);
        g.ingest(2000);
        let v = g.ingest(2000).unwrap();
        assert!((v - expected(2000.0)).abs() < 1e-4);
    }

    #[test]
    fn unchecked_zero_capacity_acts_as_one() {
        let config = GaugeConfig {
            capacity: 0,
            divider: VoltageDivider::REFERENCE,
        };
        let mut g = BatteryGauge::new(config);
        assert_eq!(g.capacity(), 1);
        assert!(g.ingest(3000).is_some());
    }

    struct Ramp(u32);

    impl MillivoltSource for Ramp {
        type Error = ();

        fn read_millivolts(&mut self) -> Result<u32, ()> {
            self.0 += 100;
            Ok(self.0)
        }
    }

    struct Broken;

    impl MillivoltSource for Broken {
        type Error = &'static str;

        fn read_millivolts(&mut self) -> Result<u32, Self::Error> {
            Err("conversion timeout")
        }
    }

    #[test]
    fn monitor_reads_one_sample_per_update() {
        let config = GaugeBuilder::new().capacity(4).build().unwrap();
        let mut monitor = BatteryMonitor::new(Ramp(0), config);
        for _ in 0..3 {
            assert_eq!(monitor.update(), Ok(None));
        }
        // 100, 200, 300, 400
        let v = monitor.update().unwrap().unwrap();
        assert!((v - expected(250.0)).abs() < 1e-4);
        assert_eq!(monitor.into_source().0, 400);
    }

    #[test]
    fn monitor_propagates_adc_errors() {
        let mut monitor = BatteryMonitor::new(Broken, GaugeConfig::default());
        assert_eq!(monitor.update(), Err(Error::Adc("conversion timeout")));
        assert_eq!(monitor.gauge().pending(), 0);
    }
}
