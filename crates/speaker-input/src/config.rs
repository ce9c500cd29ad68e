//! Component configuration types and builder
//!
//! All configuration is fixed at construction time. There is no runtime
//! reconfiguration API; the surrounding application supplies its compile-time
//! constants here.

pub use crate::error::BuilderError;

/// Debounce interval used when the caller does not specify one
pub const DEFAULT_DEBOUNCE_MS: u16 = 5;

/// Number of raw samples averaged into one voltage estimate by default
pub const DEFAULT_SAMPLE_CAPACITY: usize = 10_000;

/// Button configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonConfig {
    /// Time the raw level must hold before the stable state follows it
    pub debounce_ms: u16,
}

impl ButtonConfig {
    /// Create a configuration with the given debounce interval
    pub const fn new(debounce_ms: u16) -> Self {
        Self { debounce_ms }
    }
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

/// Resistive divider between the battery and the sense pin
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoltageDivider {
    /// Resistance from battery positive to the sense pin, in kilohms
    pub upper_kohm: f32,
    /// Resistance from the sense pin to ground, in kilohms
    pub lower_kohm: f32,
}

impl VoltageDivider {
    /// 22k over 6.9k, as fitted on the speaker board
    pub const REFERENCE: Self = Self {
        upper_kohm: 22.0,
        lower_kohm: 6.9,
    };

    /// Create a divider with validation
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::InvalidDivider` if:
    /// - either leg is NaN or infinite
    /// - lower_kohm <= 0
    /// - upper_kohm < 0
    pub fn new(upper_kohm: f32, lower_kohm: f32) -> Result<Self, BuilderError> {
        let valid = upper_kohm.is_finite()
            && lower_kohm.is_finite()
            && lower_kohm > 0.0
            && upper_kohm >= 0.0;
        if !valid {
            return Err(BuilderError::InvalidDivider {
                upper_kohm,
                lower_kohm,
            });
        }
        Ok(Self {
            upper_kohm,
            lower_kohm,
        })
    }

    /// Fraction of the battery voltage that reaches the sense pin
    pub fn factor(&self) -> f32 {
        self.lower_kohm / (self.upper_kohm + self.lower_kohm)
    }
}

impl Default for VoltageDivider {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Battery gauge configuration
///
/// Use `GaugeBuilder` to create a GaugeConfig.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaugeConfig {
    /// Samples per averaging window
    pub capacity: usize,
    /// Divider used to recover the battery voltage
    pub divider: VoltageDivider,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_SAMPLE_CAPACITY,
            divider: VoltageDivider::REFERENCE,
        }
    }
}

/// Builder for constructing gauge configuration
///
/// # Example
///
/// ```
/// use speaker_input::{GaugeBuilder, VoltageDivider};
///
/// let config = GaugeBuilder::new()
///     .capacity(64)
///     .divider(VoltageDivider::new(10.0, 10.0).unwrap())
///     .build()
///     .expect("valid configuration");
/// assert_eq!(config.capacity, 64);
/// assert_eq!(config.divider.factor(), 0.5);
/// ```
#[derive(Default)]
pub struct GaugeBuilder {
    config: GaugeConfig,
}

impl GaugeBuilder {
    /// Create a new GaugeBuilder with the reference values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of samples per averaging window
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Set the voltage divider
    pub fn divider(mut self, divider: VoltageDivider) -> Self {
        self.config.divider = divider;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::ZeroCapacity` if the capacity was set to 0
    pub fn build(self) -> Result<GaugeConfig, BuilderError> {
        if self.config.capacity == 0 {
            return Err(BuilderError::ZeroCapacity);
        }
        Ok(self.config)
    }
}
