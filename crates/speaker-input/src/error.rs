//! Error types for the input components
//!
//! This module defines error types for configuration building ([`BuilderError`])
//! and for per-tick hardware access ([`Error`]).
//!
//! Neither state machine has a failure mode of its own. Noisy input is
//! filtered and out-of-range analog readings are averaged as-is, so the only
//! errors that reach the caller come from the hardware collaborators.
//!
//! ## Example
//!
//! ```
//! use speaker_input::{BuilderError, GaugeBuilder};
//!
//! let result = GaugeBuilder::new().capacity(0).build();
//! assert!(matches!(result, Err(BuilderError::ZeroCapacity)));
//! ```

/// Errors raised while polling a component
///
/// Generic over the collaborator's error type so the caller can still match on
/// the underlying HAL error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Reading or configuring the digital input failed
    Pin(E),
    /// The analog conversion failed
    Adc(E),
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Pin(e) => write!(f, "Pin error: {e:?}"),
            Error::Adc(e) => write!(f, "ADC error: {e:?}"),
        }
    }
}

impl<E: core::fmt::Debug> core::error::Error for Error<E> {}

/// Errors that can occur when building configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BuilderError {
    /// The sample window must hold at least one sample
    ZeroCapacity,
    /// The divider resistances do not produce a usable attenuation factor
    ///
    /// Both legs must be finite, the lower leg must be positive and the upper
    /// leg must not be negative.
    InvalidDivider {
        /// Resistance between battery and sense pin, in kilohms
        upper_kohm: f32,
        /// Resistance between sense pin and ground, in kilohms
        lower_kohm: f32,
    },
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BuilderError::ZeroCapacity => write!(f, "Sample capacity must be at least 1"),
            BuilderError::InvalidDivider {
                upper_kohm,
                lower_kohm,
            } => write!(
                f,
                "Invalid voltage divider {upper_kohm}k/{lower_kohm}k (lower leg must be positive)"
            ),
        }
    }
}

impl core::error::Error for BuilderError {}
