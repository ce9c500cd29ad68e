//! Hardware seams consumed by the input components
//!
//! The button and the battery gauge never talk to a peripheral directly. They
//! are generic over the small set of traits in this module, so the same state
//! machines run on the ESP32 and inside host tests.
//!
//! ## What the host environment provides
//!
//! - A monotonic millisecond clock ([`Clock`])
//! - A digital read returning the pin level
//!   ([`InputPin`](embedded_hal::digital::InputPin), from embedded-hal)
//! - A way to switch that pin into pulled-up input mode ([`PullUpInput`])
//! - An analog read returning millivolts ([`MillivoltSource`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use speaker_input::{Clock, MillivoltSource};
//!
//! struct Uptime;
//!
//! impl Clock for Uptime {
//!     fn now_ms(&self) -> u32 {
//!         board::uptime_ms()
//!     }
//! }
//! ```

use core::fmt::Debug;
use embedded_hal::digital::InputPin;

/// Monotonic millisecond clock
///
/// The value is allowed to wrap around at `u32::MAX`. Every consumer in this
/// crate uses wrapping arithmetic on the returned timestamps, matching the
/// behaviour of a free-running 32-bit tick counter.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin
    fn now_ms(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Digital input that can be switched to pulled-up mode
///
/// A released button must read logical HIGH, so the pin needs its pull-up
/// enabled before the first sample is taken.
///
/// ## Implementing
///
/// Wrap the HAL's pin driver in a newtype and forward the pull configuration.
/// Errors use the same type as the embedded-hal [`InputPin`] reads.
pub trait PullUpInput: InputPin {
    /// Configure the pin as an input with the internal pull-up enabled
    ///
    /// # Errors
    ///
    /// Returns an error if the HAL refuses the configuration.
    fn configure_pull_up(&mut self) -> Result<(), Self::Error>;
}

/// Analog channel that reports calibrated millivolts
///
/// This is the consumption side of the ADC primitive. Readings are passed to
/// the gauge unvalidated; the gauge averages whatever it is given.
pub trait MillivoltSource {
    /// Error type for conversion failures
    type Error: Debug;

    /// Perform one conversion and return the result in millivolts
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion could not be performed.
    fn read_millivolts(&mut self) -> Result<u32, Self::Error>;
}

impl<M: MillivoltSource + ?Sized> MillivoltSource for &mut M {
    type Error = M::Error;

    fn read_millivolts(&mut self) -> Result<u32, Self::Error> {
        (**self).read_millivolts()
    }
}
