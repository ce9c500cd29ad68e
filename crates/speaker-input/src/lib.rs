//! Input conditioning for a polled audio-receiver control loop.
//!
//! Two independent components, each owning its state and advanced once per
//! control-loop tick:
//!
//! - [`Button`]: debounced active-low push button that reports press,
//!   short-press and long-press gestures through a [`ButtonHandler`].
//! - [`BatteryMonitor`] / [`BatteryGauge`]: block-averaging voltage estimate
//!   behind a resistive divider.
//!
//! Hardware access goes through the traits in [`hal`], so both components run
//! unchanged on the target and in host tests.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::unreachable,
        clippy::unwrap_used
    )
)]

extern crate alloc;

pub mod battery;
pub mod button;
pub mod config;
pub mod debounce;
pub mod error;
pub mod hal;

pub use battery::{BatteryGauge, BatteryMonitor};
pub use button::{Button, ButtonEvent, ButtonHandler, ButtonState, Callbacks, LONG_PRESS_MS};
pub use config::{
    ButtonConfig, GaugeBuilder, GaugeConfig, VoltageDivider, DEFAULT_DEBOUNCE_MS,
    DEFAULT_SAMPLE_CAPACITY,
};
pub use debounce::Debouncer;
pub use error::{BuilderError, Error};
pub use hal::{Clock, MillivoltSource, PullUpInput};
