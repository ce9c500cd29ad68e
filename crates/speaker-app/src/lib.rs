//! Application layer for the ESP32 Bluetooth speaker.
//! Shared between the firmware and host-side scenario tests.

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

pub mod audio;
pub mod input;
pub mod metadata;
pub mod remote;
pub mod status;

pub use audio::condition_pcm;
pub use input::{Binding, ButtonId, Command, InputEvent, Keymap};
pub use metadata::{Metadata, MetadataAttribute, PlaybackStatus, REQUESTED_ATTRIBUTES};
pub use remote::{ButtonBinding, ConnectionState, Remote, Transport, MAX_VOLUME, VOLUME_STEP};
pub use status::{StatusReport, StatusReporter, STATUS_INTERVAL_MS};

/// Name advertised to phones during pairing
pub const DEVICE_NAME: &str = "ESP32 Speaker";
