//! Playback remote: turns commands into transport calls and tracks what the
//! source reports back.

use core::cell::RefCell;
use core::fmt::Debug;

use speaker_input::ButtonHandler;

use crate::input::{ButtonId, Command, InputEvent, Keymap};
use crate::metadata::{Metadata, PlaybackStatus};

/// Volume change per button press
pub const VOLUME_STEP: u8 = 4;

/// Upper end of the AVRC absolute volume range
pub const MAX_VOLUME: u8 = 127;

/// Transport control offered by the Bluetooth sink
///
/// Implemented by the firmware on top of AVRC passthrough commands and by
/// recording doubles in tests.
pub trait Transport {
    type Error: Debug;

    fn play(&mut self) -> Result<(), Self::Error>;

    fn pause(&mut self) -> Result<(), Self::Error>;

    fn next(&mut self) -> Result<(), Self::Error>;

    fn previous(&mut self) -> Result<(), Self::Error>;

    /// Current output volume, 0..=127
    fn volume(&self) -> u8;

    fn set_volume(&mut self, volume: u8) -> Result<(), Self::Error>;

    /// Drop the current source so another device can pair
    fn disconnect(&mut self) -> Result<(), Self::Error>;
}

/// A2DP link state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// Command executor with the last-known source state
pub struct Remote<T> {
    transport: T,
    metadata: Metadata,
    connection: ConnectionState,
}

impl<T> Remote<T>
where
    T: Transport,
{
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            metadata: Metadata::default(),
            connection: ConnectionState::Disconnected,
        }
    }

    /// Run one command against the transport
    ///
    /// Transport failures are logged and returned; the metadata is left as it
    /// was before the command.
    pub fn execute(&mut self, command: Command) -> Result<(), T::Error> {
        log::info!("{}", command);
        let result = match command {
            Command::VolumeUp => self.step_volume(true),
            Command::VolumeDown => self.step_volume(false),
            Command::NextTrack => self.transport.next(),
            Command::PreviousTrack => self.transport.previous(),
            Command::TogglePlayback => self.toggle_playback(),
            Command::EnterPairing => self.transport.disconnect(),
        };
        if let Err(err) = &result {
            log::warn!("{} failed: {:?}", command, err);
        }
        result
    }

    /// Resolve `event` through `keymap` and execute it
    pub fn handle(&mut self, keymap: &Keymap, event: InputEvent) -> Result<(), T::Error> {
        self.execute(keymap.command(event))
    }

    fn step_volume(&mut self, up: bool) -> Result<(), T::Error> {
        let current = self.transport.volume();
        let volume = if up {
            current.saturating_add(VOLUME_STEP).min(MAX_VOLUME)
        } else {
            current.saturating_sub(VOLUME_STEP)
        };
        self.transport.set_volume(volume)?;
        self.metadata.volume = volume;
        Ok(())
    }

    fn toggle_playback(&mut self) -> Result<(), T::Error> {
        match self.metadata.status {
            PlaybackStatus::Paused | PlaybackStatus::Stopped => self.transport.play(),
            PlaybackStatus::Playing => self.transport.pause(),
            PlaybackStatus::ForwardSeek | PlaybackStatus::ReverseSeek | PlaybackStatus::Error => {
                Ok(())
            }
        }
    }

    /// Media attribute response from the source
    pub fn on_metadata(&mut self, id: u8, data: &[u8]) {
        if !self.metadata.apply_attribute(id, data) {
            log::debug!("Ignoring metadata attribute 0x{:02x}", id);
        }
    }

    /// Absolute volume set by the source
    pub fn on_volume_change(&mut self, volume: u8) {
        self.metadata.volume = volume.min(MAX_VOLUME);
    }

    pub fn on_play_position(&mut self, position_ms: u32) {
        self.metadata.position_ms = position_ms;
    }

    pub fn on_playback_status(&mut self, status: PlaybackStatus) {
        self.metadata.status = status;
    }

    pub fn on_connection_state(&mut self, state: ConnectionState) {
        match state {
            ConnectionState::Connected => log::info!("A2DP connected"),
            ConnectionState::Disconnected => log::warn!("A2DP disconnected"),
            ConnectionState::Connecting | ConnectionState::Disconnecting => {}
        }
        self.connection = state;
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

/// Button handler that forwards one button's gestures to a shared remote
///
/// All three front-panel buttons share the same [`Remote`], so it is held in a
/// `RefCell` owned by the control loop.
pub struct ButtonBinding<'a, T> {
    button: ButtonId,
    keymap: &'a Keymap,
    remote: &'a RefCell<Remote<T>>,
}

impl<'a, T> ButtonBinding<'a, T>
where
    T: Transport,
{
    pub fn new(button: ButtonId, keymap: &'a Keymap, remote: &'a RefCell<Remote<T>>) -> Self {
        Self {
            button,
            keymap,
            remote,
        }
    }

    pub fn button(&self) -> ButtonId {
        self.button
    }

    fn dispatch(&self, event: InputEvent) {
        let Ok(mut remote) = self.remote.try_borrow_mut() else {
            log::warn!("Remote busy, dropping {:?}", event);
            return;
        };
        // Failures were already logged by the remote
        remote.handle(self.keymap, event).ok();
    }
}

impl<T> ButtonHandler for ButtonBinding<'_, T>
where
    T: Transport,
{
    fn on_short_press(&mut self) {
        self.dispatch(InputEvent::ShortPress(self.button));
    }

    fn on_long_press(&mut self) {
        self.dispatch(InputEvent::LongPress(self.button));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Play,
        Pause,
        Next,
        Previous,
        SetVolume(u8),
        Disconnect,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        volume: u8,
        offline: bool,
    }

    impl Recorder {
        fn record(&mut self, call: Call) -> Result<(), &'static str> {
            if self.offline {
                return Err("not connected");
            }
            self.calls.push(call);
            Ok(())
        }
    }

    impl Transport for Recorder {
        type Error = &'static str;

        fn play(&mut self) -> Result<(), Self::Error> {
            self.record(Call::Play)
        }

        fn pause(&mut self) -> Result<(), Self::Error> {
            self.record(Call::Pause)
        }

        fn next(&mut self) -> Result<(), Self::Error> {
            self.record(Call::Next)
        }

        fn previous(&mut self) -> Result<(), Self::Error> {
            self.record(Call::Previous)
        }

        fn volume(&self) -> u8 {
            self.volume
        }

        fn set_volume(&mut self, volume: u8) -> Result<(), Self::Error> {
            self.record(Call::SetVolume(volume))?;
            self.volume = volume;
            Ok(())
        }

        fn disconnect(&mut self) -> Result<(), Self::Error> {
            self.record(Call::Disconnect)
        }
    }

    #[test]
    fn volume_steps_and_clamps() {
        let mut remote = Remote::new(Recorder {
            volume: 125,
            ..Recorder::default()
        });
        remote.execute(Command::VolumeUp).unwrap();
        assert_eq!(remote.metadata().volume, MAX_VOLUME);

        remote.transport_mut().volume = 2;
        remote.execute(Command::VolumeDown).unwrap();
        assert_eq!(remote.metadata().volume, 0);

        remote.execute(Command::VolumeUp).unwrap();
        assert_eq!(remote.metadata().volume, VOLUME_STEP);
        assert_eq!(
            remote.transport().calls,
            [Call::SetVolume(127), Call::SetVolume(0), Call::SetVolume(4)]
        );
    }

    #[test]
    fn toggle_follows_reported_status() {
        let mut remote = Remote::new(Recorder::default());
        remote.execute(Command::TogglePlayback).unwrap();

        remote.on_playback_status(PlaybackStatus::Playing);
        remote.execute(Command::TogglePlayback).unwrap();

        remote.on_playback_status(PlaybackStatus::Paused);
        remote.execute(Command::TogglePlayback).unwrap();

        remote.on_playback_status(PlaybackStatus::ForwardSeek);
        remote.execute(Command::TogglePlayback).unwrap();

        assert_eq!(remote.transport().calls, [Call::Play, Call::Pause, Call::Play]);
    }

    #[test]
    fn track_and_pairing_commands() {
        let mut remote = Remote::new(Recorder::default());
        let keymap = Keymap::default();
        remote
            .handle(&keymap, InputEvent::LongPress(ButtonId::Right))
            .unwrap();
        remote
            .handle(&keymap, InputEvent::LongPress(ButtonId::Left))
            .unwrap();
        remote
            .handle(&keymap, InputEvent::LongPress(ButtonId::Center))
            .unwrap();
        assert_eq!(
            remote.transport().calls,
            [Call::Next, Call::Previous, Call::Disconnect]
        );
    }

    #[test]
    fn failed_volume_change_keeps_metadata() {
        let mut remote = Remote::new(Recorder {
            volume: 40,
            offline: true,
            ..Recorder::default()
        });
        remote.on_volume_change(40);
        assert_eq!(remote.execute(Command::VolumeUp), Err("not connected"));
        assert_eq!(remote.metadata().volume, 40);
    }

    #[test]
    fn notifications_update_metadata() {
        let mut remote = Remote::new(Recorder::default());
        remote.on_metadata(0x01, b"Title\0");
        remote.on_volume_change(200);
        remote.on_play_position(61_000);
        remote.on_connection_state(ConnectionState::Connected);

        let meta = remote.metadata();
        assert_eq!(meta.title, "Title");
        assert_eq!(meta.volume, MAX_VOLUME);
        assert_eq!(meta.position_ms, 61_000);
        assert_eq!(remote.connection(), ConnectionState::Connected);
    }

    #[test]
    fn binding_routes_gestures_through_keymap() {
        let keymap = Keymap::default();
        let remote = RefCell::new(Remote::new(Recorder::default()));
        let mut left = ButtonBinding::new(ButtonId::Left, &keymap, &remote);
        let mut right = ButtonBinding::new(ButtonId::Right, &keymap, &remote);

        right.on_short_press();
        right.on_short_press();
        left.on_short_press();
        left.on_long_press();

        let remote = remote.into_inner();
        assert_eq!(
            remote.transport().calls,
            [
                Call::SetVolume(4),
                Call::SetVolume(8),
                Call::SetVolume(4),
                Call::Previous
            ]
        );
    }

    #[test]
    fn binding_drops_event_while_remote_is_borrowed() {
        let keymap = Keymap::default();
        let remote = RefCell::new(Remote::new(Recorder::default()));
        let mut center = ButtonBinding::new(ButtonId::Center, &keymap, &remote);
        {
            let _guard = remote.borrow();
            center.on_short_press();
        }
        assert!(remote.borrow().transport().calls.is_empty());
    }
}
