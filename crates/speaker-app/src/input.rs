//! Button input abstraction and default key bindings.

use core::fmt;

/// Physical buttons on the speaker front panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    Left,
    Right,
    Center,
}

impl ButtonId {
    pub const ALL: [ButtonId; 3] = [ButtonId::Left, ButtonId::Right, ButtonId::Center];
}

/// Input events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    ShortPress(ButtonId),
    LongPress(ButtonId),
}

/// Actions the speaker can perform on the connected source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    VolumeUp,
    VolumeDown,
    NextTrack,
    PreviousTrack,
    TogglePlayback,
    EnterPairing,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Command::VolumeUp => "Increase volume",
            Command::VolumeDown => "Decrease volume",
            Command::NextTrack => "Next track",
            Command::PreviousTrack => "Previous track",
            Command::TogglePlayback => "Change play state",
            Command::EnterPairing => "Enter pairing mode",
        };
        f.write_str(label)
    }
}

/// Commands bound to one button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub short: Command,
    pub long: Command,
}

/// Button-to-command table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keymap {
    pub left: Binding,
    pub right: Binding,
    pub center: Binding,
}

impl Keymap {
    pub fn binding(&self, button: ButtonId) -> Binding {
        match button {
            ButtonId::Left => self.left,
            ButtonId::Right => self.right,
            ButtonId::Center => self.center,
        }
    }

    /// Resolve an input event to the command it triggers
    pub fn command(&self, event: InputEvent) -> Command {
        match event {
            InputEvent::ShortPress(button) => self.binding(button).short,
            InputEvent::LongPress(button) => self.binding(button).long,
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            left: Binding {
                short: Command::VolumeDown,
                long: Command::PreviousTrack,
            },
            right: Binding {
                short: Command::VolumeUp,
                long: Command::NextTrack,
            },
            center: Binding {
                short: Command::TogglePlayback,
                long: Command::EnterPairing,
            },
        }
    }
}
