//! Debounced push button with short/long press detection
//!
//! A [`Button`] owns an active-low input pin and a [`ButtonHandler`]. Polled
//! once per control-loop tick it turns the noisy pin level into three events:
//!
//! | Event                      | When                                                   |
//! |----------------------------|--------------------------------------------------------|
//! | [`ButtonEvent::Pressed`]   | the debounced level goes LOW                           |
//! | [`ButtonEvent::LongPress`] | held for more than [`LONG_PRESS_MS`], once per press   |
//! | [`ButtonEvent::ShortPress`]| released after at most [`LONG_PRESS_MS`]               |
//!
//! Each press/release cycle produces at most one of short or long press.
//! Releasing a long press produces nothing further, and neither does a
//! release whose held time only exceeded [`LONG_PRESS_MS`] while no tick
//! observed the press (a stalled control loop).
//!
//! ## Example
//!
//! ```rust,ignore
//! use speaker_input::{Button, Callbacks};
//!
//! let mut left = Button::new(pin, Callbacks::new(volume_down, previous_track));
//! left.setup(&clock)?;
//! loop {
//!     left.update(&clock)?;
//! }
//! ```

use crate::config::ButtonConfig;
use crate::debounce::Debouncer;
use crate::error::Error;
use crate::hal::{Clock, PullUpInput};

/// Hold time that separates a short press from a long press
///
/// A press lasting exactly this long still counts as short.
pub const LONG_PRESS_MS: u32 = 330;

/// Debounced button level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonState {
    Released,
    Pressed,
}

/// Events emitted by [`Button::update`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonEvent {
    /// The button settled in the pressed state
    Pressed,
    /// The button was released before the long-press threshold
    ShortPress,
    /// The button has been held past the long-press threshold
    LongPress,
}

/// Receiver for button gestures
///
/// Both methods default to doing nothing, so a handler only implements the
/// gestures it cares about. Handlers run inline on the polling thread and must
/// not block.
pub trait ButtonHandler {
    fn on_short_press(&mut self) {}

    fn on_long_press(&mut self) {}
}

/// No-op handler
impl ButtonHandler for () {}

impl<H: ButtonHandler + ?Sized> ButtonHandler for &mut H {
    fn on_short_press(&mut self) {
        (**self).on_short_press();
    }

    fn on_long_press(&mut self) {
        (**self).on_long_press();
    }
}

/// Handler built from a pair of closures
pub struct Callbacks<S, L> {
    short: S,
    long: L,
}

impl<S, L> Callbacks<S, L>
where
    S: FnMut(),
    L: FnMut(),
{
    pub fn new(short: S, long: L) -> Self {
        Self { short, long }
    }
}

impl<S, L> ButtonHandler for Callbacks<S, L>
where
    S: FnMut(),
    L: FnMut(),
{
    fn on_short_press(&mut self) {
        (self.short)();
    }

    fn on_long_press(&mut self) {
        (self.long)();
    }
}

/// Active-low push button
pub struct Button<P, H> {
    pin: P,
    handler: H,
    debouncer: Debouncer,
    /// Set once the long press of the current hold has been reported
    long_press_fired: bool,
}

impl<P, H> Button<P, H>
where
    P: PullUpInput,
    H: ButtonHandler,
{
    /// Create a button with the default 5 ms debounce interval
    pub fn new(pin: P, handler: H) -> Self {
        Self::with_config(pin, handler, ButtonConfig::default())
    }

    /// Create a button with an explicit configuration
    pub fn with_config(pin: P, handler: H, config: ButtonConfig) -> Self {
        Self {
            pin,
            handler,
            debouncer: Debouncer::new(config.debounce_ms, false, 0),
            long_press_fired: false,
        }
    }

    /// Enable the pin's pull-up and start timing from `clock`
    ///
    /// Must be called once before the first [`update`](Self::update). The
    /// button always starts in [`ButtonState::Released`]; a button held at
    /// boot registers as a press once its level has settled.
    pub fn setup<C: Clock>(&mut self, clock: &C) -> Result<(), Error<P::Error>> {
        self.pin.configure_pull_up().map_err(Error::Pin)?;
        self.debouncer = Debouncer::new(self.debouncer.interval_ms(), false, clock.now_ms());
        self.long_press_fired = false;
        Ok(())
    }

    /// Sample the pin and run the press state machine
    ///
    /// Calls the handler inline when a short or long press is recognised and
    /// returns the event of this tick, if any. At most one event is produced
    /// per call.
    pub fn update<C: Clock>(&mut self, clock: &C) -> Result<Option<ButtonEvent>, Error<P::Error>> {
        let now = clock.now_ms();
        let pressed = self.pin.is_low().map_err(Error::Pin)?;
        self.debouncer.update(pressed, now);
        Ok(self.classify())
    }

    fn classify(&mut self) -> Option<ButtonEvent> {
        if self.debouncer.activated() {
            return Some(ButtonEvent::Pressed);
        }

        if self.debouncer.is_active() {
            if !self.long_press_fired && self.debouncer.current_duration() > LONG_PRESS_MS {
                self.long_press_fired = true;
                log::debug!("button: long press");
                self.handler.on_long_press();
                return Some(ButtonEvent::LongPress);
            }
            return None;
        }

        if self.debouncer.deactivated() {
            let held_ms = self.debouncer.previous_duration();
            if core::mem::replace(&mut self.long_press_fired, false) {
                return None;
            }
            if held_ms <= LONG_PRESS_MS {
                log::debug!("button: short press ({} ms)", held_ms);
                self.handler.on_short_press();
                return Some(ButtonEvent::ShortPress);
            }
            log::debug!("button: release after {} ms without long press", held_ms);
            return None;
        }

        None
    }

    /// Debounced level
    pub fn state(&self) -> ButtonState {
        if self.debouncer.is_active() {
            ButtonState::Pressed
        } else {
            ButtonState::Released
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.state() == ButtonState::Pressed
    }

    /// Whether the current hold has already produced its long press
    pub fn long_press_fired(&self) -> bool {
        self.long_press_fired
    }

    /// Milliseconds in the current debounced state
    pub fn current_duration(&self) -> u32 {
        self.debouncer.current_duration()
    }

    /// Milliseconds spent in the previous debounced state
    pub fn previous_duration(&self) -> u32 {
        self.debouncer.previous_duration()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Give back the pin and the handler
    pub fn into_parts(self) -> (P, H) {
        (self.pin, self.handler)
    }
}
