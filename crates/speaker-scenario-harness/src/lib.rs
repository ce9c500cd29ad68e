//! Host-side scenario test harness for scripted button and battery flows.
//!
//! Provides simulated hardware for the seams in `speaker_input::hal` and a
//! recording [`Transport`], so complete control-loop scenarios run on the
//! host with millisecond-exact timing.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin};
use speaker_app::Transport;
use speaker_input::{
    Button, ButtonConfig, ButtonEvent, ButtonHandler, Clock, MillivoltSource, PullUpInput,
};

/// Manually advanced millisecond clock
#[derive(Debug, Default)]
pub struct SimClock {
    now: Cell<u32>,
}

impl SimClock {
    pub fn starting_at(now_ms: u32) -> Self {
        Self {
            now: Cell::new(now_ms),
        }
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}

#[derive(Debug)]
struct LineState {
    low: Cell<bool>,
    pulled_up: Cell<bool>,
}

/// Test-side handle of a simulated button line
///
/// Cloning shares the same line; the paired [`SimPin`] observes every change.
#[derive(Debug, Clone)]
pub struct SimLine {
    state: Rc<LineState>,
}

impl SimLine {
    /// Create a released line and the pin that reads it
    pub fn new() -> (Self, SimPin) {
        let state = Rc::new(LineState {
            low: Cell::new(false),
            pulled_up: Cell::new(false),
        });
        (
            Self {
                state: state.clone(),
            },
            SimPin { state },
        )
    }

    /// Drive the line LOW (button closed)
    pub fn press(&self) {
        self.state.low.set(true);
    }

    /// Let the pull-up bring the line HIGH (button open)
    pub fn release(&self) {
        self.state.low.set(false);
    }

    pub fn set_low(&self, low: bool) {
        self.state.low.set(low);
    }

    pub fn is_pulled_up(&self) -> bool {
        self.state.pulled_up.get()
    }
}

/// Simulated active-low GPIO input
#[derive(Debug)]
pub struct SimPin {
    state: Rc<LineState>,
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.state.low.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.state.low.get())
    }
}

impl PullUpInput for SimPin {
    fn configure_pull_up(&mut self) -> Result<(), Self::Error> {
        self.state.pulled_up.set(true);
        Ok(())
    }
}

/// Simulated ADC channel replaying a repeating millivolt pattern
#[derive(Debug)]
pub struct SimAdc {
    pattern: Vec<u32>,
    next: usize,
    reads: usize,
}

impl SimAdc {
    pub fn constant(millivolts: u32) -> Self {
        Self::pattern([millivolts])
    }

    /// Replay `pattern` in order, starting over after the last element
    ///
    /// An empty pattern reads 0 mV.
    pub fn pattern(pattern: impl IntoIterator<Item = u32>) -> Self {
        Self {
            pattern: pattern.into_iter().collect(),
            next: 0,
            reads: 0,
        }
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl MillivoltSource for SimAdc {
    type Error = Infallible;

    fn read_millivolts(&mut self) -> Result<u32, Self::Error> {
        self.reads += 1;
        let Some(&value) = self.pattern.get(self.next) else {
            return Ok(0);
        };
        self.next = (self.next + 1) % self.pattern.len();
        Ok(value)
    }
}

/// Handler that counts gestures
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GestureCount {
    pub short: u32,
    pub long: u32,
}

impl ButtonHandler for GestureCount {
    fn on_short_press(&mut self) {
        self.short += 1;
    }

    fn on_long_press(&mut self) {
        self.long += 1;
    }
}

/// Event returned by a poll, stamped with the poll time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampedEvent {
    pub at_ms: u32,
    pub event: ButtonEvent,
}

/// One simulated button polled every millisecond
pub struct ButtonRig {
    clock: SimClock,
    line: SimLine,
    button: Button<SimPin, GestureCount>,
    events: Vec<StampedEvent>,
}

impl ButtonRig {
    /// Set up a released button with the given debounce interval at t = 0
    pub fn new(debounce_ms: u16) -> Self {
        let clock = SimClock::default();
        let (line, pin) = SimLine::new();
        let mut button =
            Button::with_config(pin, GestureCount::default(), ButtonConfig::new(debounce_ms));
        button
            .setup(&clock)
            .expect("simulated pin setup is infallible");
        Self {
            clock,
            line,
            button,
            events: Vec::new(),
        }
    }

    /// Hold the raw level for `ms` milliseconds, polling once per millisecond
    pub fn hold(&mut self, low: bool, ms: u32) {
        log::debug!(
            "scenario: {} for {} ms at t={}",
            if low { "LOW" } else { "HIGH" },
            ms,
            self.clock.now_ms()
        );
        self.line.set_low(low);
        for _ in 0..ms {
            self.poll();
            self.clock.advance(1);
        }
    }

    /// Hold the button down for `ms` milliseconds
    pub fn press_for(&mut self, ms: u32) {
        self.hold(true, ms);
    }

    /// Leave the button released for `ms` milliseconds
    pub fn release_for(&mut self, ms: u32) {
        self.hold(false, ms);
    }

    /// Replay a contact-bounce pattern: alternating levels starting LOW, each
    /// held for the given number of milliseconds
    pub fn bounce(&mut self, starting_low: bool, segments_ms: &[u32]) {
        let mut low = starting_low;
        for &ms in segments_ms {
            self.hold(low, ms);
            low = !low;
        }
    }

    /// Let time pass without polling
    pub fn stall(&mut self, ms: u32) {
        self.clock.advance(ms);
    }

    fn poll(&mut self) {
        let event = self
            .button
            .update(&self.clock)
            .expect("simulated pin reads are infallible");
        if let Some(event) = event {
            self.events.push(StampedEvent {
                at_ms: self.clock.now_ms(),
                event,
            });
        }
    }

    pub fn gestures(&self) -> GestureCount {
        *self.button.handler()
    }

    /// Every event returned by `update`, in order
    pub fn events(&self) -> &[StampedEvent] {
        &self.events
    }

    pub fn events_of(&self, kind: ButtonEvent) -> Vec<u32> {
        self.events
            .iter()
            .filter(|e| e.event == kind)
            .map(|e| e.at_ms)
            .collect()
    }

    pub fn now_ms(&self) -> u32 {
        self.clock.now_ms()
    }

    pub fn button(&self) -> &Button<SimPin, GestureCount> {
        &self.button
    }

    pub fn line(&self) -> &SimLine {
        &self.line
    }
}

/// Transport call recorded by [`RecordingTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCall {
    Play,
    Pause,
    Next,
    Previous,
    SetVolume(u8),
    Disconnect,
}

/// Error returned by a [`RecordingTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    NotConnected,
    /// Injected with [`RecordingTransport::fail_next`]
    Rejected,
}

/// Transport double that records calls into a shared log
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    calls: Rc<RefCell<VecDeque<TransportCall>>>,
    volume: u8,
    connected: bool,
    fail_next: Rc<Cell<bool>>,
}

impl RecordingTransport {
    pub fn connected(volume: u8) -> Self {
        Self {
            calls: Rc::default(),
            volume,
            connected: true,
            fail_next: Rc::default(),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Remove and return the calls recorded so far
    pub fn take_calls(&self) -> Vec<TransportCall> {
        self.calls.borrow_mut().drain(..).collect()
    }

    /// Make the next call fail without changing any state
    pub fn fail_next(&self) {
        self.fail_next.set(true);
    }

    fn record(&mut self, call: TransportCall) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        if self.fail_next.replace(false) {
            return Err(TransportError::Rejected);
        }
        self.calls.borrow_mut().push_back(call);
        Ok(())
    }
}

impl Transport for RecordingTransport {
    type Error = TransportError;

    fn play(&mut self) -> Result<(), Self::Error> {
        self.record(TransportCall::Play)
    }

    fn pause(&mut self) -> Result<(), Self::Error> {
        self.record(TransportCall::Pause)
    }

    fn next(&mut self) -> Result<(), Self::Error> {
        self.record(TransportCall::Next)
    }

    fn previous(&mut self) -> Result<(), Self::Error> {
        self.record(TransportCall::Previous)
    }

    fn volume(&self) -> u8 {
        self.volume
    }

    fn set_volume(&mut self, volume: u8) -> Result<(), Self::Error> {
        self.record(TransportCall::SetVolume(volume))?;
        self.volume = volume;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        self.record(TransportCall::Disconnect)?;
        self.connected = false;
        Ok(())
    }
}
