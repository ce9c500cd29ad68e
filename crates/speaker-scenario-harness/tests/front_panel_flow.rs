use std::cell::RefCell;

use speaker_app::{
    ButtonBinding, ButtonId, Keymap, PlaybackStatus, Remote, StatusReport, StatusReporter,
    STATUS_INTERVAL_MS,
};
use speaker_input::{BatteryMonitor, Button, Clock, GaugeBuilder};
use speaker_scenario_harness::{
    RecordingTransport, SimAdc, SimClock, SimLine, SimPin, TransportCall,
};

type PanelButton<'a> = Button<SimPin, ButtonBinding<'a, RecordingTransport>>;

/// The firmware control loop, wired to simulated hardware
struct Panel<'a> {
    clock: &'a SimClock,
    remote: &'a RefCell<Remote<RecordingTransport>>,
    lines: [SimLine; 3],
    buttons: [PanelButton<'a>; 3],
    battery: BatteryMonitor<SimAdc>,
    reporter: StatusReporter,
    reports: Vec<String>,
}

impl<'a> Panel<'a> {
    fn new(
        clock: &'a SimClock,
        keymap: &'a Keymap,
        remote: &'a RefCell<Remote<RecordingTransport>>,
    ) -> Self {
        let mut lines = Vec::new();
        let mut buttons = Vec::new();
        for id in ButtonId::ALL {
            let (line, pin) = SimLine::new();
            let mut button = Button::new(pin, ButtonBinding::new(id, keymap, remote));
            button.setup(clock).unwrap();
            lines.push(line);
            buttons.push(button);
        }

        let config = GaugeBuilder::new().capacity(3).build().unwrap();
        Self {
            clock,
            remote,
            lines: lines.try_into().unwrap(),
            buttons: buttons.try_into().ok().unwrap(),
            battery: BatteryMonitor::new(SimAdc::pattern([3_000, 3_300, 3_150]), config),
            reporter: StatusReporter::new(STATUS_INTERVAL_MS, clock.now_ms()),
            reports: Vec::new(),
        }
    }

    fn run(&mut self, ms: u32) {
        for _ in 0..ms {
            self.battery.update().unwrap();
            for button in &mut self.buttons {
                button.update(self.clock).unwrap();
            }
            if self.reporter.due(self.clock.now_ms()) {
                let remote = self.remote.borrow();
                let report = StatusReport {
                    battery_voltage: self.battery.voltage(),
                    metadata: remote.metadata(),
                };
                self.reports.push(report.to_string());
            }
            self.clock.advance(1);
        }
    }

    fn line(&self, id: ButtonId) -> &SimLine {
        let index = ButtonId::ALL
            .iter()
            .position(|&candidate| candidate == id)
            .unwrap();
        &self.lines[index]
    }

    fn tap(&mut self, id: ButtonId) {
        self.line(id).press();
        self.run(100);
        self.line(id).release();
        self.run(30);
    }

    fn hold(&mut self, id: ButtonId) {
        self.line(id).press();
        self.run(400);
        self.line(id).release();
        self.run(30);
    }
}

#[test]
fn gestures_drive_the_transport_through_the_default_keymap() {
    let clock = SimClock::default();
    let keymap = Keymap::default();
    let transport = RecordingTransport::connected(60);
    let calls = transport.clone();
    let remote = RefCell::new(Remote::new(transport));
    let mut panel = Panel::new(&clock, &keymap, &remote);

    panel.tap(ButtonId::Right);
    panel.tap(ButtonId::Left);
    panel.hold(ButtonId::Right);
    panel.hold(ButtonId::Left);
    assert_eq!(
        calls.take_calls(),
        [
            TransportCall::SetVolume(64),
            TransportCall::SetVolume(60),
            TransportCall::Next,
            TransportCall::Previous,
        ]
    );

    panel.tap(ButtonId::Center);
    remote.borrow_mut().on_playback_status(PlaybackStatus::Playing);
    panel.tap(ButtonId::Center);
    panel.hold(ButtonId::Center);
    assert_eq!(
        calls.take_calls(),
        [
            TransportCall::Play,
            TransportCall::Pause,
            TransportCall::Disconnect
        ]
    );

    // Once disconnected the transport rejects commands; the loop keeps going
    panel.tap(ButtonId::Right);
    assert!(calls.take_calls().is_empty());
    assert_eq!(remote.borrow().metadata().volume, 60);
}

#[test]
fn status_reports_follow_the_interval_and_carry_the_battery_estimate() {
    let clock = SimClock::default();
    let keymap = Keymap::default();
    let remote = RefCell::new(Remote::new(RecordingTransport::connected(32)));
    let mut panel = Panel::new(&clock, &keymap, &remote);

    panel.run(STATUS_INTERVAL_MS + 1);
    assert!(panel.reports.is_empty());

    panel.run(1);
    assert_eq!(panel.reports.len(), 1);

    remote.borrow_mut().on_metadata(0x01, b"Night Drive\0");
    panel.tap(ButtonId::Right);
    panel.run(STATUS_INTERVAL_MS);

    assert_eq!(panel.reports.len(), 2);
    let last = panel.reports.last().unwrap();
    assert!(last.contains("Battery voltage: 13.19"));
    assert!(last.contains("Title: Night Drive"));
    assert!(last.ends_with("Volume: 36"));
}

#[test]
fn buttons_are_independent() {
    let clock = SimClock::default();
    let keymap = Keymap::default();
    let transport = RecordingTransport::connected(20);
    let calls = transport.clone();
    let remote = RefCell::new(Remote::new(transport));
    let mut panel = Panel::new(&clock, &keymap, &remote);

    // Hold left for a long press while right is tapped underneath it
    panel.line(ButtonId::Left).press();
    panel.run(50);
    panel.line(ButtonId::Right).press();
    panel.run(100);
    panel.line(ButtonId::Right).release();
    panel.run(300);
    panel.line(ButtonId::Left).release();
    panel.run(30);

    assert_eq!(
        calls.take_calls(),
        [TransportCall::SetVolume(24), TransportCall::Previous]
    );
}

#[test]
fn failed_pairing_request_can_be_retried() {
    let clock = SimClock::default();
    let keymap = Keymap::default();
    let transport = RecordingTransport::connected(20);
    let calls = transport.clone();
    let remote = RefCell::new(Remote::new(transport));
    let mut panel = Panel::new(&clock, &keymap, &remote);

    calls.fail_next();
    panel.hold(ButtonId::Center);
    assert!(calls.take_calls().is_empty());

    // The link is still up, so the next request reaches the source
    panel.tap(ButtonId::Right);
    panel.hold(ButtonId::Center);
    assert_eq!(
        calls.take_calls(),
        [TransportCall::SetVolume(24), TransportCall::Disconnect]
    );
}
