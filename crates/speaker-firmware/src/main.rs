mod audio;
mod bluetooth;
mod clock;
mod input;
mod pins;

use std::cell::RefCell;
use std::error::Error;

use esp_idf_svc::hal::{delay::FreeRtos, gpio::IOPin, peripherals::Peripherals};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys;

use speaker_app::{
    ButtonBinding, ButtonId, ConnectionState, Keymap, PlaybackStatus, Remote, StatusReport,
    StatusReporter, DEVICE_NAME, STATUS_INTERVAL_MS,
};
use speaker_input::{BatteryMonitor, Button, Clock, GaugeConfig};

use bluetooth::{AvrcError, AvrcTransport, BtEvent, Bluetooth};
use clock::EspClock;
use input::{BatteryAdc, ButtonPin};

type SharedRemote = RefCell<Remote<AvrcTransport>>;

fn main() -> Result<(), Box<dyn Error>> {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!(
        "Starting {} with {} bytes stack",
        DEVICE_NAME,
        sys::CONFIG_ESP_MAIN_TASK_STACK_SIZE
    );

    let peripherals = Peripherals::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    audio::start(
        peripherals.i2s0,
        peripherals.pins.gpio26,
        peripherals.pins.gpio25,
        peripherals.pins.gpio22,
    )?;
    let bluetooth = Bluetooth::start(peripherals.modem, nvs, DEVICE_NAME)?;

    let clock = EspClock;
    let keymap = Keymap::default();
    let remote: SharedRemote = RefCell::new(Remote::new(AvrcTransport::new()));

    let left = Button::new(
        ButtonPin::new(peripherals.pins.gpio32.downgrade())?,
        ButtonBinding::new(ButtonId::Left, &keymap, &remote),
    );
    let right = Button::new(
        ButtonPin::new(peripherals.pins.gpio33.downgrade())?,
        ButtonBinding::new(ButtonId::Right, &keymap, &remote),
    );
    let center = Button::new(
        ButtonPin::new(peripherals.pins.gpio27.downgrade())?,
        ButtonBinding::new(ButtonId::Center, &keymap, &remote),
    );
    let mut buttons = [left, right, center];
    for button in &mut buttons {
        button.setup(&clock)?;
    }

    let mut battery = BatteryMonitor::new(BatteryAdc::new(), GaugeConfig::default());
    let mut reporter = StatusReporter::new(STATUS_INTERVAL_MS, clock.now_ms());

    log::info!("Entering control loop");
    loop {
        while let Some(event) = bluetooth.poll() {
            handle_bt_event(&remote, event);
        }

        if let Err(err) = battery.update() {
            log::warn!("Battery sample failed: {}", err);
        }

        for button in &mut buttons {
            if let Err(err) = button.update(&clock) {
                log::warn!("Button read failed: {}", err);
            }
        }

        if reporter.due(clock.now_ms()) {
            let remote = remote.borrow();
            log::info!(
                "{}",
                StatusReport {
                    battery_voltage: battery.voltage(),
                    metadata: remote.metadata(),
                }
            );
        }

        FreeRtos::delay_ms(1);
    }
}

fn handle_bt_event(remote: &SharedRemote, event: BtEvent) {
    let mut remote = remote.borrow_mut();
    match event {
        BtEvent::Connection { state, peer } => {
            match state {
                ConnectionState::Connected => remote.transport_mut().set_peer(Some(peer)),
                ConnectionState::Disconnected => remote.transport_mut().set_peer(None),
                ConnectionState::Connecting | ConnectionState::Disconnecting => {}
            }
            remote.on_connection_state(state);
        }
        BtEvent::Controller(connected) => {
            let transport = remote.transport_mut();
            transport.set_controller_connected(connected);
            if connected {
                log_failure(transport.request_metadata());
                log_failure(transport.register_all_notifications());
            }
        }
        BtEvent::Metadata { id, text } => remote.on_metadata(id, &text),
        BtEvent::TrackChanged => {
            let transport = remote.transport_mut();
            log_failure(transport.request_metadata());
            log_failure(transport.register_notification(bluetooth::RN_TRACK_CHANGE));
        }
        BtEvent::PlaybackStatus(code) => {
            remote.on_playback_status(PlaybackStatus::from_code(code));
            log_failure(
                remote
                    .transport_mut()
                    .register_notification(bluetooth::RN_PLAY_STATUS),
            );
        }
        BtEvent::PlayPosition(position_ms) => {
            remote.on_play_position(position_ms);
            log_failure(
                remote
                    .transport_mut()
                    .register_notification(bluetooth::RN_PLAY_POS),
            );
        }
        BtEvent::Volume(volume) => remote.on_volume_change(volume),
    }
}

fn log_failure(result: Result<(), AvrcError>) {
    if let Err(err) = result {
        log::warn!("AVRC request failed: {}", err);
    }
}
