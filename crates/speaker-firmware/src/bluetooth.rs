//! Bluetooth Classic glue: A2DP sink and AVRC callbacks forwarded to the
//! control loop, and the AVRC passthrough transport.
//!
//! Stack callbacks run on the Bluedroid task. They only translate their
//! parameters into [`BtEvent`]s and post them over a channel; all state lives
//! in the control loop.

use std::ffi::CString;
use std::fmt;
use std::slice;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, OnceLock};

use esp_idf_svc::bt::{BtClassic, BtDriver};
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::{self, esp, EspError};

use speaker_app::{ConnectionState, Transport, MAX_VOLUME, REQUESTED_ATTRIBUTES};

use crate::audio;

pub const RN_TRACK_CHANGE: u8 = sys::esp_avrc_rn_event_ids_t_ESP_AVRC_RN_TRACK_CHANGE as u8;
pub const RN_PLAY_STATUS: u8 = sys::esp_avrc_rn_event_ids_t_ESP_AVRC_RN_PLAY_STATUS_CHANGE as u8;
pub const RN_PLAY_POS: u8 = sys::esp_avrc_rn_event_ids_t_ESP_AVRC_RN_PLAY_POS_CHANGED as u8;
const RN_VOLUME: u8 = sys::esp_avrc_rn_event_ids_t_ESP_AVRC_RN_VOLUME_CHANGE as u8;

/// Play position notification period requested from the source
const PLAY_POS_INTERVAL_S: u32 = 1;

/// Output volume until the source sets one
const DEFAULT_VOLUME: u8 = 64;

/// Absolute volume, written by the loop and read by the stack callbacks
static VOLUME: AtomicU8 = AtomicU8::new(DEFAULT_VOLUME);
/// Set while the source waits for a volume change notification
static VOLUME_NOTIFY: AtomicBool = AtomicBool::new(false);
static EVENTS: OnceLock<Mutex<Sender<BtEvent>>> = OnceLock::new();

/// Stack notification for the control loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BtEvent {
    Connection {
        state: ConnectionState,
        peer: [u8; 6],
    },
    /// AVRC controller link to the source came up or went down
    Controller(bool),
    Metadata {
        id: u8,
        text: Vec<u8>,
    },
    TrackChanged,
    PlaybackStatus(u8),
    PlayPosition(u32),
    /// Absolute volume set from the source
    Volume(u8),
}

/// Current output volume, 0..=127
pub fn volume() -> u8 {
    VOLUME.load(Ordering::Relaxed)
}

fn post(event: BtEvent) {
    let Some(events) = EVENTS.get() else {
        return;
    };
    if let Ok(events) = events.lock() {
        events.send(event).ok();
    }
}

/// Running Bluetooth stack
pub struct Bluetooth {
    _driver: BtDriver<'static, BtClassic>,
    events: Receiver<BtEvent>,
}

impl Bluetooth {
    /// Bring up Bluedroid, register the A2DP sink and AVRC roles and become
    /// discoverable as `name`
    pub fn start(modem: Modem, nvs: EspDefaultNvsPartition, name: &str) -> Result<Self, EspError> {
        let (tx, events) = mpsc::channel();
        if EVENTS.set(Mutex::new(tx)).is_err() {
            log::warn!("Bluetooth event channel already installed");
        }

        let driver = BtDriver::<BtClassic>::new(modem, Some(nvs))?;
        let name = CString::new(name).unwrap_or_default();

        unsafe {
            esp!(sys::esp_bt_dev_set_device_name(name.as_ptr()))?;

            esp!(sys::esp_avrc_ct_register_callback(Some(avrc_ct_callback)))?;
            esp!(sys::esp_avrc_ct_init())?;

            esp!(sys::esp_avrc_tg_register_callback(Some(avrc_tg_callback)))?;
            esp!(sys::esp_avrc_tg_init())?;
            let mut capabilities = sys::esp_avrc_rn_evt_cap_mask_t::default();
            sys::esp_avrc_rn_evt_bit_mask_operation(
                sys::esp_avrc_bit_mask_op_t_ESP_AVRC_BIT_MASK_OP_SET,
                &mut capabilities,
                sys::esp_avrc_rn_event_ids_t_ESP_AVRC_RN_VOLUME_CHANGE,
            );
            esp!(sys::esp_avrc_tg_set_rn_evt_cap(&capabilities))?;

            esp!(sys::esp_a2d_register_callback(Some(a2d_callback)))?;
            esp!(sys::esp_a2d_sink_register_data_callback(Some(
                audio::on_sink_data
            )))?;
            esp!(sys::esp_a2d_sink_init())?;

            esp!(sys::esp_bt_gap_set_scan_mode(
                sys::esp_bt_connection_mode_t_ESP_BT_CONNECTABLE,
                sys::esp_bt_discovery_mode_t_ESP_BT_GENERAL_DISCOVERABLE,
            ))?;
        }

        log::info!("Bluetooth sink discoverable as {:?}", name);
        Ok(Self {
            _driver: driver,
            events,
        })
    }

    /// Next pending stack event, without blocking
    pub fn poll(&self) -> Option<BtEvent> {
        self.events.try_recv().ok()
    }
}

unsafe extern "C" fn a2d_callback(
    event: sys::esp_a2d_cb_event_t,
    param: *mut sys::esp_a2d_cb_param_t,
) {
    if event != sys::esp_a2d_cb_event_t_ESP_A2D_CONNECTION_STATE_EVT || param.is_null() {
        return;
    }
    let conn = (*param).conn_stat;
    let state = match conn.state {
        sys::esp_a2d_connection_state_t_ESP_A2D_CONNECTION_STATE_CONNECTED => {
            ConnectionState::Connected
        }
        sys::esp_a2d_connection_state_t_ESP_A2D_CONNECTION_STATE_CONNECTING => {
            ConnectionState::Connecting
        }
        sys::esp_a2d_connection_state_t_ESP_A2D_CONNECTION_STATE_DISCONNECTING => {
            ConnectionState::Disconnecting
        }
        _ => ConnectionState::Disconnected,
    };
    post(BtEvent::Connection {
        state,
        peer: conn.remote_bda,
    });
}

unsafe extern "C" fn avrc_ct_callback(
    event: sys::esp_avrc_ct_cb_event_t,
    param: *mut sys::esp_avrc_ct_cb_param_t,
) {
    if param.is_null() {
        return;
    }
    match event {
        sys::esp_avrc_ct_cb_event_t_ESP_AVRC_CT_CONNECTION_STATE_EVT => {
            post(BtEvent::Controller((*param).conn_stat.connected));
        }
        sys::esp_avrc_ct_cb_event_t_ESP_AVRC_CT_METADATA_RSP_EVT => {
            let rsp = (*param).meta_rsp;
            let len = usize::try_from(rsp.attr_length).unwrap_or(0);
            let text = if rsp.attr_text.is_null() {
                Vec::new()
            } else {
                slice::from_raw_parts(rsp.attr_text, len).to_vec()
            };
            post(BtEvent::Metadata {
                id: rsp.attr_id,
                text,
            });
        }
        sys::esp_avrc_ct_cb_event_t_ESP_AVRC_CT_CHANGE_NOTIFY_EVT => {
            let ntf = (*param).change_ntf;
            match ntf.event_id {
                RN_TRACK_CHANGE => post(BtEvent::TrackChanged),
                RN_PLAY_STATUS => {
                    post(BtEvent::PlaybackStatus(ntf.event_parameter.playback as u8))
                }
                RN_PLAY_POS => post(BtEvent::PlayPosition(ntf.event_parameter.play_pos)),
                _ => {}
            }
        }
        _ => {}
    }
}

unsafe extern "C" fn avrc_tg_callback(
    event: sys::esp_avrc_tg_cb_event_t,
    param: *mut sys::esp_avrc_tg_cb_param_t,
) {
    if param.is_null() {
        return;
    }
    match event {
        sys::esp_avrc_tg_cb_event_t_ESP_AVRC_TG_SET_ABSOLUTE_VOLUME_CMD_EVT => {
            let volume = (*param).set_abs_vol.volume.min(MAX_VOLUME);
            VOLUME.store(volume, Ordering::Relaxed);
            post(BtEvent::Volume(volume));
        }
        sys::esp_avrc_tg_cb_event_t_ESP_AVRC_TG_REGISTER_NOTIFICATION_EVT => {
            if (*param).reg_ntf.event_id == RN_VOLUME {
                VOLUME_NOTIFY.store(true, Ordering::Relaxed);
                let mut rsp = sys::esp_avrc_rn_param_t {
                    volume: VOLUME.load(Ordering::Relaxed),
                };
                sys::esp_avrc_tg_send_rn_rsp(
                    sys::esp_avrc_rn_event_ids_t_ESP_AVRC_RN_VOLUME_CHANGE,
                    sys::esp_avrc_rn_rsp_t_ESP_AVRC_RN_RSP_INTERIM,
                    &mut rsp,
                );
            }
        }
        _ => {}
    }
}

/// AVRC transport failure
#[derive(Debug)]
pub enum AvrcError {
    /// No source is connected
    NotConnected,
    Esp(EspError),
}

impl fmt::Display for AvrcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvrcError::NotConnected => write!(f, "no source connected"),
            AvrcError::Esp(err) => write!(f, "AVRC error: {}", err),
        }
    }
}

impl From<EspError> for AvrcError {
    fn from(err: EspError) -> Self {
        AvrcError::Esp(err)
    }
}

/// Transport control through AVRC passthrough commands
#[derive(Debug, Default)]
pub struct AvrcTransport {
    /// AVRC transaction label, 4 bits
    label: u8,
    peer: Option<[u8; 6]>,
    controller: bool,
}

impl AvrcTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_peer(&mut self, peer: Option<[u8; 6]>) {
        self.peer = peer;
    }

    pub fn set_controller_connected(&mut self, connected: bool) {
        self.controller = connected;
    }

    fn next_label(&mut self) -> u8 {
        let label = self.label;
        self.label = (self.label + 1) & 0x0F;
        label
    }

    fn ensure_controller(&self) -> Result<(), AvrcError> {
        if self.controller {
            Ok(())
        } else {
            Err(AvrcError::NotConnected)
        }
    }

    fn passthrough(&mut self, key: sys::esp_avrc_pt_cmd_t) -> Result<(), AvrcError> {
        self.ensure_controller()?;
        for state in [
            sys::esp_avrc_pt_cmd_state_t_ESP_AVRC_PT_CMD_STATE_PRESSED,
            sys::esp_avrc_pt_cmd_state_t_ESP_AVRC_PT_CMD_STATE_RELEASED,
        ] {
            let label = self.next_label();
            esp!(unsafe { sys::esp_avrc_ct_send_passthrough_cmd(label, key as u8, state as u8) })?;
        }
        Ok(())
    }

    /// Ask the source for the track attributes shown in the status report
    pub fn request_metadata(&mut self) -> Result<(), AvrcError> {
        self.ensure_controller()?;
        let label = self.next_label();
        esp!(unsafe { sys::esp_avrc_ct_send_metadata_cmd(label, REQUESTED_ATTRIBUTES) })?;
        Ok(())
    }

    /// Subscribe to one AVRC change notification
    ///
    /// The source sends a single change per registration, so this is called
    /// again after each notification.
    pub fn register_notification(&mut self, event_id: u8) -> Result<(), AvrcError> {
        self.ensure_controller()?;
        let interval = if event_id == RN_PLAY_POS {
            PLAY_POS_INTERVAL_S
        } else {
            0
        };
        let label = self.next_label();
        esp!(unsafe {
            sys::esp_avrc_ct_send_register_notification_cmd(label, event_id, interval)
        })?;
        Ok(())
    }

    pub fn register_all_notifications(&mut self) -> Result<(), AvrcError> {
        for event_id in [RN_TRACK_CHANGE, RN_PLAY_STATUS, RN_PLAY_POS] {
            self.register_notification(event_id)?;
        }
        Ok(())
    }
}

impl Transport for AvrcTransport {
    type Error = AvrcError;

    fn play(&mut self) -> Result<(), Self::Error> {
        self.passthrough(sys::esp_avrc_pt_cmd_t_ESP_AVRC_PT_CMD_PLAY)
    }

    fn pause(&mut self) -> Result<(), Self::Error> {
        self.passthrough(sys::esp_avrc_pt_cmd_t_ESP_AVRC_PT_CMD_PAUSE)
    }

    fn next(&mut self) -> Result<(), Self::Error> {
        self.passthrough(sys::esp_avrc_pt_cmd_t_ESP_AVRC_PT_CMD_FORWARD)
    }

    fn previous(&mut self) -> Result<(), Self::Error> {
        self.passthrough(sys::esp_avrc_pt_cmd_t_ESP_AVRC_PT_CMD_BACKWARD)
    }

    fn volume(&self) -> u8 {
        volume()
    }

    fn set_volume(&mut self, volume: u8) -> Result<(), Self::Error> {
        let volume = volume.min(MAX_VOLUME);
        VOLUME.store(volume, Ordering::Relaxed);
        if VOLUME_NOTIFY.swap(false, Ordering::Relaxed) {
            let mut rsp = sys::esp_avrc_rn_param_t { volume };
            esp!(unsafe {
                sys::esp_avrc_tg_send_rn_rsp(
                    sys::esp_avrc_rn_event_ids_t_ESP_AVRC_RN_VOLUME_CHANGE,
                    sys::esp_avrc_rn_rsp_t_ESP_AVRC_RN_RSP_CHANGED,
                    &mut rsp,
                )
            })?;
        }
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        // Cleared by the Disconnected event once the link is down
        let mut peer = self.peer.ok_or(AvrcError::NotConnected)?;
        esp!(unsafe { sys::esp_a2d_sink_disconnect(peer.as_mut_ptr()) })?;
        Ok(())
    }
}
