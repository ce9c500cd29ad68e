//! I2S output fed from the A2DP sink data callback.

use std::slice;
use std::sync::{Mutex, OnceLock};

use esp_idf_svc::hal::delay::BLOCK;
use esp_idf_svc::hal::gpio::{AnyIOPin, Gpio22, Gpio25, Gpio26};
use esp_idf_svc::hal::i2s::config::{
    Config, DataBitWidth, SlotMode, StdClkConfig, StdConfig, StdGpioConfig, StdSlotConfig,
};
use esp_idf_svc::hal::i2s::{I2sDriver, I2sTx, I2S0};
use esp_idf_svc::sys::EspError;

use speaker_app::condition_pcm;

use crate::bluetooth;

/// SBC rate used by phones for music streams
const SAMPLE_RATE_HZ: u32 = 44_100;
const DMA_BUFFERS: u32 = 8;
/// 1024 bytes of 16-bit stereo per DMA buffer
const FRAMES_PER_BUFFER: u32 = 256;
const MONO_DOWNMIX: bool = true;

static OUTPUT: OnceLock<Mutex<AudioOut>> = OnceLock::new();

struct AudioOut {
    i2s: I2sDriver<'static, I2sTx>,
    scratch: Vec<u8>,
}

impl AudioOut {
    fn play(&mut self, pcm: &[u8]) {
        self.scratch.clear();
        self.scratch.extend_from_slice(pcm);
        condition_pcm(&mut self.scratch, bluetooth::volume(), MONO_DOWNMIX);

        let mut written = 0;
        while written < self.scratch.len() {
            match self.i2s.write(&self.scratch[written..], BLOCK) {
                Ok(n) => written += n,
                Err(err) => {
                    log::warn!("I2S write failed: {}", err);
                    return;
                }
            }
        }
    }
}

/// Start the I2S transmitter towards the DAC
///
/// With 16-bit samples in 16-bit slots the MSB and LSB justified formats are
/// the same bit stream, which is what the DAC expects.
pub fn start(i2s: I2S0, bck: Gpio26, ws: Gpio25, dout: Gpio22) -> Result<(), EspError> {
    let config = StdConfig::new(
        Config::default()
            .dma_buffer_count(DMA_BUFFERS)
            .frames_per_buffer(FRAMES_PER_BUFFER),
        StdClkConfig::from_sample_rate_hz(SAMPLE_RATE_HZ),
        StdSlotConfig::msb_slot_default(DataBitWidth::Bits16, SlotMode::Stereo),
        StdGpioConfig::default(),
    );
    let mut driver = I2sDriver::new_std_tx(i2s, &config, bck, dout, Option::<AnyIOPin>::None, ws)?;
    driver.tx_enable()?;

    let output = AudioOut {
        i2s: driver,
        scratch: Vec::with_capacity((DMA_BUFFERS * FRAMES_PER_BUFFER) as usize * 4),
    };
    if OUTPUT.set(Mutex::new(output)).is_err() {
        log::warn!("I2S output already started");
    }
    log::info!("I2S out at {} Hz", SAMPLE_RATE_HZ);
    Ok(())
}

/// A2DP sink data callback: decoded PCM from the source
pub unsafe extern "C" fn on_sink_data(buf: *const u8, len: u32) {
    if buf.is_null() {
        return;
    }
    let Some(output) = OUTPUT.get() else {
        return;
    };
    let pcm = slice::from_raw_parts(buf, len as usize);
    if let Ok(mut output) = output.lock() {
        output.play(pcm);
    }
}
