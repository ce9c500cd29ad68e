//! Button and battery sense adapters for the speaker-input seams.

use core::fmt;

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin};
use esp_idf_svc::hal::gpio::{AnyIOPin, Input, PinDriver, Pull};
use esp_idf_svc::sys::{self, EspError};

use speaker_input::{MillivoltSource, PullUpInput};

use crate::pins::BATTERY_ADC_CHANNEL;

const ADC_WIDTH_BIT_12: u32 = 3;
const ADC_ATTEN_DB_0: u32 = 0;
/// Used by the calibration when the eFuse carries no Vref
const DEFAULT_VREF_MV: u32 = 1100;

/// GPIO driver failure
#[derive(Debug)]
pub struct PinError(EspError);

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO error: {}", self.0)
    }
}

impl embedded_hal::digital::Error for PinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Front-panel button input, pressed = LOW
pub struct ButtonPin {
    driver: PinDriver<'static, AnyIOPin, Input>,
}

impl ButtonPin {
    pub fn new(pin: AnyIOPin) -> Result<Self, EspError> {
        Ok(Self {
            driver: PinDriver::input(pin)?,
        })
    }
}

impl ErrorType for ButtonPin {
    type Error = PinError;
}

impl InputPin for ButtonPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.driver.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.driver.is_low())
    }
}

impl PullUpInput for ButtonPin {
    fn configure_pull_up(&mut self) -> Result<(), Self::Error> {
        self.driver.set_pull(Pull::Up).map_err(PinError)
    }
}

/// `adc1_get_raw` reported a failed conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcReadError(pub i32);

/// Calibrated battery sense channel on ADC1
///
/// Uses 0 dB attenuation, which keeps the full scale near 1.1 V.
pub struct BatteryAdc {
    channel: sys::adc_channel_t,
    characteristics: sys::esp_adc_cal_characteristics_t,
}

impl BatteryAdc {
    pub fn new() -> Self {
        let channel = BATTERY_ADC_CHANNEL;
        let mut characteristics = sys::esp_adc_cal_characteristics_t::default();
        unsafe {
            sys::adc1_config_width(ADC_WIDTH_BIT_12);
            sys::adc1_config_channel_atten(channel, ADC_ATTEN_DB_0);
            let source = sys::esp_adc_cal_characterize(
                sys::adc_unit_t_ADC_UNIT_1,
                ADC_ATTEN_DB_0,
                ADC_WIDTH_BIT_12,
                DEFAULT_VREF_MV,
                &mut characteristics,
            );
            log::info!("Battery ADC calibrated (source {})", source);
        }
        Self {
            channel,
            characteristics,
        }
    }
}

impl MillivoltSource for BatteryAdc {
    type Error = AdcReadError;

    fn read_millivolts(&mut self) -> Result<u32, Self::Error> {
        let raw = unsafe { sys::adc1_get_raw(self.channel) };
        let raw = u32::try_from(raw).map_err(|_| AdcReadError(raw))?;
        Ok(unsafe { sys::esp_adc_cal_raw_to_voltage(raw, &self.characteristics) })
    }
}
