//! Board wiring (classic ESP32 module)
//!
//! | Signal        | GPIO | Notes                                  |
//! |---------------|------|----------------------------------------|
//! | Left button   | 32   | to GND, internal pull-up               |
//! | Right button  | 33   | to GND, internal pull-up               |
//! | Center button | 27   | to GND, internal pull-up               |
//! | Battery sense | 34   | ADC1 channel 6, 22k / 6.9k divider     |
//! | I2S BCK       | 26   | audio bit clock                        |
//! | I2S LRC       | 25   | audio word select                      |
//! | I2S DIN       | 22   | serial data towards the DAC            |

use esp_idf_svc::sys;

pub const BATTERY_ADC_CHANNEL: sys::adc_channel_t = sys::adc_channel_t_ADC_CHANNEL_6;
