/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Total gain to (analog step, digital multiplier) mapping
//!
//! Analog gain on this chip is a coarse 17-step ladder. The residual between
//! the requested total gain and the analog step's nominal gain is made up by
//! the digital pre-gain, expressed relative to `DIGITAL_GAIN_BASE` (1.0x).

pub const GAIN_MIN: u32 = 0x40;
pub const GAIN_MAX: u32 = 0x300;
pub const GAIN_STEP: u32 = 1;
pub const GAIN_DEFAULT: u32 = 0x80;

/// Digital pre-gain value meaning 1.0x
pub const DIGITAL_GAIN_BASE: u32 = 1024;

/// (threshold, analog gain code). The last threshold is a sentinel.
pub const AGC_TABLE: [(u32, u8); 17] = [
    (64, 0),
    (96, 1),
    (127, 2),
    (157, 3),
    (198, 4),
    (227, 5),
    (259, 6),
    (287, 7),
    (318, 8),
    (356, 9),
    (392, 10),
    (420, 11),
    (451, 12),
    (480, 13),
    (513, 14),
    (646, 15),
    (0xffff, 16),
];

/// Register values realizing a total gain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GainSetting {
    pub analog_code: u8,
    pub digital_multiplier: u32,
}

impl GainSetting {
    /// Pre-gain register bytes (high, low)
    pub fn pregain_bytes(&self) -> (u8, u8) {
        ((self.digital_multiplier >> 8) as u8, (self.digital_multiplier & 0xff) as u8)
    }
}

/// Select the analog step whose interval contains `total_gain` and compute
/// the digital multiplier that corrects for the step's coarseness.
/// Inputs below `GAIN_MIN` are treated as `GAIN_MIN`; inputs beyond the
/// sentinel threshold stay on the last real step.
pub fn map_gain(total_gain: u32) -> GainSetting {
    let total_gain = total_gain.max(GAIN_MIN);

    let last = AGC_TABLE.len() - 2;
    let index = (0..=last)
        .rev()
        .find(|&i| total_gain >= AGC_TABLE[i].0 && total_gain < AGC_TABLE[i + 1].0)
        .unwrap_or(last);
    let (threshold, analog_code) = AGC_TABLE[index];

    let dgain = u64::from(total_gain) * u64::from(DIGITAL_GAIN_BASE) / u64::from(threshold);
    let digital_multiplier = if dgain > u64::from(u32::MAX) {
        u32::MAX
    } else {
        dgain as u32
    };

    sensor_log!(
        "AGC_TABLE[{}] = {} dgain = {:#06x}",
        index,
        threshold,
        digital_multiplier
    );
    GainSetting {
        analog_code,
        digital_multiplier,
    }
}

/// Nominal analog gain of a code, relative to `DIGITAL_GAIN_BASE`
fn analog_threshold(code: u8) -> u32 {
    AGC_TABLE[usize::from(code)].0
}

/// Combined analog x digital gain, in units of threshold * base
pub fn combined_gain(setting: &GainSetting) -> u64 {
    u64::from(analog_threshold(setting.analog_code)) * u64::from(setting.digital_multiplier)
}
