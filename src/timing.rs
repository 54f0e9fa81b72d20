/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Exposure, vertical blanking and frame length bookkeeping
//!
//! The frame length (VTS) is the active height plus vertical blanking.
//! The chip can integrate for at most `VTS - EXPOSURE_MARGIN` lines, so any
//! change to vertical blanking moves the upper bound of the exposure control.

use crate::modes::Mode;
use crate::registers::{EXPOSURE_H, EXPOSURE_L, VTS_H, VTS_L};

/// Minimum integration time, in lines
pub const EXPOSURE_MIN: u32 = 4;
pub const EXPOSURE_STEP: u32 = 1;
/// Readout margin between exposure and frame length, in lines
pub const EXPOSURE_MARGIN: u32 = 16;
/// Longest exposure the 14-bit register pair can carry, in lines
pub const EXPOSURE_MAX: u32 = 0x3fff;
/// Frame length ceiling, in lines
pub const VTS_MAX: u32 = 0x7fff;

/// High byte of a line count only carries 6 bits
const LINES_HIGH_MASK: u32 = 0x3f;

/// Legal values of an integer control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRange {
    pub min: u32,
    pub max: u32,
    pub step: u32,
    pub default: u32,
}

impl ControlRange {
    pub const fn fixed(value: u32) -> Self {
        Self {
            min: value,
            max: value,
            step: 1,
            default: value,
        }
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: u32) -> u32 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

/// Split a line count into its (high, low) register bytes
pub fn encode_lines(lines: u32) -> (u8, u8) {
    (((lines >> 8) & LINES_HIGH_MASK) as u8, (lines & 0xff) as u8)
}

pub fn decode_lines(high: u8, low: u8) -> u32 {
    ((u32::from(high) & LINES_HIGH_MASK) << 8) | u32::from(low)
}

/// Keeps exposure and vertical blanking consistent for one mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposureTimingController {
    mode: &'static Mode,
    vblank: u32,
    exposure: u32,
}

impl ExposureTimingController {
    /// Start from the mode's default frame length and exposure
    pub fn new(mode: &'static Mode) -> Self {
        let vblank = mode.vblank_def();
        let exposure = Self::exposure_range_for(mode, vblank).clamp(mode.exp_def);
        Self {
            mode,
            vblank,
            exposure,
        }
    }

    pub fn mode(&self) -> &'static Mode {
        self.mode
    }

    pub fn vblank(&self) -> u32 {
        self.vblank
    }

    pub fn exposure(&self) -> u32 {
        self.exposure
    }

    /// Vertical total size, in lines
    pub fn vts(&self) -> u32 {
        self.mode.height + self.vblank
    }

    pub fn hblank_range(&self) -> ControlRange {
        ControlRange::fixed(self.mode.hblank())
    }

    pub fn vblank_range(&self) -> ControlRange {
        let vblank_def = self.mode.vblank_def();
        ControlRange {
            min: vblank_def,
            max: VTS_MAX.saturating_sub(self.mode.height).max(vblank_def),
            step: 1,
            default: vblank_def,
        }
    }

    /// Exposure range for the current vertical blanking
    pub fn exposure_range(&self) -> ControlRange {
        Self::exposure_range_for(self.mode, self.vblank)
    }

    /// `[EXPOSURE_MIN, min(height + vblank - EXPOSURE_MARGIN, EXPOSURE_MAX)]`,
    /// default is the mode's exposure clamped into that range
    pub fn exposure_range_for(mode: &Mode, vblank: u32) -> ControlRange {
        let max = (mode.height + vblank)
            .saturating_sub(EXPOSURE_MARGIN)
            .min(EXPOSURE_MAX)
            .max(EXPOSURE_MIN);
        let mut range = ControlRange {
            min: EXPOSURE_MIN,
            max,
            step: EXPOSURE_STEP,
            default: 0,
        };
        range.default = range.clamp(mode.exp_def);
        range
    }

    /// Accept a new vertical blanking, clamped into its range.
    /// Re-clamps the held exposure against the new exposure range and
    /// reports whether it moved.
    pub fn set_vblank(&mut self, vblank: u32) -> bool {
        self.vblank = self.vblank_range().clamp(vblank);
        let exposure = self.exposure_range().clamp(self.exposure);
        let moved = exposure != self.exposure;
        self.exposure = exposure;
        moved
    }

    /// Accept a new exposure, clamped into the current range
    pub fn set_exposure(&mut self, exposure: u32) -> u32 {
        self.exposure = self.exposure_range().clamp(exposure);
        self.exposure
    }

    /// Exposure register writes (page 0 must already be selected)
    pub fn exposure_regs(&self) -> [(u8, u8); 2] {
        let (high, low) = encode_lines(self.exposure);
        [(EXPOSURE_H, high), (EXPOSURE_L, low)]
    }

    /// Frame length register writes (page 0 must already be selected)
    pub fn vts_regs(&self) -> [(u8, u8); 2] {
        let (high, low) = encode_lines(self.vts());
        [(VTS_H, high), (VTS_L, low)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::ModeCatalog;

    fn controller() -> ExposureTimingController {
        ExposureTimingController::new(ModeCatalog::default().default_mode())
    }

    #[test]
    fn defaults_for_720p() {
        let timing = controller();
        assert_eq!(timing.vblank(), 0x04f4 - 720);
        assert_eq!(timing.vts(), 0x04f4);
        assert_eq!(timing.exposure(), 0x0475);
        assert_eq!(timing.hblank_range(), ControlRange::fixed(912));
        let range = timing.exposure_range();
        assert_eq!((range.min, range.max), (4, 0x04f4 - 16));
        let vb = timing.vblank_range();
        assert_eq!((vb.min, vb.max, vb.default), (548, 0x7fff - 720, 548));
    }

    #[test]
    fn long_exposure_clamped_to_frame() {
        let mut timing = controller();
        assert_eq!(timing.set_exposure(2000), 720 + 548 - 16);
        assert_eq!(timing.set_exposure(0), EXPOSURE_MIN);
    }

    #[test]
    fn vblank_widens_exposure_range() {
        let mut timing = controller();
        assert!(!timing.set_vblank(2000));
        assert_eq!(timing.exposure_range().max, 720 + 2000 - 16);
        assert_eq!(timing.set_exposure(2000), 2000);
    }

    #[test]
    fn vblank_shrink_reclamps_exposure() {
        let mut timing = controller();
        timing.set_vblank(3000);
        timing.set_exposure(3000);
        assert!(timing.set_vblank(548));
        assert_eq!(timing.exposure(), 720 + 548 - 16);
        assert_eq!(timing.exposure_range().default, 0x0475);
    }

    #[test]
    fn vblank_clamped_to_ceiling() {
        let mut timing = controller();
        timing.set_vblank(u32::MAX);
        assert_eq!(timing.vts(), VTS_MAX);
        timing.set_vblank(0);
        assert_eq!(timing.vblank(), 548);
    }

    #[test]
    fn exposure_range_bounds_hold_for_all_vblanks() {
        let mut timing = controller();
        let vb = timing.vblank_range();
        for vblank in (vb.min..=vb.max).step_by(7) {
            timing.set_vblank(vblank);
            let range = timing.exposure_range();
            assert!(EXPOSURE_MIN <= range.min);
            assert!(range.min <= range.max);
            assert!(range.max <= vblank + 720 - EXPOSURE_MARGIN);
            assert!(range.contains(timing.exposure()));
            assert!(range.contains(range.default));
        }
    }

    #[test]
    fn exposure_capped_at_register_width() {
        let mut timing = controller();
        timing.set_vblank(16000);
        assert_eq!(timing.vts(), 720 + 16000);
        assert_eq!(timing.exposure_range().max, EXPOSURE_MAX);
        assert_eq!(timing.set_exposure(0x4000), EXPOSURE_MAX);
        let [(_, high), (_, low)] = timing.exposure_regs();
        assert_eq!(decode_lines(high, low), timing.exposure());
    }

    #[test]
    fn line_encoding_round_trips_14_bits() {
        for lines in 0..=0x3fff {
            let (high, low) = encode_lines(lines);
            assert!(high <= 0x3f);
            assert_eq!(decode_lines(high, low), lines);
        }
    }

    #[test]
    fn register_pairs() {
        let timing = controller();
        assert_eq!(timing.exposure_regs(), [(0x03, 0x04), (0x04, 0x75)]);
        assert_eq!(timing.vts_regs(), [(0x41, 0x04), (0x42, 0xf4)]);
    }
}
