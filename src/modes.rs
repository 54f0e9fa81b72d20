/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Supported sensor modes

use crate::registers::{RegVal, GLOBAL_REGS};

/// Media bus pixel codes the sensor can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MediaBusFormat {
    /// 10-bit raw Bayer, RGGB order
    Srggb10_1x10 = 0x300f,
}

/// A rational number, used for frame intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fraction {
    pub numerator: u32,
    pub denominator: u32,
}

/// A fixed sensor configuration
#[derive(Debug, PartialEq, Eq)]
pub struct Mode {
    pub bus_fmt: MediaBusFormat,
    pub width: u32,
    pub height: u32,
    /// Frame interval at the maximum frame rate
    pub max_fps: Fraction,
    /// Horizontal total size, in pixel clocks
    pub hts_def: u32,
    /// Default vertical total size, in lines
    pub vts_def: u32,
    /// Default exposure, in lines
    pub exp_def: u32,
    /// Register program that configures the mode, `REG_NULL` terminated
    pub reg_list: &'static [RegVal],
}

impl Mode {
    /// Horizontal blanking is fixed per mode
    pub fn hblank(&self) -> u32 {
        self.hts_def.saturating_sub(self.width)
    }

    pub fn vblank_def(&self) -> u32 {
        self.vts_def.saturating_sub(self.height)
    }

    fn is_consistent(&self) -> bool {
        self.hts_def >= self.width && self.vts_def >= self.height
    }

    /// Summed absolute width and height difference to a requested size
    fn distance(&self, width: u32, height: u32) -> u32 {
        abs_diff(self.width, width) + abs_diff(self.height, height)
    }
}

fn abs_diff(a: u32, b: u32) -> u32 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

const SUPPORTED_MODES: &[Mode] = &[Mode {
    bus_fmt: MediaBusFormat::Srggb10_1x10,
    width: 1280,
    height: 720,
    max_fps: Fraction {
        numerator: 10000,
        denominator: 300000,
    },
    hts_def: 0x0448 * 2,
    vts_def: 0x04f4,
    exp_def: 0x0475,
    reg_list: GLOBAL_REGS,
}];

/// Immutable table of supported modes; the first entry is the default
#[derive(Debug, Clone, Copy)]
pub struct ModeCatalog {
    modes: &'static [Mode],
}

impl Default for ModeCatalog {
    fn default() -> Self {
        Self {
            modes: SUPPORTED_MODES,
        }
    }
}

impl ModeCatalog {
    /// Use a custom table. Returns `None` for an empty table, or when a
    /// mode's totals are smaller than its active size.
    pub fn new(modes: &'static [Mode]) -> Option<Self> {
        if modes.is_empty() || !modes.iter().all(Mode::is_consistent) {
            None
        } else {
            Some(Self { modes })
        }
    }

    pub fn modes(&self) -> &'static [Mode] {
        self.modes
    }

    pub fn default_mode(&self) -> &'static Mode {
        let modes = self.modes;
        &modes[0]
    }

    pub fn get(&self, index: usize) -> Option<&'static Mode> {
        let modes = self.modes;
        modes.get(index)
    }

    /// Nearest mode by summed absolute width+height difference.
    /// Ties go to the earlier table entry.
    pub fn find_best_fit(&self, width: u32, height: u32) -> &'static Mode {
        let modes = self.modes;
        let mut best = &modes[0];
        let mut best_dist = best.distance(width, height);
        for mode in &modes[1..] {
            let dist = mode.distance(width, height);
            if dist < best_dist {
                best = mode;
                best_dist = dist;
            }
        }
        best
    }

    /// Every mode shares the default mode's bus format
    pub fn enum_mbus_code(&self, index: usize) -> Option<MediaBusFormat> {
        if index == 0 {
            Some(self.default_mode().bus_fmt)
        } else {
            None
        }
    }

    /// (width, height) of the mode at `index`, when `code` is supported
    pub fn enum_frame_size(&self, index: usize, code: MediaBusFormat) -> Option<(u32, u32)> {
        if code != self.default_mode().bus_fmt {
            return None;
        }
        self.get(index).map(|mode| (mode.width, mode.height))
    }

    pub fn enum_frame_interval(&self, index: usize) -> Option<(MediaBusFormat, u32, u32, Fraction)> {
        self.get(index)
            .map(|mode| (mode.bus_fmt, mode.width, mode.height, mode.max_fps))
    }
}
