/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Register map and the power-up register program of the GC02M2

/// Writing this register selects the page subsequent addresses refer to
pub const PAGE_SELECT: u8 = 0xfe;
/// Page holding the mode select, exposure, VTS, gain and mirror/flip registers
pub const PAGE_0: u8 = 0x00;

pub const MODE_SELECT: u8 = 0x3e;
pub const MODE_SW_STANDBY: u8 = 0x00;
pub const MODE_STREAMING: u8 = 0x90;

pub const CHIP_ID_H: u8 = 0xf0;
pub const CHIP_ID_L: u8 = 0xf1;
/// Expected value of CHIP_ID_H:CHIP_ID_L
pub const CHIP_ID: u16 = 0x02f0;

pub const EXPOSURE_H: u8 = 0x03;
pub const EXPOSURE_L: u8 = 0x04;

pub const VTS_H: u8 = 0x41;
pub const VTS_L: u8 = 0x42;

pub const ANALOG_GAIN: u8 = 0xb6;
pub const PREGAIN_H: u8 = 0xb1;
pub const PREGAIN_L: u8 = 0xb2;

pub const MIRROR_FLIP: u8 = 0x17;
pub const MIRROR_BIT: u8 = 0x01;
pub const FLIP_BIT: u8 = 0x02;

/// End-of-program marker, never written to the chip
pub const REG_NULL: u8 = 0xff;

/// An (address, value) register write
pub type RegVal = (u8, u8);

/// Full-chip setup for 1280x720 RAW10 on a single MIPI lane, 24 MHz xvclk
pub const GLOBAL_REGS: &[RegVal] = &[
    // system
    (0xfc, 0x01),
    (0xf4, 0x41),
    (0xf5, 0xe3),
    (0xf6, 0x44),
    (0xf8, 0x38),
    (0xf9, 0x82),
    (0xfa, 0x00),
    (0xfd, 0x80),
    (0xfc, 0x81),
    (0xfe, 0x03),
    (0x01, 0x0b),
    (0xf7, 0x01),
    (0xfc, 0x80),
    (0xfc, 0x80),
    (0xfc, 0x80),
    (0xfc, 0x8e),
    // CISCTL
    (0xfe, 0x00),
    (0x87, 0x09),
    (0xee, 0x72),
    (0xfe, 0x01),
    (0x8c, 0x90),
    (0xfe, 0x00),
    (0x90, 0x00),
    (0x03, 0x04),
    (0x04, 0x7d),
    (0x41, 0x04),
    (0x42, 0xf4),
    (0x05, 0x04),
    (0x06, 0x48),
    (0x07, 0x00),
    (0x08, 0x18),
    (0x9d, 0x18),
    (0x09, 0x00),
    (0x0a, 0x02),
    (0x0d, 0x04),
    (0x0e, 0xbc),
    (0x17, 0x80),
    (0x19, 0x04),
    (0x24, 0x00),
    (0x56, 0x20),
    (0x5b, 0x00),
    (0x5e, 0x01),
    // analog register width
    (0x21, 0x3c),
    (0x44, 0x20),
    (0xcc, 0x01),
    // analog mode
    (0x1a, 0x04),
    (0x1f, 0x11),
    (0x27, 0x30),
    (0x2b, 0x00),
    (0x33, 0x00),
    (0x53, 0x90),
    (0xe6, 0x50),
    // analog voltage
    (0x39, 0x07),
    (0x43, 0x04),
    (0x46, 0x4a),
    (0x7c, 0xa0),
    (0xd0, 0xbe),
    (0xd1, 0x40),
    (0xd2, 0x40),
    (0xd3, 0xb3),
    (0xde, 0x1c),
    // analog current
    (0xcd, 0x06),
    (0xce, 0x6f),
    // CISCTL reset
    (0xfc, 0x88),
    (0xfe, 0x10),
    (0xfe, 0x00),
    (0xfc, 0x8e),
    (0xfe, 0x00),
    (0xfe, 0x00),
    (0xfe, 0x00),
    (0xfe, 0x00),
    (0xfc, 0x88),
    (0xfe, 0x10),
    (0xfe, 0x00),
    (0xfc, 0x8e),
    (0xfe, 0x04),
    (0xe0, 0x01),
    (0xfe, 0x00),
    // ISP
    (0xfe, 0x01),
    (0x53, 0x54),
    (0x87, 0x53),
    (0x89, 0x03),
    // gain
    (0xfe, 0x00),
    (0xb0, 0x74),
    (0xb1, 0x04),
    (0xb2, 0x00),
    (0xb6, 0x00),
    (0xfe, 0x04),
    (0xd8, 0x00),
    (0xc0, 0x40),
    (0xc0, 0x00),
    (0xc0, 0x00),
    (0xc0, 0x00),
    (0xc0, 0x60),
    (0xc0, 0x00),
    (0xc0, 0xc0),
    (0xc0, 0x2a),
    (0xc0, 0x80),
    (0xc0, 0x00),
    (0xc0, 0x00),
    (0xc0, 0x40),
    (0xc0, 0xa0),
    (0xc0, 0x00),
    (0xc0, 0x90),
    (0xc0, 0x19),
    (0xc0, 0xc0),
    (0xc0, 0x00),
    (0xc0, 0xd0),
    (0xc0, 0x2f),
    (0xc0, 0xe0),
    (0xc0, 0x00),
    (0xc0, 0x90),
    (0xc0, 0x39),
    (0xc0, 0x00),
    (0xc0, 0x01),
    (0xc0, 0x20),
    (0xc0, 0x04),
    (0xc0, 0x20),
    (0xc0, 0x01),
    (0xc0, 0xe0),
    (0xc0, 0x0f),
    (0xc0, 0x40),
    (0xc0, 0x01),
    (0xc0, 0xe0),
    (0xc0, 0x1a),
    (0xc0, 0x60),
    (0xc0, 0x01),
    (0xc0, 0x20),
    (0xc0, 0x25),
    (0xc0, 0x80),
    (0xc0, 0x01),
    (0xc0, 0xa0),
    (0xc0, 0x2c),
    (0xc0, 0xa0),
    (0xc0, 0x01),
    (0xc0, 0xe0),
    (0xc0, 0x32),
    (0xc0, 0xc0),
    (0xc0, 0x01),
    (0xc0, 0x20),
    (0xc0, 0x38),
    (0xc0, 0xe0),
    (0xc0, 0x01),
    (0xc0, 0x60),
    (0xc0, 0x3c),
    (0xc0, 0x00),
    (0xc0, 0x02),
    (0xc0, 0xa0),
    (0xc0, 0x40),
    (0xc0, 0x80),
    (0xc0, 0x02),
    (0xc0, 0x18),
    (0xc0, 0x5c),
    (0xfe, 0x00),
    (0x9f, 0x10),
    // BLK
    (0xfe, 0x00),
    (0x26, 0x20),
    (0xfe, 0x01),
    (0x40, 0x22),
    (0x46, 0x7f),
    (0x49, 0x0f),
    (0x4a, 0xf0),
    (0xfe, 0x04),
    (0x14, 0x80),
    (0x15, 0x80),
    (0x16, 0x80),
    (0x17, 0x80),
    // anti-blooming
    (0xfe, 0x01),
    (0x41, 0x20),
    (0x4c, 0x00),
    (0x4d, 0x0c),
    (0x44, 0x08),
    (0x48, 0x03),
    // window 1280x720
    (0xfe, 0x01),
    (0x90, 0x01),
    (0x91, 0x00),
    (0x92, 0x06),
    (0x93, 0x00),
    (0x94, 0x06),
    (0x95, 0x02),
    (0x96, 0xd0),
    (0x97, 0x05),
    (0x98, 0x00),
    // mipi
    (0xfe, 0x03),
    (0x01, 0x23),
    (0x03, 0xce),
    (0x04, 0x48),
    (0x15, 0x01),
    (0x21, 0x10),
    (0x22, 0x05),
    (0x23, 0x20),
    (0x25, 0x20),
    (0x26, 0x08),
    (0x29, 0x06),
    (0x2a, 0x0a),
    (0x2b, 0x08),
    // out
    (0xfe, 0x01),
    (0x8c, 0x10),
    (REG_NULL, 0x00),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_program_terminated_once() {
        let sentinels = GLOBAL_REGS.iter().filter(|(a, _)| *a == REG_NULL).count();
        assert_eq!(sentinels, 1);
        assert_eq!(GLOBAL_REGS.last(), Some(&(REG_NULL, 0x00)));
    }
}
