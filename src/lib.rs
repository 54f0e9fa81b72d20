/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/
#![cfg_attr(not(test), no_std)]

//! Control and timing driver for the GalaxyCore GC02M2 image sensor
//! This imaging sensor has multiple interfaces:
//! - Two-wire i2c (SCCB-like) for configuration registers
//! - single-lane MIPI CSI-2 pixel data out
//! - power supplies, master clock, reset and power-down lines
//!
//! This driver is concerned with the i2c interface and with the power-up
//! sequencing the chip requires before it will accept register traffic.
//! It converts exposure, gain, blanking and mirror/flip requests into the
//! paged 8-bit register writes the chip understands, and tracks the
//! power and streaming state of the device.

/// Debug output over RTT, only when the `rttdebug` feature is enabled
macro_rules! sensor_log {
    ($($arg:tt)+) => {{
        #[cfg(feature = "rttdebug")]
        panic_rtt_core::rprintln!($($arg)+);
        #[cfg(not(feature = "rttdebug"))]
        $crate::log_sink(core::format_args!($($arg)+));
    }};
}

pub mod gain;
pub mod modes;
pub mod power;
pub mod registers;
pub mod sensor;
pub mod timing;
pub mod transport;

pub use gain::{map_gain, GainSetting};
pub use modes::{Fraction, MediaBusFormat, Mode, ModeCatalog};
pub use power::{MasterClock, NotConnected, PinMux, PowerControl, PowerSequencer, SupplyBank};
pub use sensor::{Control, DeviceState, Gc02m2, Lifecycle, PowerState, StreamState};
pub use timing::{ControlRange, ExposureTimingController};
pub use transport::{I2cTransport, RegisterTransport};

/// Errors in this crate
#[derive(Debug, PartialEq)]
pub enum Error<CommE> {
    /// Sensor communication error
    Comm(CommE),

    /// Hardware bring-up failed before the chip could be addressed
    Sequencing(SequencingError),

    /// The chip id register did not hold the expected value
    IdentityMismatch { found: u16 },

    /// The value is outside the control's currently published range,
    /// or the control is read-only
    InvalidControlValue { control: Control, value: u32 },

    /// Only a single MIPI lane is supported
    UnsupportedLaneCount(u8),

    /// The request cannot be serviced while the sensor is streaming
    Busy,
}

/// Power-on steps that abort the bring-up sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencingError {
    /// The master clock could not be enabled
    ClockEnable,
    /// The supply regulators could not be enabled
    SupplyEnable,
}

impl<CommE> From<SequencingError> for Error<CommE> {
    fn from(err: SequencingError) -> Self {
        Error::Sequencing(err)
    }
}

/// 7-bit i2c address of the sensor (0x6E write / 0x6F read)
pub const DEFAULT_I2C_ADDRESS: u8 = 0x37;

/// All register tables assume a 24 MHz master clock
pub const XVCLK_FREQ_HZ: u32 = 24_000_000;

/// MIPI link frequency the register tables are built for
pub const MIPI_LINK_FREQ_HZ: u64 = 336_000_000;

/// Bits per sample on the CSI-2 bus (RAW10)
pub const BITS_PER_SAMPLE: u64 = 10;

/// Board-level configuration for a sensor instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorConfig {
    /// 7-bit i2c address
    pub address: u8,
    /// Number of MIPI data lanes wired up
    pub lanes: u8,
    /// Master clock frequency to request
    pub mclk_hz: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_I2C_ADDRESS,
            lanes: 1,
            mclk_hz: XVCLK_FREQ_HZ,
        }
    }
}

impl SensorConfig {
    /// Only single-lane operation is supported by the register tables
    pub fn validate<CommE>(&self) -> Result<(), Error<CommE>> {
        if self.lanes != 1 {
            return Err(Error::UnsupportedLaneCount(self.lanes));
        }
        Ok(())
    }

    /// pixel rate = link frequency * 2 * lanes / bits per sample
    pub fn pixel_rate(&self) -> u64 {
        MIPI_LINK_FREQ_HZ * 2 * u64::from(self.lanes) / BITS_PER_SAMPLE
    }
}

#[allow(dead_code)]
#[inline(always)]
pub(crate) fn log_sink(_args: core::fmt::Arguments<'_>) {}
