/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Hardware bring-up and tear-down of the sensor
//!
//! The chip must see its master clock, then its supplies, then a reset
//! pulse, and then 8192 master clock cycles of quiet before the first
//! register transaction. Power-down runs the inverse with the power-down
//! line asserted first and reset asserted last.

use core::convert::Infallible;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::OutputPin;

use crate::SequencingError;

/// Delay after reset release, microseconds
pub const RESET_SETTLE_US: u32 = 500;

/// Master clock cycles required before the first register transaction
pub const PRE_SCCB_CYCLES: u32 = 8192;

/// What the streaming state machine needs from power sequencing
pub trait PowerControl {
    /// Bring the chip up until it accepts register traffic
    fn power_on(&mut self) -> Result<(), SequencingError>;

    /// Tear the chip down. Cannot fail.
    fn power_off(&mut self);
}

/// The sensor's external master clock (xvclk)
pub trait MasterClock {
    type Error;

    fn set_rate(&mut self, hz: u32) -> Result<(), Self::Error>;
    fn rate(&self) -> u32;
    fn enable(&mut self) -> Result<(), Self::Error>;
    fn disable(&mut self);
}

/// The sensor's supply rails (dovdd, avdd, dvdd), switched together
pub trait SupplyBank {
    type Error;

    fn enable_all(&mut self) -> Result<(), Self::Error>;
    fn disable_all(&mut self);
}

/// Pin multiplexing for the sensor's interface pins
pub trait PinMux {
    type Error;

    fn select_default(&mut self) -> Result<(), Self::Error>;
}

/// Placeholder for an optional pin or pin mux the board does not wire up
pub struct NotConnected;

impl OutputPin for NotConnected {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

impl PinMux for NotConnected {
    type Error = Infallible;

    fn select_default(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// Delay in microseconds for a number of master clock cycles, rounded up
pub fn cycles_to_us(cycles: u32, clock_hz: u32) -> u32 {
    let clock_hz = u64::from(clock_hz.max(1));
    let us = (u64::from(cycles) * 1_000_000 + clock_hz - 1) / clock_hz;
    if us > u64::from(u32::MAX) {
        u32::MAX
    } else {
        us as u32
    }
}

/// Ordered power sequencing over board-level collaborators.
///
/// `reset` and `pwdn` are driven as logical levels: high means asserted.
pub struct PowerSequencer<CLK, SUP, MUX, RST, PWDN, D> {
    clock: CLK,
    supplies: SUP,
    pinmux: Option<MUX>,
    reset: Option<RST>,
    pwdn: Option<PWDN>,
    delay: D,
    mclk_hz: u32,
}

impl<CLK, SUP, MUX, RST, PWDN, D> PowerSequencer<CLK, SUP, MUX, RST, PWDN, D>
where
    CLK: MasterClock,
    SUP: SupplyBank,
    MUX: PinMux,
    RST: OutputPin,
    PWDN: OutputPin,
    D: DelayUs<u32>,
{
    pub fn new(
        clock: CLK,
        supplies: SUP,
        pinmux: Option<MUX>,
        reset: Option<RST>,
        pwdn: Option<PWDN>,
        delay: D,
        mclk_hz: u32,
    ) -> Self {
        Self {
            clock,
            supplies,
            pinmux,
            reset,
            pwdn,
            delay,
            mclk_hz,
        }
    }

    fn drive<P: OutputPin>(pin: &mut Option<P>, asserted: bool) {
        if let Some(pin) = pin.as_mut() {
            let res = if asserted {
                pin.set_high()
            } else {
                pin.set_low()
            };
            if res.is_err() {
                sensor_log!("gc02m2 gpio set failed");
            }
        }
    }
}

impl<CLK, SUP, MUX, RST, PWDN, D> PowerControl for PowerSequencer<CLK, SUP, MUX, RST, PWDN, D>
where
    CLK: MasterClock,
    SUP: SupplyBank,
    MUX: PinMux,
    RST: OutputPin,
    PWDN: OutputPin,
    D: DelayUs<u32>,
{
    fn power_on(&mut self) -> Result<(), SequencingError> {
        if let Some(mux) = self.pinmux.as_mut() {
            if mux.select_default().is_err() {
                sensor_log!("gc02m2 could not set pins");
            }
        }

        if self.clock.set_rate(self.mclk_hz).is_err() {
            sensor_log!("gc02m2 failed to set xvclk rate ({} Hz)", self.mclk_hz);
        }
        if self.clock.rate() != self.mclk_hz {
            sensor_log!(
                "gc02m2 xvclk mismatched: {} Hz, modes are based on {} Hz",
                self.clock.rate(),
                self.mclk_hz
            );
        }
        if self.clock.enable().is_err() {
            sensor_log!("gc02m2 failed to enable xvclk");
            return Err(SequencingError::ClockEnable);
        }

        if self.supplies.enable_all().is_err() {
            sensor_log!("gc02m2 failed to enable regulators");
            self.clock.disable();
            return Err(SequencingError::SupplyEnable);
        }

        Self::drive(&mut self.reset, true);
        Self::drive(&mut self.pwdn, false);
        Self::drive(&mut self.reset, false);
        self.delay.delay_us(RESET_SETTLE_US);

        self.delay.delay_us(cycles_to_us(PRE_SCCB_CYCLES, self.mclk_hz));
        sensor_log!("gc02m2 powered on");
        Ok(())
    }

    fn power_off(&mut self) {
        Self::drive(&mut self.pwdn, true);
        self.clock.disable();
        Self::drive(&mut self.reset, true);
        self.supplies.disable_all();
        sensor_log!("gc02m2 powered off");
    }
}
