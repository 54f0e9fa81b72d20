/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Power and streaming state machine for one sensor instance
//!
//! Every public operation takes the device lock once and holds it for the
//! whole register sequence it issues, so two callers never interleave
//! their writes. Control changes made while the chip is unpowered are only
//! recorded, and are written out when streaming next starts.

use spin::Mutex;

use crate::gain::{map_gain, GAIN_DEFAULT, GAIN_MAX, GAIN_MIN, GAIN_STEP};
use crate::modes::{Fraction, Mode, ModeCatalog};
use crate::power::PowerControl;
use crate::registers::{
    ANALOG_GAIN, CHIP_ID, FLIP_BIT, MIRROR_BIT, MIRROR_FLIP, MODE_SELECT, MODE_STREAMING,
    MODE_SW_STANDBY, PAGE_0, PAGE_SELECT, PREGAIN_H, PREGAIN_L,
};
use crate::timing::{ControlRange, ExposureTimingController};
use crate::transport::RegisterTransport;
use crate::{Error, SensorConfig, MIPI_LINK_FREQ_HZ};

/// Runtime-adjustable sensor controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Integration time, in lines
    Exposure,
    /// Total (analog x digital) gain, 0x40 is 1.0x
    Gain,
    /// Vertical blanking, in lines
    VerticalBlank,
    /// Horizontal blanking, in pixel clocks (read-only)
    HorizontalBlank,
    /// Horizontal mirror, 0 or 1
    Mirror,
    /// Vertical flip, 0 or 1
    Flip,
    /// MIPI link frequency in Hz (read-only)
    LinkFrequency,
    /// Pixel rate in pixels per second (read-only)
    PixelRate,
}

/// Lifecycle of the device. Streaming always implies powered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    PowerOff,
    PowerOnIdle,
    Streaming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Off,
    On,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Stopped,
    Streaming,
}

const BOOL_RANGE: ControlRange = ControlRange {
    min: 0,
    max: 1,
    step: 1,
    default: 0,
};

const GAIN_RANGE: ControlRange = ControlRange {
    min: GAIN_MIN,
    max: GAIN_MAX,
    step: GAIN_STEP,
    default: GAIN_DEFAULT,
};

/// Software view of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    lifecycle: Lifecycle,
    timing: ExposureTimingController,
    gain: u32,
    mirror: bool,
    flip: bool,
}

impl DeviceState {
    fn new(mode: &'static Mode) -> Self {
        Self {
            lifecycle: Lifecycle::PowerOff,
            timing: ExposureTimingController::new(mode),
            gain: GAIN_DEFAULT,
            mirror: false,
            flip: false,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn power(&self) -> PowerState {
        match self.lifecycle {
            Lifecycle::PowerOff => PowerState::Off,
            Lifecycle::PowerOnIdle | Lifecycle::Streaming => PowerState::On,
        }
    }

    pub fn streaming(&self) -> StreamState {
        match self.lifecycle {
            Lifecycle::Streaming => StreamState::Streaming,
            Lifecycle::PowerOff | Lifecycle::PowerOnIdle => StreamState::Stopped,
        }
    }

    pub fn mode(&self) -> &'static Mode {
        self.timing.mode()
    }

    pub fn exposure(&self) -> u32 {
        self.timing.exposure()
    }

    pub fn vblank(&self) -> u32 {
        self.timing.vblank()
    }

    pub fn gain(&self) -> u32 {
        self.gain
    }

    pub fn mirror(&self) -> bool {
        self.mirror
    }

    pub fn flip(&self) -> bool {
        self.flip
    }

    pub fn timing(&self) -> &ExposureTimingController {
        &self.timing
    }

    fn is_powered(&self) -> bool {
        self.power() == PowerState::On
    }
}

/// Collaborators and state guarded by the device lock
struct Inner<T, P> {
    transport: T,
    power: P,
    state: DeviceState,
}

impl<T, P> Inner<T, P>
where
    T: RegisterTransport,
    P: PowerControl,
{
    fn select_page0(&mut self) -> Result<(), T::Error> {
        self.transport.write(PAGE_SELECT, PAGE_0)
    }

    fn write_regs(&mut self, regs: &[(u8, u8)]) -> Result<(), T::Error> {
        for &(addr, val) in regs {
            self.transport.write(addr, val)?;
        }
        Ok(())
    }

    fn write_exposure(&mut self, timing: &ExposureTimingController) -> Result<(), T::Error> {
        self.select_page0()?;
        self.write_regs(&timing.exposure_regs())
    }

    fn write_vts(&mut self, timing: &ExposureTimingController) -> Result<(), T::Error> {
        self.select_page0()?;
        self.write_regs(&timing.vts_regs())
    }

    fn write_gain(&mut self, total_gain: u32) -> Result<(), T::Error> {
        sensor_log!("gc02m2 total_gain = {:#06x}", total_gain);
        let setting = map_gain(total_gain);
        let (pregain_h, pregain_l) = setting.pregain_bytes();
        self.select_page0()?;
        self.write_regs(&[
            (ANALOG_GAIN, setting.analog_code),
            (PREGAIN_H, pregain_h),
            (PREGAIN_L, pregain_l),
        ])
    }

    /// Read-modify-write of one bit in the mirror/flip register
    fn write_orientation_bit(&mut self, bit: u8, enable: bool) -> Result<(), T::Error> {
        self.select_page0()?;
        let current = self.transport.read(MIRROR_FLIP)?;
        let val = if enable { current | bit } else { current & !bit };
        self.transport.write(MIRROR_FLIP, val)
    }

    /// Push one control of `next` to the chip
    fn write_control(
        &mut self,
        control: Control,
        next: &DeviceState,
        exposure_moved: bool,
    ) -> Result<(), T::Error> {
        match control {
            Control::Exposure => self.write_exposure(&next.timing),
            Control::Gain => self.write_gain(next.gain),
            Control::VerticalBlank => {
                // shortened exposure must land before the shorter frame
                if exposure_moved {
                    self.write_exposure(&next.timing)?;
                }
                self.write_vts(&next.timing)
            }
            Control::Mirror => self.write_orientation_bit(MIRROR_BIT, next.mirror),
            Control::Flip => self.write_orientation_bit(FLIP_BIT, next.flip),
            Control::HorizontalBlank | Control::LinkFrequency | Control::PixelRate => Ok(()),
        }
    }

    /// Write every recorded control value, first failure aborts
    fn apply_all_controls(&mut self) -> Result<(), T::Error> {
        let state = self.state;
        self.write_vts(&state.timing)?;
        self.write_exposure(&state.timing)?;
        self.write_gain(state.gain)?;
        self.write_orientation_bit(MIRROR_BIT, state.mirror)?;
        self.write_orientation_bit(FLIP_BIT, state.flip)
    }

    /// PowerOff -> PowerOnIdle. Tears the hardware back down if the mode
    /// program cannot be written, so a retry starts from scratch.
    fn power_up(&mut self) -> Result<(), Error<T::Error>> {
        self.power.power_on()?;
        let program = self.state.mode().reg_list;
        if let Err(err) = self.transport.write_program(program) {
            sensor_log!("gc02m2 could not set init registers");
            self.power.power_off();
            return Err(Error::Comm(err));
        }
        self.state.lifecycle = Lifecycle::PowerOnIdle;
        Ok(())
    }

    /// PowerOnIdle -> PowerOff. Caller ensures streaming has stopped.
    fn power_down(&mut self) {
        self.power.power_off();
        self.state.lifecycle = Lifecycle::PowerOff;
    }

    fn start_stream(&mut self) -> Result<(), T::Error> {
        self.apply_all_controls()?;
        self.write_regs(&[
            (PAGE_SELECT, PAGE_0),
            (MODE_SELECT, MODE_STREAMING),
            (PAGE_SELECT, PAGE_0),
        ])
    }

    /// Every write is attempted; the first failure is reported
    fn stop_stream(&mut self) -> Result<(), T::Error> {
        let mut first_err = None;
        for &(addr, val) in &[
            (PAGE_SELECT, PAGE_0),
            (MODE_SELECT, MODE_SW_STANDBY),
            (PAGE_SELECT, PAGE_0),
        ] {
            if let Err(err) = self.transport.write(addr, val) {
                sensor_log!("gc02m2 stop stream write {:#04x} failed", addr);
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }
        self.state.lifecycle = Lifecycle::PowerOnIdle;
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Main driver struct
pub struct Gc02m2<T, P> {
    inner: Mutex<Inner<T, P>>,
    catalog: ModeCatalog,
    config: SensorConfig,
}

impl<T, P> Gc02m2<T, P>
where
    T: RegisterTransport,
    P: PowerControl,
{
    /// Attach to a sensor using the built-in mode table.
    /// See `attach_with_catalog`.
    pub fn attach(transport: T, power: P, config: SensorConfig) -> Result<Self, Error<T::Error>> {
        Self::attach_with_catalog(transport, power, config, ModeCatalog::default())
    }

    /// Validate the board configuration, power the chip up long enough to
    /// check its identity, and leave it powered off in the default mode.
    pub fn attach_with_catalog(
        mut transport: T,
        mut power: P,
        config: SensorConfig,
        catalog: ModeCatalog,
    ) -> Result<Self, Error<T::Error>> {
        config.validate()?;

        power.power_on()?;
        let id = transport.read_chip_id();
        power.power_off();

        let id = id.map_err(Error::Comm)?;
        if id != CHIP_ID {
            sensor_log!("gc02m2 unexpected sensor id {:#06x}", id);
            return Err(Error::IdentityMismatch { found: id });
        }
        sensor_log!("gc02m2 detected gc{:04x} sensor", id);

        Ok(Self {
            inner: Mutex::new(Inner {
                transport,
                power,
                state: DeviceState::new(catalog.default_mode()),
            }),
            catalog,
            config,
        })
    }

    /// Stop streaming, power off, and give back the collaborators
    pub fn detach(self) -> (T, P) {
        let mut inner = self.inner.into_inner();
        if inner.state.lifecycle == Lifecycle::Streaming {
            if inner.stop_stream().is_err() {
                sensor_log!("gc02m2 standby failed on detach");
            }
        }
        if inner.state.lifecycle == Lifecycle::PowerOnIdle {
            inner.power_down();
        }
        (inner.transport, inner.power)
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Snapshot of the device state
    pub fn state(&self) -> DeviceState {
        self.inner.lock().state
    }

    pub fn enumerate_modes(&self) -> &'static [Mode] {
        self.catalog.modes()
    }

    pub fn catalog(&self) -> &ModeCatalog {
        &self.catalog
    }

    /// Mode that `select_mode` would pick, without applying it
    pub fn try_format(&self, width: u32, height: u32) -> &'static Mode {
        self.catalog.find_best_fit(width, height)
    }

    pub fn current_mode(&self) -> &'static Mode {
        self.inner.lock().state.mode()
    }

    /// Switch to the nearest supported mode. Blanking and exposure return
    /// to the mode's defaults. When powered, the new mode's register program
    /// is written before the switch is recorded.
    pub fn select_mode(&self, width: u32, height: u32) -> Result<&'static Mode, Error<T::Error>> {
        let mode = self.catalog.find_best_fit(width, height);
        let mut inner = self.inner.lock();
        let lifecycle = inner.state.lifecycle;
        match lifecycle {
            Lifecycle::Streaming => return Err(Error::Busy),
            Lifecycle::PowerOnIdle if inner.state.mode() != mode => {
                inner
                    .transport
                    .write_program(mode.reg_list)
                    .map_err(Error::Comm)?;
            }
            _ => {}
        }
        inner.state.timing = ExposureTimingController::new(mode);
        Ok(mode)
    }

    pub fn get_frame_interval(&self) -> Fraction {
        self.inner.lock().state.mode().max_fps
    }

    /// Currently published legal range of a control
    pub fn control_range(&self, control: Control) -> ControlRange {
        let inner = self.inner.lock();
        self.range_of(&inner.state, control)
    }

    fn range_of(&self, state: &DeviceState, control: Control) -> ControlRange {
        match control {
            Control::Exposure => state.timing.exposure_range(),
            Control::Gain => GAIN_RANGE,
            Control::VerticalBlank => state.timing.vblank_range(),
            Control::HorizontalBlank => state.timing.hblank_range(),
            Control::Mirror | Control::Flip => BOOL_RANGE,
            Control::LinkFrequency => ControlRange::fixed(MIPI_LINK_FREQ_HZ as u32),
            Control::PixelRate => ControlRange::fixed(self.config.pixel_rate() as u32),
        }
    }

    pub fn get_control(&self, control: Control) -> u32 {
        let inner = self.inner.lock();
        let state = &inner.state;
        match control {
            Control::Exposure => state.exposure(),
            Control::Gain => state.gain,
            Control::VerticalBlank => state.vblank(),
            Control::Mirror => u32::from(state.mirror),
            Control::Flip => u32::from(state.flip),
            Control::HorizontalBlank | Control::LinkFrequency | Control::PixelRate => {
                self.range_of(state, control).default
            }
        }
    }

    /// Set a control and return the value accepted.
    ///
    /// Integer controls are clamped into their current range. Mirror and
    /// flip only accept 0 or 1, and read-only controls only accept their
    /// fixed value. The registers are written immediately when the chip is
    /// powered; otherwise the value is kept for the next stream start.
    /// A failed write leaves the recorded value unchanged.
    pub fn set_control(&self, control: Control, value: u32) -> Result<u32, Error<T::Error>> {
        let mut inner = self.inner.lock();
        let range = self.range_of(&inner.state, control);
        let mut next = inner.state;
        let mut exposure_moved = false;

        let accepted = match control {
            Control::Exposure => next.timing.set_exposure(value),
            Control::Gain => {
                next.gain = range.clamp(value);
                next.gain
            }
            Control::VerticalBlank => {
                exposure_moved = next.timing.set_vblank(value);
                next.timing.vblank()
            }
            Control::Mirror | Control::Flip => {
                if !range.contains(value) {
                    return Err(Error::InvalidControlValue { control, value });
                }
                if control == Control::Mirror {
                    next.mirror = value == 1;
                } else {
                    next.flip = value == 1;
                }
                value
            }
            Control::HorizontalBlank | Control::LinkFrequency | Control::PixelRate => {
                if range.contains(value) {
                    return Ok(value);
                }
                return Err(Error::InvalidControlValue { control, value });
            }
        };

        if next.is_powered() {
            inner
                .write_control(control, &next, exposure_moved)
                .map_err(Error::Comm)?;
        }
        inner.state = next;
        Ok(accepted)
    }

    /// Power the chip up (sequencer, then full mode program) or down.
    /// Powering down while streaming stops the stream first.
    pub fn set_power(&self, on: bool) -> Result<(), Error<T::Error>> {
        let mut inner = self.inner.lock();
        match (on, inner.state.lifecycle) {
            (true, Lifecycle::PowerOff) => inner.power_up(),
            (true, _) | (false, Lifecycle::PowerOff) => Ok(()),
            (false, lifecycle) => {
                if lifecycle == Lifecycle::Streaming && inner.stop_stream().is_err() {
                    sensor_log!("gc02m2 standby failed before power off");
                }
                inner.power_down();
                Ok(())
            }
        }
    }

    /// Start or stop streaming. Starting from power-off powers up first.
    /// Stopping always ends idle, even when standby writes fail.
    pub fn set_streaming(&self, on: bool) -> Result<(), Error<T::Error>> {
        let mut inner = self.inner.lock();
        if on {
            let lifecycle = inner.state.lifecycle;
            match lifecycle {
                Lifecycle::Streaming => return Ok(()),
                Lifecycle::PowerOff => inner.power_up()?,
                Lifecycle::PowerOnIdle => {}
            }
            if let Err(err) = inner.start_stream() {
                sensor_log!("gc02m2 start stream failed while write regs");
                return Err(Error::Comm(err));
            }
            inner.state.lifecycle = Lifecycle::Streaming;
            sensor_log!("gc02m2 streaming");
            Ok(())
        } else {
            if inner.state.lifecycle != Lifecycle::Streaming {
                return Ok(());
            }
            let res = inner.stop_stream();
            sensor_log!("gc02m2 stream stopped");
            res.map_err(Error::Comm)
        }
    }
}
