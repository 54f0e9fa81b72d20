/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Byte-addressed register access to the sensor

use crate::registers::{RegVal, CHIP_ID_H, CHIP_ID_L, REG_NULL};
use crate::DEFAULT_I2C_ADDRESS;

/// Point-to-point read/write of 8-bit registers at 8-bit addresses
pub trait RegisterTransport {
    type Error;

    /// Read a u8 from an 8-bit address
    fn read(&mut self, addr: u8) -> Result<u8, Self::Error>;

    /// Write a u8 to an 8-bit address
    fn write(&mut self, addr: u8, val: u8) -> Result<(), Self::Error>;

    /// Write a register program in order, up to the `REG_NULL` sentinel.
    /// Stops at the first failed write.
    fn write_program(&mut self, program: &[RegVal]) -> Result<(), Self::Error> {
        for &(addr, val) in program.iter().take_while(|(addr, _)| *addr != REG_NULL) {
            self.write(addr, val)?;
        }
        Ok(())
    }

    /// Read the 16-bit chip identifier
    fn read_chip_id(&mut self) -> Result<u16, Self::Error> {
        let upper = u16::from(self.read(CHIP_ID_H)?) << 8;
        let lower = u16::from(self.read(CHIP_ID_L)?);
        Ok(upper | lower)
    }
}

/// Register transport over a blocking embedded-hal i2c bus
pub struct I2cTransport<I2C> {
    address: u8,
    i2c: I2C,
}

impl<I2C, CommE> I2cTransport<I2C>
where
    I2C: embedded_hal::blocking::i2c::Write<Error = CommE>
        + embedded_hal::blocking::i2c::Read<Error = CommE>,
{
    /// Create a new instance with an i2c address:
    /// May use DEFAULT_I2C_ADDRESS if in doubt.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { address, i2c }
    }

    pub fn default(i2c: I2C) -> Self {
        Self::new(i2c, DEFAULT_I2C_ADDRESS)
    }

    /// Give back the bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, CommE> RegisterTransport for I2cTransport<I2C>
where
    I2C: embedded_hal::blocking::i2c::Write<Error = CommE>
        + embedded_hal::blocking::i2c::Read<Error = CommE>,
{
    type Error = CommE;

    fn read(&mut self, addr: u8) -> Result<u8, CommE> {
        // SCCB: address write and data read are separate transactions
        let cmd_buf = [addr];
        let mut recv_buf = [0u8];
        self.i2c.write(self.address, &cmd_buf)?;
        self.i2c.read(self.address, &mut recv_buf)?;
        Ok(recv_buf[0])
    }

    fn write(&mut self, addr: u8, val: u8) -> Result<(), CommE> {
        let write_buf = [addr, val];
        self.i2c.write(self.address, &write_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    use embedded_hal_mock::MockError;
    use std::io::ErrorKind;

    const ADDR: u8 = DEFAULT_I2C_ADDRESS;

    #[test]
    fn read_is_address_write_then_read() {
        let expectations = [
            I2cTransaction::write(ADDR, vec![0x17]),
            I2cTransaction::read(ADDR, vec![0x80]),
        ];
        let mut transport = I2cTransport::default(I2cMock::new(&expectations));
        assert_eq!(transport.read(0x17), Ok(0x80));
        transport.release().done();
    }

    #[test]
    fn chip_id_is_high_then_low() {
        let expectations = [
            I2cTransaction::write(ADDR, vec![CHIP_ID_H]),
            I2cTransaction::read(ADDR, vec![0x02]),
            I2cTransaction::write(ADDR, vec![CHIP_ID_L]),
            I2cTransaction::read(ADDR, vec![0xf0]),
        ];
        let mut transport = I2cTransport::new(I2cMock::new(&expectations), ADDR);
        assert_eq!(transport.read_chip_id(), Ok(0x02f0));
        transport.release().done();
    }

    #[test]
    fn program_stops_at_sentinel() {
        let program = [(0xfe, 0x00), (0x3e, 0x90), (REG_NULL, 0x00), (0x10, 0x11)];
        let expectations = [
            I2cTransaction::write(ADDR, vec![0xfe, 0x00]),
            I2cTransaction::write(ADDR, vec![0x3e, 0x90]),
        ];
        let mut transport = I2cTransport::default(I2cMock::new(&expectations));
        assert_eq!(transport.write_program(&program), Ok(()));
        transport.release().done();
    }

    #[test]
    fn program_stops_at_first_failure() {
        let program = [(0x01, 0x01), (0x02, 0x02), (0x03, 0x03), (REG_NULL, 0x00)];
        let expectations = [
            I2cTransaction::write(ADDR, vec![0x01, 0x01]),
            I2cTransaction::write(ADDR, vec![0x02, 0x02])
                .with_error(MockError::Io(ErrorKind::Other)),
        ];
        let mut transport = I2cTransport::default(I2cMock::new(&expectations));
        assert_eq!(
            transport.write_program(&program),
            Err(MockError::Io(ErrorKind::Other))
        );
        transport.release().done();
    }
}
