//! # Rust driver for MCP47FEB22 2-channel 12-bit I2C DAC
//!
//! This is a platform agnostic rust driver for the MCP47FEB22 DAC using the [embedded-hal](https://github.com/rust-embedded/embedded-hal) traits.
//!
//! Every getter queries the device; nothing is cached in the driver.  Values are raw 12-bit codes,
//! not voltages.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(target_os = "linux")] {
//! use linux_embedded_hal::I2cdev;
//! use mcp47feb::{Channel, MCP47FEB};
//!
//! let i2c = I2cdev::new("/dev/i2c-1").unwrap();
//! let mut dac = MCP47FEB::new(i2c, 0x60);
//! dac.is_ready().unwrap();
//! dac.analog_write(483, 2790).unwrap();
//! assert_eq!(dac.value(Channel::One).unwrap(), 2790);
//! dac.write_eeprom().unwrap();
//! # }
//! ```
#![cfg_attr(not(test), no_std)]

mod fmt;

#[cfg(feature = "async")]
mod async_impl;
pub mod command;
mod types;

pub use crate::command::{Bank, Register, DEFAULT_ADDRESS};
pub use crate::types::*;

#[cfg(feature = "sync")]
use crate::command::*;
#[cfg(feature = "sync")]
use crate::types::PackedField;
#[cfg(feature = "sync")]
use embedded_hal::i2c;

/// MCP47FEB22 2-channel 12-bit I2C DAC.
pub struct MCP47FEB<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> MCP47FEB<I2C> {
    /// The 7-bit I2C address this instance talks to.
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// The 8-bit address as it appears on the wire (the 7-bit address shifted left by one, read/write
    /// bit clear).
    pub const fn bus_address(&self) -> u8 {
        self.address << 1
    }
}

/// Implementation of all commands given a generic I2CInterface.
///
/// # Errors
///
/// Any errors encountered within the I2C device will be wrapped in [`Error::I2CError`].  The
/// first failing transaction aborts the command; no transaction is retried.
#[cfg(feature = "sync")]
impl<I2C, E> MCP47FEB<I2C>
where
    I2C: i2c::I2c<Error = E>,
{
    /// Creates a new [`MCP47FEB`] from an I2C device that implements the
    /// [`embedded_hal::i2c::I2c`] trait.
    ///
    /// No bus traffic is generated.  `address` is the unshifted 7-bit address.
    pub fn new(i2c: I2C, address: u8) -> Self {
        MCP47FEB { i2c, address }
    }

    fn write_bytes(&mut self, address: u8, bytes: &[u8]) -> Result<(), Error<E>> {
        trace!("write {:?} to {:#x}", bytes, address);
        self.i2c.write(address, bytes).map_err(Error::I2CError)
    }

    fn read_register(&mut self, register: Register, bank: Bank) -> Result<[u8; 2], Error<E>> {
        let command = read_command(register.into(), bank);
        let mut bytes = [0; 2];
        self.write_bytes(self.address, &[command])?;
        self.i2c.read(self.address, &mut bytes)?;
        trace!("read {:?} with {:#x}", &bytes[..], command);
        Ok(bytes)
    }

    fn read_pair<T: PackedField>(
        &mut self,
        register: Register,
        bank: Bank,
    ) -> Result<ChannelPair<T>, Error<E>> {
        let bytes = self.read_register(register, bank)?;
        Ok(ChannelPair::from_bits(
            bytes[control_byte_index(register.into())],
        ))
    }

    fn fast_write(&mut self, register: Register, data: u16) -> Result<(), Error<E>> {
        self.write_bytes(self.address, &fast_write_payload(register.into(), data))
    }

    fn write_addressed(&mut self, address: u8, register: u8, data: u8) -> Result<(), Error<E>> {
        self.write_bytes(address, &addressed_write_payload(register, data))
    }

    /// Destroy this instance and return the inner I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Checks whether the device acknowledges its address.
    ///
    /// Issues a single 1-byte read, whose outcome only depends on the address acknowledge, and
    /// returns the result of the bus verbatim.  The byte read is discarded.
    pub fn is_ready(&mut self) -> Result<(), Error<E>> {
        let mut byte = [0; 1];
        let result = self.i2c.read(self.address, &mut byte).map_err(Error::I2CError);
        if result.is_err() {
            warn!("no acknowledge from {:#x}", self.address);
        }
        result
    }

    /// Issues a general call command (address 0x00) to reset the device.  All MCP47FEB devices on
    /// the bus will load the values from EEPROM into the volatile registers.
    pub fn general_call_reset(&mut self) -> Result<(), Error<E>> {
        debug!("general call reset");
        self.write_bytes(ADDRESS_GENERAL_CALL, &[COMMAND_GENERAL_CALL_RESET])
    }

    /// Issues a general call command (address 0x00) to wake up the device.  All MCP47FEB devices on
    /// the bus will clear the power-down bits of their volatile registers.
    pub fn general_call_wake_up(&mut self) -> Result<(), Error<E>> {
        debug!("general call wake up");
        self.write_bytes(ADDRESS_GENERAL_CALL, &[COMMAND_GENERAL_CALL_WAKE_UP])
    }

    /// Unlocks the I2C address of the device.
    ///
    /// # Hardware precondition
    ///
    /// The device only accepts SALCK commands while its HVC pin is driven to the high voltage
    /// level.  The driver does not control that pin; the caller must assert it before this call and
    /// release it afterwards.
    pub fn unlock_salck(&mut self) -> Result<(), Error<E>> {
        debug!("unlock SALCK at {:#x}", self.address);
        self.write_addressed(self.address, UNLOCK_SALCK, 0)
    }

    /// Sends the SALCK lock sequence to the device at `address`.
    ///
    /// The command is addressed to `address`, not to the address of this instance, and this
    /// instance keeps its own address afterwards.  The command byte sent is [`LOCK_SALCK`], which
    /// currently carries the unlock bits; see [`SALCK_LOCK_COMMAND_BITS`].
    ///
    /// # Hardware precondition
    ///
    /// As for [`MCP47FEB::unlock_salck`], the caller drives the HVC pin around this call.
    pub fn lock_salck(&mut self, address: u8) -> Result<(), Error<E>> {
        debug!("lock SALCK at {:#x}", address);
        self.write_addressed(address, LOCK_SALCK, 0)
    }

    /// Writes the outputs of both channels.
    ///
    /// Values are truncated to 12 bits.  Channel 0 is written first, then channel 1, each with its
    /// own fast write.  The EEPROM is not affected.
    pub fn analog_write(&mut self, val_0: u16, val_1: u16) -> Result<(), Error<E>> {
        self.fast_write(Register::Dac0, val_0 & 0x0fff)?;
        self.fast_write(Register::Dac1, val_1 & 0x0fff)
    }

    /// Writes the output of a single channel.
    ///
    /// # Errors
    ///
    /// In addition to the internal I2C errors, this can return [`Error::ValueOutOfBounds`] if the
    /// value is out of range (greater than 4095).
    pub fn write_value(&mut self, channel: Channel, value: u16) -> Result<(), Error<E>> {
        if value > 0x0fff {
            return Err(Error::ValueOutOfBounds(value));
        }
        self.fast_write(dac_register(channel), value)
    }

    /// Reads the 12-bit output value of a channel.
    pub fn value(&mut self, channel: Channel) -> Result<u16, Error<E>> {
        let bytes = self.read_register(dac_register(channel), Bank::Volatile)?;
        Ok(parse_value(bytes))
    }

    /// Reads the 12-bit output value of a channel stored in EEPROM.
    pub fn value_eeprom(&mut self, channel: Channel) -> Result<u16, Error<E>> {
        let bytes = self.read_register(dac_register(channel), Bank::Eeprom)?;
        Ok(parse_value(bytes))
    }

    /// Writes the power-down modes of both channels to the volatile register.
    pub fn set_power_down_mode(
        &mut self,
        mode_0: PowerDownMode,
        mode_1: PowerDownMode,
    ) -> Result<(), Error<E>> {
        let bits = ChannelPair::new(mode_0, mode_1).bits();
        self.write_addressed(self.address, Register::PowerDown.into(), bits)
    }

    /// Reads the power-down modes of both channels with a single transaction.
    pub fn power_down_modes(&mut self) -> Result<ChannelPair<PowerDownMode>, Error<E>> {
        self.read_pair(Register::PowerDown, Bank::Volatile)
    }

    /// Reads the power-down mode of one channel.
    pub fn power_down_mode(&mut self, channel: Channel) -> Result<PowerDownMode, Error<E>> {
        Ok(self.power_down_modes()?.get(channel))
    }

    /// Reads the power-down modes of both channels stored in EEPROM.
    pub fn power_down_modes_eeprom(&mut self) -> Result<ChannelPair<PowerDownMode>, Error<E>> {
        self.read_pair(Register::PowerDown, Bank::Eeprom)
    }

    /// Reads the power-down mode of one channel stored in EEPROM.
    pub fn power_down_mode_eeprom(&mut self, channel: Channel) -> Result<PowerDownMode, Error<E>> {
        Ok(self.power_down_modes_eeprom()?.get(channel))
    }

    /// Writes the gain modes of both channels to the volatile register.
    pub fn set_gain_mode(&mut self, mode_0: GainMode, mode_1: GainMode) -> Result<(), Error<E>> {
        let bits = ChannelPair::new(mode_0, mode_1).bits();
        self.write_addressed(self.address, Register::Gain.into(), bits)
    }

    /// Reads the gain modes of both channels with a single transaction.
    pub fn gain_modes(&mut self) -> Result<ChannelPair<GainMode>, Error<E>> {
        self.read_pair(Register::Gain, Bank::Volatile)
    }

    /// Reads the gain mode of one channel.
    pub fn gain_mode(&mut self, channel: Channel) -> Result<GainMode, Error<E>> {
        Ok(self.gain_modes()?.get(channel))
    }

    /// Reads the gain modes of both channels stored in EEPROM.
    pub fn gain_modes_eeprom(&mut self) -> Result<ChannelPair<GainMode>, Error<E>> {
        self.read_pair(Register::Gain, Bank::Eeprom)
    }

    /// Reads the gain mode of one channel stored in EEPROM.
    pub fn gain_mode_eeprom(&mut self, channel: Channel) -> Result<GainMode, Error<E>> {
        Ok(self.gain_modes_eeprom()?.get(channel))
    }

    /// Writes the voltage reference modes of both channels to the volatile register.
    pub fn set_voltage_reference_mode(
        &mut self,
        mode_0: VoltageReferenceMode,
        mode_1: VoltageReferenceMode,
    ) -> Result<(), Error<E>> {
        let bits = ChannelPair::new(mode_0, mode_1).bits();
        self.write_addressed(self.address, Register::VoltageReference.into(), bits)
    }

    /// Reads the voltage reference modes of both channels with a single transaction.
    pub fn voltage_reference_modes(
        &mut self,
    ) -> Result<ChannelPair<VoltageReferenceMode>, Error<E>> {
        self.read_pair(Register::VoltageReference, Bank::Volatile)
    }

    /// Reads the voltage reference mode of one channel.
    pub fn voltage_reference_mode(
        &mut self,
        channel: Channel,
    ) -> Result<VoltageReferenceMode, Error<E>> {
        Ok(self.voltage_reference_modes()?.get(channel))
    }

    /// Reads the voltage reference modes of both channels stored in EEPROM.
    pub fn voltage_reference_modes_eeprom(
        &mut self,
    ) -> Result<ChannelPair<VoltageReferenceMode>, Error<E>> {
        self.read_pair(Register::VoltageReference, Bank::Eeprom)
    }

    /// Reads the voltage reference mode of one channel stored in EEPROM.
    pub fn voltage_reference_mode_eeprom(
        &mut self,
        channel: Channel,
    ) -> Result<VoltageReferenceMode, Error<E>> {
        Ok(self.voltage_reference_modes_eeprom()?.get(channel))
    }

    /// Copies the current volatile configuration of both channels into EEPROM.
    ///
    /// Each value is read back from the device right before it is persisted, in this order:
    /// output of channel 0, output of channel 1, voltage reference, gain, power-down.  Every
    /// per-channel setting is read with its own transaction, and each EEPROM register gets one
    /// fast write.  The gain word is shifted by [`EEPROM_GAIN_SHIFT`] before it is written.
    ///
    /// The device ignores commands while an EEPROM write is in progress, so callers issuing further
    /// commands right away should poll [`MCP47FEB::is_ready`] or wait out the write cycle.
    pub fn write_eeprom(&mut self) -> Result<(), Error<E>> {
        debug!("persisting volatile registers to EEPROM");
        let value_0 = self.value(Channel::Zero)?;
        self.fast_write(Register::Dac0Eeprom, value_0)?;
        let value_1 = self.value(Channel::One)?;
        self.fast_write(Register::Dac1Eeprom, value_1)?;

        let vref = ChannelPair::new(
            self.voltage_reference_mode(Channel::Zero)?,
            self.voltage_reference_mode(Channel::One)?,
        );
        self.fast_write(Register::VoltageReferenceEeprom, vref.bits().into())?;

        let gain = ChannelPair::new(
            self.gain_mode(Channel::Zero)?,
            self.gain_mode(Channel::One)?,
        );
        self.fast_write(
            Register::GainEeprom,
            u16::from(gain.bits()) << EEPROM_GAIN_SHIFT,
        )?;

        let power_down = ChannelPair::new(
            self.power_down_mode(Channel::Zero)?,
            self.power_down_mode(Channel::One)?,
        );
        self.fast_write(Register::PowerDownEeprom, power_down.bits().into())
    }
}

#[cfg(any(feature = "sync", feature = "async"))]
pub(crate) const fn dac_register(channel: Channel) -> Register {
    match channel {
        Channel::Zero => Register::Dac0,
        Channel::One => Register::Dac1,
    }
}
