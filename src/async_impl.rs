use crate::command::*;
use crate::types::*;
use crate::{dac_register, MCP47FEB};

use embedded_hal_async::i2c;

/// Implementation of all commands given a generic async I2CInterface.
///
/// Every command behaves exactly like its blocking counterpart without the `_async` suffix.
///
/// # Errors
///
/// Any errors encountered within the I2C device will be wrapped in [`Error::I2CError`].
impl<I, E> MCP47FEB<I>
where
    I: i2c::I2c<Error = E>,
{
    /// Creates a new [`MCP47FEB`] from an I2C device that implements the
    /// [`embedded_hal_async::i2c::I2c`] trait.
    pub const fn new_async(i2c: I, address: u8) -> Self {
        MCP47FEB { i2c, address }
    }

    async fn write_bytes_async(&mut self, address: u8, bytes: &[u8]) -> Result<(), Error<E>> {
        trace!("write {:?} to {:#x}", bytes, address);
        self.i2c.write(address, bytes).await.map_err(Error::I2CError)
    }

    async fn read_register_async(
        &mut self,
        register: Register,
        bank: Bank,
    ) -> Result<[u8; 2], Error<E>> {
        let command = read_command(register.into(), bank);
        let mut bytes = [0; 2];
        self.write_bytes_async(self.address, &[command]).await?;
        self.i2c.read(self.address, &mut bytes).await?;
        trace!("read {:?} with {:#x}", &bytes[..], command);
        Ok(bytes)
    }

    async fn read_pair_async<T: PackedField>(
        &mut self,
        register: Register,
        bank: Bank,
    ) -> Result<ChannelPair<T>, Error<E>> {
        let bytes = self.read_register_async(register, bank).await?;
        Ok(ChannelPair::from_bits(
            bytes[control_byte_index(register.into())],
        ))
    }

    async fn fast_write_async(&mut self, register: Register, data: u16) -> Result<(), Error<E>> {
        self.write_bytes_async(self.address, &fast_write_payload(register.into(), data))
            .await
    }

    async fn write_addressed_async(
        &mut self,
        address: u8,
        register: u8,
        data: u8,
    ) -> Result<(), Error<E>> {
        self.write_bytes_async(address, &addressed_write_payload(register, data))
            .await
    }

    /// Destroy this instance and return the inner I2C bus.
    pub async fn release_async(self) -> I {
        self.i2c
    }

    /// Checks whether the device acknowledges its address.
    pub async fn is_ready_async(&mut self) -> Result<(), Error<E>> {
        let mut byte = [0; 1];
        let result = self
            .i2c
            .read(self.address, &mut byte)
            .await
            .map_err(Error::I2CError);
        if result.is_err() {
            warn!("no acknowledge from {:#x}", self.address);
        }
        result
    }

    /// Issues a general call command (address 0x00) to reset the device.
    pub async fn general_call_reset_async(&mut self) -> Result<(), Error<E>> {
        debug!("general call reset");
        self.write_bytes_async(ADDRESS_GENERAL_CALL, &[COMMAND_GENERAL_CALL_RESET])
            .await
    }

    /// Issues a general call command (address 0x00) to wake up the device.
    pub async fn general_call_wake_up_async(&mut self) -> Result<(), Error<E>> {
        debug!("general call wake up");
        self.write_bytes_async(ADDRESS_GENERAL_CALL, &[COMMAND_GENERAL_CALL_WAKE_UP])
            .await
    }

    /// Unlocks the I2C address of the device.  The caller drives the HVC pin around this call.
    pub async fn unlock_salck_async(&mut self) -> Result<(), Error<E>> {
        debug!("unlock SALCK at {:#x}", self.address);
        self.write_addressed_async(self.address, UNLOCK_SALCK, 0)
            .await
    }

    /// Sends the SALCK lock sequence to the device at `address`.  The caller drives the HVC pin
    /// around this call.
    pub async fn lock_salck_async(&mut self, address: u8) -> Result<(), Error<E>> {
        debug!("lock SALCK at {:#x}", address);
        self.write_addressed_async(address, LOCK_SALCK, 0).await
    }

    /// Writes the outputs of both channels, truncated to 12 bits.
    pub async fn analog_write_async(&mut self, val_0: u16, val_1: u16) -> Result<(), Error<E>> {
        self.fast_write_async(Register::Dac0, val_0 & 0x0fff).await?;
        self.fast_write_async(Register::Dac1, val_1 & 0x0fff).await
    }

    /// Writes the output of a single channel.
    ///
    /// # Errors
    ///
    /// In addition to the internal I2C errors, this can return [`Error::ValueOutOfBounds`] if the
    /// value is out of range (greater than 4095).
    pub async fn write_value_async(&mut self, channel: Channel, value: u16) -> Result<(), Error<E>> {
        if value > 0x0fff {
            return Err(Error::ValueOutOfBounds(value));
        }
        self.fast_write_async(dac_register(channel), value).await
    }

    /// Reads the 12-bit output value of a channel.
    pub async fn value_async(&mut self, channel: Channel) -> Result<u16, Error<E>> {
        let bytes = self
            .read_register_async(dac_register(channel), Bank::Volatile)
            .await?;
        Ok(parse_value(bytes))
    }

    /// Reads the 12-bit output value of a channel stored in EEPROM.
    pub async fn value_eeprom_async(&mut self, channel: Channel) -> Result<u16, Error<E>> {
        let bytes = self
            .read_register_async(dac_register(channel), Bank::Eeprom)
            .await?;
        Ok(parse_value(bytes))
    }

    /// Writes the power-down modes of both channels to the volatile register.
    pub async fn set_power_down_mode_async(
        &mut self,
        mode_0: PowerDownMode,
        mode_1: PowerDownMode,
    ) -> Result<(), Error<E>> {
        let bits = ChannelPair::new(mode_0, mode_1).bits();
        self.write_addressed_async(self.address, Register::PowerDown.into(), bits)
            .await
    }

    /// Reads the power-down modes of both channels with a single transaction.
    pub async fn power_down_modes_async(
        &mut self,
    ) -> Result<ChannelPair<PowerDownMode>, Error<E>> {
        self.read_pair_async(Register::PowerDown, Bank::Volatile)
            .await
    }

    /// Reads the power-down mode of one channel.
    pub async fn power_down_mode_async(
        &mut self,
        channel: Channel,
    ) -> Result<PowerDownMode, Error<E>> {
        Ok(self.power_down_modes_async().await?.get(channel))
    }

    /// Reads the power-down modes of both channels stored in EEPROM.
    pub async fn power_down_modes_eeprom_async(
        &mut self,
    ) -> Result<ChannelPair<PowerDownMode>, Error<E>> {
        self.read_pair_async(Register::PowerDown, Bank::Eeprom).await
    }

    /// Reads the power-down mode of one channel stored in EEPROM.
    pub async fn power_down_mode_eeprom_async(
        &mut self,
        channel: Channel,
    ) -> Result<PowerDownMode, Error<E>> {
        Ok(self.power_down_modes_eeprom_async().await?.get(channel))
    }

    /// Writes the gain modes of both channels to the volatile register.
    pub async fn set_gain_mode_async(
        &mut self,
        mode_0: GainMode,
        mode_1: GainMode,
    ) -> Result<(), Error<E>> {
        let bits = ChannelPair::new(mode_0, mode_1).bits();
        self.write_addressed_async(self.address, Register::Gain.into(), bits)
            .await
    }

    /// Reads the gain modes of both channels with a single transaction.
    pub async fn gain_modes_async(&mut self) -> Result<ChannelPair<GainMode>, Error<E>> {
        self.read_pair_async(Register::Gain, Bank::Volatile).await
    }

    /// Reads the gain mode of one channel.
    pub async fn gain_mode_async(&mut self, channel: Channel) -> Result<GainMode, Error<E>> {
        Ok(self.gain_modes_async().await?.get(channel))
    }

    /// Reads the gain modes of both channels stored in EEPROM.
    pub async fn gain_modes_eeprom_async(&mut self) -> Result<ChannelPair<GainMode>, Error<E>> {
        self.read_pair_async(Register::Gain, Bank::Eeprom).await
    }

    /// Reads the gain mode of one channel stored in EEPROM.
    pub async fn gain_mode_eeprom_async(&mut self, channel: Channel) -> Result<GainMode, Error<E>> {
        Ok(self.gain_modes_eeprom_async().await?.get(channel))
    }

    /// Writes the voltage reference modes of both channels to the volatile register.
    pub async fn set_voltage_reference_mode_async(
        &mut self,
        mode_0: VoltageReferenceMode,
        mode_1: VoltageReferenceMode,
    ) -> Result<(), Error<E>> {
        let bits = ChannelPair::new(mode_0, mode_1).bits();
        self.write_addressed_async(self.address, Register::VoltageReference.into(), bits)
            .await
    }

    /// Reads the voltage reference modes of both channels with a single transaction.
    pub async fn voltage_reference_modes_async(
        &mut self,
    ) -> Result<ChannelPair<VoltageReferenceMode>, Error<E>> {
        self.read_pair_async(Register::VoltageReference, Bank::Volatile)
            .await
    }

    /// Reads the voltage reference mode of one channel.
    pub async fn voltage_reference_mode_async(
        &mut self,
        channel: Channel,
    ) -> Result<VoltageReferenceMode, Error<E>> {
        Ok(self.voltage_reference_modes_async().await?.get(channel))
    }

    /// Reads the voltage reference modes of both channels stored in EEPROM.
    pub async fn voltage_reference_modes_eeprom_async(
        &mut self,
    ) -> Result<ChannelPair<VoltageReferenceMode>, Error<E>> {
        self.read_pair_async(Register::VoltageReference, Bank::Eeprom)
            .await
    }

    /// Reads the voltage reference mode of one channel stored in EEPROM.
    pub async fn voltage_reference_mode_eeprom_async(
        &mut self,
        channel: Channel,
    ) -> Result<VoltageReferenceMode, Error<E>> {
        Ok(self
            .voltage_reference_modes_eeprom_async()
            .await?
            .get(channel))
    }

    /// Copies the current volatile configuration of both channels into EEPROM, with the same
    /// transaction sequence as [`MCP47FEB::write_eeprom`].
    pub async fn write_eeprom_async(&mut self) -> Result<(), Error<E>> {
        debug!("persisting volatile registers to EEPROM");
        let value_0 = self.value_async(Channel::Zero).await?;
        self.fast_write_async(Register::Dac0Eeprom, value_0).await?;
        let value_1 = self.value_async(Channel::One).await?;
        self.fast_write_async(Register::Dac1Eeprom, value_1).await?;

        let vref = ChannelPair::new(
            self.voltage_reference_mode_async(Channel::Zero).await?,
            self.voltage_reference_mode_async(Channel::One).await?,
        );
        self.fast_write_async(Register::VoltageReferenceEeprom, vref.bits().into())
            .await?;

        let gain = ChannelPair::new(
            self.gain_mode_async(Channel::Zero).await?,
            self.gain_mode_async(Channel::One).await?,
        );
        self.fast_write_async(
            Register::GainEeprom,
            u16::from(gain.bits()) << EEPROM_GAIN_SHIFT,
        )
        .await?;

        let power_down = ChannelPair::new(
            self.power_down_mode_async(Channel::Zero).await?,
            self.power_down_mode_async(Channel::One).await?,
        );
        self.fast_write_async(Register::PowerDownEeprom, power_down.bits().into())
            .await
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};

    use crate::*;

    const ADDRESS: u8 = 0x60;

    fn read(command: u8, response: [u8; 2]) -> Vec<Transaction> {
        vec![
            Transaction::write(ADDRESS, vec![command]),
            Transaction::read(ADDRESS, response.to_vec()),
        ]
    }

    #[tokio::test]
    async fn is_ready_propagates_nack() {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        let mut i2c = Mock::new(&[
            Transaction::read(ADDRESS, vec![0x5a]),
            Transaction::read(ADDRESS, vec![0x00]).with_error(nack),
        ]);
        let mut dac = MCP47FEB::new_async(i2c.clone(), ADDRESS);
        assert_eq!(dac.is_ready_async().await, Ok(()));
        assert_eq!(dac.is_ready_async().await, Err(Error::I2CError(nack)));
        i2c.done();
    }

    #[tokio::test]
    async fn analog_write_truncates_to_twelve_bits() {
        let mut i2c = Mock::new(&[
            Transaction::write(ADDRESS, vec![0x00, 0x00, 0x00]),
            Transaction::write(ADDRESS, vec![0x08, 0x03, 0x88]),
        ]);
        let mut dac = MCP47FEB::new_async(i2c.clone(), ADDRESS);
        assert_eq!(dac.analog_write_async(4096, 5000).await, Ok(()));
        i2c.done();
    }

    #[tokio::test]
    async fn power_down_modes() {
        let mut i2c = Mock::new(&[
            vec![Transaction::write(ADDRESS, vec![0x09, 0x00, 0b0100])],
            read(0x4e, [0x00, 0b0100]),
        ]
        .concat());
        let mut dac = MCP47FEB::new_async(i2c.clone(), ADDRESS);
        assert_eq!(
            dac.set_power_down_mode_async(PowerDownMode::Normal, PowerDownMode::PowerDownOneK)
                .await,
            Ok(())
        );
        assert_eq!(
            dac.power_down_modes_async().await,
            Ok(ChannelPair::new(
                PowerDownMode::Normal,
                PowerDownMode::PowerDownOneK
            ))
        );
        i2c.done();
    }

    #[tokio::test]
    async fn set_gain_mode_uses_high_data_byte() {
        let mut i2c = Mock::new(&[Transaction::write(ADDRESS, vec![0x0a, 0b01, 0x00])]);
        let mut dac = MCP47FEB::new_async(i2c.clone(), ADDRESS);
        assert_eq!(
            dac.set_gain_mode_async(GainMode::TimesTwo, GainMode::TimesOne)
                .await,
            Ok(())
        );
        i2c.done();
    }

    #[tokio::test]
    async fn lock_salck_targets_new_address() {
        let mut i2c = Mock::new(&[
            Transaction::write(ADDRESS, vec![0xd2, 0x00, 0x00]),
            Transaction::write(0x62, vec![0xd2, 0x00, 0x00]),
        ]);
        let mut dac = MCP47FEB::new_async(i2c.clone(), ADDRESS);
        assert_eq!(dac.unlock_salck_async().await, Ok(()));
        assert_eq!(dac.lock_salck_async(0x62).await, Ok(()));
        i2c.done();
    }

    #[tokio::test]
    async fn write_eeprom() {
        let mut i2c = Mock::new(&[
            read(0x06, [0x0f, 0xff]),
            vec![Transaction::write(ADDRESS, vec![0x80, 0x0f, 0xff])],
            read(0x0e, [0x00, 0x00]),
            vec![Transaction::write(ADDRESS, vec![0x88, 0x00, 0x00])],
            read(0x46, [0x00, 0b0001]),
            read(0x46, [0x00, 0b0001]),
            vec![Transaction::write(ADDRESS, vec![0xc0, 0x00, 0b0001])],
            read(0x56, [0b10, 0x00]),
            read(0x56, [0b10, 0x00]),
            vec![Transaction::write(ADDRESS, vec![0xd0, 0b10, 0x00])],
            read(0x4e, [0x00, 0b1111]),
            read(0x4e, [0x00, 0b1111]),
            vec![Transaction::write(ADDRESS, vec![0xc8, 0x00, 0b1111])],
        ]
        .concat());
        let mut dac = MCP47FEB::new_async(i2c.clone(), ADDRESS);
        assert_eq!(dac.write_eeprom_async().await, Ok(()));
        i2c.done();
    }
}
