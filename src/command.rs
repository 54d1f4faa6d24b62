//! Register map and command framing for the MCP47FEB22.
//!
//! Every bus transaction the driver issues is built by one of the functions in this module.  None
//! of them validate the register index: the device ignores reserved address bits, so out-of-range
//! indices simply produce out-of-range command bytes.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Default 7-bit I2C address of an MCP47FEB22 that has not been re-addressed.
pub const DEFAULT_ADDRESS: u8 = 0x60;

pub(crate) const ADDRESS_GENERAL_CALL: u8 = 0x00;
pub(crate) const COMMAND_GENERAL_CALL_RESET: u8 = 0b00000110;
pub(crate) const COMMAND_GENERAL_CALL_WAKE_UP: u8 = 0b00001010;

const COMMAND_READ: u8 = 0b00000110;
const COMMAND_WRITE: u8 = 0b00000000;
const BANK_EEPROM: u8 = 0b10000000;

const COMMAND_SALCK: u8 = 0xD0;

/// Command bits that unlock the I2C address (SALCK) of the device.
pub const SALCK_UNLOCK_BITS: u8 = 0x02;

/// Command bits that lock the I2C address (SALCK) of the device.
pub const SALCK_LOCK_BITS: u8 = 0x04;

/// Command bits sent by [`MCP47FEB::lock_salck`](crate::MCP47FEB::lock_salck).
///
/// Deployed firmware sends the unlock bits here rather than [`SALCK_LOCK_BITS`], and this driver
/// does the same so that it stays interchangeable with it on the bus.  This is most likely a
/// defect: switching to [`SALCK_LOCK_BITS`] is the intended fix.
pub const SALCK_LOCK_COMMAND_BITS: u8 = SALCK_UNLOCK_BITS;

/// Left shift applied to the packed gain bits when they are persisted by
/// [`MCP47FEB::write_eeprom`](crate::MCP47FEB::write_eeprom).
///
/// The voltage reference and power-down words are written unshifted.
pub const EEPROM_GAIN_SHIFT: u32 = 8;

/// Full command byte of the SALCK unlock command.
pub const UNLOCK_SALCK: u8 = COMMAND_SALCK | SALCK_UNLOCK_BITS;

/// Full command byte sent by [`MCP47FEB::lock_salck`](crate::MCP47FEB::lock_salck).
pub const LOCK_SALCK: u8 = COMMAND_SALCK | SALCK_LOCK_COMMAND_BITS;

/// Register indices, before they are shifted into a command byte.
///
/// The EEPROM mirror of a volatile register lives at its index plus `0x10`.
#[derive(IntoPrimitive, TryFromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Output value of channel 0.
    Dac0 = 0x00,
    /// Output value of channel 1.
    Dac1 = 0x01,
    /// Voltage reference selection of both channels.
    VoltageReference = 0x08,
    /// Power-down selection of both channels.
    PowerDown = 0x09,
    /// Gain selection of both channels.
    Gain = 0x0A,
    /// Wiper lock status of both channels.
    WiperLock = 0x0B,
    /// EEPROM mirror of [`Register::Dac0`].
    Dac0Eeprom = 0x10,
    /// EEPROM mirror of [`Register::Dac1`].
    Dac1Eeprom = 0x11,
    /// EEPROM mirror of [`Register::VoltageReference`].
    VoltageReferenceEeprom = 0x18,
    /// EEPROM mirror of [`Register::PowerDown`].
    PowerDownEeprom = 0x19,
    /// EEPROM mirror of [`Register::Gain`].
    GainEeprom = 0x1A,
}

/// Which copy of a register a read targets.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bank {
    /// The working register that drives the outputs.
    Volatile,
    /// The EEPROM copy that is loaded into the working register at power-up.
    Eeprom,
}

/// Builds the single command byte of a streamed read.
///
/// `register` is always the index of the volatile register; the EEPROM bank is selected with bit
/// 7 of the command.
pub const fn read_command(register: u8, bank: Bank) -> u8 {
    let command = COMMAND_READ | (register << 3);
    match bank {
        Bank::Volatile => command,
        Bank::Eeprom => BANK_EEPROM | command,
    }
}

/// Builds the 3-byte payload of a fast write: shifted register index, then the data word in
/// big-endian order.
pub const fn fast_write_payload(register: u8, data: u16) -> [u8; 3] {
    let [high, low] = data.to_be_bytes();
    [(register << 3) | COMMAND_WRITE, high, low]
}

/// Index of the meaningful control byte within a 2-byte register word.
///
/// The gain bits live in the high byte; every other control register uses the low byte.
pub const fn control_byte_index(register: u8) -> usize {
    if register == Register::Gain as u8 {
        0
    } else {
        1
    }
}

/// Builds the 3-byte payload of an addressed write: unshifted register index, then a data word
/// carrying `data` in the position given by [`control_byte_index`] and zero in the other.
pub const fn addressed_write_payload(register: u8, data: u8) -> [u8; 3] {
    let mut payload = [register | COMMAND_WRITE, 0, 0];
    payload[1 + control_byte_index(register)] = data;
    payload
}

/// Extracts the 12-bit output value from a DAC register word.
pub const fn parse_value(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes([bytes[0] & 0x0F, bytes[1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOLATILE_REGISTERS: [Register; 6] = [
        Register::Dac0,
        Register::Dac1,
        Register::VoltageReference,
        Register::PowerDown,
        Register::Gain,
        Register::WiperLock,
    ];

    #[test]
    fn read_command_volatile() {
        let commands: Vec<u8> = VOLATILE_REGISTERS
            .iter()
            .map(|&r| read_command(r.into(), Bank::Volatile))
            .collect();
        assert_eq!(commands, vec![0x06, 0x0e, 0x46, 0x4e, 0x56, 0x5e]);
    }

    #[test]
    fn read_command_eeprom_sets_bit_seven() {
        for register in VOLATILE_REGISTERS {
            let index = u8::from(register);
            assert_eq!(
                read_command(index, Bank::Eeprom),
                0x80 | 0x06 | (index << 3)
            );
        }
        assert_eq!(read_command(Register::PowerDown.into(), Bank::Eeprom), 0xce);
    }

    #[test]
    fn eeprom_read_of_dac_matches_mirror_index() {
        assert_eq!(
            read_command(Register::Dac1.into(), Bank::Eeprom),
            read_command(Register::Dac1Eeprom.into(), Bank::Volatile)
        );
    }

    #[test]
    fn fast_write_payload_is_big_endian() {
        assert_eq!(fast_write_payload(0x01, 0xabcd), [0x08, 0xab, 0xcd]);
        assert_eq!(fast_write_payload(0x00, 0x0fff), [0x00, 0x0f, 0xff]);
        assert_eq!(fast_write_payload(0x00, 0xffff), [0x00, 0xff, 0xff]);
    }

    #[test]
    fn fast_write_payload_truncates_eeprom_indices() {
        assert_eq!(fast_write_payload(Register::Dac0Eeprom.into(), 0)[0], 0x80);
        assert_eq!(fast_write_payload(Register::Dac1Eeprom.into(), 0)[0], 0x88);
        assert_eq!(fast_write_payload(Register::VoltageReferenceEeprom.into(), 0)[0], 0xc0);
        assert_eq!(fast_write_payload(Register::PowerDownEeprom.into(), 0)[0], 0xc8);
        assert_eq!(fast_write_payload(Register::GainEeprom.into(), 0)[0], 0xd0);
    }

    #[test]
    fn addressed_write_places_gain_in_high_byte() {
        assert_eq!(
            addressed_write_payload(Register::Gain.into(), 0x03),
            [0x0a, 0x03, 0x00]
        );
    }

    #[test]
    fn addressed_write_places_other_registers_in_low_byte() {
        assert_eq!(
            addressed_write_payload(Register::PowerDown.into(), 0x0d),
            [0x09, 0x00, 0x0d]
        );
        assert_eq!(
            addressed_write_payload(Register::VoltageReference.into(), 0x05),
            [0x08, 0x00, 0x05]
        );
        assert_eq!(addressed_write_payload(UNLOCK_SALCK, 0), [0xd2, 0x00, 0x00]);
    }

    #[test]
    fn salck_commands() {
        assert_eq!(UNLOCK_SALCK, 0xd2);
        assert_eq!(LOCK_SALCK, 0xd2);
        assert_eq!(COMMAND_SALCK | SALCK_LOCK_BITS, 0xd4);
    }

    #[test]
    fn parse_value_masks_upper_nibble() {
        assert_eq!(parse_value([0xfa, 0xbc]), 0x0abc);
        assert_eq!(parse_value([0x0f, 0xff]), 0x0fff);
    }
}
