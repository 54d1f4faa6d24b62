use num_enum::{IntoPrimitive, TryFromPrimitive};

// Error type.

/// Error type for the crate, which can represent either an error from this driver or an inner error
/// that comes from the I2C type.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<InnerError> {
    /// A value was larger than the DAC supports.
    ///
    /// The MCP47FEB22 is a 12-bit DAC, so values that it writes must be smaller than 2^12.  Only
    /// [`MCP47FEB::write_value`](crate::MCP47FEB::write_value) checks this; the two-channel
    /// [`MCP47FEB::analog_write`](crate::MCP47FEB::analog_write) truncates instead.
    ValueOutOfBounds(u16),
    /// Error representing an error that came from the inner I2C driver.
    I2CError(InnerError),
}

impl<InnerError> From<InnerError> for Error<InnerError> {
    fn from(inner: InnerError) -> Self {
        Error::I2CError(inner)
    }
}

// Enums for configuration.

/// Output channel selection.
#[derive(IntoPrimitive, TryFromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Channel {
    Zero = 0,
    One = 1,
}

/// Configuration bits for which voltage reference a channel should use.
#[derive(IntoPrimitive, TryFromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum VoltageReferenceMode {
    /// Use VDD as the voltage reference, unbuffered.
    Vdd = 0,
    /// Use the internal 1.22V band gap reference.
    InternalBandGap = 1,
    /// Use the VREF pin, unbuffered.
    ExternalUnbuffered = 2,
    /// Use the VREF pin through the internal buffer.
    ExternalBuffered = 3,
}

/// Configuration bits for the powered-down state of a channel.
#[derive(IntoPrimitive, TryFromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerDownMode {
    /// Channel is not powered down.
    Normal = 0,
    /// Channel is powered down and output pin is connected to ground through a 1K resistor.
    PowerDownOneK = 1,
    /// Channel is powered down and output pin is connected to ground through a 100K resistor.
    PowerDownOneHundredK = 2,
    /// Channel is powered down and output pin is left open.
    PowerDownOpenCircuit = 3,
}

/// Configuration bit for the gain selection mode of a channel.
///
/// If the channel is using VDD as its reference, this bit is ignored and a gain of 1x is always
/// used.
#[derive(IntoPrimitive, TryFromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum GainMode {
    /// Gain is set to unity (1x).
    TimesOne = 0,
    /// Gain is set to 2x.
    TimesTwo = 1,
}

pub(crate) use sealed::PackedField;

mod sealed {
    /// A configuration field packed twice into one register, once per channel.
    ///
    /// Channel 0 occupies the low `WIDTH` bits and channel 1 the `WIDTH` bits above it.
    pub trait PackedField: Copy + Into<u8> {
        const WIDTH: u8;

        /// Decodes the field from bits that have already been masked to `WIDTH`.
        fn from_bits(bits: u8) -> Self;
    }
}

impl PackedField for PowerDownMode {
    const WIDTH: u8 = 2;

    fn from_bits(bits: u8) -> Self {
        match bits {
            0 => PowerDownMode::Normal,
            1 => PowerDownMode::PowerDownOneK,
            2 => PowerDownMode::PowerDownOneHundredK,
            _ => PowerDownMode::PowerDownOpenCircuit,
        }
    }
}

impl PackedField for VoltageReferenceMode {
    const WIDTH: u8 = 2;

    fn from_bits(bits: u8) -> Self {
        match bits {
            0 => VoltageReferenceMode::Vdd,
            1 => VoltageReferenceMode::InternalBandGap,
            2 => VoltageReferenceMode::ExternalUnbuffered,
            _ => VoltageReferenceMode::ExternalBuffered,
        }
    }
}

impl PackedField for GainMode {
    const WIDTH: u8 = 1;

    fn from_bits(bits: u8) -> Self {
        match bits {
            0 => GainMode::TimesOne,
            _ => GainMode::TimesTwo,
        }
    }
}

// Container structs.

/// The values of one setting for both channels, as stored together in a single register.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelPair<T> {
    /// Value for channel 0.
    pub zero: T,
    /// Value for channel 1.
    pub one: T,
}

impl<T: Copy> ChannelPair<T> {
    pub const fn new(zero: T, one: T) -> ChannelPair<T> {
        ChannelPair { zero, one }
    }

    /// Returns the value for `channel`.
    pub fn get(&self, channel: Channel) -> T {
        match channel {
            Channel::Zero => self.zero,
            Channel::One => self.one,
        }
    }
}

impl<T: PackedField> ChannelPair<T> {
    pub(crate) fn from_bits(bits: u8) -> ChannelPair<T> {
        let mask = (1 << T::WIDTH) - 1;
        ChannelPair {
            zero: T::from_bits(bits & mask),
            one: T::from_bits((bits >> T::WIDTH) & mask),
        }
    }

    pub(crate) fn bits(&self) -> u8 {
        let zero: u8 = self.zero.into();
        let one: u8 = self.one.into();
        zero | one << T::WIDTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_down_pair_bits() {
        let pair = ChannelPair::new(
            PowerDownMode::PowerDownOneK,
            PowerDownMode::PowerDownOpenCircuit,
        );
        assert_eq!(pair.bits(), 0b1101);
        assert_eq!(ChannelPair::<PowerDownMode>::from_bits(0b1101), pair);
    }

    #[test]
    fn gain_pair_bits() {
        let pair = ChannelPair::new(GainMode::TimesOne, GainMode::TimesTwo);
        assert_eq!(pair.bits(), 0b10);
        assert_eq!(ChannelPair::<GainMode>::from_bits(0b10), pair);
    }

    #[test]
    fn from_bits_ignores_upper_bits() {
        assert_eq!(
            ChannelPair::<VoltageReferenceMode>::from_bits(0b1111_0110),
            ChannelPair::new(
                VoltageReferenceMode::ExternalUnbuffered,
                VoltageReferenceMode::InternalBandGap
            )
        );
        assert_eq!(
            ChannelPair::<GainMode>::from_bits(0b1111_1101),
            ChannelPair::new(GainMode::TimesTwo, GainMode::TimesOne)
        );
    }

    #[test]
    fn get_selects_channel() {
        let pair = ChannelPair::new(1u16, 2u16);
        assert_eq!(pair.get(Channel::Zero), 1);
        assert_eq!(pair.get(Channel::One), 2);
    }
}
