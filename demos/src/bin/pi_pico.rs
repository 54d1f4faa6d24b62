#![no_std]
#![no_main]

use embedded_hal::digital::OutputPin;
use fugit::RateExtU32;
use hal::pac;
use mcp47feb::{Channel, GainMode, PowerDownMode, VoltageReferenceMode, MCP47FEB};
use panic_halt as _;
use rp2040_hal as hal;
use rp2040_hal::Clock;
use rp_pico::entry;
const XTAL_FREQ_HZ: u32 = 12_000_000u32;
const NEW_ADDRESS: u8 = 0x61;

#[entry]
fn main() -> ! {
    // Device-specific setup for Raspberry Pi Pico.
    let mut pac = pac::Peripherals::take().unwrap();
    let core = pac::CorePeripherals::take().unwrap();
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);
    let clocks = hal::clocks::init_clocks_and_plls(
        XTAL_FREQ_HZ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    let mut delay = cortex_m::delay::Delay::new(core.SYST, clocks.system_clock.freq().to_Hz());
    let sio = hal::Sio::new(pac.SIO);
    let pins = rp_pico::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let mut led_pin = pins.led.into_push_pull_output();
    // Drives the level shifter feeding the DAC's HVC pin.
    let mut hvc_pin = pins.gpio6.into_push_pull_output();

    let sda_pin = pins
        .gpio4
        .into_function::<hal::gpio::FunctionI2C>()
        .into_pull_type::<hal::gpio::PullUp>();
    let scl_pin = pins
        .gpio5
        .into_function::<hal::gpio::FunctionI2C>()
        .into_pull_type::<hal::gpio::PullUp>();

    let i2c = hal::I2C::i2c0(
        pac.I2C0,
        sda_pin,
        scl_pin,
        400.kHz(),
        &mut pac.RESETS,
        &clocks.peripheral_clock,
    );

    // MCP47FEB22 example usage.
    let mut dac = MCP47FEB::new(i2c, mcp47feb::DEFAULT_ADDRESS);
    dac.is_ready().unwrap();

    // SALCK commands are only accepted while HVC is high.
    hvc_pin.set_high().unwrap();
    dac.unlock_salck().unwrap();
    dac.lock_salck(NEW_ADDRESS).unwrap();
    hvc_pin.set_low().unwrap();

    dac.set_voltage_reference_mode(
        VoltageReferenceMode::InternalBandGap,
        VoltageReferenceMode::InternalBandGap,
    )
    .unwrap();
    dac.set_gain_mode(GainMode::TimesTwo, GainMode::TimesTwo)
        .unwrap();
    dac.set_power_down_mode(PowerDownMode::Normal, PowerDownMode::Normal)
        .unwrap();
    dac.analog_write(0x800, 0x800).unwrap();
    dac.write_eeprom().unwrap();
    // Wait out the EEPROM write cycle.
    delay.delay_ms(25);

    loop {
        led_pin.set_high().unwrap();
        dac.analog_write(0xfff, 0xfff).unwrap();
        delay.delay_ms(1000);

        led_pin.set_low().unwrap();
        dac.write_value(Channel::One, 0).unwrap();
        dac.analog_write(0, 0).unwrap();
        delay.delay_ms(1000);
    }
}
