//! Raw GPIO access.

use crate::config::{IecConfig, PinMap};

/// The platform's GPIO bank.
///
/// Every call must be non-blocking and complete within a fraction of a
/// microsecond; they are made several times per emulated cycle.
///
/// Shared-line pins are expected to have their output latch preset low, so
/// switching a pin to output pulls the line low and switching it back to
/// input releases it.
pub trait Gpio {
    /// Read the level of all pins at once (bit n = GPIO n).
    fn read_levels(&mut self) -> u32;

    /// Switch the pins in `inputs` to input and the pins in `outputs` to
    /// output.
    fn set_modes(&mut self, inputs: u32, outputs: u32);

    /// Drive the pins in `set` high and the pins in `clear` low.
    fn write_levels(&mut self, set: u32, clear: u32);

    /// Whether this backend can drive separate output pins per line.
    fn supports_split_lines(&self) -> bool {
        true
    }
}

/// Pin masks resolved once from a [`PinMap`] and the line-splitting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMasks {
    pub in_atn: u32,
    pub in_data: u32,
    pub in_clock: u32,
    pub in_srq: u32,
    pub in_reset: u32,
    /// Direction-switched DATA pin (shared lines).
    pub data: u32,
    /// Direction-switched CLK pin (shared lines).
    pub clock: u32,
    /// Direction-switched SRQ pin (shared lines).
    pub srq: u32,
    pub out_data: u32,
    pub out_clock: u32,
    pub out_srq: u32,
    pub out_led: u32,
    pub out_sound: u32,
    pub buttons: [u32; 5],
    pub rotary_clk: u32,
    pub rotary_dt: u32,
    pub rotary_sw: u32,
}

const fn mask(pin: u8) -> u32 {
    1 << pin
}

impl PinMasks {
    #[must_use]
    pub fn new(config: &IecConfig) -> Self {
        let pins: &PinMap = &config.pins;
        let split = config.split_iec_lines;
        let pick = |shared: u8, input: u8| if split { mask(input) } else { mask(shared) };
        Self {
            in_atn: pick(pins.atn, pins.in_atn),
            in_data: pick(pins.data, pins.in_data),
            in_clock: pick(pins.clock, pins.in_clock),
            in_srq: pick(pins.srq, pins.in_srq),
            in_reset: pick(pins.reset, pins.in_reset),
            data: mask(pins.data),
            clock: mask(pins.clock),
            srq: mask(pins.srq),
            out_data: mask(pins.out_data),
            out_clock: mask(pins.out_clock),
            out_srq: mask(pins.out_srq),
            out_led: mask(pins.out_led),
            out_sound: mask(pins.out_sound),
            buttons: pins.buttons.map(mask),
            rotary_clk: mask(pins.rotary.clk),
            rotary_dt: mask(pins.rotary.dt),
            rotary_sw: mask(pins.rotary.sw),
        }
    }
}
