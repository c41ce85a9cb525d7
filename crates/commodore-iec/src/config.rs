//! Bus wiring and electrical options.

use serde::{Deserialize, Serialize};

/// Debounced samples before a button counts as pressed.
pub const DEFAULT_DEBOUNCE_THRESHOLD: u32 = 20_000;
/// Samples before a held button starts repeating.
pub const DEFAULT_REPEAT_THRESHOLD: u32 = 460_000;

/// Electrical options of the IEC interface board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IecConfig {
    /// Separate input and output pins per line (needs external
    /// transistors). Otherwise a single pin per line toggles direction.
    pub split_iec_lines: bool,
    /// Input pins read high when the line is asserted.
    pub invert_iec_inputs: bool,
    /// Output pins drive high to assert a line (split lines only).
    pub invert_iec_outputs: bool,
    /// Never sense RESET.
    pub ignore_reset: bool,
    /// Use a rotary encoder instead of the Enter/Up/Down buttons.
    pub rotary_encoder_enable: bool,
    /// Swap the encoder's rotation direction.
    pub rotary_encoder_invert: bool,
    pub button_debounce_threshold: u32,
    pub button_repeat_threshold: u32,
    pub pins: PinMap,
}

impl Default for IecConfig {
    fn default() -> Self {
        Self {
            split_iec_lines: false,
            invert_iec_inputs: false,
            invert_iec_outputs: true,
            ignore_reset: false,
            rotary_encoder_enable: false,
            rotary_encoder_invert: false,
            button_debounce_threshold: DEFAULT_DEBOUNCE_THRESHOLD,
            button_repeat_threshold: DEFAULT_REPEAT_THRESHOLD,
            pins: PinMap::default(),
        }
    }
}

/// GPIO numbers of every signal on the interface board.
///
/// Defaults are the Raspberry Pi header layout: the shared-line pins double
/// as outputs in split mode, so `data`/`out_data` and friends coincide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinMap {
    pub atn: u8,
    pub data: u8,
    pub clock: u8,
    pub srq: u8,
    pub reset: u8,

    pub in_atn: u8,
    pub in_data: u8,
    pub in_clock: u8,
    pub in_srq: u8,
    pub in_reset: u8,
    pub out_atn: u8,
    pub out_data: u8,
    pub out_clock: u8,
    pub out_srq: u8,

    pub out_led: u8,
    pub out_sound: u8,
    /// Enter, Up, Down, Back, Insert.
    pub buttons: [u8; 5],
    pub rotary: RotaryPins,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            atn: 2,
            data: 18,
            clock: 17,
            srq: 19,
            reset: 3,
            in_atn: 24,
            in_data: 25,
            in_clock: 26,
            in_srq: 21,
            in_reset: 20,
            out_atn: 12,
            out_data: 18,
            out_clock: 17,
            out_srq: 19,
            out_led: 16,
            out_sound: 13,
            buttons: [27, 22, 23, 4, 5],
            rotary: RotaryPins::default(),
        }
    }
}

/// Rotary encoder wiring. Reuses the Up/Down/Enter button pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotaryPins {
    pub clk: u8,
    pub dt: u8,
    pub sw: u8,
}

impl Default for RotaryPins {
    fn default() -> Self {
        Self {
            clk: 22,
            dt: 23,
            sw: 27,
        }
    }
}
