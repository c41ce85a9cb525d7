//! Commodore IEC serial bus, as seen from a drive wired to GPIO pins.
//!
//! Three open-collector lines (ATN, CLK, DATA) plus SRQ and RESET. The
//! drive never drives a line high: it either lets go (pin is an input and
//! the pull-up wins) or pulls it low (pin is an output latched low). A
//! line the drive itself pulls low cannot be sensed through the same pin,
//! so its level is looped back in software.
//!
//! The 1541 board also has an XOR gate (UD3) between the VIA's ATNA output
//! and the sensed ATN line. When they disagree the gate pulls DATA low,
//! which is how the drive acknowledges ATN without firmware involvement.

mod bus;
mod buttons;
mod config;
mod gate;
mod gpio;
mod port;
mod rotary;
mod shared;
mod state;

pub use bus::IecBus;
pub use buttons::{
    BUTTON_BACK, BUTTON_COUNT, BUTTON_DOWN, BUTTON_ENTER, BUTTON_INSERT, BUTTON_UP, Buttons,
};
pub use config::{IecConfig, PinMap, RotaryPins};
pub use gate::GateModel;
pub use gpio::{Gpio, PinMasks};
pub use port::{IecPort, PortLatch, port_pins};
pub use rotary::{RotaryEncoder, RotaryEvent};
pub use shared::{RealtimeSession, SharedBus, SpinGuard, SpinLock};
pub use state::IecBusState;
