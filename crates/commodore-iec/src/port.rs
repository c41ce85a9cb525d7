//! The drive chip's IEC-facing port.
//!
//! On a 1541 this is VIA1 port B ($1800); on a 1581 it is the CIA's port B.
//! The chip itself is an external component: the bus only needs to push
//! sensed levels into its input latch and to know which pins the firmware
//! has configured as outputs.

/// Port B pin assignments shared by the 1541 VIA and the 1581 CIA.
pub mod port_pins {
    /// PB0: DATA IN (1 = DATA line asserted).
    pub const DATA_IN: u8 = 0x01;
    /// PB1: DATA OUT (1 = pull DATA low).
    pub const DATA_OUT: u8 = 0x02;
    /// PB2: CLK IN (1 = CLK line asserted).
    pub const CLOCK_IN: u8 = 0x04;
    /// PB3: CLK OUT (1 = pull CLK low).
    pub const CLOCK_OUT: u8 = 0x08;
    /// PB4: ATN ACK, feeds the UD3 gate.
    pub const ATNA_OUT: u8 = 0x10;
    /// PB7: ATN IN (1 = ATN asserted).
    pub const ATN_IN: u8 = 0x80;
}

/// Input side of the drive chip's port B.
pub trait IecPort {
    /// Set or clear the given input pins.
    fn set_input(&mut self, pins: u8, asserted: bool);

    /// Data direction register (1 = output).
    fn direction(&self) -> u8;

    /// VIA CA1 edge input (wired to ATN on the 1541).
    fn input_ca1(&mut self, _level: bool) {}

    /// CIA FLAG input (wired to inverted ATN on the 1581).
    fn set_pin_flag(&mut self, _level: bool) {}
}

/// Plain port latch: an input register and a direction register.
///
/// Useful when wiring a chip model that keeps its own external-input byte
/// (like a 6522's `external_b`), and for driving the bus in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortLatch {
    /// Input latch as the chip sees it.
    pub inputs: u8,
    /// Data direction register.
    pub direction: u8,
    /// Last level presented on CA1.
    pub ca1: bool,
    /// Last level presented on FLAG.
    pub flag: bool,
}

impl PortLatch {
    #[must_use]
    pub const fn with_direction(direction: u8) -> Self {
        Self {
            inputs: 0,
            direction,
            ca1: false,
            flag: false,
        }
    }

    /// Whether all of the given input pins are set.
    #[must_use]
    pub const fn input(&self, pins: u8) -> bool {
        self.inputs & pins == pins
    }
}

impl IecPort for PortLatch {
    fn set_input(&mut self, pins: u8, asserted: bool) {
        if asserted {
            self.inputs |= pins;
        } else {
            self.inputs &= !pins;
        }
    }

    fn direction(&self) -> u8 {
        self.direction
    }

    fn input_ca1(&mut self, level: bool) {
        self.ca1 = level;
    }

    fn set_pin_flag(&mut self, level: bool) {
        self.flag = level;
    }
}
