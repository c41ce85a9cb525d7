//! Line state of one IEC bus instance.
//!
//! Sensed lines (`pi_*`) are true when the line is asserted (electrically
//! low). Driven flags (`*_set_to_out`) are true when this drive pulls the
//! line low.

use crate::gate::GateModel;
use crate::port::port_pins;

/// Sensed and driven state of the IEC lines for one drive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IecBusState {
    pub(crate) pi_atn: bool,
    pub(crate) pi_data: bool,
    pub(crate) pi_clock: bool,
    pub(crate) pi_srq: bool,
    pub(crate) pi_reset: bool,

    /// What the chip's port B is trying to output.
    pub(crate) via_atna: bool,
    pub(crate) via_data: bool,
    pub(crate) via_clock: bool,

    pub(crate) data_set_to_out: bool,
    pub(crate) clock_set_to_out: bool,
    pub(crate) atna_data_set_to_out: bool,
    pub(crate) srq_set_to_out: bool,

    pub(crate) output_led: bool,
    pub(crate) output_sound: bool,

    pub(crate) resetting: bool,
    pub(crate) gate: GateModel,
}

impl IecBusState {
    #[must_use]
    pub fn new(gate: GateModel) -> Self {
        Self {
            gate,
            ..Self::default()
        }
    }

    /// Port-output hook: called whenever the chip's port B output changes.
    ///
    /// `status` is the port B output byte, `direction` its data direction
    /// register. Updates the driven flags used by the next refresh.
    pub fn port_b_on_port_out(&mut self, status: u8, direction: u8) {
        self.via_atna = status & port_pins::ATNA_OUT != 0;
        self.via_data = status & port_pins::DATA_OUT != 0;
        self.via_clock = status & port_pins::CLOCK_OUT != 0;

        self.atna_data_set_to_out = self.gate.atna_pulls_data(self.via_atna, self.pi_atn);

        if self.gate.has_via() {
            // With PB1/PB3 as inputs the pull-ups win, and the board's
            // inverters then pull the line low.
            if direction & port_pins::DATA_OUT == 0 {
                self.via_data = true;
            }
            if direction & port_pins::CLOCK_OUT == 0 {
                self.via_clock = true;
            }
        }

        self.clock_set_to_out = self.via_clock;
        self.data_set_to_out = self.via_data;
    }

    /// Release everything and recompute the gate from the cleared inputs.
    pub fn reset_lines(&mut self) {
        self.via_atna = false;
        self.via_data = false;
        self.via_clock = false;

        self.data_set_to_out = false;
        self.clock_set_to_out = false;
        self.srq_set_to_out = false;

        self.pi_atn = false;
        self.pi_data = false;
        self.pi_clock = false;
        self.pi_srq = false;

        self.atna_data_set_to_out = self.gate.atna_pulls_data(self.via_atna, self.pi_atn);
        if self.atna_data_set_to_out {
            self.pi_data = true;
        }
    }

    /// Whether this drive currently pulls DATA low (directly or via the gate).
    #[must_use]
    pub fn drives_data(&self) -> bool {
        self.atna_data_set_to_out || self.data_set_to_out
    }

    #[must_use]
    pub fn atn(&self) -> bool {
        self.pi_atn
    }

    #[must_use]
    pub fn data(&self) -> bool {
        self.pi_data
    }

    #[must_use]
    pub fn clock(&self) -> bool {
        self.pi_clock
    }

    #[must_use]
    pub fn srq(&self) -> bool {
        self.pi_srq
    }

    #[must_use]
    pub fn data_set_to_out(&self) -> bool {
        self.data_set_to_out
    }

    #[must_use]
    pub fn clock_set_to_out(&self) -> bool {
        self.clock_set_to_out
    }

    #[must_use]
    pub fn atna_data_set_to_out(&self) -> bool {
        self.atna_data_set_to_out
    }

    #[must_use]
    pub fn srq_set_to_out(&self) -> bool {
        self.srq_set_to_out
    }

    #[must_use]
    pub fn via_atna(&self) -> bool {
        self.via_atna
    }

    #[must_use]
    pub fn output_led(&self) -> bool {
        self.output_led
    }

    pub fn set_output_led(&mut self, on: bool) {
        self.output_led = on;
    }

    #[must_use]
    pub fn output_sound(&self) -> bool {
        self.output_sound
    }

    pub fn set_output_sound(&mut self, on: bool) {
        self.output_sound = on;
    }

    /// RESET was asserted at the last sample.
    #[must_use]
    pub fn resetting(&self) -> bool {
        self.resetting
    }

    #[must_use]
    pub fn gate(&self) -> GateModel {
        self.gate
    }

    /// Change the attached chip's gate model and recompute the gate output.
    pub fn set_gate(&mut self, gate: GateModel) {
        self.gate = gate;
        self.atna_data_set_to_out = gate.atna_pulls_data(self.via_atna, self.pi_atn);
    }
}
