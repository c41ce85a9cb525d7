//! IEC bus as driven from GPIO.
//!
//! Sensing: a line is asserted when its input pin reads low (or high with
//! `invert_iec_inputs`). A line this drive pulls low is reported asserted
//! without looking at the pin.
//!
//! Driving, shared lines: each line has one pin whose output latch is low;
//! switching it to output pulls the line low, back to input releases it.
//! Driving, split lines: separate output pins feed transistors, so the pin
//! is set high to assert (or low, without `invert_iec_outputs`).

use std::sync::Arc;

use emu_core::{Observable, Value};

use crate::buttons::{
    BUTTON_BACK, BUTTON_COUNT, BUTTON_DOWN, BUTTON_ENTER, BUTTON_INSERT, BUTTON_UP, Buttons,
};
use crate::config::IecConfig;
use crate::gate::GateModel;
use crate::gpio::{Gpio, PinMasks};
use crate::port::{IecPort, port_pins};
use crate::rotary::{RotaryEncoder, RotaryEvent};
use crate::shared::SharedBus;
use crate::state::IecBusState;

/// One drive's view of the IEC bus.
pub struct IecBus<G: Gpio> {
    state: IecBusState,
    gpio: G,
    config: IecConfig,
    masks: PinMasks,
    /// Raw levels from the last sample.
    levels: u32,
    device_id: u8,
    shared: Arc<SharedBus>,
    buttons: Buttons,
    rotary: Option<RotaryEncoder>,
    emulation_button_index: usize,
    split_warned: bool,
}

impl<G: Gpio> IecBus<G> {
    pub fn new(gpio: G, config: &IecConfig, device_id: u8, shared: Arc<SharedBus>) -> Self {
        let rotary = config
            .rotary_encoder_enable
            .then(|| RotaryEncoder::new(config.rotary_encoder_invert));
        shared.attach(device_id);
        Self {
            state: IecBusState::new(GateModel::AndWithoutVia),
            gpio,
            config: config.clone(),
            masks: PinMasks::new(config),
            levels: u32::MAX,
            device_id,
            shared,
            buttons: Buttons::new(
                config.button_debounce_threshold,
                config.button_repeat_threshold,
            ),
            rotary,
            emulation_button_index: 0,
            split_warned: false,
        }
    }

    fn asserted(&self, mask: u32) -> bool {
        let when = if self.config.invert_iec_inputs { mask } else { 0 };
        self.levels & mask == when
    }

    /// Take a fresh sample if this bus owns the pins, otherwise reuse the
    /// owner's. Returns whether the pins were actually read.
    fn sample(&mut self) -> bool {
        if self.shared.is_owner(self.device_id) {
            self.levels = self.gpio.read_levels();
            self.shared.latch_levels(self.levels);
            true
        } else {
            self.levels = self.shared.latched_levels();
            false
        }
    }

    fn sense_reset(&mut self) {
        self.state.pi_reset = self.asserted(self.masks.in_reset);
        self.state.resetting = !self.config.ignore_reset && self.state.pi_reset;
    }

    /// Poll used while the menu (or the command fast path) owns the drive.
    ///
    /// Returns false, leaving everything untouched, when another drive owns
    /// the pins.
    pub fn read_browse_mode(&mut self) -> bool {
        if !self.sample() {
            return false;
        }

        self.read_user_input();

        self.state.pi_atn = self.asserted(self.masks.in_atn);

        self.state.pi_data = if self.state.drives_data() {
            true
        } else {
            self.asserted(self.masks.in_data)
        };

        self.state.pi_clock = if self.state.clock_set_to_out {
            true
        } else {
            self.asserted(self.masks.in_clock)
        };

        self.sense_reset();
        true
    }

    /// Per-cycle poll while a 1541 image runs.
    pub fn read_emulation_mode_1541<P: IecPort + ?Sized>(&mut self, port: &mut P) {
        self.sample();

        let atna_is_output = port.direction() & port_pins::ATNA_OUT != 0;

        let atn = self.asserted(self.masks.in_atn);
        if atn != self.state.pi_atn {
            self.state.pi_atn = atn;
            if atna_is_output {
                self.state.atna_data_set_to_out =
                    self.state.gate.atna_pulls_data(self.state.via_atna, atn);
            }
            // Inverted, then wired to PB7 and CA1.
            port.set_input(port_pins::ATN_IN, atn);
            port.input_ca1(atn);
        }

        // Maniac Mansion switches PB4 to input.
        if !atna_is_output {
            self.state.atna_data_set_to_out = false;
        }

        if self.state.drives_data() {
            self.state.pi_data = true;
            port.set_input(port_pins::DATA_IN, true);
        } else {
            let data = self.asserted(self.masks.in_data);
            self.state.pi_data = data;
            port.set_input(port_pins::DATA_IN, data);
        }

        if self.state.clock_set_to_out {
            self.state.pi_clock = true;
            port.set_input(port_pins::CLOCK_IN, true);
        } else {
            let clock = self.asserted(self.masks.in_clock);
            self.state.pi_clock = clock;
            port.set_input(port_pins::CLOCK_IN, clock);
        }

        self.sense_reset();
    }

    /// Per-tick poll while a 1581 image runs.
    ///
    /// Same as the 1541 poll, except ATN goes to the CIA's FLAG input, DATA
    /// and CLK are only forwarded on change, and SRQ is sensed too.
    pub fn read_emulation_mode_1581<P: IecPort + ?Sized>(&mut self, port: &mut P) {
        self.sample();

        let atna_is_output = port.direction() & port_pins::ATNA_OUT != 0;

        let atn = self.asserted(self.masks.in_atn);
        if atn != self.state.pi_atn {
            self.state.pi_atn = atn;
            if atna_is_output {
                self.state.atna_data_set_to_out =
                    self.state.gate.atna_pulls_data(self.state.via_atna, atn);
            }
            port.set_input(port_pins::ATN_IN, atn);
            port.set_pin_flag(!atn);
        }

        if !atna_is_output {
            self.state.atna_data_set_to_out = false;
        }

        if self.state.drives_data() {
            self.state.pi_data = true;
            port.set_input(port_pins::DATA_IN, true);
        } else {
            let data = self.asserted(self.masks.in_data);
            if data != self.state.pi_data {
                self.state.pi_data = data;
                port.set_input(port_pins::DATA_IN, data);
            }
        }

        if self.state.clock_set_to_out {
            self.state.pi_clock = true;
            port.set_input(port_pins::CLOCK_IN, true);
        } else {
            let clock = self.asserted(self.masks.in_clock);
            if clock != self.state.pi_clock {
                self.state.pi_clock = clock;
                port.set_input(port_pins::CLOCK_IN, clock);
            }
        }

        self.state.pi_srq = self.state.srq_set_to_out || self.asserted(self.masks.in_srq);

        self.sense_reset();
    }

    fn split_lines_unsupported(&mut self) -> bool {
        if !self.config.split_iec_lines || self.gpio.supports_split_lines() {
            return false;
        }
        if !self.split_warned {
            self.split_warned = true;
            log::warn!("split IEC lines are not supported by this GPIO backend");
        }
        true
    }

    fn refresh_outs(&mut self, with_srq: bool) {
        if self.split_lines_unsupported() {
            return;
        }

        let drives_data = self.state.drives_data();
        let mut set = 0;
        let mut clear = 0;

        if self.config.split_iec_lines {
            let mut line = |pin: u32, on: bool| {
                if on {
                    set |= pin;
                } else {
                    clear |= pin;
                }
            };
            line(self.masks.out_data, drives_data);
            line(self.masks.out_clock, self.state.clock_set_to_out);
            if with_srq {
                line(self.masks.out_srq, self.state.srq_set_to_out);
            }
            if !self.config.invert_iec_outputs {
                std::mem::swap(&mut set, &mut clear);
            }
        } else {
            let mut inputs = 0;
            let mut outputs = 0;
            let mut line = |pin: u32, on: bool| {
                if on {
                    outputs |= pin;
                } else {
                    inputs |= pin;
                }
            };
            line(self.masks.data, drives_data);
            line(self.masks.clock, self.state.clock_set_to_out);
            if with_srq {
                line(self.masks.srq, self.state.srq_set_to_out);
            }
            self.gpio.set_modes(inputs, outputs);
        }

        for (pin, on) in [
            (self.masks.out_led, self.state.output_led),
            (self.masks.out_sound, self.state.output_sound),
        ] {
            if on {
                set |= pin;
            } else {
                clear |= pin;
            }
        }
        self.gpio.write_levels(set, clear);
    }

    /// Push DATA, CLK, LED and sound to the pins.
    pub fn refresh_outs_1541(&mut self) {
        self.refresh_outs(false);
    }

    /// Push DATA, CLK, SRQ, LED and sound to the pins.
    pub fn refresh_outs_1581(&mut self) {
        self.refresh_outs(true);
    }

    pub fn refresh_out_led(&mut self) {
        let pin = self.masks.out_led;
        if self.state.output_led {
            self.gpio.write_levels(pin, 0);
        } else {
            self.gpio.write_levels(0, pin);
        }
    }

    pub fn refresh_out_sound(&mut self) {
        let pin = self.masks.out_sound;
        if self.state.output_sound {
            self.gpio.write_levels(pin, 0);
        } else {
            self.gpio.write_levels(0, pin);
        }
    }

    /// Release every line. Without a VIA the released state goes out at
    /// once; with one, the next refresh pushes it.
    pub fn reset(&mut self) {
        self.state.reset_lines();
        if !self.state.gate.has_via() {
            self.refresh_outs_1581();
        }
    }

    /// Stop pulling SRQ low.
    pub fn let_srq_be_pulled_high(&mut self) {
        self.state.srq_set_to_out = false;
        self.refresh_outs_1581();
    }

    /// Block until the host stops asserting RESET.
    ///
    /// Spins on the pins; returns immediately with `ignore_reset`.
    pub fn wait_until_reset_released(&mut self) {
        if self.config.ignore_reset {
            return;
        }
        loop {
            self.levels = self.gpio.read_levels();
            if !self.asserted(self.masks.in_reset) {
                break;
            }
            std::hint::spin_loop();
        }
        self.state.pi_reset = false;
        self.state.resetting = false;
    }

    /// RESET as of the last sample.
    #[must_use]
    pub fn is_reset(&self) -> bool {
        self.state.resetting
    }

    fn button_raw(&self, index: usize) -> bool {
        self.levels & self.masks.buttons[index] == 0
    }

    /// Debounce every button (and the rotary encoder) from the last sample.
    pub fn read_user_input(&mut self) {
        if let Some(rotary) = self.rotary.as_mut() {
            let clk = self.levels & self.masks.rotary_clk != 0;
            let dt = self.levels & self.masks.rotary_dt != 0;
            let sw = self.levels & self.masks.rotary_sw != 0;
            match rotary.update(clk, dt, sw) {
                RotaryEvent::ButtonDown => self.buttons.set_state(BUTTON_ENTER, true),
                RotaryEvent::RotateNegative => self.buttons.set_state(BUTTON_UP, true),
                RotaryEvent::RotatePositive => self.buttons.set_state(BUTTON_DOWN, true),
                RotaryEvent::None | RotaryEvent::ButtonUp => {
                    self.buttons.set_state(BUTTON_ENTER, false);
                    self.buttons.set_state(BUTTON_UP, false);
                    self.buttons.set_state(BUTTON_DOWN, false);
                }
            }
            for index in [BUTTON_BACK, BUTTON_INSERT] {
                let raw = self.button_raw(index);
                self.buttons.update(index, raw);
            }
        } else {
            for index in 0..BUTTON_COUNT {
                let raw = self.button_raw(index);
                self.buttons.update(index, raw);
            }
        }
    }

    /// Debounce a single button per call, cycling through all of them.
    ///
    /// Used from the per-cycle loop where the full scan would cost too much.
    pub fn read_user_input_emulation(&mut self) {
        let index = self.emulation_button_index;
        let raw = self.button_raw(index);
        self.buttons.update(index, raw);
        self.emulation_button_index = (index + 1) % BUTTON_COUNT;
    }

    #[must_use]
    pub fn buttons(&self) -> &Buttons {
        &self.buttons
    }

    #[must_use]
    pub fn state(&self) -> &IecBusState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut IecBusState {
        &mut self.state
    }

    /// Attach a drive chip: picks how ATNA gates DATA.
    pub fn set_gate(&mut self, gate: GateModel) {
        self.state.set_gate(gate);
    }

    #[must_use]
    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    pub fn gpio_mut(&mut self) -> &mut G {
        &mut self.gpio
    }

    #[must_use]
    pub fn config(&self) -> &IecConfig {
        &self.config
    }

    #[must_use]
    pub fn shared(&self) -> &Arc<SharedBus> {
        &self.shared
    }

    #[must_use]
    pub fn device_id(&self) -> u8 {
        self.device_id
    }

    /// Change the bus address. A primary drive stays primary.
    pub fn set_device_id(&mut self, device_id: u8) {
        if self.shared.primary() == self.device_id {
            self.shared.set_primary(device_id);
        }
        self.shared.detach(self.device_id);
        self.shared.attach(device_id);
        self.device_id = device_id;
    }

    /// Raw levels from the last sample.
    #[must_use]
    pub fn levels(&self) -> u32 {
        self.levels
    }
}

impl<G: Gpio> Drop for IecBus<G> {
    fn drop(&mut self) {
        self.shared.detach(self.device_id);
    }
}

impl<G: Gpio> Observable for IecBus<G> {
    fn query(&self, path: &str) -> Option<Value> {
        let s = &self.state;
        match path {
            "iec.atn" => Some(s.pi_atn.into()),
            "iec.data" => Some(s.pi_data.into()),
            "iec.clock" => Some(s.pi_clock.into()),
            "iec.srq" => Some(s.pi_srq.into()),
            "iec.reset" => Some(s.resetting.into()),
            "iec.data_out" => Some(s.data_set_to_out.into()),
            "iec.clock_out" => Some(s.clock_set_to_out.into()),
            "iec.atna_data_out" => Some(s.atna_data_set_to_out.into()),
            "iec.srq_out" => Some(s.srq_set_to_out.into()),
            "iec.led" => Some(s.output_led.into()),
            "iec.levels" => Some(self.levels.into()),
            "iec.device" => Some(self.device_id.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "iec.atn",
            "iec.data",
            "iec.clock",
            "iec.srq",
            "iec.reset",
            "iec.data_out",
            "iec.clock_out",
            "iec.atna_data_out",
            "iec.srq_out",
            "iec.led",
            "iec.levels",
            "iec.device",
        ]
    }
}
