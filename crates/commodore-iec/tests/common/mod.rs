//! Fake GPIO bank for driving the bus from tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use commodore_iec::Gpio;

/// Electrical state of the pins, shared by every fake on the same bank.
#[derive(Debug, Default)]
pub struct Bank {
    /// Pins the host (or a button) holds low.
    pub host_low: u32,
    /// Pins switched to output (latched low) by a drive.
    pub outputs: u32,
    /// Output latch of the set/clear register.
    pub latch: u32,
    /// Release `host_low` bits in `release_mask` after this many reads.
    pub release_after: Option<(usize, u32)>,
    pub reads: usize,
    pub mode_writes: usize,
    pub level_writes: usize,
}

#[derive(Debug, Clone)]
pub struct FakeGpio {
    pub bank: Rc<RefCell<Bank>>,
    pub split_capable: bool,
}

impl FakeGpio {
    pub fn new() -> Self {
        Self {
            bank: Rc::new(RefCell::new(Bank::default())),
            split_capable: true,
        }
    }

    /// Another handle on the same bank.
    pub fn sharing(&self) -> Self {
        Self {
            bank: Rc::clone(&self.bank),
            split_capable: self.split_capable,
        }
    }

    pub fn pull_low(&self, pin: u8) {
        self.bank.borrow_mut().host_low |= 1 << pin;
    }

    pub fn release(&self, pin: u8) {
        self.bank.borrow_mut().host_low &= !(1 << pin);
    }

    pub fn is_output(&self, pin: u8) -> bool {
        self.bank.borrow().outputs & (1 << pin) != 0
    }

    pub fn latch_high(&self, pin: u8) -> bool {
        self.bank.borrow().latch & (1 << pin) != 0
    }

    pub fn reads(&self) -> usize {
        self.bank.borrow().reads
    }
}

impl Gpio for FakeGpio {
    fn read_levels(&mut self) -> u32 {
        let mut bank = self.bank.borrow_mut();
        bank.reads += 1;
        if let Some((remaining, mask)) = bank.release_after {
            if remaining == 0 {
                bank.host_low &= !mask;
                bank.release_after = None;
            } else {
                bank.release_after = Some((remaining - 1, mask));
            }
        }
        !(bank.host_low | bank.outputs)
    }

    fn set_modes(&mut self, inputs: u32, outputs: u32) {
        let mut bank = self.bank.borrow_mut();
        bank.mode_writes += 1;
        bank.outputs = (bank.outputs & !inputs) | outputs;
    }

    fn write_levels(&mut self, set: u32, clear: u32) {
        let mut bank = self.bank.borrow_mut();
        bank.level_writes += 1;
        bank.latch = (bank.latch & !clear) | set;
    }

    fn supports_split_lines(&self) -> bool {
        self.split_capable
    }
}
