//! Core traits and types for cycle-synchronised drive emulation.
//!
//! The drive CPU is stepped once per emulated clock cycle. Everything the
//! real-time loop counts is expressed in those cycles.

mod bus;
mod clock;
mod cpu;
mod observable;
mod ticks;

pub use bus::{Bus, RamBus};
pub use clock::MasterClock;
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use ticks::Ticks;
