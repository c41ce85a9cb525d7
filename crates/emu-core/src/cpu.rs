//! CPU core trait.

use crate::Bus;

/// A drive CPU core.
///
/// The interpreter itself lives outside this workspace. The real-time loop
/// only needs to advance it, to know when it sits on an instruction
/// boundary, and to peek at PC and A for command snooping.
pub trait Cpu {
    /// Advance the CPU by one clock cycle.
    ///
    /// The bus is passed in, not owned, so the drive model can route port
    /// writes to the IEC bus state while the CPU runs.
    fn step<B: Bus>(&mut self, bus: &mut B);

    /// True when the next step fetches a new opcode.
    fn sync(&self) -> bool;

    /// Current program counter.
    fn pc(&self) -> u16;

    /// Current accumulator.
    fn a(&self) -> u8;

    /// Reset the CPU to its power-on state.
    fn reset(&mut self);
}
