//! Memory and I/O bus interface.

/// Memory and I/O bus interface.
///
/// A CPU core never owns its memory map. It is handed a bus on every step,
/// and the bus decodes the address and routes the access to RAM, ROM or a
/// port chip. This replaces "register a read callback and a write callback"
/// with an ordinary borrow.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}

/// Flat 64KB RAM bus, handy for CPU cores under test.
pub struct RamBus {
    memory: Box<[u8; 0x10000]>,
}

impl RamBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
        }
    }

    /// Copy `data` into memory starting at `address` (wrapping at $FFFF).
    pub fn load(&mut self, address: u16, data: &[u8]) {
        for (offset, byte) in data.iter().enumerate() {
            self.memory[usize::from(address.wrapping_add(offset as u16))] = *byte;
        }
    }
}

impl Default for RamBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for RamBus {
    fn read(&mut self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }
}
