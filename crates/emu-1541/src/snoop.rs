//! Spotting `CD:_` on the command channel.
//!
//! The host backs out of an emulated image by sending `CD:_`. The drive
//! firmware receives the command byte by byte through the accumulator at a
//! few known addresses; watching A at those PCs is enough to recognise it
//! without decoding the protocol.

/// The back-out command as it appears in A.
const BACK_COMMAND: [u8; 5] = *b"CD:_?";

/// 1541 stock ROM command receive loop.
const CBM_1541: u16 = 0xEA2D;
/// JiffyDOS, C64 and drive both patched.
const JIFFY_BOTH: u16 = 0xFC07;
const JIFFY_BOTH_V6_00: u16 = 0xFC12;
/// JiffyDOS drive ROM with a stock C64.
const JIFFY_DRIVE_ONLY: u16 = 0xEA16;
/// ROM that reuses $EA16 for something else.
const ROM_WITHOUT_JIFFY_DRIVE_ONLY: u32 = 0x9EEF_0D97;

const CBM_1581: u16 = 0xAEB7;
const CBM_1581_JIFFY: u16 = 0xE281;

/// Countdown from recognising `CD:_` to leaving emulation, so the drive
/// can finish the handshake first.
pub const EXIT_DELAY_CYCLES: u32 = 40_000;

/// Which drive's addresses and signature length to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnoopTarget {
    Drive1541 { rom_hash: u32 },
    Drive1581,
}

impl SnoopTarget {
    fn is_snoop_pc(self, pc: u16) -> bool {
        match self {
            Self::Drive1541 { rom_hash } => {
                matches!(pc, CBM_1541 | JIFFY_BOTH | JIFFY_BOTH_V6_00)
                    || (pc == JIFFY_DRIVE_ONLY && rom_hash != ROM_WITHOUT_JIFFY_DRIVE_ONLY)
            }
            Self::Drive1581 => matches!(pc, CBM_1581 | CBM_1581_JIFFY),
        }
    }

    /// The 1581 never shows the trailing byte in A.
    fn signature_len(self) -> usize {
        match self {
            Self::Drive1541 { .. } => BACK_COMMAND.len(),
            Self::Drive1581 => BACK_COMMAND.len() - 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CdSnooper {
    target: SnoopTarget,
    index: usize,
    /// Receive loop address latched on first sight; 0 until then.
    snoop_pc: u16,
}

impl CdSnooper {
    #[must_use]
    pub fn new(target: SnoopTarget) -> Self {
        Self {
            target,
            index: 0,
            snoop_pc: 0,
        }
    }

    /// Feed the CPU state at an instruction boundary. Returns true once the
    /// whole command has been seen.
    pub fn on_sync(&mut self, pc: u16, a: u8) -> bool {
        if self.target.is_snoop_pc(pc) {
            self.snoop_pc = pc;
        }
        if self.snoop_pc == 0 || pc != self.snoop_pc {
            return false;
        }
        self.feed(a)
    }

    fn feed(&mut self, a: u8) -> bool {
        if a == BACK_COMMAND[self.index] {
            self.index += 1;
            if self.index == self.target.signature_len() {
                self.index = 0;
                return true;
            }
        } else {
            self.index = 0;
            self.snoop_pc = 0;
        }
        false
    }
}
