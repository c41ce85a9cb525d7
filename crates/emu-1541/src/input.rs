//! Emulation-mode actions from buttons, keys and the host.

use commodore_iec::{BUTTON_DOWN, BUTTON_ENTER, BUTTON_UP, Buttons};

use crate::caddy::MAX_DIRECT_SELECT;
use crate::host::KeyAction;

/// Pending actions, each consumed by the first query.
#[derive(Debug, Clone, Default)]
pub struct InputMappings {
    exit: bool,
    auto_load: bool,
    next_disk: bool,
    prev_disk: bool,
    /// Bit n: direct swap to caddy slot n.
    direct_swap: u16,
    /// Debounced level of Enter/Up/Down at the last check.
    held: [bool; 3],
}

impl InputMappings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Button 0 leaves emulation, 1 and 2 swap disks.
    ///
    /// Acts once per press, however often it is called while the button is
    /// held.
    pub fn check_buttons_emulation_mode(&mut self, buttons: &Buttons) {
        let down = [BUTTON_ENTER, BUTTON_UP, BUTTON_DOWN].map(|b| buttons.is_down(b));
        let went_down: [bool; 3] = std::array::from_fn(|i| down[i] && !self.held[i]);
        self.held = down;

        if went_down[0] {
            self.exit = true;
        } else if went_down[1] {
            self.next_disk = true;
        } else if went_down[2] {
            self.prev_disk = true;
        }
    }

    /// `images` is how many images the caddy holds; direct selection past
    /// the end or past slot 9 is dropped.
    pub fn apply_key(&mut self, key: KeyAction, images: usize) {
        match key {
            KeyAction::Exit => self.exit = true,
            KeyAction::AutoLoad => self.auto_load = true,
            KeyAction::NextDisk => self.next_disk = true,
            KeyAction::PrevDisk => self.prev_disk = true,
            KeyAction::SelectDisk(slot) => {
                let slot = usize::from(slot);
                if slot < images.min(MAX_DIRECT_SELECT) {
                    self.direct_swap |= 1 << slot;
                }
            }
        }
    }

    pub fn request_exit(&mut self) {
        self.exit = true;
    }

    pub fn request_auto_load(&mut self) {
        self.auto_load = true;
    }

    pub fn exit(&mut self) -> bool {
        std::mem::take(&mut self.exit)
    }

    pub fn auto_load(&mut self) -> bool {
        std::mem::take(&mut self.auto_load)
    }

    pub fn next_disk(&mut self) -> bool {
        std::mem::take(&mut self.next_disk)
    }

    pub fn prev_disk(&mut self) -> bool {
        std::mem::take(&mut self.prev_disk)
    }

    /// Requested slots as a bitmask, clearing all requests.
    pub fn take_direct_swaps(&mut self) -> u16 {
        std::mem::take(&mut self.direct_swap)
    }

    /// Drop pending actions. Buttons still held stay consumed.
    pub fn reset(&mut self) {
        *self = Self {
            held: self.held,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_consumed_once() {
        let mut input = InputMappings::new();
        input.apply_key(KeyAction::Exit, 1);
        assert!(input.exit());
        assert!(!input.exit());
    }

    #[test]
    fn direct_select_bounded_by_caddy() {
        let mut input = InputMappings::new();
        input.apply_key(KeyAction::SelectDisk(3), 3);
        assert_eq!(input.take_direct_swaps(), 0);
        input.apply_key(KeyAction::SelectDisk(2), 3);
        input.apply_key(KeyAction::SelectDisk(1), 3);
        assert_eq!(input.take_direct_swaps(), 0b110);
        assert_eq!(input.take_direct_swaps(), 0);
        input.apply_key(KeyAction::SelectDisk(10), 20);
        assert_eq!(input.take_direct_swaps(), 0);
    }

    #[test]
    fn buttons_map_to_actions() {
        let mut buttons = Buttons::new(1, 100);
        buttons.update(BUTTON_UP, true);
        let mut input = InputMappings::new();
        input.check_buttons_emulation_mode(&buttons);
        assert!(input.next_disk());
        assert!(!input.prev_disk());
        assert!(!input.exit());

        input.check_buttons_emulation_mode(&buttons);
        assert!(!input.next_disk(), "held button does not fire again");

        buttons.update(BUTTON_ENTER, true);
        input.check_buttons_emulation_mode(&buttons);
        assert!(input.exit());
    }
}
