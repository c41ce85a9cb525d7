//! Debounced push buttons.
//!
//! Buttons share the GPIO bank with the IEC lines, so they are sampled from
//! the same level word the bus read just produced. A button reads pressed
//! when its pin is low.

pub const BUTTON_ENTER: usize = 0;
pub const BUTTON_UP: usize = 1;
pub const BUTTON_DOWN: usize = 2;
pub const BUTTON_BACK: usize = 3;
pub const BUTTON_INSERT: usize = 4;
pub const BUTTON_COUNT: usize = 5;

/// Largest divisor applied to the repeat interval; after this many repeats
/// the interval stays fixed.
const MAX_REPEAT_SPEEDUP: u32 = 8;

#[derive(Debug, Clone, Copy, Default)]
struct Button {
    pressed: bool,
    pressed_prev: bool,
    valid_count: u32,
    repeat_threshold: u32,
    repeat: u32,
    repeat_prev: u32,
}

/// Debounce and auto-repeat state for all buttons.
#[derive(Debug, Clone)]
pub struct Buttons {
    buttons: [Button; BUTTON_COUNT],
    debounce_threshold: u32,
    repeat_threshold: u32,
}

impl Buttons {
    #[must_use]
    pub fn new(debounce_threshold: u32, repeat_threshold: u32) -> Self {
        let debounce_threshold = debounce_threshold.max(1);
        let button = Button {
            repeat_threshold,
            ..Button::default()
        };
        Self {
            buttons: [button; BUTTON_COUNT],
            debounce_threshold,
            repeat_threshold,
        }
    }

    /// Feed one raw sample for a button.
    ///
    /// The button becomes pressed on exactly the `debounce_threshold`-th
    /// consecutive pressed sample. Any released sample starts over.
    pub fn update(&mut self, index: usize, raw_pressed: bool) {
        let debounce = self.debounce_threshold;
        let repeat_interval = self.repeat_threshold;
        let Some(button) = self.buttons.get_mut(index) else {
            return;
        };

        button.pressed_prev = button.pressed;
        button.repeat_prev = button.repeat;

        if raw_pressed {
            button.valid_count = button.valid_count.saturating_add(1);
            if button.valid_count == debounce {
                button.pressed = true;
                button.repeat_threshold = debounce.saturating_add(repeat_interval);
                button.repeat += 1;
            } else if button.valid_count == button.repeat_threshold {
                button.repeat += 1;
                let speedup = button.repeat.min(MAX_REPEAT_SPEEDUP);
                button.repeat_threshold = button
                    .repeat_threshold
                    .saturating_add((repeat_interval / speedup).max(1));
            }
        } else {
            button.pressed = false;
            button.valid_count = 0;
            button.repeat_threshold = repeat_interval;
            button.repeat = 0;
            button.repeat_prev = 0;
        }
    }

    /// Force a button's state (used by the rotary encoder).
    pub fn set_state(&mut self, index: usize, pressed: bool) {
        if let Some(button) = self.buttons.get_mut(index) {
            button.pressed_prev = button.pressed;
            button.pressed = pressed;
        }
    }

    /// Debounced level.
    #[must_use]
    pub fn is_down(&self, index: usize) -> bool {
        self.buttons.get(index).is_some_and(|b| b.pressed)
    }

    /// Became pressed on the last update.
    #[must_use]
    pub fn pressed(&self, index: usize) -> bool {
        self.buttons
            .get(index)
            .is_some_and(|b| b.pressed && !b.pressed_prev)
    }

    /// Fired an auto-repeat on the last update.
    #[must_use]
    pub fn repeating(&self, index: usize) -> bool {
        self.buttons
            .get(index)
            .is_some_and(|b| b.repeat != b.repeat_prev && b.repeat > 1)
    }

    /// Whether any button is still held.
    #[cfg(test)]
    fn any_down(&self) -> bool {
        self.buttons.iter().any(|b| b.pressed)
    }
}
