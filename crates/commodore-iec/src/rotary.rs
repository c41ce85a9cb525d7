//! Quadrature rotary encoder with push switch.

/// Movement from the previous 2-bit `clk:dt` state to the next, indexed by
/// `(old << 2) | new`. Clockwise (11 -> 01 -> 00 -> 10) counts up. Invalid
/// jumps (both bits changed) count as zero.
const TRANSITIONS: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

/// Both pins high: the mechanical rest position.
const DETENT: u8 = 0b11;

/// Accumulated quarter-steps that make one detent click.
const STEPS_PER_CLICK: i8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotaryEvent {
    None,
    RotatePositive,
    RotateNegative,
    ButtonDown,
    ButtonUp,
}

#[derive(Debug, Clone)]
pub struct RotaryEncoder {
    state: u8,
    accum: i8,
    switch_down: bool,
    invert: bool,
}

impl RotaryEncoder {
    #[must_use]
    pub fn new(invert: bool) -> Self {
        Self {
            state: DETENT,
            accum: 0,
            switch_down: false,
            invert,
        }
    }

    /// Feed one sample of the three pins (raw levels, switch active low).
    pub fn update(&mut self, clk: bool, dt: bool, switch_level: bool) -> RotaryEvent {
        let switch_down = !switch_level;
        if switch_down != self.switch_down {
            self.switch_down = switch_down;
            return if switch_down {
                RotaryEvent::ButtonDown
            } else {
                RotaryEvent::ButtonUp
            };
        }

        let new = (u8::from(clk) << 1) | u8::from(dt);
        if new == self.state {
            return RotaryEvent::None;
        }
        let index = usize::from((self.state << 2) | new);
        self.state = new;
        self.accum = self.accum.saturating_add(TRANSITIONS[index]);

        if new != DETENT {
            return RotaryEvent::None;
        }
        let accum = std::mem::take(&mut self.accum);
        if accum.abs() < STEPS_PER_CLICK {
            return RotaryEvent::None;
        }
        if (accum > 0) == self.invert {
            RotaryEvent::RotateNegative
        } else {
            RotaryEvent::RotatePositive
        }
    }

    #[must_use]
    pub fn switch_down(&self) -> bool {
        self.switch_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(encoder: &mut RotaryEncoder, seq: &[(bool, bool)]) -> Vec<RotaryEvent> {
        seq.iter()
            .map(|&(clk, dt)| encoder.update(clk, dt, true))
            .filter(|e| *e != RotaryEvent::None)
            .collect()
    }

    // 11 -> 01 -> 00 -> 10 -> 11
    const CLOCKWISE: [(bool, bool); 4] =
        [(false, true), (false, false), (true, false), (true, true)];
    // 11 -> 10 -> 00 -> 01 -> 11
    const COUNTER: [(bool, bool); 4] =
        [(true, false), (false, false), (false, true), (true, true)];

    #[test]
    fn one_click_each_way() {
        let mut encoder = RotaryEncoder::new(false);
        assert_eq!(turn(&mut encoder, &CLOCKWISE), [RotaryEvent::RotatePositive]);
        assert_eq!(turn(&mut encoder, &COUNTER), [RotaryEvent::RotateNegative]);
    }

    #[test]
    fn invert_swaps_direction() {
        let mut encoder = RotaryEncoder::new(true);
        assert_eq!(turn(&mut encoder, &CLOCKWISE), [RotaryEvent::RotateNegative]);
        assert_eq!(turn(&mut encoder, &COUNTER), [RotaryEvent::RotatePositive]);
    }

    #[test]
    fn several_clicks_report_once_each() {
        let mut encoder = RotaryEncoder::new(false);
        let mut seq = CLOCKWISE.to_vec();
        seq.extend(CLOCKWISE);
        assert_eq!(
            turn(&mut encoder, &seq),
            [RotaryEvent::RotatePositive, RotaryEvent::RotatePositive]
        );
    }

    #[test]
    fn bounce_back_to_detent_is_ignored() {
        let mut encoder = RotaryEncoder::new(false);
        assert!(turn(&mut encoder, &[(false, true), (true, true)]).is_empty());
    }

    #[test]
    fn switch_edges() {
        let mut encoder = RotaryEncoder::new(false);
        assert_eq!(encoder.update(true, true, false), RotaryEvent::ButtonDown);
        assert!(encoder.switch_down());
        assert_eq!(encoder.update(true, true, false), RotaryEvent::None);
        assert_eq!(encoder.update(true, true, true), RotaryEvent::ButtonUp);
    }
}
