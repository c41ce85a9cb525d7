//! ATN acknowledge gate.

/// How the drive's ATNA output combines with the sensed ATN line to decide
/// whether DATA is pulled low.
///
/// Chosen when a drive chip is attached to the bus: a 1541 session wires
/// the VIA through the UD3 XOR gate, a 1581 session (CIA) and the IEC
/// command fast path have no such gate and use a plain AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateModel {
    /// 1541: XOR of VIA ATNA and sensed ATN.
    XorWithVia,
    /// No VIA present: ATNA AND sensed ATN.
    #[default]
    AndWithoutVia,
}

impl GateModel {
    /// Whether the gate pulls DATA low for the given inputs.
    #[must_use]
    pub const fn atna_pulls_data(self, via_atna: bool, pi_atn: bool) -> bool {
        match self {
            Self::XorWithVia => via_atna != pi_atn,
            Self::AndWithoutVia => via_atna && pi_atn,
        }
    }

    /// A VIA is attached (1541 session).
    #[must_use]
    pub const fn has_via(self) -> bool {
        matches!(self, Self::XorWithVia)
    }
}
