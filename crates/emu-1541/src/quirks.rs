/// Images whose loaders sample the bus so early in the cycle that outputs
/// must only change after the 1MHz boundary.
const DEFERRED_REFRESH_HASHES: [u32; 8] = [
    0x42C0_2586, // Maniac Mansion (Lucasfilm 1989, NTSC)
    0x1865_1422, // Aliens (Electric Dreams 1987)
    0x2A7F_4B77, // Zak McKracken boot
    0x9773_2C3E, // Maniac Mansion (Activision 1987)
    0x63F8_09D2, // 4x4 Offroad Racing (NTSC)
    0x778F_ECDA, // Zak McKracken (German)
    0x6AB9_2E00, // Zak McKracken (German)
    0x3ADB_56B7,
];

/// Whether the image needs its outputs refreshed at the start of the next
/// cycle instead of right after the CPU step.
#[must_use]
pub fn needs_deferred_refresh(hash: u32) -> bool {
    DEFERRED_REFRESH_HASHES.contains(&hash)
}
