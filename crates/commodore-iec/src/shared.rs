//! Two drives on one GPIO bank.
//!
//! Each emulator owns its own [`IecBus`](crate::IecBus), but the pins are
//! physically shared. Exactly one bus samples the raw levels per tick (the
//! owner); the other reuses the owner's latched sample.

use std::hint;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, AtomicU16, AtomicU32, Ordering};

/// Busy-waiting mutual exclusion for the real-time cores.
///
/// Only held for a handful of instructions on session entry and exit.
#[derive(Debug, Default)]
pub struct SpinLock {
    locked: AtomicBool,
}

impl SpinLock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    pub fn lock(&self) -> SpinGuard<'_> {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while self.locked.load(Ordering::Relaxed) {
                hint::spin_loop();
            }
        }
        SpinGuard { lock: self }
    }

    #[cfg(test)]
    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

/// Releases the [`SpinLock`] when dropped.
#[derive(Debug)]
pub struct SpinGuard<'a> {
    lock: &'a SpinLock,
}

impl Drop for SpinGuard<'_> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

/// Arbitration state shared by every bus on the same GPIO bank.
#[derive(Debug)]
pub struct SharedBus {
    lock: SpinLock,
    /// -1 with no drive in real time, 0 with one, 1 with both.
    dual_drive: AtomicI32,
    /// Bit per device ID currently in real time.
    emulating: AtomicU16,
    /// Bit per device ID with a bus on this bank.
    attached: AtomicU16,
    primary: AtomicU8,
    levels: AtomicU32,
}

impl SharedBus {
    #[must_use]
    pub fn new(primary_device: u8) -> Self {
        Self {
            lock: SpinLock::new(),
            dual_drive: AtomicI32::new(-1),
            emulating: AtomicU16::new(0),
            attached: AtomicU16::new(0),
            primary: AtomicU8::new(primary_device),
            levels: AtomicU32::new(u32::MAX),
        }
    }

    /// Mark `device` as running real-time emulation until the returned
    /// session is dropped.
    #[must_use]
    pub fn enter_realtime(self: &Arc<Self>, device: u8) -> RealtimeSession {
        {
            let _guard = self.lock.lock();
            self.dual_drive.fetch_add(1, Ordering::AcqRel);
            self.emulating.fetch_or(device_bit(device), Ordering::AcqRel);
        }
        log::debug!("device {device} entered real time");
        RealtimeSession {
            shared: Arc::clone(self),
            device,
        }
    }

    fn leave_realtime(&self, device: u8) {
        {
            let _guard = self.lock.lock();
            self.dual_drive.fetch_sub(1, Ordering::AcqRel);
            self.emulating.fetch_and(!device_bit(device), Ordering::AcqRel);
        }
        log::debug!("device {device} left real time");
    }

    #[must_use]
    pub fn dual_drive(&self) -> i32 {
        self.dual_drive.load(Ordering::Acquire)
    }

    /// Both drives are in real time.
    #[cfg(test)]
    fn both_emulating(&self) -> bool {
        self.dual_drive() > 0
    }

    #[must_use]
    pub fn is_emulating(&self, device: u8) -> bool {
        self.emulating.load(Ordering::Acquire) & device_bit(device) != 0
    }

    #[must_use]
    pub fn primary(&self) -> u8 {
        self.primary.load(Ordering::Relaxed)
    }

    pub fn set_primary(&self, device: u8) {
        self.primary.store(device, Ordering::Relaxed);
    }

    /// Register a bus for `device` on this bank.
    pub fn attach(&self, device: u8) {
        self.attached.fetch_or(device_bit(device), Ordering::AcqRel);
    }

    pub fn detach(&self, device: u8) {
        self.attached.fetch_and(!device_bit(device), Ordering::AcqRel);
    }

    /// Whether `device` samples the pins this tick.
    ///
    /// A lone emulating drive owns the bus; otherwise the primary does. With
    /// no bus attached at the primary's ID, the lowest attached device
    /// stands in for it.
    #[must_use]
    pub fn is_owner(&self, device: u8) -> bool {
        let emulating = self.emulating.load(Ordering::Acquire);
        if emulating.count_ones() == 1 {
            emulating == device_bit(device)
        } else {
            device == self.acting_primary()
        }
    }

    fn acting_primary(&self) -> u8 {
        let primary = self.primary();
        let attached = self.attached.load(Ordering::Acquire);
        if attached == 0 || attached & device_bit(primary) != 0 {
            primary
        } else {
            attached.trailing_zeros() as u8
        }
    }

    /// Publish the owner's raw sample.
    pub fn latch_levels(&self, levels: u32) {
        self.levels.store(levels, Ordering::Release);
    }

    /// Last sample published by the owner.
    #[must_use]
    pub fn latched_levels(&self) -> u32 {
        self.levels.load(Ordering::Acquire)
    }
}

impl Default for SharedBus {
    fn default() -> Self {
        Self::new(8)
    }
}

fn device_bit(device: u8) -> u16 {
    1 << (device & 0x0F)
}

/// A drive's stay in real-time emulation.
#[derive(Debug)]
pub struct RealtimeSession {
    shared: Arc<SharedBus>,
    device: u8,
}

impl Drop for RealtimeSession {
    fn drop(&mut self) {
        self.shared.leave_realtime(self.device);
    }
}
