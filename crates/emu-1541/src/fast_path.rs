//! The IEC command fast path.
//!
//! Between emulation sessions the drive answers the host itself: directory
//! listings, `CD`, file loads from the SD card. That protocol engine is an
//! external component; the emulator only reacts to what it reports.

use commodore_iec::{Gpio, IecBus};

use crate::image::FileInfo;

/// Outcome of one fast-path poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateAction {
    None,
    /// Host reset the bus.
    Reset,
    /// Host picked an image (or an image list) to mount.
    ImageSelected(FileInfo),
    DirPushed,
    PopDir,
    PopToRoot,
    Refresh,
    DeviceIdChanged(u8),
    DeviceSwitched,
}

pub trait CommandFastPath<G: Gpio> {
    /// Start serving after a reset or a finished session.
    fn begin(&mut self, bus: &mut IecBus<G>);

    /// Service the bus once.
    fn update(&mut self, bus: &mut IecBus<G>) -> UpdateAction;

    /// Drop any half-finished transfer.
    fn reset(&mut self);

    /// The image selected last could not be mounted.
    fn mount_failed(&mut self);

    fn device_id(&self) -> u8;

    fn set_device_id(&mut self, device_id: u8);
}
