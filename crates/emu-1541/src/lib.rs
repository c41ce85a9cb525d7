//! Commodore 1541/1581 drive emulation for a real C64 on the other end of
//! the cable.
//!
//! An [`Emulator`] is one drive. It sits in command mode (serving the
//! host's directory browsing through a [`CommandFastPath`]) until an image
//! is selected, then runs the drive's own firmware cycle by cycle against
//! the live IEC lines until the host resets, backs out with `CD:_`, or the
//! user leaves.
//!
//! The 6502, the VIA/CIA chips, the GCR/MFM disk mechanics and the image
//! parsers are supplied by the caller through [`DriveModel`] and
//! [`ImageLoader`]; timing and LEDs through [`Platform`].

mod caddy;
mod config;
mod drive;
mod emulator;
mod error;
mod fast_path;
mod host;
mod image;
mod input;
mod platform;
mod quirks;
mod snoop;

pub use caddy::{DiskCaddy, MAX_DIRECT_SELECT};
pub use config::{EmulatorConfig, SoundMode};
pub use drive::{CpuDrive, DriveHardware, DriveModel, WiredBus};
pub use emulator::{DriveParts, EmulatingMode, Emulator, EmulatorStats, ExitType};
pub use error::{CaddyError, ConfigError};
pub use fast_path::{CommandFastPath, UpdateAction};
pub use host::{EmulatorEvent, HostRequest, KeyAction};
pub use image::{DiskImage, FileInfo, ImageLoader, SharedImage, is_disk_image_name};
pub use input::InputMappings;
pub use platform::Platform;
pub use quirks::needs_deferred_refresh;
pub use snoop::{CdSnooper, SnoopTarget};
