//! Messages between a drive and the host side (menu, web UI, keyboard).

use crate::emulator::{EmulatingMode, ExitType};
use crate::image::FileInfo;

/// Keyboard shortcuts honoured while emulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Exit,
    AutoLoad,
    NextDisk,
    PrevDisk,
    /// Jump straight to caddy slot 0-9.
    SelectDisk(u8),
}

/// Requests polled once per tick (and per command-mode iteration).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    /// Mount a single image, leaving any running session first.
    Mount(FileInfo),
    /// Mount every image named in a `.lst` file.
    MountList(FileInfo),
    /// Leave emulation without mounting anything.
    Unmount,
    Shutdown,
    /// A new file finished uploading; reload it like the autoload key.
    UploadFinished,
    Key(KeyAction),
}

/// Notifications for whatever renders the drive's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmulatorEvent {
    ModeChanged {
        device: u8,
        mode: EmulatingMode,
    },
    /// Images in the caddy, shown when a session starts.
    CaddyContents {
        device: u8,
        names: Vec<String>,
        selected: usize,
    },
    DiskSwapped {
        device: u8,
        index: usize,
        name: String,
    },
    MountFailed {
        device: u8,
        name: String,
        reason: String,
    },
    SessionEnded {
        device: u8,
        reason: ExitType,
        lost_cycles: u64,
    },
    /// A browser button went down (or auto-repeated) in command mode.
    ButtonPressed {
        device: u8,
        button: usize,
    },
    DeviceIdChanged {
        old: u8,
        new: u8,
    },
    /// Browser navigation requested over IEC.
    DisplayRoot {
        device: u8,
    },
    FolderChanged {
        device: u8,
    },
    PopFolder {
        device: u8,
    },
    DeviceSwitched {
        device: u8,
    },
}
