//! Disk images as the emulator sees them.
//!
//! Parsing and GCR/MFM encoding live behind [`DiskImage`]; the emulator
//! only needs identity, a content hash and write-back.

use std::fmt;
use std::sync::Arc;

use crate::error::CaddyError;

/// An opened image, shared between the caddy and the drive model.
pub trait DiskImage: Send + Sync {
    fn name(&self) -> &str;

    /// Content hash, used to recognise titles that need timing quirks.
    fn hash(&self) -> u32;

    /// 3.5" 1581 image.
    fn is_d81(&self) -> bool;

    /// Written to since it was opened.
    fn is_dirty(&self) -> bool;

    /// Write changes back to storage.
    fn flush(&self) -> Result<(), CaddyError>;
}

pub type SharedImage = Arc<dyn DiskImage>;

impl fmt::Debug for dyn DiskImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskImage")
            .field("name", &self.name())
            .field("hash", &format!("{:#010x}", self.hash()))
            .finish()
    }
}

/// A directory entry picked by the host or the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    /// Read-only attribute on the storage medium.
    pub read_only: bool,
}

impl FileInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            read_only: false,
        }
    }

    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        has_extension(&self.name, &["lst"])
    }
}

/// Opens images from storage.
pub trait ImageLoader {
    fn open(&mut self, file: &FileInfo, read_only: bool) -> Result<SharedImage, CaddyError>;

    /// Read an image list (`.lst`): one file name per line.
    fn read_list(&mut self, file: &FileInfo) -> Result<Vec<FileInfo>, CaddyError>;
}

const IMAGE_EXTENSIONS: &[&str] = &["d64", "g64", "nib", "nbz", "d71", "d81", "t64", "prg"];

fn has_extension(name: &str, extensions: &[&str]) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        extensions
            .iter()
            .any(|candidate| ext.eq_ignore_ascii_case(candidate))
    })
}

/// File names the loader can open as a single image.
#[must_use]
pub fn is_disk_image_name(name: &str) -> bool {
    has_extension(name, IMAGE_EXTENSIONS)
}
