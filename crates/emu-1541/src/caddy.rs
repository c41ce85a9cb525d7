//! The stack of images the user loaded for one drive.

use crate::error::CaddyError;
use crate::image::{FileInfo, ImageLoader, SharedImage, is_disk_image_name};

/// Images reachable by direct selection (keys 0-9).
pub const MAX_DIRECT_SELECT: usize = 10;

/// Inserted images plus the one currently in the drive.
///
/// `selected` always indexes a valid image while the caddy is non-empty, so
/// a swap can never leave the drive without a disk.
#[derive(Debug, Default)]
pub struct DiskCaddy {
    images: Vec<SharedImage>,
    selected: usize,
}

impl DiskCaddy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `file` and append it. On failure the caddy is unchanged.
    pub fn insert(
        &mut self,
        loader: &mut dyn ImageLoader,
        file: &FileInfo,
        read_only: bool,
    ) -> Result<(), CaddyError> {
        check_name(file)?;
        let image = loader.open(file, read_only || file.read_only)?;
        log::debug!("caddy: inserted {}", image.name());
        self.images.push(image);
        Ok(())
    }

    /// Open every file of a list. Either all of them go in or none does.
    pub fn insert_all(
        &mut self,
        loader: &mut dyn ImageLoader,
        files: &[FileInfo],
    ) -> Result<usize, CaddyError> {
        if files.is_empty() {
            return Err(CaddyError::EmptyList);
        }
        let opened = files
            .iter()
            .map(|file| {
                check_name(file)?;
                loader.open(file, file.read_only)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let count = opened.len();
        self.images.extend(opened);
        Ok(count)
    }

    /// Write back dirty images and drop everything.
    ///
    /// Returns whether anything was written. Every image is flushed even if
    /// one fails; the first failure is returned after the caddy is cleared.
    pub fn empty(&mut self) -> Result<bool, CaddyError> {
        let mut written = false;
        let mut first_error = None;
        for image in self.images.drain(..) {
            if !image.is_dirty() {
                continue;
            }
            match image.flush() {
                Ok(()) => {
                    log::debug!("caddy: wrote back {}", image.name());
                    written = true;
                }
                Err(err) => {
                    log::warn!("caddy: {err}");
                    first_error.get_or_insert(err);
                }
            }
        }
        self.selected = 0;
        match first_error {
            Some(err) => Err(err),
            None => Ok(written),
        }
    }

    pub fn select_first_image(&mut self) -> Option<SharedImage> {
        self.selected = 0;
        self.current()
    }

    /// Select by position. Out-of-range leaves the selection alone.
    pub fn select_image(&mut self, index: usize) -> Option<SharedImage> {
        let image = self.images.get(index).cloned()?;
        self.selected = index;
        Some(image)
    }

    /// Step forward, wrapping to the first image.
    pub fn next_disk(&mut self) -> Option<SharedImage> {
        if self.images.is_empty() {
            return None;
        }
        self.selected = (self.selected + 1) % self.images.len();
        self.current()
    }

    /// Step back, wrapping to the last image.
    pub fn prev_disk(&mut self) -> Option<SharedImage> {
        if self.images.is_empty() {
            return None;
        }
        self.selected = self
            .selected
            .checked_sub(1)
            .unwrap_or(self.images.len() - 1);
        self.current()
    }

    /// Image at `index` without changing the selection.
    #[must_use]
    pub fn image(&self, index: usize) -> Option<&SharedImage> {
        self.images.get(index)
    }

    #[must_use]
    pub fn current(&self) -> Option<SharedImage> {
        self.images.get(self.selected).cloned()
    }

    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    #[must_use]
    pub fn number_of_images(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.images.iter().map(|i| i.name().to_string()).collect()
    }
}

fn check_name(file: &FileInfo) -> Result<(), CaddyError> {
    if is_disk_image_name(&file.name) {
        Ok(())
    } else {
        Err(CaddyError::NotADiskImage(file.name.clone()))
    }
}
