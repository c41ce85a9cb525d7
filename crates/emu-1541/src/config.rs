//! Emulator options.

use commodore_iec::IecConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Cycles of 1541 self test run flat out before real time starts.
pub const FAST_BOOT_CYCLES: u32 = 1_003_061;

/// How the head stepping noise is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundMode {
    Off,
    /// Square wave bit-banged on the sound pin.
    #[default]
    Gpio,
    /// Sample played by the platform's DMA audio.
    Dma,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    pub device_id: u8,
    pub fast_boot_cycles: u32,
    /// Map RAM into the $8000 area (for speeders that expect it).
    pub extra_ram: bool,
    /// Serve only the on-device browser, never IEC commands.
    pub disable_fast_path: bool,
    pub on_reset_change_to_starting_folder: bool,
    /// Image mounted automatically after a host reset.
    pub auto_mount_image: Option<String>,
    pub head_sound: SoundMode,
    /// Ticks between toggles of the GPIO square wave.
    pub head_sound_freq: u32,
    /// Length of a GPIO head sound; each toggle uses up eight times
    /// `head_sound_freq`.
    pub head_sound_duration: u32,
    /// Device that samples the shared pins when both drives are idle or
    /// both are emulating.
    pub dual_drive_primary: u8,
    pub iec: IecConfig,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            device_id: 8,
            fast_boot_cycles: FAST_BOOT_CYCLES,
            extra_ram: false,
            disable_fast_path: false,
            on_reset_change_to_starting_folder: false,
            auto_mount_image: None,
            head_sound: SoundMode::Gpio,
            head_sound_freq: 3,
            head_sound_duration: 1000,
            dual_drive_primary: 8,
            iec: IecConfig::default(),
        }
    }
}

impl EmulatorConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(8..=11).contains(&self.device_id) {
            return Err(ConfigError::DeviceId(self.device_id));
        }
        if !(8..=11).contains(&self.dual_drive_primary) {
            return Err(ConfigError::Primary(self.dual_drive_primary));
        }
        Ok(())
    }
}
