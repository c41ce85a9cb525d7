use thiserror::Error;

/// Why an image could not be put into (or taken out of) the caddy.
#[derive(Debug, Error)]
pub enum CaddyError {
    #[error("{0} is not a disk image")]
    NotADiskImage(String),

    #[error("failed to open {name}: {reason}")]
    Open { name: String, reason: String },

    #[error("failed to write back {name}: {reason}")]
    Flush { name: String, reason: String },

    #[error("image list is empty")]
    EmptyList,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("device id {0} is outside 8..=11")]
    DeviceId(u8),

    #[error("dual drive primary {0} is outside 8..=11")]
    Primary(u8),
}
