//! Configuration for writing Zarr arrays.

use serde::{Deserialize, Serialize};

/// Chunking and compression used when writing Zarr arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZarrWriterConfig {
    /// Chunk length along the leading (time or sample) axis.
    pub leading_chunk: usize,

    /// Compression codec.
    pub compression: ZarrCompression,

    /// Compression level (1-9).
    pub compression_level: u8,

    /// Enable byte shuffle filter for better compression.
    pub shuffle: bool,
}

impl Default for ZarrWriterConfig {
    fn default() -> Self {
        Self {
            leading_chunk: 32,
            compression: ZarrCompression::BloscZstd,
            compression_level: 1,
            shuffle: true,
        }
    }
}

impl ZarrWriterConfig {
    /// Uncompressed arrays, used by tests and small fixtures.
    pub fn uncompressed() -> Self {
        Self {
            compression: ZarrCompression::None,
            ..Self::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.leading_chunk == 0 {
            return Err("leading_chunk must be > 0".to_string());
        }

        if self.compression_level == 0 || self.compression_level > 9 {
            return Err("compression_level must be 1-9".to_string());
        }

        Ok(())
    }
}

/// Compression codec for Zarr files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZarrCompression {
    /// No compression.
    None,
    /// Blosc with LZ4.
    BloscLz4,
    /// Blosc with Zstd (recommended).
    #[default]
    BloscZstd,
}

impl ZarrCompression {
    /// Get the codec name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BloscLz4 => "blosc_lz4",
            Self::BloscZstd => "blosc_zstd",
        }
    }
}

impl std::fmt::Display for ZarrCompression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ZarrWriterConfig::default().validate().is_ok());
        assert!(ZarrWriterConfig::uncompressed().validate().is_ok());
    }

    #[test]
    fn test_invalid_level() {
        let config = ZarrWriterConfig {
            compression_level: 12,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
