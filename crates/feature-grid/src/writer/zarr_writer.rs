//! Zarr V3 writer.
//!
//! Writes the two array kinds this workspace produces: feature partitions
//! (`[time, variable, lat, lon]` with coordinate attributes) and sample
//! tensors (`[sample, variable, day]` with variable and sample-id
//! attributes).

use std::path::Path;
use std::sync::Arc;

use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use crate::config::{ZarrCompression, ZarrWriterConfig};
use crate::error::{FetchError, Result};
use crate::types::PartitionAxes;

/// Result of writing a Zarr array.
#[derive(Debug, Clone)]
pub struct ZarrWriteResult {
    /// Array shape.
    pub shape: Vec<u64>,
    /// Total bytes written (uncompressed).
    pub bytes_written: u64,
}

/// Writer for Zarr V3 arrays on the local filesystem.
pub struct ZarrWriter {
    config: ZarrWriterConfig,
}

impl ZarrWriter {
    /// Create a new ZarrWriter with the given configuration.
    pub fn new(config: ZarrWriterConfig) -> Result<Self> {
        config.validate().map_err(FetchError::ConfigError)?;
        Ok(Self { config })
    }

    /// Write a feature partition.
    ///
    /// # Arguments
    /// * `path` - Partition directory (created if missing)
    /// * `axes` - Coordinate axes, stored as attributes
    /// * `data` - Values in `[time, variable, lat, lon]` row-major order
    pub fn write_partition(
        &self,
        path: &Path,
        axes: &PartitionAxes,
        data: &[f32],
    ) -> Result<ZarrWriteResult> {
        axes.validate().map_err(FetchError::InvalidMetadata)?;

        let mut attrs = serde_json::Map::new();
        attrs.insert("variables".to_string(), serde_json::json!(axes.variables));
        attrs.insert("latitudes".to_string(), serde_json::json!(axes.latitudes));
        attrs.insert("longitudes".to_string(), serde_json::json!(axes.longitudes));
        attrs.insert("times".to_string(), serde_json::to_value(&axes.times)?);

        let shape: Vec<u64> = axes.shape().iter().map(|d| *d as u64).collect();
        let chunk_shape = vec![
            (self.config.leading_chunk as u64).min(shape[0].max(1)),
            shape[1].max(1),
            shape[2].max(1),
            shape[3].max(1),
        ];

        self.write_array(path, shape, chunk_shape, attrs, data)
    }

    /// Write a sample tensor `[sample, variable, day]`.
    ///
    /// # Arguments
    /// * `path` - Array directory (created if missing)
    /// * `shape` - `[samples, variables, days]`
    /// * `variables` - Variable name per channel
    /// * `samples` - Sample identifier per row
    /// * `data` - Values in row-major order
    pub fn write_tensor(
        &self,
        path: &Path,
        shape: [usize; 3],
        variables: &[String],
        samples: &[String],
        data: &[f32],
    ) -> Result<ZarrWriteResult> {
        if variables.len() != shape[1] || samples.len() != shape[0] {
            return Err(FetchError::shape_mismatch(
                format!("{} samples x {} variables", shape[0], shape[1]),
                format!("{} samples x {} variables", samples.len(), variables.len()),
            ));
        }

        let mut attrs = serde_json::Map::new();
        attrs.insert("variables".to_string(), serde_json::json!(variables));
        attrs.insert("samples".to_string(), serde_json::json!(samples));
        attrs.insert(
            "dimensions".to_string(),
            serde_json::json!(["sample", "variable", "day"]),
        );

        let shape: Vec<u64> = shape.iter().map(|d| *d as u64).collect();
        let chunk_shape = vec![
            (self.config.leading_chunk as u64).min(shape[0].max(1)),
            shape[1].max(1),
            shape[2].max(1),
        ];

        self.write_array(path, shape, chunk_shape, attrs, data)
    }

    fn write_array(
        &self,
        path: &Path,
        shape: Vec<u64>,
        chunk_shape: Vec<u64>,
        attrs: serde_json::Map<String, serde_json::Value>,
        data: &[f32],
    ) -> Result<ZarrWriteResult> {
        let expected: u64 = shape.iter().product();
        if data.len() as u64 != expected {
            return Err(FetchError::shape_mismatch(expected, data.len()));
        }

        std::fs::create_dir_all(path)?;
        let store = Arc::new(
            FilesystemStore::new(path).map_err(|e| FetchError::write_failed(e.to_string()))?,
        );

        let chunk_grid: zarrs::array::ChunkGrid = chunk_shape
            .try_into()
            .map_err(|e| FetchError::ConfigError(format!("{:?}", e)))?;

        let mut binding = ArrayBuilder::new(
            shape.clone(),
            DataType::Float32,
            chunk_grid,
            FillValue::from(f32::NAN),
        );
        let mut builder = binding.attributes(attrs);

        if self.config.compression != ZarrCompression::None {
            let codec = self.create_compression_codec()?;
            builder = builder.bytes_to_bytes_codecs(vec![codec]);
        }

        let array = builder
            .build(store, "/")
            .map_err(|e| FetchError::write_failed(e.to_string()))?;

        array
            .store_metadata()
            .map_err(|e| FetchError::write_failed(e.to_string()))?;

        if expected > 0 {
            let subset = ArraySubset::new_with_start_shape(vec![0; shape.len()], shape.clone())
                .map_err(|e| FetchError::write_failed(e.to_string()))?;

            array
                .store_array_subset_elements(&subset, data)
                .map_err(|e| FetchError::write_failed(e.to_string()))?;
        }

        tracing::debug!(
            path = %path.display(),
            shape = ?shape,
            compression = %self.config.compression,
            "Wrote Zarr array"
        );

        Ok(ZarrWriteResult {
            shape,
            bytes_written: (data.len() * std::mem::size_of::<f32>()) as u64,
        })
    }

    /// Create the compression codec based on configuration.
    fn create_compression_codec(
        &self,
    ) -> Result<Arc<dyn zarrs::array::codec::BytesToBytesCodecTraits>> {
        let level = BloscCompressionLevel::try_from(self.config.compression_level)
            .map_err(|_| FetchError::ConfigError("Invalid compression level".to_string()))?;

        let shuffle = if self.config.shuffle {
            BloscShuffleMode::Shuffle
        } else {
            BloscShuffleMode::NoShuffle
        };

        // typesize is required when shuffle is enabled
        let typesize = if self.config.shuffle { Some(4) } else { None };

        let compressor = match self.config.compression {
            ZarrCompression::None => {
                return Err(FetchError::ConfigError(
                    "No compression configured".to_string(),
                ))
            }
            ZarrCompression::BloscLz4 => BloscCompressor::LZ4,
            ZarrCompression::BloscZstd => BloscCompressor::Zstd,
        };

        let codec = BloscCodec::new(compressor, level, None, shuffle, typesize)
            .map_err(|e| FetchError::ConfigError(e.to_string()))?;

        Ok(Arc::new(codec))
    }
}
