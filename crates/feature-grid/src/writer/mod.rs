//! Zarr writers for feature partitions and sample tensors.

mod zarr_writer;

pub use zarr_writer::{ZarrWriteResult, ZarrWriter};
