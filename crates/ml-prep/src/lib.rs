//! Training dataset preparation for avalanche danger forecasting.
//!
//! Turns a forecast archive and a zone-partitioned feature grid into
//! class-balanced tensors of daily weather features with aligned labels.
//!
//! # Architecture
//!
//! ```text
//! forecast archive + feature store
//!      │
//!      ▼
//! labels::build_label_split ──► LabelPool (train) / LabelPool (test)
//!      │
//!      ▼
//! BatchSampler::draw_batch ──► PointSeriesFetcher (rayon workers)
//!      │
//!      ▼
//! OutOfCoreAccumulator
//!      ├─► cache_batches: X_<split>_<i>.zarr + y_<split>_<i>.csv
//!      └─► create_memmapped: X<split>_batch_<b>_on_disk.npy + y_*.csv
//!               │
//!               ▼
//!          merge ──► X_all.npy
//! ```
//!
//! Label pools are owned values: every sampling step takes the pool and
//! returns what is left.

pub mod accumulator;
pub mod batch;
pub mod config;
pub mod error;
pub mod labels;
pub mod merge;
pub mod pipeline;
pub mod pool;
pub mod sampler;

// Re-exports
pub use accumulator::{clear_resume_state, memmap_file_name, Checkpoint, OutOfCoreAccumulator};
pub use batch::Batch;
pub use config::{
    ExcludedZoneSeason, GenerateConfig, LabelJoinConfig, MemmapConfig, SamplerConfig,
    StreamConfig,
};
pub use error::{PrepError, Result};
pub use labels::{build_label_split, load_split, save_split, LabelRecord, LabelSplit};
pub use merge::{discover_batch_files, merge, MergeResult, MERGED_FILE_NAME};
pub use pipeline::{generate_train_test, write_variable_manifest, GenerateResult, VARIABLE_MANIFEST};
pub use pool::{LabelColumn, LabelPool, LabeledPoint, Split};
pub use sampler::BatchSampler;
