//! Concatenation of disk-backed tensors along the sample axis.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapMut};
use ndarray::{s, ArrayView3, ArrayViewMut3, Dim};
use ndarray_npy::{write_zeroed_npy, ViewMutNpyExt, ViewNpyExt};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::accumulator::partial_path;
use crate::error::{PrepError, Result};
use crate::pool::Split;

/// File name of the merged tensor.
pub const MERGED_FILE_NAME: &str = "X_all.npy";

/// Outcome of a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    pub output: PathBuf,
    pub shape: [usize; 3],
}

/// Concatenate `files` (each `[n_i, dim1, dim2]` float32) into `output`.
///
/// Every input is checked before anything is written; the output appears
/// only once it is complete.
pub fn merge(files: &[PathBuf], dim1: usize, dim2: usize, output: &Path) -> Result<MergeResult> {
    if files.is_empty() {
        return Err(PrepError::invalid_config("no tensors to merge"));
    }

    let mut inputs = Vec::with_capacity(files.len());
    for path in files {
        let file = File::open(path)?;
        // SAFETY: inputs are finished tensors that nothing writes to.
        let mmap = unsafe { Mmap::map(&file)? };
        inputs.push((path, mmap));
    }

    let mut total = 0usize;
    for (path, mmap) in &inputs {
        let view = ArrayView3::<f32>::view_npy(mmap)
            .map_err(|e| PrepError::npy(format!("{}: {}", path.display(), e)))?;
        let (n, d1, d2) = view.dim();
        if (d1, d2) != (dim1, dim2) {
            return Err(PrepError::shape_mismatch(
                format!("(_, {}, {})", dim1, dim2),
                format!("{}: ({}, {}, {})", path.display(), n, d1, d2),
            ));
        }
        total += n;
    }

    let shape = [total, dim1, dim2];
    let scratch = partial_path(output);
    let out_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&scratch)?;
    write_zeroed_npy::<f32, _>(&out_file, Dim(shape)).map_err(PrepError::npy)?;
    // SAFETY: the scratch file is private to this call until it is renamed.
    let mut out_map = unsafe { MmapMut::map_mut(&out_file)? };

    {
        let mut dest = ArrayViewMut3::<f32>::view_mut_npy(&mut out_map).map_err(PrepError::npy)?;
        let mut offset = 0usize;
        for (i, (path, mmap)) in inputs.iter().enumerate() {
            let view = ArrayView3::<f32>::view_npy(mmap).map_err(PrepError::npy)?;
            let n = view.len_of(ndarray::Axis(0));
            dest.slice_mut(s![offset..offset + n, .., ..]).assign(&view);
            offset += n;
            debug!(file = i, of = inputs.len(), path = %path.display(), rows = n, "Merged tensor");
        }
    }
    out_map.flush()?;
    drop(out_map);
    drop(out_file);
    fs::rename(&scratch, output)?;

    info!(output = %output.display(), shape = ?shape, inputs = files.len(), "Merged tensors");

    Ok(MergeResult {
        output: output.to_path_buf(),
        shape,
    })
}

/// Parse `X<split>_batch_<n>_on_disk.npy`.
fn parse_batch_file(name: &str) -> Option<(Split, usize)> {
    let rest = name.strip_prefix('X')?.strip_suffix("_on_disk.npy")?;
    let (split, number) = rest.split_once("_batch_")?;
    let split = match split {
        "train" => Split::Train,
        "test" => Split::Test,
        _ => return None,
    };
    Some((split, number.parse().ok()?))
}

/// Disk-backed tensors in `dir`: train before test, by batch number.
pub fn discover_batch_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| PrepError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(key) = entry.file_name().to_str().and_then(parse_batch_file) {
            found.push((key, entry.into_path()));
        }
    }
    found.sort();
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_file() {
        assert_eq!(
            parse_batch_file("Xtrain_batch_12_on_disk.npy"),
            Some((Split::Train, 12))
        );
        assert_eq!(
            parse_batch_file("Xtest_batch_0_on_disk.npy"),
            Some((Split::Test, 0))
        );
        assert_eq!(parse_batch_file("Xtrain_batch_0_on_disk.npy.partial"), None);
        assert_eq!(parse_batch_file("X_all.npy"), None);
        assert_eq!(parse_batch_file("Xval_batch_1_on_disk.npy"), None);
    }
}
