//! Sample batches: a feature tensor and its aligned label rows.

use ndarray::{Array3, Axis};

use crate::error::{PrepError, Result};
use crate::pool::LabeledPoint;

/// Feature tensor `[sample, variable, day]` with one label row per sample.
///
/// `labels[i]` always describes `features[i]`.
#[derive(Debug, Clone)]
pub struct Batch {
    features: Array3<f32>,
    variables: Vec<String>,
    labels: Vec<LabeledPoint>,
}

impl Batch {
    pub fn new(
        features: Array3<f32>,
        variables: Vec<String>,
        labels: Vec<LabeledPoint>,
    ) -> Result<Self> {
        let (samples, vars, _) = features.dim();
        if samples != labels.len() || vars != variables.len() {
            return Err(PrepError::shape_mismatch(
                format!("{} samples x {} variables", labels.len(), variables.len()),
                format!("{:?}", features.dim()),
            ));
        }
        Ok(Self {
            features,
            variables,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn lookback_days(&self) -> usize {
        self.features.len_of(Axis(2))
    }

    pub fn features(&self) -> &Array3<f32> {
        &self.features
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn labels(&self) -> &[LabeledPoint] {
        &self.labels
    }

    /// `"<date>: <zone>"` for every sample, in tensor order.
    pub fn sample_ids(&self) -> Vec<String> {
        self.labels.iter().map(LabeledPoint::sample_id).collect()
    }

    pub fn into_parts(self) -> (Array3<f32>, Vec<String>, Vec<LabeledPoint>) {
        (self.features, self.variables, self.labels)
    }

    /// Keep at most `n` samples.
    pub fn truncate(&mut self, n: usize) {
        if n >= self.len() {
            return;
        }
        self.features = self.features.slice_axis(Axis(0), (0..n).into()).to_owned();
        self.labels.truncate(n);
    }

    /// Reorder the variable axis lexicographically by name.
    pub fn sort_variables(&mut self) {
        let mut order: Vec<usize> = (0..self.variables.len()).collect();
        order.sort_by(|a, b| self.variables[*a].cmp(&self.variables[*b]));
        if order.iter().enumerate().all(|(i, j)| i == *j) {
            return;
        }
        self.features = self.features.select(Axis(1), &order);
        self.variables = order.iter().map(|i| self.variables[*i].clone()).collect();
    }

    /// Reorder samples by (date, zone, latitude, longitude).
    pub fn canonicalize(&mut self) {
        let mut order: Vec<usize> = (0..self.labels.len()).collect();
        order.sort_by(|a, b| self.labels[*a].canonical_cmp(&self.labels[*b]));
        if order.iter().enumerate().all(|(i, j)| i == *j) {
            return;
        }
        self.features = self.features.select(Axis(0), &order);
        self.labels = order.iter().map(|i| self.labels[*i].clone()).collect();
    }
}
