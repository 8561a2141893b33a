//! Class rebalancing for skewed binary label distributions.
//!
//! Training batches for anomaly detection are heavily skewed toward normal
//! nodes. Before loss computation the minority class is oversampled, either
//! by synthetic interpolation (SMOTE) or by plain duplication. Everything
//! appended is materialized on the same device as the incoming tensors.

use crate::error::ModelError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tch::{Kind, Tensor};

/// Seed for synthetic-sample generation, fixed so resampling is repeatable.
const RESAMPLE_SEED: u64 = 42;

/// Minority oversampling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleMethod {
    /// Synthetic minority oversampling: interpolate between a minority
    /// sample and one of its k nearest minority neighbors.
    #[serde(rename = "SMOTE")]
    Smote,
    /// Duplicate minority rows verbatim.
    #[serde(rename = "copy")]
    Copy,
}

impl FromStr for SampleMethod {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SMOTE" => Ok(SampleMethod::Smote),
            "copy" => Ok(SampleMethod::Copy),
            other => Err(ModelError::UnsupportedSampleMethod(other.to_string())),
        }
    }
}

/// Oversample the minority class of a (features, labels) batch.
///
/// The minority label is whichever of {0, 1} occurs strictly less often
/// (ties resolve to 0). When the minority class has at most one member, or
/// the scale factor is not positive, the inputs are returned unchanged;
/// synthetic
/// interpolation needs at least two members to draw a segment between.
///
/// Both modes append `minority_count * scale_factor` new rows after the
/// original rows, which stay unmodified and in order; nothing is shuffled.
pub fn balance_features_labels(
    features: &Tensor,
    labels: &Tensor,
    over_sample_scale_factor: i64,
    sample_method: SampleMethod,
) -> (Tensor, Tensor) {
    let count_0 = labels.eq(0).sum(Kind::Int64).int64_value(&[]);
    let count_1 = labels.eq(1).sum(Kind::Int64).int64_value(&[]);
    let minority_label: i64 = if count_0 <= count_1 { 0 } else { 1 };

    let minority_indices = labels.eq(minority_label).nonzero().squeeze_dim(-1);
    let minority_count = minority_indices.size()[0];

    if minority_count <= 1 || over_sample_scale_factor <= 0 {
        return (features.shallow_clone(), labels.shallow_clone());
    }

    let added = minority_count * over_sample_scale_factor;
    let added_labels = Tensor::full(&[added], minority_label, (labels.kind(), labels.device()));

    match sample_method {
        SampleMethod::Copy => {
            let selected = minority_indices.repeat(&[over_sample_scale_factor]);
            let selected_features = features.index_select(0, &selected);
            (
                Tensor::cat(&[features.shallow_clone(), selected_features], 0),
                Tensor::cat(&[labels.shallow_clone(), added_labels], 0),
            )
        }
        SampleMethod::Smote => {
            let synthetic = smote_samples(
                features,
                &minority_indices,
                minority_count,
                over_sample_scale_factor,
            );
            (
                Tensor::cat(&[features.shallow_clone(), synthetic], 0),
                Tensor::cat(&[labels.shallow_clone(), added_labels], 0),
            )
        }
    }
}

/// Generate `minority_count * scale` synthetic minority rows.
///
/// Uses k = min(minority_count - 1, scale) nearest minority neighbors under
/// squared Euclidean distance; each synthetic row interpolates between a
/// minority row (cycled in order) and a uniformly chosen neighbor with a
/// uniform gap in [0, 1). Distances are taken on detached rows, so the
/// synthetic samples do not carry gradients.
fn smote_samples(
    features: &Tensor,
    minority_indices: &Tensor,
    minority_count: i64,
    scale: i64,
) -> Tensor {
    let k = (minority_count - 1).min(scale);
    let minority = features.index_select(0, minority_indices).detach();

    // pairwise squared distances among minority rows; column 0 of the
    // argsort is the row itself
    let diff = minority.unsqueeze(1) - minority.unsqueeze(0);
    let distances = diff
        .pow_tensor_scalar(2.0)
        .sum_dim_intlist(-1, false, Kind::Float);
    let neighbors = distances.argsort(-1, false).narrow(1, 1, k);
    let neighbors: Vec<Vec<i64>> = Vec::<Vec<i64>>::try_from(&neighbors).unwrap();

    let mut rng = StdRng::seed_from_u64(RESAMPLE_SEED);
    let total = minority_count * scale;
    let mut synthetic = Vec::with_capacity(total as usize);
    for s in 0..total {
        let i = (s % minority_count) as usize;
        let j = neighbors[i][rng.gen_range(0..k as usize)];
        let gap: f64 = rng.gen();
        let base = minority.get(i as i64);
        let neighbor = minority.get(j);
        synthetic.push(&base + (neighbor - &base) * gap);
    }

    Tensor::stack(&synthetic, 0).to_device(features.device())
}
