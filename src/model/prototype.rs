//! Prototype similarity transform.

use tch::{Kind, Tensor};

/// Guards the denominator and caps the similarity at `ln(1/EPSILON)`.
pub const SIMILARITY_EPSILON: f64 = 1e-4;

/// Similarity between each node embedding and each prototype.
///
/// For embeddings `[n, d]` and prototypes `[k, d]`, computes per-pair
/// squared Euclidean distance and maps it through
/// `ln((dist + 1) / (dist + EPSILON))`, a strictly positive, monotonically
/// decreasing function of distance. Output is `[n, k]`.
pub fn calculate_similarity(node_embedding: &Tensor, prototypes: &Tensor) -> Tensor {
    let diff = node_embedding.unsqueeze(1) - prototypes.unsqueeze(0);
    let distance = diff
        .pow_tensor_scalar(2.0)
        .sum_dim_intlist(-1, false, Kind::Float);
    ((&distance + 1.0) / (&distance + SIMILARITY_EPSILON)).log()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tch::Device;

    #[test]
    fn test_output_shape() {
        let emb = Tensor::randn(&[7, 4], (Kind::Float, Device::Cpu));
        let protos = Tensor::randn(&[6, 4], (Kind::Float, Device::Cpu));

        let sim = calculate_similarity(&emb, &protos);
        assert_eq!(sim.size(), vec![7, 6]);
    }

    #[test]
    fn test_zero_distance_hits_maximum() {
        let v = Tensor::from_slice(&[1.0f32, -2.0, 0.5]).reshape(&[1, 3]);

        let sim = calculate_similarity(&v, &v);
        let value = sim.double_value(&[0, 0]);
        assert_relative_eq!(value, (1.0 / SIMILARITY_EPSILON).ln(), epsilon = 1e-3);
    }

    #[test]
    fn test_strictly_decreasing_in_distance() {
        let emb = Tensor::zeros(&[1, 2], (Kind::Float, Device::Cpu));
        // prototypes at increasing distance from the origin
        let protos = Tensor::from_slice(&[0.5f32, 0.0, 1.0, 0.0, 3.0, 0.0]).reshape(&[3, 2]);

        let sim = calculate_similarity(&emb, &protos);
        let near = sim.double_value(&[0, 0]);
        let mid = sim.double_value(&[0, 1]);
        let far = sim.double_value(&[0, 2]);
        assert!(near > mid);
        assert!(mid > far);
        assert!(far > 0.0);
    }
}
