//! Elementwise activation functions.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tch::Tensor;

/// Elementwise nonlinearity applied between encoder layers.
///
/// Resolved once at construction time; an unrecognized name is a
/// configuration error rather than a silent pass-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    LeakyRelu,
    Gelu,
}

impl Default for Activation {
    fn default() -> Self {
        Self::Relu
    }
}

impl Activation {
    /// Apply the activation elementwise.
    pub fn apply(&self, x: &Tensor) -> Tensor {
        match self {
            Activation::Relu => x.relu(),
            Activation::LeakyRelu => x.leaky_relu(),
            Activation::Gelu => x.gelu("none"),
        }
    }
}

impl FromStr for Activation {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relu" => Ok(Activation::Relu),
            "leaky_relu" => Ok(Activation::LeakyRelu),
            "gelu" => Ok(Activation::Gelu),
            other => Err(ModelError::UnsupportedActivation(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind};

    #[test]
    fn test_parse() {
        assert_eq!(Activation::from_str("relu").unwrap(), Activation::Relu);
        assert_eq!(
            Activation::from_str("leaky_relu").unwrap(),
            Activation::LeakyRelu
        );
        assert_eq!(Activation::from_str("gelu").unwrap(), Activation::Gelu);
        assert!(Activation::from_str("tanh").is_err());
        assert!(Activation::from_str("").is_err());
    }

    #[test]
    fn test_relu_clamps_negatives() {
        let x = Tensor::from_slice(&[-1.0f32, 0.0, 2.0]).to_device(Device::Cpu);
        let y = Activation::Relu.apply(&x);
        let v: Vec<f64> = Vec::<f64>::try_from(y.to_kind(Kind::Double)).unwrap();
        assert_eq!(v, vec![0.0, 0.0, 2.0]);
    }

    #[test]
    fn test_shapes_preserved() {
        let x = Tensor::randn(&[4, 7], (Kind::Float, Device::Cpu));
        for act in [Activation::Relu, Activation::LeakyRelu, Activation::Gelu] {
            assert_eq!(act.apply(&x).size(), vec![4, 7]);
        }
    }
}
