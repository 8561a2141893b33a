//! Feed-forward classification heads.

use crate::model::activation::Activation;
use tch::{nn, Tensor};

const DEFAULT_READOUT_DROPOUT: f64 = 0.1;
const DEFAULT_READOUT_LAYERS: usize = 1;

/// Width-halving MLP readout.
///
/// `n_layers` hidden linears chain `input -> input/2 -> input/4 -> ...`,
/// each preceded by dropout (training only) and followed by GELU; a final
/// linear maps to `output_dim` with no trailing activation.
pub struct MlpReadout {
    fc_layers: Vec<nn::Linear>,
    n_layers: usize,
    dropout: f64,
}

impl MlpReadout {
    pub fn new(vs: &nn::Path, input_dim: i64, output_dim: i64) -> Self {
        Self::with_options(
            vs,
            input_dim,
            output_dim,
            DEFAULT_READOUT_DROPOUT,
            DEFAULT_READOUT_LAYERS,
        )
    }

    pub fn with_options(
        vs: &nn::Path,
        input_dim: i64,
        output_dim: i64,
        dropout: f64,
        n_layers: usize,
    ) -> Self {
        let mut fc_layers = Vec::with_capacity(n_layers + 1);
        for n in 0..n_layers {
            fc_layers.push(nn::linear(
                vs / format!("fc_{}", n),
                input_dim >> n,
                input_dim >> (n + 1),
                Default::default(),
            ));
        }
        fc_layers.push(nn::linear(
            vs / format!("fc_{}", n_layers),
            input_dim >> n_layers,
            output_dim,
            Default::default(),
        ));

        Self {
            fc_layers,
            n_layers,
            dropout,
        }
    }

    pub fn forward(&self, x: &Tensor, train: bool) -> Tensor {
        let mut y = x.shallow_clone();
        for n in 0..self.n_layers {
            y = y.dropout(self.dropout, train);
            y = y.apply(&self.fc_layers[n]);
            y = y.gelu("none");
        }
        y.apply(&self.fc_layers[self.n_layers])
    }
}

/// Plain single-hidden-layer MLP with a configurable activation.
pub struct Mlp {
    fc1: nn::Linear,
    fc2: nn::Linear,
    activation: Activation,
}

impl Mlp {
    pub fn new(
        vs: &nn::Path,
        input_dim: i64,
        hidden_dim: i64,
        output_dim: i64,
        activation: Activation,
    ) -> Self {
        let fc1 = nn::linear(vs / "fc1", input_dim, hidden_dim, Default::default());
        let fc2 = nn::linear(vs / "fc2", hidden_dim, output_dim, Default::default());
        Self {
            fc1,
            fc2,
            activation,
        }
    }

    pub fn forward(&self, x: &Tensor) -> Tensor {
        self.activation.apply(&x.apply(&self.fc1)).apply(&self.fc2)
    }
}
