//! SLAD-GNN model: encoder, prototype bank and readout.

pub mod activation;
pub mod encoder;
pub mod layers;
pub mod prototype;
pub mod readout;

pub use activation::Activation;
pub use encoder::{Encoder, MultiLayerGat, MultiLayerGcn, MultiLayerGtc};
pub use layers::{GraphAttentionLayer, GraphConvLayer, TransformerConvLayer};
pub use prototype::{calculate_similarity, SIMILARITY_EPSILON};
pub use readout::{Mlp, MlpReadout};

use crate::balance::{balance_features_labels, SampleMethod};
use crate::error::ModelError;
use crate::graph::GraphBatch;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tch::{nn, nn::OptimizerConfig, Device, Kind, Tensor};
use tracing::debug;

/// Encoder architecture tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GnnType {
    /// Multi-layer graph convolutional encoder
    Gcn,
    /// Multi-layer graph attention encoder
    Gat,
    /// Multi-layer transformer-style encoder
    Gtc,
}

impl FromStr for GnnType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gcn" => Ok(GnnType::Gcn),
            "gat" => Ok(GnnType::Gat),
            "gtc" => Ok(GnnType::Gtc),
            other => Err(ModelError::UnsupportedGnnType(other.to_string())),
        }
    }
}

/// Forward-pass mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Rebalance labels before similarity scoring
    Train,
    /// Pass labels through unchanged
    Eval,
}

impl FromStr for Mode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Mode::Train),
            "eval" => Ok(Mode::Eval),
            other => Err(ModelError::UnsupportedMode(other.to_string())),
        }
    }
}

/// Output encoding selector, reserved for alternative encodings of the
/// forward result. Currently single-variant; callers pass it for call-site
/// symmetry with external collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Probabilities,
}

/// Construction-time configuration, fixed for the model lifetime.
#[derive(Debug, Clone)]
pub struct SladConfig {
    /// Attention/transformer head count (ignored by gcn)
    pub gnn_head_num: i64,
    /// Dropout on attention weights (ignored by gcn)
    pub gnn_dropout: f64,
    /// Activation between encoder layers (ignored by gtc)
    pub activation: Activation,
    /// Encoder architecture
    pub gnn_type: GnnType,
    /// Input feature width
    pub num_features: i64,
    /// Hidden layer widths, one entry per encoder layer
    pub hidden_sizes: Vec<i64>,
    /// Number of label classes
    pub num_classes: i64,
    /// Learned prototypes per class
    pub num_prototypes_per_class: i64,
    /// Readout input width; must equal num_classes * num_prototypes_per_class
    pub mlp_input_dim: i64,
    /// Hidden width for the plain MLP head
    pub mlp_hidden_dim: i64,
    /// Readout output width
    pub mlp_output_dim: i64,
}

impl Default for SladConfig {
    fn default() -> Self {
        Self {
            gnn_head_num: 4,
            gnn_dropout: 0.2,
            activation: Activation::Relu,
            gnn_type: GnnType::Gcn,
            num_features: 10,
            hidden_sizes: vec![64, 64],
            num_classes: 2,
            num_prototypes_per_class: 3,
            mlp_input_dim: 6,
            mlp_hidden_dim: 32,
            mlp_output_dim: 1,
        }
    }
}

/// Prototype-based GNN for node-level anomaly detection.
///
/// Owns the encoder weights, the prototype bank and the readout weights in
/// one `nn::VarStore`; the external training loop mutates them through
/// [`SladGnn::optimizer`]. The forward pass itself never mutates parameters.
pub struct SladGnn {
    encoder: Encoder,
    prototypes: Tensor,
    readout: MlpReadout,
    vs: nn::VarStore,
    device: Device,
}

impl SladGnn {
    /// Build the model on the given device.
    ///
    /// The prototype bank width follows the encoder's output width, which
    /// is head-multiplied for the gat/gtc variants. Fails eagerly on an
    /// empty hidden-size list or a readout width that cannot match the
    /// similarity matrix.
    pub fn new(config: &SladConfig, device: Device) -> Result<Self, ModelError> {
        let prototype_count = config.num_classes * config.num_prototypes_per_class;
        if config.mlp_input_dim != prototype_count {
            return Err(ModelError::ReadoutWidthMismatch {
                got: config.mlp_input_dim,
                expected: prototype_count,
            });
        }

        let vs = nn::VarStore::new(device);
        let root = vs.root();

        let encoder = match config.gnn_type {
            GnnType::Gcn => Encoder::Gcn(MultiLayerGcn::new(
                &(&root / "gnn"),
                config.num_features,
                &config.hidden_sizes,
                config.activation,
            )?),
            GnnType::Gat => Encoder::Gat(MultiLayerGat::new(
                &(&root / "gnn"),
                config.num_features,
                &config.hidden_sizes,
                config.activation,
                config.gnn_head_num,
                config.gnn_dropout,
            )?),
            GnnType::Gtc => Encoder::Gtc(MultiLayerGtc::new(
                &(&root / "gnn"),
                config.num_features,
                &config.hidden_sizes,
                config.gnn_head_num,
                config.gnn_dropout,
            )?),
        };

        let embed_dim = encoder.output_dim();
        let prototypes = root.randn(
            "prototypes",
            &[config.num_classes, config.num_prototypes_per_class, embed_dim],
            0.0,
            1.0,
        );
        let readout = MlpReadout::new(
            &(&root / "readout"),
            config.mlp_input_dim,
            config.mlp_output_dim,
        );

        debug!(
            embed_dim,
            prototype_count, "constructed model with {:?} encoder", config.gnn_type
        );

        Ok(Self {
            encoder,
            prototypes,
            readout,
            vs,
            device,
        })
    }

    /// Full forward pass.
    ///
    /// Encodes the batch, rebalances embeddings and labels in train mode,
    /// scores embeddings against the flattened prototype bank and reduces
    /// the similarity profile to a per-node anomaly probability.
    ///
    /// Returns `(probabilities, labels)` as matching 1-D Float tensors; in
    /// train mode rebalancing can make both longer than the input label
    /// vector, which is why the labels are returned alongside.
    pub fn forward(
        &self,
        batch: &GraphBatch,
        mode: Mode,
        over_sample_scale_factor: i64,
        sample_method: SampleMethod,
        _output: OutputFormat,
    ) -> (Tensor, Tensor) {
        let train = mode == Mode::Train;
        let embeddings = self
            .encoder
            .forward(&batch.x, &batch.edge_index, train);

        let (embeddings, labels) = if train {
            balance_features_labels(
                &embeddings,
                &batch.y,
                over_sample_scale_factor,
                sample_method,
            )
        } else {
            (embeddings, batch.y.shallow_clone())
        };

        let embed_dim = self.prototypes.size()[2];
        let flat_prototypes = self.prototypes.reshape(&[-1, embed_dim]);
        let similarity = calculate_similarity(&embeddings, &flat_prototypes);

        let logits = self.readout.forward(&similarity, train);
        let probabilities = logits.sigmoid().squeeze();

        (probabilities, labels.to_kind(Kind::Float))
    }

    /// Device the model's parameters live on.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Flat `[num_classes * num_prototypes_per_class, embed_dim]` view of
    /// the prototype bank.
    pub fn prototypes(&self) -> Tensor {
        let embed_dim = self.prototypes.size()[2];
        self.prototypes.reshape(&[-1, embed_dim])
    }

    /// Trainable parameters, for external loss/update loops.
    pub fn trainable_variables(&self) -> Vec<Tensor> {
        self.vs.trainable_variables()
    }

    /// Adam optimizer over the model's variable store.
    pub fn optimizer(&self, learning_rate: f64) -> Result<nn::Optimizer, tch::TchError> {
        nn::Adam::default().build(&self.vs, learning_rate)
    }

    /// Save all weights to a file.
    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        self.vs.save(path)?;
        Ok(())
    }

    /// Load weights saved by [`SladGnn::save`].
    pub fn load(&mut self, path: &str) -> anyhow::Result<()> {
        self.vs.load(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{create_edge_index, create_features, create_labels};

    fn test_batch(labels: &[i64], num_features: usize) -> GraphBatch {
        let n = labels.len();
        let features: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..num_features).map(|j| ((i * j) as f64).sin()).collect())
            .collect();
        let sources: Vec<i64> = (0..n as i64 - 1).collect();
        let targets: Vec<i64> = (1..n as i64).collect();
        GraphBatch::new(
            create_features(&features, Device::Cpu),
            create_edge_index(&sources, &targets, Device::Cpu),
            create_labels(labels, Device::Cpu),
        )
        .unwrap()
    }

    fn test_config(gnn_type: GnnType) -> SladConfig {
        SladConfig {
            gnn_type,
            num_features: 8,
            hidden_sizes: vec![16, 16],
            gnn_head_num: 2,
            gnn_dropout: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_tag_parsing() {
        assert_eq!(GnnType::from_str("gcn").unwrap(), GnnType::Gcn);
        assert_eq!(GnnType::from_str("gat").unwrap(), GnnType::Gat);
        assert_eq!(GnnType::from_str("gtc").unwrap(), GnnType::Gtc);
        assert!(GnnType::from_str("sage").is_err());
        assert!(Mode::from_str("test").is_err());
        assert_eq!(Mode::from_str("train").unwrap(), Mode::Train);
    }

    #[test]
    fn test_readout_width_checked_eagerly() {
        let config = SladConfig {
            mlp_input_dim: 5,
            ..test_config(GnnType::Gcn)
        };
        assert!(matches!(
            SladGnn::new(&config, Device::Cpu),
            Err(ModelError::ReadoutWidthMismatch { got: 5, expected: 6 })
        ));
    }

    #[test]
    fn test_forward_all_encoders() {
        let labels = [0i64, 0, 0, 0, 1, 0, 0, 1, 0, 0];
        for gnn_type in [GnnType::Gcn, GnnType::Gat, GnnType::Gtc] {
            let model = SladGnn::new(&test_config(gnn_type), Device::Cpu).unwrap();
            let batch = test_batch(&labels, 8);

            let (probs, y) = model.forward(
                &batch,
                Mode::Eval,
                0,
                SampleMethod::Copy,
                OutputFormat::default(),
            );
            assert_eq!(probs.size(), vec![10]);
            assert_eq!(y.size(), vec![10]);
            assert_eq!(y.kind(), Kind::Float);
        }
    }

    #[test]
    fn test_train_mode_grows_both_outputs() {
        let labels = [0i64, 0, 0, 0, 0, 0, 0, 0, 1, 1];
        let model = SladGnn::new(&test_config(GnnType::Gcn), Device::Cpu).unwrap();
        let batch = test_batch(&labels, 8);

        let (probs, y) = model.forward(
            &batch,
            Mode::Train,
            2,
            SampleMethod::Copy,
            OutputFormat::default(),
        );
        // 2 minority rows * scale 2 appended
        assert_eq!(probs.size(), vec![14]);
        assert_eq!(y.size(), vec![14]);
    }

    #[test]
    fn test_prototype_bank_shape() {
        let model = SladGnn::new(&test_config(GnnType::Gat), Device::Cpu).unwrap();
        // gat output width = hidden_sizes[-1] * heads
        assert_eq!(model.prototypes().size(), vec![6, 32]);
    }
}
