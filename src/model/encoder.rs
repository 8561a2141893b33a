//! Multi-layer graph encoders.
//!
//! Three interchangeable variants that map `[num_nodes, num_features]` node
//! features and an edge index to node embeddings. The convolutional and
//! attention variants apply the configured activation after every layer,
//! final layer included; the transformer variant applies a per-layer
//! normalization and no activation at all.

use crate::error::ModelError;
use crate::model::activation::Activation;
use crate::model::layers::{GraphAttentionLayer, GraphConvLayer, TransformerConvLayer};
use tch::{nn, Tensor};

/// Encoder variant selected at model construction.
pub enum Encoder {
    Gcn(MultiLayerGcn),
    Gat(MultiLayerGat),
    Gtc(MultiLayerGtc),
}

impl Encoder {
    pub fn forward(&self, x: &Tensor, edge_index: &Tensor, train: bool) -> Tensor {
        match self {
            Encoder::Gcn(e) => e.forward(x, edge_index),
            Encoder::Gat(e) => e.forward(x, edge_index, train),
            Encoder::Gtc(e) => e.forward(x, edge_index, train),
        }
    }

    /// Width of the produced embeddings (head-multiplied for gat/gtc).
    pub fn output_dim(&self) -> i64 {
        match self {
            Encoder::Gcn(e) => e.output_dim(),
            Encoder::Gat(e) => e.output_dim(),
            Encoder::Gtc(e) => e.output_dim(),
        }
    }
}

/// Stack of graph convolution layers.
pub struct MultiLayerGcn {
    layers: Vec<GraphConvLayer>,
    activation: Activation,
    output_dim: i64,
}

impl MultiLayerGcn {
    pub fn new(
        vs: &nn::Path,
        num_features: i64,
        hidden_sizes: &[i64],
        activation: Activation,
    ) -> Result<Self, ModelError> {
        let last = *hidden_sizes.last().ok_or(ModelError::EmptyHiddenSizes)?;

        let mut layers = Vec::with_capacity(hidden_sizes.len());
        layers.push(GraphConvLayer::new(
            &(vs / "layer_0"),
            num_features,
            hidden_sizes[0],
        ));
        for i in 1..hidden_sizes.len() {
            layers.push(GraphConvLayer::new(
                &(vs / format!("layer_{}", i)),
                hidden_sizes[i - 1],
                hidden_sizes[i],
            ));
        }

        Ok(Self {
            layers,
            activation,
            output_dim: last,
        })
    }

    pub fn forward(&self, x: &Tensor, edge_index: &Tensor) -> Tensor {
        let mut h = x.shallow_clone();
        for layer in &self.layers {
            h = self.activation.apply(&layer.forward(&h, edge_index));
        }
        h
    }

    pub fn output_dim(&self) -> i64 {
        self.output_dim
    }
}

/// Stack of multi-head graph attention layers.
///
/// Layer 0 maps `num_features -> hidden[0] * heads`; layer i maps
/// `hidden[i-1] * heads -> hidden[i] * heads`.
pub struct MultiLayerGat {
    layers: Vec<GraphAttentionLayer>,
    activation: Activation,
    output_dim: i64,
}

impl MultiLayerGat {
    pub fn new(
        vs: &nn::Path,
        num_features: i64,
        hidden_dims: &[i64],
        activation: Activation,
        num_heads: i64,
        dropout: f64,
    ) -> Result<Self, ModelError> {
        let last = *hidden_dims.last().ok_or(ModelError::EmptyHiddenSizes)?;

        let mut layers = Vec::with_capacity(hidden_dims.len());
        layers.push(GraphAttentionLayer::new(
            &(vs / "layer_0"),
            num_features,
            hidden_dims[0],
            num_heads,
            dropout,
        ));
        for i in 1..hidden_dims.len() {
            layers.push(GraphAttentionLayer::new(
                &(vs / format!("layer_{}", i)),
                hidden_dims[i - 1] * num_heads,
                hidden_dims[i],
                num_heads,
                dropout,
            ));
        }

        Ok(Self {
            layers,
            activation,
            output_dim: last * num_heads,
        })
    }

    pub fn forward(&self, x: &Tensor, edge_index: &Tensor, train: bool) -> Tensor {
        let mut h = x.shallow_clone();
        for layer in &self.layers {
            h = self.activation.apply(&layer.forward(&h, edge_index, train));
        }
        h
    }

    pub fn output_dim(&self) -> i64 {
        self.output_dim
    }
}

/// Stack of transformer-style graph convolutions, each followed by its own
/// layer normalization of width `hidden[i] * heads`.
pub struct MultiLayerGtc {
    layers: Vec<TransformerConvLayer>,
    norms: Vec<nn::LayerNorm>,
    output_dim: i64,
}

impl MultiLayerGtc {
    pub fn new(
        vs: &nn::Path,
        num_features: i64,
        hidden_dims: &[i64],
        num_heads: i64,
        dropout: f64,
    ) -> Result<Self, ModelError> {
        let last = *hidden_dims.last().ok_or(ModelError::EmptyHiddenSizes)?;

        let mut layers = Vec::with_capacity(hidden_dims.len());
        let mut norms = Vec::with_capacity(hidden_dims.len());
        layers.push(TransformerConvLayer::new(
            &(vs / "layer_0"),
            num_features,
            hidden_dims[0],
            num_heads,
            dropout,
        ));
        for i in 1..hidden_dims.len() {
            layers.push(TransformerConvLayer::new(
                &(vs / format!("layer_{}", i)),
                hidden_dims[i - 1] * num_heads,
                hidden_dims[i],
                num_heads,
                dropout,
            ));
        }
        for (i, dim) in hidden_dims.iter().enumerate() {
            norms.push(nn::layer_norm(
                vs / format!("norm_{}", i),
                vec![dim * num_heads],
                Default::default(),
            ));
        }

        Ok(Self {
            layers,
            norms,
            output_dim: last * num_heads,
        })
    }

    pub fn forward(&self, x: &Tensor, edge_index: &Tensor, train: bool) -> Tensor {
        let mut h = x.shallow_clone();
        for (layer, norm) in self.layers.iter().zip(&self.norms) {
            h = layer.forward(&h, edge_index, train).apply(norm);
        }
        h
    }

    pub fn output_dim(&self) -> i64 {
        self.output_dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind};

    fn test_graph() -> (Tensor, Tensor) {
        let x = Tensor::randn(&[6, 8], (Kind::Float, Device::Cpu));
        let edge_index = Tensor::from_slice2(&[[0i64, 1, 2, 3, 4], [1, 2, 3, 4, 5]]);
        (x, edge_index)
    }

    #[test]
    fn test_gcn_output_width() {
        let vs = nn::VarStore::new(Device::Cpu);
        let enc = MultiLayerGcn::new(&vs.root(), 8, &[16, 12], Activation::Relu).unwrap();
        let (x, edge_index) = test_graph();

        assert_eq!(enc.output_dim(), 12);
        assert_eq!(enc.forward(&x, &edge_index).size(), vec![6, 12]);
    }

    #[test]
    fn test_gat_output_width_is_head_multiplied() {
        let vs = nn::VarStore::new(Device::Cpu);
        let enc =
            MultiLayerGat::new(&vs.root(), 8, &[16, 12], Activation::Gelu, 4, 0.0).unwrap();
        let (x, edge_index) = test_graph();

        assert_eq!(enc.output_dim(), 48);
        assert_eq!(enc.forward(&x, &edge_index, false).size(), vec![6, 48]);
    }

    #[test]
    fn test_gtc_output_width_is_head_multiplied() {
        let vs = nn::VarStore::new(Device::Cpu);
        let enc = MultiLayerGtc::new(&vs.root(), 8, &[16, 12], 2, 0.0).unwrap();
        let (x, edge_index) = test_graph();

        assert_eq!(enc.output_dim(), 24);
        assert_eq!(enc.forward(&x, &edge_index, false).size(), vec![6, 24]);
    }

    #[test]
    fn test_empty_hidden_sizes_rejected() {
        let vs = nn::VarStore::new(Device::Cpu);
        assert!(MultiLayerGcn::new(&vs.root(), 8, &[], Activation::Relu).is_err());
        assert!(MultiLayerGat::new(&vs.root(), 8, &[], Activation::Relu, 4, 0.2).is_err());
        assert!(MultiLayerGtc::new(&vs.root(), 8, &[], 4, 0.2).is_err());
    }

    #[test]
    fn test_gcn_relu_output_nonnegative() {
        // activation is applied after the final layer too
        let vs = nn::VarStore::new(Device::Cpu);
        let enc = MultiLayerGcn::new(&vs.root(), 8, &[16], Activation::Relu).unwrap();
        let (x, edge_index) = test_graph();

        let out = enc.forward(&x, &edge_index);
        let min = out.min().double_value(&[]);
        assert!(min >= 0.0);
    }
}
