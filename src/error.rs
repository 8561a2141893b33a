//! Error types for model construction and batch validation.

use thiserror::Error;

/// Errors raised while configuring or feeding the model.
///
/// Configuration errors are raised eagerly, before any encoder tensors are
/// allocated; batch errors are raised when an input graph violates its shape
/// invariants.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("unsupported GNN type: {0} (expected gcn, gat or gtc)")]
    UnsupportedGnnType(String),

    #[error("unsupported activation: {0} (expected relu, leaky_relu or gelu)")]
    UnsupportedActivation(String),

    #[error("unsupported sampling method: {0} (expected SMOTE or copy)")]
    UnsupportedSampleMethod(String),

    #[error("unsupported mode: {0} (expected train or eval)")]
    UnsupportedMode(String),

    #[error("hidden_sizes must contain at least one layer width")]
    EmptyHiddenSizes,

    #[error("mlp_input_dim is {got} but the similarity matrix is {expected} wide (num_classes x num_prototypes_per_class)")]
    ReadoutWidthMismatch { got: i64, expected: i64 },

    #[error("edge_index must have shape [2, num_edges], got {0:?}")]
    BadEdgeIndexShape(Vec<i64>),

    #[error("edge endpoint {index} out of range for {num_nodes} nodes")]
    EdgeIndexOutOfRange { index: i64, num_nodes: i64 },

    #[error("label vector has {labels} entries but the batch has {nodes} nodes")]
    LabelLengthMismatch { labels: i64, nodes: i64 },
}
