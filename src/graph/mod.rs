//! Graph batches and event-graph construction.
//!
//! The model consumes a [`GraphBatch`]: node features, directed edge
//! connectivity and binary node labels as tch tensors. [`EventGraph`] is a
//! small petgraph-backed builder for assembling batches from named log
//! events.

use crate::error::ModelError;
use petgraph::graph::{Graph, NodeIndex};
use std::collections::HashMap;
use tch::{Device, Kind, Tensor};

/// One graph of node features, edges and labels.
///
/// Immutable for the duration of a forward pass. `x` is `[n, f]` Float,
/// `edge_index` is `[2, num_edges]` Int64 (row 0 = source, row 1 = target),
/// `y` is `[n]` Int64 with values in {0, 1}.
pub struct GraphBatch {
    pub x: Tensor,
    pub edge_index: Tensor,
    pub y: Tensor,
}

impl GraphBatch {
    /// Validate shapes and build a batch.
    ///
    /// Every edge endpoint must be in `[0, n)` and the label vector must
    /// have one entry per node.
    pub fn new(x: Tensor, edge_index: Tensor, y: Tensor) -> Result<Self, ModelError> {
        let num_nodes = x.size()[0];

        let shape = edge_index.size();
        if shape.len() != 2 || shape[0] != 2 {
            return Err(ModelError::BadEdgeIndexShape(shape));
        }
        if shape[1] > 0 {
            let max = edge_index.max().int64_value(&[]);
            let min = edge_index.min().int64_value(&[]);
            if min < 0 || max >= num_nodes {
                let index = if min < 0 { min } else { max };
                return Err(ModelError::EdgeIndexOutOfRange { index, num_nodes });
            }
        }

        let labels = y.size()[0];
        if labels != num_nodes {
            return Err(ModelError::LabelLengthMismatch {
                labels,
                nodes: num_nodes,
            });
        }

        Ok(Self { x, edge_index, y })
    }

    pub fn num_nodes(&self) -> i64 {
        self.x.size()[0]
    }

    pub fn num_edges(&self) -> i64 {
        self.edge_index.size()[1]
    }
}

/// Create an edge index tensor from source/target vectors.
pub fn create_edge_index(sources: &[i64], targets: &[i64], device: Device) -> Tensor {
    let sources_tensor = Tensor::from_slice(sources).to_device(device);
    let targets_tensor = Tensor::from_slice(targets).to_device(device);
    Tensor::stack(&[sources_tensor, targets_tensor], 0)
}

/// Create a node feature tensor from per-node feature rows.
pub fn create_features(features: &[Vec<f64>], device: Device) -> Tensor {
    let flat: Vec<f64> = features.iter().flatten().cloned().collect();
    let n = features.len() as i64;
    let d = if n > 0 { features[0].len() as i64 } else { 0 };
    Tensor::from_slice(&flat)
        .reshape(&[n, d])
        .to_device(device)
        .to_kind(Kind::Float)
}

/// Create a label tensor.
pub fn create_labels(labels: &[i64], device: Device) -> Tensor {
    Tensor::from_slice(labels).to_device(device)
}

/// Named-node event graph.
///
/// Keeps a petgraph representation alongside name/index maps so callers can
/// wire up log events by name and export the connectivity in edge-index
/// form.
#[derive(Debug, Clone, Default)]
pub struct EventGraph {
    graph: Graph<String, f64>,
    event_to_node: HashMap<String, NodeIndex>,
    node_to_event: HashMap<NodeIndex, String>,
}

impl EventGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event node, returning the existing index if already present.
    pub fn add_event(&mut self, event: &str) -> NodeIndex {
        if let Some(&idx) = self.event_to_node.get(event) {
            return idx;
        }
        let idx = self.graph.add_node(event.to_string());
        self.event_to_node.insert(event.to_string(), idx);
        self.node_to_event.insert(idx, event.to_string());
        idx
    }

    /// Add a weighted edge between two events, creating nodes as needed.
    pub fn add_edge(&mut self, from: &str, to: &str, weight: f64) {
        let from_idx = self.add_event(from);
        let to_idx = self.add_event(to);
        self.graph.add_edge(from_idx, to_idx, weight);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Export connectivity as `(sources, targets)`, with each undirected
    /// edge expanded into both directions.
    pub fn to_edge_index(&self) -> (Vec<i64>, Vec<i64>) {
        let mut sources = Vec::new();
        let mut targets = Vec::new();

        for edge in self.graph.edge_indices() {
            if let Some((source, target)) = self.graph.edge_endpoints(edge) {
                sources.push(source.index() as i64);
                targets.push(target.index() as i64);
                sources.push(target.index() as i64);
                targets.push(source.index() as i64);
            }
        }

        (sources, targets)
    }

    /// Assemble a validated batch from this graph's connectivity plus
    /// per-node features and labels (ordered by node index).
    pub fn to_batch(
        &self,
        features: &[Vec<f64>],
        labels: &[i64],
        device: Device,
    ) -> Result<GraphBatch, ModelError> {
        let (sources, targets) = self.to_edge_index();
        GraphBatch::new(
            create_features(features, device),
            create_edge_index(&sources, &targets, device),
            create_labels(labels, device),
        )
    }
}
