//! # SLAD-GNN: prototype-based graph anomaly detection
//!
//! This library implements a prototype-based graph neural network for
//! node-level anomaly detection over graph-structured data such as log
//! event graphs. Node embeddings produced by a configurable GNN encoder are
//! scored against a bank of learned class prototypes, and the similarity
//! profile is reduced to a per-node anomaly probability.
//!
//! ## Features
//!
//! - Three interchangeable encoders: graph convolution (gcn), multi-head
//!   graph attention (gat) and transformer-style graph convolution (gtc)
//! - Minority-class rebalancing during training via SMOTE interpolation or
//!   plain duplication
//! - Log-distance prototype similarity scoring with an MLP readout
//! - petgraph-backed event-graph builder for assembling input batches
//!
//! ## Example
//!
//! ```rust,no_run
//! use slad_gnn::{
//!     balance::SampleMethod,
//!     graph::EventGraph,
//!     model::{Mode, OutputFormat, SladConfig, SladGnn},
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut graph = EventGraph::new();
//!     graph.add_edge("session_open", "auth_ok", 1.0);
//!     graph.add_edge("auth_ok", "session_close", 1.0);
//!
//!     let features = vec![vec![0.1; 10], vec![0.4; 10], vec![0.2; 10]];
//!     let labels = vec![0, 0, 1];
//!     let batch = graph.to_batch(&features, &labels, tch::Device::Cpu)?;
//!
//!     let model = SladGnn::new(&SladConfig::default(), tch::Device::Cpu)?;
//!     let (probabilities, labels) = model.forward(
//!         &batch,
//!         Mode::Eval,
//!         0,
//!         SampleMethod::Copy,
//!         OutputFormat::default(),
//!     );
//!     println!("{:?} {:?}", probabilities, labels);
//!     Ok(())
//! }
//! ```

pub mod balance;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;

// Re-export main types
pub use balance::{balance_features_labels, SampleMethod};
pub use config::Config;
pub use error::ModelError;
pub use graph::{EventGraph, GraphBatch};
pub use model::{Activation, GnnType, Mode, OutputFormat, SladConfig, SladGnn};
