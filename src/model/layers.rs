//! Graph convolution layers.
//!
//! Each layer consumes node features `[num_nodes, in_width]` and an edge
//! index `[2, num_edges]` (row 0 = source, row 1 = target) and produces
//! transformed node features. Aggregation is scatter-add over incoming
//! edges.

use tch::{nn, Kind, Tensor};

/// Softmax of per-edge scores over the incoming edges of each target node.
///
/// `scores` is `[num_edges, num_heads]`; the result has the same shape and
/// sums to one over the edges sharing a target.
fn edge_softmax(scores: &Tensor, target: &Tensor, num_nodes: i64) -> Tensor {
    // max() rejects empty tensors; a zero-edge graph has nothing to normalize
    if scores.size()[0] == 0 {
        return scores.shallow_clone();
    }
    let shifted = scores - scores.max();
    let exp = shifted.exp();
    let num_heads = exp.size()[1];
    let idx = target.unsqueeze(-1).expand_as(&exp);
    let sums = Tensor::zeros(&[num_nodes, num_heads], (exp.kind(), exp.device()))
        .scatter_add(0, &idx, &exp);
    let denom = sums.index_select(0, target) + 1e-16;
    exp / denom
}

/// Graph convolutional layer.
///
/// Linear transform, scatter-add aggregation of neighbor features at each
/// target node, inverse-sqrt degree normalization, then bias.
pub struct GraphConvLayer {
    linear: nn::Linear,
    bias: Tensor,
}

impl GraphConvLayer {
    pub fn new(vs: &nn::Path, in_features: i64, out_features: i64) -> Self {
        let linear = nn::linear(vs / "linear", in_features, out_features, Default::default());
        let bias = vs.zeros("bias", &[out_features]);
        Self { linear, bias }
    }

    pub fn forward(&self, x: &Tensor, edge_index: &Tensor) -> Tensor {
        let num_nodes = x.size()[0];
        let h = x.apply(&self.linear);

        let source = edge_index.select(0, 0);
        let target = edge_index.select(0, 1);
        let messages = h.index_select(0, &source);

        let aggregated = Tensor::zeros(&[num_nodes, h.size()[1]], (h.kind(), h.device()));
        let idx = target.unsqueeze(-1).expand_as(&messages);
        let summed = aggregated.scatter_add(0, &idx, &messages);

        let degree = self.compute_degree(&target, num_nodes);
        let degree_inv_sqrt = (degree + 1e-6).pow_tensor_scalar(-0.5);

        summed * degree_inv_sqrt.unsqueeze(-1) + &self.bias
    }

    fn compute_degree(&self, target: &Tensor, num_nodes: i64) -> Tensor {
        let ones = Tensor::ones(&[target.size()[0]], (Kind::Float, target.device()));
        let degree = Tensor::zeros(&[num_nodes], (Kind::Float, target.device()));
        degree.scatter_add(0, target, &ones)
    }
}

/// Multi-head graph attention layer.
///
/// Per-edge additive attention with a leaky-relu(0.2) on the raw scores,
/// softmax over each node's incoming edges, and dropout on the attention
/// weights during training. Head outputs are concatenated, so the output
/// width is `num_heads * out_per_head`.
pub struct GraphAttentionLayer {
    linear: nn::Linear,
    attention_src: Tensor,
    attention_dst: Tensor,
    num_heads: i64,
    head_dim: i64,
    dropout: f64,
    negative_slope: f64,
}

impl GraphAttentionLayer {
    pub fn new(
        vs: &nn::Path,
        in_features: i64,
        out_per_head: i64,
        num_heads: i64,
        dropout: f64,
    ) -> Self {
        let linear = nn::linear(
            vs / "linear",
            in_features,
            out_per_head * num_heads,
            Default::default(),
        );
        let attention_src = vs.randn("attn_src", &[num_heads, out_per_head], 0.0, 0.1);
        let attention_dst = vs.randn("attn_dst", &[num_heads, out_per_head], 0.0, 0.1);

        Self {
            linear,
            attention_src,
            attention_dst,
            num_heads,
            head_dim: out_per_head,
            dropout,
            negative_slope: 0.2,
        }
    }

    pub fn forward(&self, x: &Tensor, edge_index: &Tensor, train: bool) -> Tensor {
        let num_nodes = x.size()[0];
        let h = x
            .apply(&self.linear)
            .reshape(&[num_nodes, self.num_heads, self.head_dim]);

        let source = edge_index.select(0, 0);
        let target = edge_index.select(0, 1);
        let h_src = h.index_select(0, &source);
        let h_dst = h.index_select(0, &target);

        let alpha_src = (&h_src * &self.attention_src).sum_dim_intlist(-1, false, Kind::Float);
        let alpha_dst = (&h_dst * &self.attention_dst).sum_dim_intlist(-1, false, Kind::Float);
        let alpha = alpha_src + alpha_dst;
        // leaky_relu with the GAT slope
        let alpha = alpha.maximum(&(&alpha * self.negative_slope));

        let attention = edge_softmax(&alpha, &target, num_nodes);
        let attention = attention.dropout(self.dropout, train);

        let weighted = h_src * attention.unsqueeze(-1);
        let out = Tensor::zeros(
            &[num_nodes, self.num_heads, self.head_dim],
            (h.kind(), h.device()),
        );
        let idx = target.unsqueeze(-1).unsqueeze(-1).expand_as(&weighted);
        out.scatter_add(0, &idx, &weighted)
            .reshape(&[num_nodes, self.num_heads * self.head_dim])
    }
}

/// Transformer-style multi-head graph convolution.
///
/// Scaled dot-product attention between per-edge query (target) and key
/// (source) projections, aggregation of value projections, plus a root
/// linear on the node's own features. Output width is
/// `num_heads * out_per_head`.
pub struct TransformerConvLayer {
    lin_query: nn::Linear,
    lin_key: nn::Linear,
    lin_value: nn::Linear,
    lin_root: nn::Linear,
    num_heads: i64,
    head_dim: i64,
    dropout: f64,
}

impl TransformerConvLayer {
    pub fn new(
        vs: &nn::Path,
        in_features: i64,
        out_per_head: i64,
        num_heads: i64,
        dropout: f64,
    ) -> Self {
        let width = out_per_head * num_heads;
        let lin_query = nn::linear(vs / "query", in_features, width, Default::default());
        let lin_key = nn::linear(vs / "key", in_features, width, Default::default());
        let lin_value = nn::linear(vs / "value", in_features, width, Default::default());
        let lin_root = nn::linear(vs / "root", in_features, width, Default::default());

        Self {
            lin_query,
            lin_key,
            lin_value,
            lin_root,
            num_heads,
            head_dim: out_per_head,
            dropout,
        }
    }

    pub fn forward(&self, x: &Tensor, edge_index: &Tensor, train: bool) -> Tensor {
        let num_nodes = x.size()[0];
        let shape = [num_nodes, self.num_heads, self.head_dim];
        let query = x.apply(&self.lin_query).reshape(&shape);
        let key = x.apply(&self.lin_key).reshape(&shape);
        let value = x.apply(&self.lin_value).reshape(&shape);

        let source = edge_index.select(0, 0);
        let target = edge_index.select(0, 1);

        let q_dst = query.index_select(0, &target);
        let k_src = key.index_select(0, &source);
        let v_src = value.index_select(0, &source);

        let scale = (self.head_dim as f64).sqrt();
        let alpha = (q_dst * k_src).sum_dim_intlist(-1, false, Kind::Float) / scale;
        let attention = edge_softmax(&alpha, &target, num_nodes);
        let attention = attention.dropout(self.dropout, train);

        let weighted = v_src * attention.unsqueeze(-1);
        let out = Tensor::zeros(
            &[num_nodes, self.num_heads, self.head_dim],
            (weighted.kind(), weighted.device()),
        );
        let idx = target.unsqueeze(-1).unsqueeze(-1).expand_as(&weighted);
        let aggregated = out
            .scatter_add(0, &idx, &weighted)
            .reshape(&[num_nodes, self.num_heads * self.head_dim]);

        aggregated + x.apply(&self.lin_root)
    }
}
