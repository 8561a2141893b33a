//! End-to-end forward-pass scenarios.

use slad_gnn::{
    balance::SampleMethod,
    graph::{create_edge_index, create_features, create_labels, GraphBatch},
    model::{GnnType, Mode, OutputFormat, SladConfig, SladGnn},
};
use std::str::FromStr;
use tch::{Device, Kind};

fn chain_batch(labels: &[i64], num_features: usize) -> GraphBatch {
    let n = labels.len();
    let features: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            (0..num_features)
                .map(|j| ((i + 1) as f64 * (j + 1) as f64 * 0.13).cos())
                .collect()
        })
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

fn gcn_config() -> SladConfig {
    SladConfig {
        gnn_type: GnnType::Gcn,
        num_features: 8,
        hidden_sizes: vec![16, 16],
        num_classes: 2,
        num_prototypes_per_class: 3,
        mlp_input_dim: 6,
        mlp_output_dim: 1,
        ..Default::default()
    }
}

#[test]
fn eval_forward_returns_probabilities_and_input_labels() {
    let model = SladGnn::new(&gcn_config(), Device::Cpu).unwrap();
    let labels = [0i64, 0, 1, 0, 0, 0, 1, 0, 0, 0];
    let batch = chain_batch(&labels, 8);

    let (probs, y) = model.forward(
        &batch,
        Mode::Eval,
        2,
        SampleMethod::Copy,
        OutputFormat::default(),
    );

    assert_eq!(probs.size(), vec![10]);
    assert_eq!(y.size(), vec![10]);

    // every probability in [0, 1]
    assert!(probs.min().double_value(&[]) >= 0.0);
    assert!(probs.max().double_value(&[]) <= 1.0);

    // labels passed through unchanged, cast to float
    assert_eq!(y.kind(), Kind::Float);
    let expected: Vec<f64> = labels.iter().map(|&l| l as f64).collect();
    let got: Vec<f64> = Vec::<f64>::try_from(y.to_kind(Kind::Double)).unwrap();
    assert_eq!(got, expected);
}

#[test]
fn train_forward_with_copy_oversampling_grows_outputs() {
    let model = SladGnn::new(&gcn_config(), Device::Cpu).unwrap();
    // 8 zeros, 2 ones; scale 2 appends 2 * 2 = 4 minority copies
    let labels = [0i64, 0, 0, 0, 1, 0, 0, 1, 0, 0];
    let batch = chain_batch(&labels, 8);

    let (probs, y) = model.forward(
        &batch,
        Mode::Train,
        2,
        SampleMethod::Copy,
        OutputFormat::default(),
    );

    assert_eq!(probs.size(), vec![14]);
    assert_eq!(y.size(), vec![14]);

    // the appended labels are the minority label
    let appended: Vec<f64> =
        Vec::<f64>::try_from(y.narrow(0, 10, 4).to_kind(Kind::Double)).unwrap();
    assert_eq!(appended, vec![1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn train_forward_with_smote_matches_lengths() {
    let model = SladGnn::new(&gcn_config(), Device::Cpu).unwrap();
    let labels = [0i64, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0, 0];
    let batch = chain_batch(&labels, 8);

    let (probs, y) = model.forward(
        &batch,
        Mode::Train,
        3,
        SampleMethod::Smote,
        OutputFormat::default(),
    );

    // 3 minority rows * scale 3 = 9 synthetic rows appended
    assert_eq!(probs.size(), vec![21]);
    assert_eq!(y.size(), vec![21]);
    assert!(probs.min().double_value(&[]) >= 0.0);
    assert!(probs.max().double_value(&[]) <= 1.0);
}

#[test]
fn unsupported_encoder_tag_fails_before_construction() {
    let err = GnnType::from_str("graphsage");
    assert!(err.is_err());
    assert!(err
        .unwrap_err()
        .to_string()
        .contains("unsupported GNN type"));
}

#[test]
fn head_multiplied_encoders_run_end_to_end() {
    let labels = [0i64, 1, 0, 0, 1, 0, 0, 0];
    for gnn_type in [GnnType::Gat, GnnType::Gtc] {
        let config = SladConfig {
            gnn_type,
            gnn_head_num: 2,
            gnn_dropout: 0.1,
            ..gcn_config()
        };
        let model = SladGnn::new(&config, Device::Cpu).unwrap();
        let batch = chain_batch(&labels, 8);

        let (probs, y) = model.forward(
            &batch,
            Mode::Eval,
            0,
            SampleMethod::Smote,
            OutputFormat::default(),
        );
        assert_eq!(probs.size(), vec![8]);
        assert_eq!(y.size(), vec![8]);
    }
}
