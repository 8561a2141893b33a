//! CLI for the SLAD-GNN anomaly detection model.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use slad_gnn::{
    balance::SampleMethod,
    config::Config,
    graph::EventGraph,
    model::{Mode, OutputFormat, SladGnn},
};

#[derive(Parser)]
#[command(name = "slad-gnn")]
#[command(about = "Prototype-based GNN for log anomaly detection")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    InitConfig,

    /// Run an eval-mode forward pass over a synthetic event graph
    Demo {
        /// Number of nodes in the synthetic ring graph
        #[arg(short, long, default_value = "16")]
        nodes: usize,

        /// Fraction of nodes labeled anomalous
        #[arg(short, long, default_value = "0.125")]
        anomaly_rate: f64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitConfig => {
            let config = Config::default();
            config.to_file(&cli.config)?;
            info!("Wrote default configuration to {}", cli.config);
        }

        Commands::Demo {
            nodes,
            anomaly_rate,
        } => {
            let config = if std::path::Path::new(&cli.config).exists() {
                Config::from_file(&cli.config)?
            } else {
                info!("{} not found, using defaults", cli.config);
                Config::default()
            };

            let device = tch::Device::Cpu;
            let model = SladGnn::new(&config.model.to_slad_config(), device)?;
            info!(
                "Model constructed ({:?} encoder, {} prototypes)",
                config.model.gnn_type,
                config.model.num_classes * config.model.num_prototypes_per_class
            );

            // ring of events with a few chords
            let mut graph = EventGraph::new();
            for i in 0..nodes {
                let from = format!("event_{}", i);
                let to = format!("event_{}", (i + 1) % nodes);
                graph.add_edge(&from, &to, 1.0);
                if i % 4 == 0 {
                    let chord = format!("event_{}", (i + nodes / 2) % nodes);
                    graph.add_edge(&from, &chord, 0.5);
                }
            }

            let num_features = config.model.num_features as usize;
            let features: Vec<Vec<f64>> = (0..nodes)
                .map(|i| {
                    (0..num_features)
                        .map(|j| ((i * (j + 1)) as f64 * 0.37).sin())
                        .collect()
                })
                .collect();
            let anomalies = ((nodes as f64) * anomaly_rate).round() as usize;
            let labels: Vec<i64> = (0..nodes)
                .map(|i| if i < anomalies { 1 } else { 0 })
                .collect();

            let batch = graph.to_batch(&features, &labels, device)?;
            info!(
                "Batch: {} nodes, {} edges, {} anomalous",
                batch.num_nodes(),
                batch.num_edges(),
                anomalies
            );

            let (probabilities, _labels) = model.forward(
                &batch,
                Mode::Eval,
                0,
                SampleMethod::Copy,
                OutputFormat::default(),
            );

            let mean = probabilities.mean(tch::Kind::Float).double_value(&[]);
            let max = probabilities.max().double_value(&[]);
            let min = probabilities.min().double_value(&[]);
            info!(
                "Anomaly probabilities: mean={:.4} min={:.4} max={:.4}",
                mean, min, max
            );
        }
    }

    Ok(())
}
