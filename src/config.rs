//! Configuration handling.

use crate::balance::SampleMethod;
use crate::model::{Activation, GnnType, SladConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model configuration
    pub model: ModelConfig,
    /// Class rebalancing configuration
    pub balance: BalanceConfig,
}

impl Config {
    /// Load configuration from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Encoder architecture (gcn, gat, gtc)
    pub gnn_type: GnnType,
    /// Activation between encoder layers
    pub activation: Activation,
    /// Input feature width
    pub num_features: i64,
    /// Hidden layer widths
    pub hidden_sizes: Vec<i64>,
    /// Attention/transformer head count
    pub num_head: i64,
    /// Dropout on attention weights
    pub dropout: f64,
    /// Number of label classes
    pub num_classes: i64,
    /// Learned prototypes per class
    pub num_prototypes_per_class: i64,
    /// Readout input width
    pub mlp_input_dim: i64,
    /// Hidden width for the plain MLP head
    pub mlp_hidden_dim: i64,
    /// Readout output width
    pub mlp_output_dim: i64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            gnn_type: GnnType::Gcn,
            activation: Activation::Relu,
            num_features: 10,
            hidden_sizes: vec![64, 64],
            num_head: 4,
            dropout: 0.2,
            num_classes: 2,
            num_prototypes_per_class: 3,
            mlp_input_dim: 6,
            mlp_hidden_dim: 32,
            mlp_output_dim: 1,
        }
    }
}

impl ModelConfig {
    /// Construction-time view consumed by the model.
    pub fn to_slad_config(&self) -> SladConfig {
        SladConfig {
            gnn_head_num: self.num_head,
            gnn_dropout: self.dropout,
            activation: self.activation,
            gnn_type: self.gnn_type,
            num_features: self.num_features,
            hidden_sizes: self.hidden_sizes.clone(),
            num_classes: self.num_classes,
            num_prototypes_per_class: self.num_prototypes_per_class,
            mlp_input_dim: self.mlp_input_dim,
            mlp_hidden_dim: self.mlp_hidden_dim,
            mlp_output_dim: self.mlp_output_dim,
        }
    }
}

/// Class rebalancing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceConfig {
    /// Oversampling strategy (SMOTE or copy)
    pub method: SampleMethod,
    /// Oversampling scale factor; 0 disables rebalancing
    pub scale_factor: i64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            method: SampleMethod::Smote,
            scale_factor: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.model.gnn_type, GnnType::Gcn);
        assert_eq!(config.model.hidden_sizes, vec![64, 64]);
        assert_eq!(config.balance.method, SampleMethod::Smote);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.model.gnn_type, parsed.model.gnn_type);
        assert_eq!(config.model.num_features, parsed.model.num_features);
    }

    #[test]
    fn test_unknown_gnn_type_rejected() {
        let toml = r#"
            [model]
            gnn_type = "sage"
            activation = "relu"
            num_features = 8
            hidden_sizes = [16]
            num_head = 4
            dropout = 0.2
            num_classes = 2
            num_prototypes_per_class = 3
            mlp_input_dim = 6
            mlp_hidden_dim = 32
            mlp_output_dim = 1

            [balance]
            method = "copy"
            scale_factor = 2
        "#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_sample_method_tags() {
        let toml = r#"
            method = "SMOTE"
            scale_factor = 3
        "#;
        let balance: BalanceConfig = toml::from_str(toml).unwrap();
        assert_eq!(balance.method, SampleMethod::Smote);
        assert!(toml::from_str::<BalanceConfig>("method = \"smote\"\nscale_factor = 1").is_err());
    }
}
