use crate::error::LoadError;
use serde::Deserialize;
use std::collections::HashMap;

/// Number of scores the classifier head must produce.
pub const NUM_LABELS: usize = 2;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    pub vocab_size: usize,
    pub embedding_dim: usize,
    pub sequence_length: usize,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub hidden_layers: Vec<usize>,
    #[serde(default = "default_num_labels")]
    pub num_labels: usize,
    #[serde(default)]
    pub output_activation: OutputActivation,
    #[serde(default)]
    pub padding: Side,
    #[serde(default)]
    pub truncating: Side,
    #[serde(default)]
    pub id2label: HashMap<String, String>,
}

fn default_num_labels() -> usize {
    NUM_LABELS
}

/// How the embedded sequence is reduced to a single feature vector.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EncoderConfig {
    #[default]
    Mean,
    Max,
    Lstm { hidden_size: usize },
}

impl EncoderConfig {
    pub fn output_dim(&self, embedding_dim: usize) -> usize {
        match self {
            Self::Mean | Self::Max => embedding_dim,
            Self::Lstm { hidden_size } => *hidden_size,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputActivation {
    #[default]
    Sigmoid,
    Softmax,
}

/// Which end of a sequence padding is added to, or tokens are dropped from.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Pre,
    #[default]
    Post,
}

impl Config {
    pub fn validate(&self) -> Result<(), LoadError> {
        let incompatible = |reason: String| Err(LoadError::Incompatible(reason));
        if self.num_labels != NUM_LABELS {
            return incompatible(format!(
                "num_labels is {}, the scorer needs exactly {}",
                self.num_labels, NUM_LABELS
            ));
        }
        if self.sequence_length == 0 {
            return incompatible("sequence_length must be at least 1".to_string());
        }
        if self.vocab_size == 0 || self.embedding_dim == 0 {
            return incompatible("vocab_size and embedding_dim must be non-zero".to_string());
        }
        if self.encoder.output_dim(self.embedding_dim) == 0 || self.hidden_layers.contains(&0) {
            return incompatible("layer widths must be non-zero".to_string());
        }
        Ok(())
    }

    pub fn label(&self, index: usize) -> String {
        self.id2label
            .get(&index.to_string())
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{}", index))
    }
}
