pub mod config;

use candle_core::{Device, Module, Tensor};
use candle_nn::{Embedding, LSTMConfig, Linear, VarBuilder, LSTM, RNN};

pub use config::{Config, EncoderConfig, OutputActivation, Side};

enum Reducer {
    Mean,
    Max,
    Lstm(LSTM),
}

impl Reducer {
    fn load(vb: VarBuilder, config: &Config) -> candle_core::Result<Self> {
        Ok(match config.encoder {
            EncoderConfig::Mean => Self::Mean,
            EncoderConfig::Max => Self::Max,
            EncoderConfig::Lstm { hidden_size } => Self::Lstm(candle_nn::lstm(
                config.embedding_dim,
                hidden_size,
                LSTMConfig::default(),
                vb.pp("lstm"),
            )?),
        })
    }

    /// (batch, seq, dim) -> (batch, features)
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            Self::Mean => xs.mean(1),
            Self::Max => xs.max(1),
            Self::Lstm(lstm) => {
                let states = lstm.seq(xs)?;
                match states.last() {
                    Some(state) => Ok(state.h().clone()),
                    None => candle_core::bail!("lstm received an empty sequence"),
                }
            }
        }
    }
}

/// Embedding, sequence reduction, dense stack and a two-way classifier head.
pub struct TextClassifier {
    embedding: Embedding,
    reducer: Reducer,
    hidden: Vec<Linear>,
    classifier: Linear,
    activation: OutputActivation,
}

impl TextClassifier {
    pub fn load(vb: VarBuilder, config: &Config) -> candle_core::Result<Self> {
        let embedding =
            candle_nn::embedding(config.vocab_size, config.embedding_dim, vb.pp("embedding"))?;
        let reducer = Reducer::load(vb.clone(), config)?;

        let mut in_dim = config.encoder.output_dim(config.embedding_dim);
        let mut hidden = Vec::with_capacity(config.hidden_layers.len());
        for (i, &width) in config.hidden_layers.iter().enumerate() {
            hidden.push(candle_nn::linear(in_dim, width, vb.pp(format!("dense_{}", i)))?);
            in_dim = width;
        }
        let classifier = candle_nn::linear(in_dim, config.num_labels, vb.pp("classifier"))?;

        Ok(Self {
            embedding,
            reducer,
            hidden,
            classifier,
            activation: config.output_activation,
        })
    }

    /// Token ids of shape (batch, seq) to scores of shape (batch, num_labels).
    pub fn forward(&self, input_ids: &Tensor) -> candle_core::Result<Tensor> {
        let xs = self.embedding.forward(input_ids)?;
        let mut xs = self.reducer.forward(&xs)?;
        for layer in &self.hidden {
            xs = layer.forward(&xs)?.relu()?;
        }
        let logits = self.classifier.forward(&xs)?;
        match self.activation {
            OutputActivation::Sigmoid => candle_nn::ops::sigmoid(&logits),
            OutputActivation::Softmax => candle_nn::ops::softmax_last_dim(&logits),
        }
    }

    pub fn device(&self) -> &Device {
        self.embedding.embeddings().device()
    }
}
