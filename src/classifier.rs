use crate::encoder::Sequence;
use crate::error::{InferenceError, Result};
use crate::model::config::NUM_LABELS;
use crate::model::{Config, TextClassifier};
use candle_core::Tensor;
use candle_nn::VarBuilder;
use std::fmt::Display;

/// The two class scores produced for one text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreVector(pub [f32; NUM_LABELS]);

impl Display for ScoreVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0[0], self.0[1])
    }
}

pub trait Predictor {
    /// Length every input sequence must have.
    fn sequence_length(&self) -> usize;

    fn predict(&self, sequence: &Sequence) -> Result<ScoreVector>;
}

pub struct Classifier {
    model: TextClassifier,
    config: Config,
}

impl Classifier {
    pub fn new(vb: VarBuilder, config: Config) -> candle_core::Result<Self> {
        let model = TextClassifier::load(vb, &config)?;
        Ok(Self { model, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn check_input(&self, sequence: &Sequence) -> std::result::Result<(), InferenceError> {
        if sequence.len() != self.config.sequence_length {
            return Err(InferenceError::ShapeMismatch {
                expected: self.config.sequence_length,
                actual: sequence.len(),
            });
        }
        match sequence
            .ids()
            .iter()
            .find(|&&id| id as usize >= self.config.vocab_size)
        {
            Some(&id) => Err(InferenceError::TokenOutOfRange {
                id,
                vocab_size: self.config.vocab_size,
            }),
            None => Ok(()),
        }
    }

    fn forward(&self, sequence: &Sequence) -> std::result::Result<ScoreVector, InferenceError> {
        self.check_input(sequence)?;

        let input_ids = Tensor::new(sequence.ids(), self.model.device())?.unsqueeze(0)?;
        let outputs: Vec<Vec<f32>> = self.model.forward(&input_ids)?.to_vec2()?;
        let scores = outputs.into_iter().next().unwrap_or_default();
        let scores: [f32; NUM_LABELS] =
            scores
                .try_into()
                .map_err(|scores: Vec<f32>| InferenceError::UnexpectedOutput {
                    expected: NUM_LABELS,
                    actual: scores.len(),
                })?;

        if scores.iter().any(|s| !s.is_finite()) {
            return Err(InferenceError::NonFinite(scores));
        }
        Ok(ScoreVector(scores))
    }
}

impl Predictor for Classifier {
    fn sequence_length(&self) -> usize {
        self.config.sequence_length
    }

    fn predict(&self, sequence: &Sequence) -> Result<ScoreVector> {
        let scores = self.forward(sequence)?;
        tracing::debug!(
            "{}={} {}={}",
            self.config.label(0),
            scores.0[0],
            self.config.label(1),
            scores.0[1]
        );
        Ok(scores)
    }
}
