use crate::classifier::{Predictor, ScoreVector};
use crate::encoder::SequenceEncoder;
use crate::error::Result;
use crate::preprocess::preprocess;

/// Preprocess, encode and predict in one call.
pub struct ScoringPipeline<P: Predictor> {
    encoder: SequenceEncoder,
    predictor: P,
}

impl<P: Predictor> ScoringPipeline<P> {
    pub fn new(encoder: SequenceEncoder, predictor: P) -> Self {
        if encoder.length() != predictor.sequence_length() {
            tracing::warn!(
                "encoder length {} differs from model input length {}",
                encoder.length(),
                predictor.sequence_length()
            );
        }
        Self { encoder, predictor }
    }

    pub fn score(&self, text: &str) -> Result<ScoreVector> {
        let cleaned = preprocess(text);
        let sequence = self.encoder.encode(&cleaned)?;
        self.predictor.predict(&sequence)
    }
}
