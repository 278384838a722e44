use crate::classifier::Classifier;
use crate::encoder::{SequenceEncoder, SequenceShape, WordIndex};
use crate::error::{Error, LoadError, Result};
use crate::model::Config;
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const CONFIG_FILE: &str = "config.json";
pub const WEIGHTS_FILE: &str = "model.safetensors";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub tokenizer: PathBuf,
    pub config: PathBuf,
    pub weights: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            tokenizer: dir.join(TOKENIZER_FILE),
            config: dir.join(CONFIG_FILE),
            weights: dir.join(WEIGHTS_FILE),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let read = || -> std::result::Result<Config, LoadError> {
        let config: Config = serde_json::from_reader(File::open(path)?)?;
        config.validate()?;
        Ok(config)
    };
    read().map_err(|e| Error::load(path, e))
}

pub fn load_tokenizer(path: &Path, shape: SequenceShape) -> Result<SequenceEncoder> {
    let read = || -> std::result::Result<SequenceEncoder, LoadError> {
        let index: WordIndex = fs::read_to_string(path)?.parse()?;
        SequenceEncoder::new(index, shape)
    };
    read().map_err(|e| Error::load(path, e))
}

pub fn load_classifier(path: &Path, config: Config, device: &Device) -> Result<Classifier> {
    if !path.is_file() {
        return Err(Error::load(
            path,
            std::io::Error::from(std::io::ErrorKind::NotFound),
        ));
    }
    let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device) }
        .map_err(|e| Error::load(path, e))?;
    Classifier::new(vb, config).map_err(|e| Error::load(path, e))
}

/// Load the tokenizer and the model, sizing the encoder to the model's input length.
pub fn load(paths: &ArtifactPaths, device: &Device) -> Result<(SequenceEncoder, Classifier)> {
    let config = load_config(&paths.config)?;
    tracing::info!(
        "model config from {}: vocab_size={} sequence_length={} encoder={:?}",
        paths.config.display(),
        config.vocab_size,
        config.sequence_length,
        config.encoder
    );

    let encoder = load_tokenizer(&paths.tokenizer, SequenceShape::from(&config))?;
    tracing::info!(
        "tokenizer from {}: {} words, unknown id {}",
        paths.tokenizer.display(),
        encoder.vocab_size(),
        encoder.unknown_id()
    );
    if encoder.max_id() as usize >= config.vocab_size {
        return Err(Error::load(
            &paths.tokenizer,
            LoadError::Incompatible(format!(
                "tokenizer ids reach {}, the model vocabulary has {}",
                encoder.max_id(),
                config.vocab_size
            )),
        ));
    }

    let classifier = load_classifier(&paths.weights, config, device)?;
    tracing::info!(
        "weights from {}, labels {} / {}",
        paths.weights.display(),
        classifier.config().label(0),
        classifier.config().label(1)
    );
    Ok((encoder, classifier))
}
