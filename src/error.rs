use std::fmt::Display;
use std::path::PathBuf;

/// Why an artifact could not be turned into a tokenizer or a model.
#[derive(Debug)]
pub enum LoadError {
    IOError(std::io::Error),
    SerializationError(serde_json::Error),
    TokenizerError(tokenizers::Error),
    CandleError(candle_core::Error),
    Incompatible(String),
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(err)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err)
    }
}

impl From<tokenizers::Error> for LoadError {
    fn from(err: tokenizers::Error) -> Self {
        Self::TokenizerError(err)
    }
}

impl From<candle_core::Error> for LoadError {
    fn from(err: candle_core::Error) -> Self {
        Self::CandleError(err)
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::IOError(e) => write!(f, "IO error: {}", e),
            Self::SerializationError(e) => write!(f, "serialization error: {}", e),
            Self::TokenizerError(e) => write!(f, "tokenizer error: {}", e),
            Self::CandleError(e) => write!(f, "candle error: {}", e),
            Self::Incompatible(reason) => write!(f, "incompatible artifact: {}", reason),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IOError(e) => Some(e),
            Self::SerializationError(e) => Some(e),
            Self::TokenizerError(e) => Some(&**e),
            Self::CandleError(e) => Some(e),
            Self::Incompatible(_) => None,
        }
    }
}

/// Failure of a forward pass over an encoded sequence.
#[derive(Debug)]
pub enum InferenceError {
    ShapeMismatch { expected: usize, actual: usize },
    TokenOutOfRange { id: u32, vocab_size: usize },
    UnexpectedOutput { expected: usize, actual: usize },
    NonFinite([f32; 2]),
    CandleError(candle_core::Error),
}

impl From<candle_core::Error> for InferenceError {
    fn from(err: candle_core::Error) -> Self {
        Self::CandleError(err)
    }
}

impl Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::ShapeMismatch { expected, actual } => write!(
                f,
                "sequence length {} does not match model input length {}",
                actual, expected
            ),
            Self::TokenOutOfRange { id, vocab_size } => write!(
                f,
                "token id {} is outside the model vocabulary of {}",
                id, vocab_size
            ),
            Self::UnexpectedOutput { expected, actual } => write!(
                f,
                "model produced {} scores, expected {}",
                actual, expected
            ),
            Self::NonFinite([a, b]) => write!(f, "model produced non-finite scores {} {}", a, b),
            Self::CandleError(e) => write!(f, "candle error: {}", e),
        }
    }
}

impl std::error::Error for InferenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CandleError(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum Error {
    Load { path: PathBuf, source: LoadError },
    Encode(tokenizers::Error),
    Inference(InferenceError),
    IOError(std::io::Error),
}

impl Error {
    pub fn load(path: impl Into<PathBuf>, source: impl Into<LoadError>) -> Self {
        Self::Load {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Process exit status reported for this failure. `2` is left to clap for usage errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::IOError(_) => 1,
            Self::Load { .. } => 3,
            Self::Encode(_) | Self::Inference(_) => 4,
        }
    }
}

impl From<InferenceError> for Error {
    fn from(err: InferenceError) -> Self {
        Self::Inference(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::Load { path, source } => {
                write!(f, "failed to load {}: {}", path.display(), source)
            }
            Self::Encode(e) => write!(f, "encoding error: {}", e),
            Self::Inference(e) => write!(f, "inference error: {}", e),
            Self::IOError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load { source, .. } => Some(source),
            Self::Encode(e) => Some(&**e),
            Self::Inference(e) => Some(e),
            Self::IOError(e) => Some(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
