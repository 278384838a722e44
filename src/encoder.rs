use crate::error::{Error, LoadError, Result};
use crate::model::{Config, Side};
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use tokenizers::{
    PaddingDirection, PaddingParams, PaddingStrategy, Tokenizer, TruncationDirection,
    TruncationParams,
};

/// Token registered, at the padding id, for unknown words when the vocabulary does not name one.
pub const DEFAULT_OOV_TOKEN: &str = "<OOV>";
pub const PAD_ID: u32 = 0;
const PAD_TOKEN: &str = "<PAD>";

/// Fixed-length id sequence ready to be fed to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence(Vec<u32>);

impl Sequence {
    pub fn new(ids: Vec<u32>) -> Self {
        Self(ids)
    }

    pub fn ids(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Word to id mapping as produced when the tokenizer was fitted.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WordIndex {
    pub word_index: HashMap<String, u32>,
    #[serde(default)]
    pub oov_token: Option<String>,
    #[serde(default)]
    pub num_words: Option<usize>,
}

#[derive(Deserialize)]
struct KerasTokenizerConfig {
    /// JSON object serialized as a string.
    word_index: String,
    #[serde(default)]
    oov_token: Option<String>,
    #[serde(default)]
    num_words: Option<usize>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TokenizerArtifact {
    Keras {
        class_name: String,
        config: KerasTokenizerConfig,
    },
    Plain(WordIndex),
}

impl FromStr for WordIndex {
    type Err = LoadError;

    /// Accepts either a plain `{"word_index": {...}}` document or a
    /// `Tokenizer.to_json()` export whose `config.word_index` is a JSON string.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match serde_json::from_str::<TokenizerArtifact>(s)? {
            TokenizerArtifact::Plain(index) => Ok(index),
            TokenizerArtifact::Keras { class_name, config } => {
                if class_name != "Tokenizer" {
                    return Err(LoadError::Incompatible(format!(
                        "expected a Tokenizer export, found {}",
                        class_name
                    )));
                }
                Ok(Self {
                    word_index: serde_json::from_str(&config.word_index)?,
                    oov_token: config.oov_token,
                    num_words: config.num_words,
                })
            }
        }
    }
}

/// Target length of encoded sequences and where padding/truncation happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceShape {
    pub length: usize,
    pub padding: Side,
    pub truncating: Side,
}

impl From<&Config> for SequenceShape {
    fn from(config: &Config) -> Self {
        Self {
            length: config.sequence_length,
            padding: config.padding,
            truncating: config.truncating,
        }
    }
}

#[derive(Clone)]
pub struct SequenceEncoder {
    tokenizer: Tokenizer,
    unknown_id: u32,
    max_id: u32,
    length: usize,
}

impl SequenceEncoder {
    pub fn new(index: WordIndex, shape: SequenceShape) -> std::result::Result<Self, LoadError> {
        let WordIndex {
            mut word_index,
            oov_token,
            num_words,
        } = index;

        if let Some((word, _)) = word_index.iter().find(|&(_, &id)| id == PAD_ID) {
            return Err(LoadError::Incompatible(format!(
                "word {:?} uses id {}, which is reserved for padding",
                word, PAD_ID
            )));
        }

        let unk_token = oov_token.unwrap_or_else(|| DEFAULT_OOV_TOKEN.to_string());
        // Words past the `num_words` limit fall back to the unknown id.
        if let Some(limit) = num_words {
            word_index.retain(|word, id| (*id as usize) < limit || *word == unk_token);
        }
        // Without an OOV entry, unknown words encode like padding, which every embedding covers.
        let unknown_id = *word_index.entry(unk_token.clone()).or_insert(PAD_ID);
        let max_id = word_index.values().copied().max().unwrap_or(PAD_ID);

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": { "type": "WhitespaceSplit" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": word_index,
                "unk_token": unk_token,
            }
        });
        let mut tokenizer = Tokenizer::from_str(&tokenizer_json.to_string())?;
        tokenizer
            .with_padding(Some(PaddingParams {
                strategy: PaddingStrategy::Fixed(shape.length),
                direction: match shape.padding {
                    Side::Pre => PaddingDirection::Left,
                    Side::Post => PaddingDirection::Right,
                },
                pad_id: PAD_ID,
                pad_token: PAD_TOKEN.to_string(),
                ..Default::default()
            }))
            .with_truncation(Some(TruncationParams {
                max_length: shape.length,
                direction: match shape.truncating {
                    Side::Pre => TruncationDirection::Left,
                    Side::Post => TruncationDirection::Right,
                },
                ..Default::default()
            }))?;

        Ok(Self {
            tokenizer,
            unknown_id,
            max_id,
            length: shape.length,
        })
    }

    /// Map each whitespace-separated word to its id and pad or truncate to the fixed length.
    pub fn encode(&self, text: &str) -> Result<Sequence> {
        let encoding = self.tokenizer.encode(text, false).map_err(Error::Encode)?;
        Ok(Sequence::new(encoding.get_ids().to_vec()))
    }

    pub fn unknown_id(&self) -> u32 {
        self.unknown_id
    }

    /// Highest id `encode` can produce.
    pub fn max_id(&self) -> u32 {
        self.max_id
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(length: usize) -> SequenceShape {
        SequenceShape {
            length,
            padding: Side::Post,
            truncating: Side::Post,
        }
    }

    fn index(words: &[(&str, u32)]) -> WordIndex {
        WordIndex {
            word_index: words.iter().map(|(w, id)| (w.to_string(), *id)).collect(),
            oov_token: None,
            num_words: None,
        }
    }

    fn toy_encoder(length: usize) -> SequenceEncoder {
        SequenceEncoder::new(
            index(&[("hello", 1), ("world", 2)]),
            post(length),
        )
        .unwrap()
    }

    #[test]
    fn pads_known_words_on_the_right() {
        let encoder = toy_encoder(5);
        let sequence = encoder.encode("hello world").unwrap();
        assert_eq!(sequence.ids(), &[1, 2, 0, 0, 0]);
    }

    #[test]
    fn unknown_word_uses_reserved_id() {
        let encoder = toy_encoder(5);
        assert_eq!(encoder.unknown_id(), PAD_ID);
        let sequence = encoder.encode("hello xyzzy world").unwrap();
        assert_eq!(sequence.ids(), &[1, 0, 2, 0, 0]);
        assert!(sequence.ids().iter().all(|&id| id <= 2));
    }

    #[test]
    fn num_words_without_oov_token_stays_in_range() {
        let mut words = index(&[("the", 1), ("cat", 2), ("sat", 3), ("mat", 4)]);
        words.num_words = Some(3);
        let encoder = SequenceEncoder::new(words, post(5)).unwrap();
        assert_eq!(encoder.unknown_id(), PAD_ID);
        assert_eq!(encoder.max_id(), 2);
        assert_eq!(encoder.encode("the cat sat on mat").unwrap().ids(), &[1, 2, 0, 0, 0]);
    }

    #[test]
    fn named_oov_token_is_reused() {
        let mut words = index(&[("<unk>", 1), ("hello", 2), ("world", 3)]);
        words.oov_token = Some("<unk>".to_string());
        let encoder = SequenceEncoder::new(words, post(4)).unwrap();
        assert_eq!(encoder.unknown_id(), 1);
        assert_eq!(encoder.encode("world xyzzy hello").unwrap().ids(), &[3, 1, 2, 0]);
    }

    #[test]
    fn output_length_is_fixed() {
        let encoder = toy_encoder(5);
        for text in ["", "hello", "hello world", "hello world hello world hello world xyzzy"] {
            let sequence = encoder.encode(text).unwrap();
            assert_eq!(sequence.len(), 5, "text: {:?}", text);
            assert!(!sequence.is_empty());
        }
        assert_eq!(encoder.length(), 5);
    }

    #[test]
    fn empty_text_is_all_padding() {
        let encoder = toy_encoder(3);
        assert_eq!(encoder.encode("").unwrap().ids(), &[0, 0, 0]);
    }

    #[test]
    fn truncates_tail_by_default() {
        let encoder = toy_encoder(2);
        assert_eq!(encoder.encode("hello hello world").unwrap().ids(), &[1, 1]);
    }

    #[test]
    fn pre_padding_and_pre_truncation() {
        let shape = SequenceShape {
            length: 3,
            padding: Side::Pre,
            truncating: Side::Pre,
        };
        let encoder = SequenceEncoder::new(index(&[("hello", 1), ("world", 2)]), shape).unwrap();
        assert_eq!(encoder.encode("world").unwrap().ids(), &[0, 0, 2]);
        assert_eq!(
            encoder.encode("world world hello world").unwrap().ids(),
            &[2, 1, 2]
        );
    }

    #[test]
    fn num_words_limits_vocabulary() {
        let mut words = index(&[("<OOV>", 1), ("the", 2), ("cat", 3), ("sat", 4)]);
        words.oov_token = Some("<OOV>".to_string());
        words.num_words = Some(3);
        let encoder = SequenceEncoder::new(words, post(3)).unwrap();
        assert_eq!(encoder.encode("the cat sat").unwrap().ids(), &[2, 1, 1]);
    }

    #[test]
    fn padding_id_cannot_be_a_word() {
        let result = SequenceEncoder::new(index(&[("hello", 0)]), post(3));
        assert!(matches!(result, Err(LoadError::Incompatible(_))));
    }

    #[test]
    fn encoding_is_deterministic() {
        let encoder = toy_encoder(6);
        let first = encoder.encode("hello xyzzy world").unwrap();
        let second = encoder.encode("hello xyzzy world").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn parses_plain_word_index() {
        let parsed: WordIndex =
            r#"{"word_index": {"hello": 1, "world": 2}, "oov_token": null}"#.parse().unwrap();
        assert_eq!(parsed, index(&[("hello", 1), ("world", 2)]));
    }

    #[test]
    fn parses_keras_tokenizer_export() {
        let export = serde_json::json!({
            "class_name": "Tokenizer",
            "config": {
                "num_words": 1000,
                "filters": "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n",
                "lower": true,
                "split": " ",
                "char_level": false,
                "oov_token": "<OOV>",
                "document_count": 2,
                "word_index": "{\"<OOV>\": 1, \"hello\": 2, \"world\": 3}"
            }
        });
        let parsed: WordIndex = export.to_string().parse().unwrap();
        assert_eq!(parsed.oov_token.as_deref(), Some("<OOV>"));
        assert_eq!(parsed.num_words, Some(1000));
        assert_eq!(parsed.word_index.get("world"), Some(&3));
    }

    #[test]
    fn rejects_other_keras_classes() {
        let export = r#"{"class_name": "TextVectorization", "config": {"word_index": "{}"}}"#;
        assert!(matches!(
            export.parse::<WordIndex>(),
            Err(LoadError::Incompatible(_))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            "{\"word_index\": [1, 2]}".parse::<WordIndex>(),
            Err(LoadError::SerializationError(_))
        ));
    }
}
