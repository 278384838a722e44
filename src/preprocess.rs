/// Characters stripped from text before it is split into words. This is the
/// default filter set word-index tokenizers are fitted with, plus tab and newline.
const FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Normalize raw text into the canonical form the tokenizer vocabulary uses:
/// lowercase, filter characters replaced by spaces, single-space separated words.
pub fn preprocess(text: &str) -> String {
    let filtered: String = text
        .to_lowercase()
        .chars()
        .map(|c| if FILTERS.contains(c) { ' ' } else { c })
        .collect();

    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}
