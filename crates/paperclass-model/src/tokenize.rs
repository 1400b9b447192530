//! Tokenizer loading and truncating encoder

use paperclass_core::{Error, Result};
use std::path::{Path, PathBuf};
use tokenizers::{Tokenizer, TruncationDirection, TruncationParams, TruncationStrategy};

/// Token ids and masks for a single input sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedText {
    pub ids: Vec<u32>,
    pub type_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
}

impl EncodedText {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Tokenizer configured to cut every input to `max_length` tokens.
///
/// Truncation keeps the head of the text and always leaves room for the
/// special tokens added by the tokenizer's post-processor.
pub struct TextEncoder {
    tokenizer: Tokenizer,
    max_length: usize,
}

impl TextEncoder {
    /// Wrap a tokenizer, replacing its truncation and padding settings
    pub fn new(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self> {
        if max_length == 0 {
            return Err(Error::config("max_length must be positive"));
        }

        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                strategy: TruncationStrategy::LongestFirst,
                direction: TruncationDirection::Right,
                stride: 0,
            }))
            .map_err(|e| Error::tokenizer(format!("Failed to configure truncation: {}", e)))?;

        Ok(Self {
            tokenizer,
            max_length,
        })
    }

    /// Load `tokenizer.json` from disk
    pub fn from_file(path: &Path, max_length: usize) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            Error::model_load(format!("Failed to load tokenizer {}: {}", path.display(), e))
        })?;
        Self::new(tokenizer, max_length)
    }

    /// Tokenize a single text, truncating to `max_length`
    pub fn encode(&self, text: &str) -> Result<EncodedText> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::tokenizer(format!("Tokenization failed: {}", e)))?;

        Ok(EncodedText {
            ids: encoding.get_ids().to_vec(),
            type_ids: encoding.get_type_ids().to_vec(),
            attention_mask: encoding.get_attention_mask().to_vec(),
        })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

/// Find `tokenizer.json`, first match wins: explicit path, adapter
/// directory, base model files, then `fallback` (typically a hub download),
/// which runs only when every local candidate is missing.
pub fn locate_tokenizer<F>(
    explicit: Option<&Path>,
    adapter_dir: &Path,
    base_model: Option<&Path>,
    fallback: F,
) -> Result<PathBuf>
where
    F: FnOnce() -> Option<Result<PathBuf>>,
{
    let mut tried = Vec::new();

    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        tried.push(path.display().to_string());
    }

    let in_adapter = adapter_dir.join("tokenizer.json");
    if in_adapter.is_file() {
        return Ok(in_adapter);
    }
    tried.push(in_adapter.display().to_string());

    if let Some(path) = base_model {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        tried.push(path.display().to_string());
    }

    match fallback() {
        Some(Ok(path)) => return Ok(path),
        Some(Err(e)) => tried.push(e.to_string()),
        None => {}
    }

    Err(Error::model_load(format!(
        "No tokenizer.json found (tried: {}). Pass --tokenizer or set \
         PAPERCLASS_TOKENIZER_PATH to a DeBERTa-v3 tokenizer.json, or set model.tokenizer_repo",
        tried.join(", ")
    )))
}


#[cfg(test)]
mod tests {
    use super::test_support::word_tokenizer;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_short_text_keeps_all_tokens() {
        let encoder = TextEncoder::new(word_tokenizer(), 16).unwrap();
        let encoded = encoder.encode("we study ideals of rings").unwrap();

        assert_eq!(encoded.ids, vec![2, 4, 5, 6, 7, 8, 3]);
        assert_eq!(encoded.attention_mask, vec![1; 7]);
        assert_eq!(encoded.type_ids.len(), 7);
    }

    #[test]
    fn test_long_text_truncated_with_special_tokens() {
        let encoder = TextEncoder::new(word_tokenizer(), 6).unwrap();
        let text = "we study ideals of rings ".repeat(200);
        let encoded = encoder.encode(&text).unwrap();

        assert_eq!(encoded.len(), 6);
        assert_eq!(encoded.ids.first(), Some(&2));
        assert_eq!(encoded.ids.last(), Some(&3));
        // Head of the text survives
        assert_eq!(&encoded.ids[1..5], &[4, 5, 6, 7]);
    }

    #[test]
    fn test_empty_text_is_just_special_tokens() {
        let encoder = TextEncoder::new(word_tokenizer(), 8).unwrap();
        let encoded = encoder.encode("").unwrap();
        assert_eq!(encoded.ids, vec![2, 3]);
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let encoder = TextEncoder::new(word_tokenizer(), 8).unwrap();
        let encoded = encoder.encode("quantum graphs").unwrap();
        assert_eq!(encoded.ids, vec![2, 0, 9, 3]);
    }

    #[test]
    fn test_zero_max_length_rejected() {
        assert!(TextEncoder::new(word_tokenizer(), 0).is_err());
    }

    #[test]
    fn test_locate_prefers_explicit_then_adapter() {
        let tmp = TempDir::new().unwrap();
        let adapter = tmp.path().join("adapter");
        std::fs::create_dir_all(&adapter).unwrap();
        let explicit = tmp.path().join("custom.json");

        // Nothing exists yet
        let err = locate_tokenizer(Some(&explicit), &adapter, None, || None).unwrap_err();
        assert!(err.to_string().contains("custom.json"));
        assert!(err.to_string().contains("PAPERCLASS_TOKENIZER_PATH"));

        std::fs::write(adapter.join("tokenizer.json"), "{}").unwrap();
        assert_eq!(
            locate_tokenizer(Some(&explicit), &adapter, None, || None).unwrap(),
            adapter.join("tokenizer.json")
        );

        std::fs::write(&explicit, "{}").unwrap();
        assert_eq!(
            locate_tokenizer(Some(&explicit), &adapter, None, || None).unwrap(),
            explicit
        );
    }

    #[test]
    fn test_locate_falls_back_to_base_model() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("tokenizer.json");
        std::fs::write(&base, "{}").unwrap();
        let adapter = tmp.path().join("missing-adapter");

        assert_eq!(locate_tokenizer(None, &adapter, Some(&base), || None).unwrap(), base);
    }

    #[test]
    fn test_locate_uses_fallback_only_when_nothing_local() {
        let tmp = TempDir::new().unwrap();
        let adapter = tmp.path().join("adapter");
        let downloaded = tmp.path().join("downloaded.json");

        let found = locate_tokenizer(None, &adapter, None, || Some(Ok(downloaded.clone()))).unwrap();
        assert_eq!(found, downloaded);

        std::fs::create_dir_all(&adapter).unwrap();
        std::fs::write(adapter.join("tokenizer.json"), "{}").unwrap();
        let found = locate_tokenizer(None, &adapter, None, || -> Option<Result<PathBuf>> {
            panic!("fallback must not run when a local tokenizer exists")
        })
        .unwrap();
        assert_eq!(found, adapter.join("tokenizer.json"));
    }

    #[test]
    fn test_locate_reports_fallback_failure() {
        let tmp = TempDir::new().unwrap();
        let err = locate_tokenizer(None, &tmp.path().join("adapter"), None, || {
            Some(Err(Error::model_load("hub unreachable")))
        })
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("hub unreachable"));
        assert!(message.contains("--tokenizer"));
    }
}
