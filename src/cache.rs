use std::collections::HashMap;
use std::fmt;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::catalog::QuestionType;

/// Digest over the current source content: text followed by the transport
/// encoding of every image, in list order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    pub fn compute<S: AsRef<str>>(source_text: &str, encoded_images: &[S]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source_text.as_bytes());
        for image in encoded_images {
            hasher.update(image.as_ref().as_bytes());
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw model responses per question type, valid only for one fingerprint.
#[derive(Debug, Default)]
pub struct GenerationCache {
    fingerprint: Option<ContentFingerprint>,
    entries: HashMap<QuestionType, String>,
}

impl GenerationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry when `fingerprint` differs from the stored one.
    /// Returns true if the cache was cleared.
    pub fn invalidate_if_stale(&mut self, fingerprint: &ContentFingerprint) -> bool {
        if self.fingerprint.as_ref() == Some(fingerprint) {
            return false;
        }
        if !self.entries.is_empty() {
            info!(
                dropped = self.entries.len(),
                fingerprint = fingerprint.as_str(),
                "Source content changed, clearing response cache"
            );
        }
        self.entries.clear();
        self.fingerprint = Some(fingerprint.clone());
        true
    }

    pub fn get(&self, question_type: QuestionType) -> Option<&str> {
        self.entries.get(&question_type).map(String::as_str)
    }

    pub fn insert(&mut self, question_type: QuestionType, raw_response: String) {
        self.entries.insert(question_type, raw_response);
    }

    pub fn contains(&self, question_type: QuestionType) -> bool {
        self.entries.contains_key(&question_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fingerprint(&self) -> Option<&ContentFingerprint> {
        self.fingerprint.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_depends_on_images_and_order() {
        let none: [&str; 0] = [];
        let a = ContentFingerprint::compute("text", &["img1", "img2"]);
        let b = ContentFingerprint::compute("text", &["img2", "img1"]);
        let c = ContentFingerprint::compute("text", &none);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, ContentFingerprint::compute("text", &["img1", "img2"]));
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn stale_fingerprint_clears_entries() {
        let mut cache = GenerationCache::new();
        let none: [&str; 0] = [];
        let first = ContentFingerprint::compute("one", &none);
        assert!(cache.invalidate_if_stale(&first));
        cache.insert(QuestionType::Kprim, "raw".to_string());
        assert!(!cache.invalidate_if_stale(&first));
        assert_eq!(cache.get(QuestionType::Kprim), Some("raw"));

        let second = ContentFingerprint::compute("two", &none);
        assert!(cache.invalidate_if_stale(&second));
        assert!(cache.is_empty());
        assert_eq!(cache.fingerprint(), Some(&second));
    }
}
