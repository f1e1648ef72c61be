//! Keyword-to-group classification.
//!
//! Keywords are tried in lexicographic order and the first one contained in
//! the lowercased message decides the group. Keyword order therefore matters
//! when a message contains several: `argh` beats `lol`.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    keywords: BTreeMap<String, String>,
}

impl Classifier {
    pub fn new<I, K, G>(keywords: I) -> Self
    where
        I: IntoIterator<Item = (K, G)>,
        K: AsRef<str>,
        G: Into<String>,
    {
        let keywords = keywords
            .into_iter()
            .map(|(k, g)| (k.as_ref().trim().to_lowercase(), g.into()))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Group for `text`, or an empty string when no keyword matches.
    pub fn classify(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        self.keywords
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword.as_str()))
            .map(|(_, group)| group.clone())
            .unwrap_or_default()
    }
}
