//! Bad-word masking.
//!
//! A whitespace-delimited token is censored when it contains any banned
//! word, case-insensitively. The token keeps its first character and the
//! rest is replaced with a repeating `#%@$!` cycle, so `crappy` becomes
//! `c#%@$!`. Whitespace between tokens is left exactly as it was.

const MASK: [char; 5] = ['#', '%', '@', '$', '!'];

/// Outcome of censoring one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Censored {
    pub text: String,
    /// Number of tokens that matched a banned word.
    pub count: usize,
}

impl Censored {
    /// True when censoring produced something different from `original`.
    /// Callers must not persist an unchanged result.
    pub fn changed(&self, original: &str) -> bool {
        self.count > 0 && self.text != original
    }
}

#[derive(Debug, Clone, Default)]
pub struct Censor {
    banned: Vec<String>,
}

impl Censor {
    pub fn new<I, S>(banned: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let banned = banned
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { banned }
    }

    pub fn len(&self) -> usize {
        self.banned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banned.is_empty()
    }

    pub fn censor(&self, text: &str) -> Censored {
        let mut out = String::with_capacity(text.len());
        let mut count = 0;

        for (is_space, segment) in segments(text) {
            if !is_space && self.is_banned(segment) {
                out.push_str(&mask(segment));
                count += 1;
            } else {
                out.push_str(segment);
            }
        }

        Censored { text: out, count }
    }

    fn is_banned(&self, token: &str) -> bool {
        let lowered = token.to_lowercase();
        self.banned.iter().any(|w| lowered.contains(w.as_str()))
    }
}

fn mask(token: &str) -> String {
    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut masked = String::with_capacity(token.len());
    masked.push(first);
    for (i, _) in chars.enumerate() {
        masked.push(MASK[i % MASK.len()]);
    }
    masked
}

/// Split into alternating runs of whitespace and non-whitespace.
fn segments(text: &str) -> Vec<(bool, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;

    for (i, c) in text.char_indices() {
        let is_space = c.is_whitespace();
        match current {
            Some(kind) if kind == is_space => {}
            Some(kind) => {
                out.push((kind, &text[start..i]));
                start = i;
                current = Some(is_space);
            }
            None => current = Some(is_space),
        }
    }
    if let Some(kind) = current {
        out.push((kind, &text[start..]));
    }
    out
}
