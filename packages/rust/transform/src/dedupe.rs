//! First-seen email deduplication.

use std::collections::HashSet;

/// The set of email keys already admitted during one pipeline run.
///
/// Keys are compared by exact string match after a single trim; case and
/// interior-whitespace variants are intentionally treated as distinct keys.
/// The index only ever grows.
#[derive(Debug, Default)]
pub struct DedupeIndex {
    seen: HashSet<String>,
}

impl DedupeIndex {
    /// Create an empty index for a new run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit the first occurrence of a non-empty trimmed email.
    ///
    /// Returns `true` (admit) the first time a key is seen and `false`
    /// thereafter. An empty email is always rejected and never touches the
    /// index, so it cannot block or be blocked by other rows.
    pub fn admit(&mut self, email: &str) -> bool {
        let key = email.trim();
        if key.is_empty() {
            return false;
        }
        self.seen.insert(key.to_string())
    }

    /// Number of distinct keys admitted so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// True when nothing has been admitted yet.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
