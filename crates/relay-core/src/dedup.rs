use std::collections::HashSet;

/// Original texts already delivered by earlier runs.
///
/// Exact string equality only. Loaded once per run and never updated while
/// the run is in progress.
#[derive(Clone, Debug, Default)]
pub struct DedupIndex {
    texts: HashSet<String>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.texts.contains(text)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

impl FromIterator<String> for DedupIndex {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            texts: iter.into_iter().collect(),
        }
    }
}

/// True iff `text` was delivered before. Logging the skip is up to the caller.
pub fn should_skip(index: &DedupIndex, text: &str) -> bool {
    index.contains(text)
}
