// optional word prefilter - only messages mentioning a listed word get sent
// to the classifier, which keeps api usage down on busy servers

#[derive(Debug, Clone, Default)]
pub struct TriggerWords {
    // None = filter off, every message is checked
    words: Option<Vec<String>>,
}

impl TriggerWords {
    pub fn disabled() -> Self {
        Self { words: None }
    }

    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        Self { words: Some(words) }
    }

    /// Comma separated list, as kept in the word file.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn is_enabled(&self) -> bool {
        self.words.is_some()
    }

    pub fn len(&self) -> usize {
        self.words.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this message should go to the classifier.
    pub fn matches(&self, content: &str) -> bool {
        let Some(words) = &self.words else {
            return true;
        };

        let content = content.to_lowercase();
        words.iter().any(|w| content.contains(w.as_str()))
    }
}
