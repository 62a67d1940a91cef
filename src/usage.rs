/// Token usage per language for one run, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageRecord {
    entries: Vec<(String, usize)>,
}

impl UsageRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Record `tokens` for `language`, replacing any earlier value.
    pub fn insert(&mut self, language: impl Into<String>, tokens: usize) {
        let language = language.into();
        match self.entries.iter_mut().find(|(lang, _)| *lang == language) {
            Some(entry) => entry.1 = tokens,
            None => self.entries.push((language, tokens)),
        }
    }

    pub fn get(&self, language: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(lang, _)| lang == language)
            .map(|(_, tokens)| *tokens)
    }

    pub fn contains(&self, language: &str) -> bool {
        self.get(language).is_some()
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, tokens)| tokens).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(lang, tokens)| (lang.as_str(), *tokens))
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for UsageRecord {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        let mut record = UsageRecord::new();
        for (language, tokens) in iter {
            record.insert(language, tokens);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record() {
        let record = UsageRecord::new();
        assert!(record.is_empty());
        assert_eq!(record.total(), 0);
        assert_eq!(record.get("日语"), None);
    }

    #[test]
    fn test_insert_and_total() {
        let mut record = UsageRecord::new();
        record.insert("日语", 5);
        record.insert("法语", 6);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("法语"), Some(6));
        assert_eq!(record.total(), 11);
    }

    #[test]
    fn test_insert_replaces_existing() {
        let mut record = UsageRecord::new();
        record.insert("日语", 5);
        record.insert("日语", 9);
        assert_eq!(record.len(), 1);
        assert_eq!(record.total(), 9);
    }

    #[test]
    fn test_iteration_keeps_insertion_order() {
        let record: UsageRecord = [("法语", 6), ("日语", 5), ("德语", 1)].into_iter().collect();
        let langs: Vec<_> = record.iter().map(|(lang, _)| lang).collect();
        assert_eq!(langs, vec!["法语", "日语", "德语"]);
    }

    #[test]
    fn test_reset_clears() {
        let mut record: UsageRecord = [("日语", 5)].into_iter().collect();
        record.reset();
        assert!(record.is_empty());
        assert!(!record.contains("日语"));
    }
}
