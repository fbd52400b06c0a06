/// (context, original): the only thing that ties an entry to the same text
/// across two extraction runs.
pub type EntryKey = (Vec<String>, String);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub context: Vec<String>,
    pub original: String,
    pub translation: String,
    pub fuzzy: bool,
    pub locations: Vec<String>,
}

impl Entry {
    /// Untranslated entry as produced by extraction.
    pub fn fresh(context: Vec<String>, original: impl Into<String>) -> Self {
        Entry {
            context,
            original: original.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.locations.push(location.into());
        self
    }

    pub fn key(&self) -> EntryKey {
        (self.context.clone(), self.original.clone())
    }

    pub fn is_translated(&self) -> bool {
        !self.translation.trim().is_empty()
    }

    /// Adds locations not already listed, keeping their order.
    pub fn absorb_locations<I>(&mut self, locations: I)
    where
        I: IntoIterator<Item = String>,
    {
        for loc in locations {
            if !self.locations.contains(&loc) {
                self.locations.push(loc);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_untranslated() {
        let e = Entry::fresh(vec!["actors".into(), "1".into(), "name".into()], "Alex");
        assert!(!e.is_translated());
        assert!(!e.fuzzy);
        assert_eq!(e.key(), (vec!["actors".to_string(), "1".into(), "name".into()], "Alex".to_string()));
    }

    #[test]
    fn absorb_skips_known_locations() {
        let mut e = Entry::fresh(Vec::new(), "Hi").with_location("Map0001.lmu: a");
        e.absorb_locations(vec!["Map0001.lmu: a".to_string(), "Map0002.lmu: b".to_string()]);
        assert_eq!(e.locations, vec!["Map0001.lmu: a", "Map0002.lmu: b"]);
    }

    #[test]
    fn whitespace_translation_counts_as_empty() {
        let mut e = Entry::fresh(Vec::new(), "Hi");
        e.translation = "  ".into();
        assert!(!e.is_translated());
    }
}
