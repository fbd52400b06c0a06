use indexmap::IndexMap;

use super::entry::{Entry, EntryKey};

/// Metadata record written at the top of every catalog the tool creates.
pub const DEFAULT_HEADER: &str = "msgid \"\"\n\
msgstr \"\"\n\
\"Project-Id-Version: lcftrans\\n\"\n\
\"MIME-Version: 1.0\\n\"\n\
\"Content-Type: text/plain; charset=UTF-8\\n\"\n\
\"Content-Transfer-Encoding: 8bit\\n\"\n";

/// Ordered set of entries, unique by (context, original).
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Raw text of the leading metadata record, kept verbatim.
    pub header: Option<String>,
    entries: IndexMap<EntryKey, Entry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(header: Option<String>) -> Self {
        Catalog {
            header,
            entries: IndexMap::new(),
        }
    }

    pub fn with_default_header() -> Self {
        Self::with_header(Some(DEFAULT_HEADER.to_string()))
    }

    /// Appends `entry`, or folds its locations into the entry that already
    /// owns the same key. Returns `true` when a new entry was added.
    pub fn push(&mut self, entry: Entry) -> bool {
        match self.entries.get_mut(&entry.key()) {
            Some(existing) => {
                tracing::debug!(
                    event = "catalog_duplicate",
                    original = %entry.original,
                    context = %entry.context.join(".")
                );
                existing.absorb_locations(entry.locations);
                false
            }
            None => {
                self.entries.insert(entry.key(), entry);
                true
            }
        }
    }

    pub fn get(&self, context: &[String], original: &str) -> Option<&Entry> {
        // IndexMap lookups need an owned key of the stored type.
        self.entries.get(&(context.to_vec(), original.to_string()))
    }

    pub fn get_by_key(&self, key: &EntryKey) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &EntryKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn translated_count(&self) -> usize {
        self.entries().filter(|e| e.is_translated()).count()
    }

    pub fn fuzzy_count(&self) -> usize {
        self.entries().filter(|e| e.fuzzy).count()
    }
}

// Entry order is part of a catalog's value.
impl PartialEq for Catalog {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header && self.entries().eq(other.entries())
    }
}

impl Eq for Catalog {}

impl FromIterator<Entry> for Catalog {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for e in iter {
            catalog.push(e);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keeps_insertion_order() {
        let c: Catalog = ["b", "a", "c"]
            .iter()
            .map(|s| Entry::fresh(Vec::new(), *s))
            .collect();
        let order: Vec<_> = c.entries().map(|e| e.original.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn duplicate_key_merges_locations_first_wins() {
        let mut c = Catalog::new();
        let mut first = Entry::fresh(Vec::new(), "Hello").with_location("Map0001.lmu: x");
        first.translation = "Bonjour".into();
        let mut second = Entry::fresh(Vec::new(), "Hello").with_location("Map0002.lmu: y");
        second.translation = "Salut".into();

        assert!(c.push(first));
        assert!(!c.push(second));
        assert_eq!(c.len(), 1);

        let e = c.get(&[], "Hello").unwrap();
        assert_eq!(e.translation, "Bonjour");
        assert_eq!(e.locations, vec!["Map0001.lmu: x", "Map0002.lmu: y"]);
    }

    #[test]
    fn same_text_different_context_is_distinct() {
        let mut c = Catalog::new();
        c.push(Entry::fresh(ctx(&["actors", "1", "name"]), "Alex"));
        c.push(Entry::fresh(ctx(&["actors", "2", "name"]), "Alex"));
        assert_eq!(c.len(), 2);
        assert!(c.get(&ctx(&["actors", "2", "name"]), "Alex").is_some());
        assert!(c.get(&ctx(&["actors", "3", "name"]), "Alex").is_none());
    }

    #[test]
    fn equality_respects_order() {
        let ab: Catalog = vec![Entry::fresh(Vec::new(), "a"), Entry::fresh(Vec::new(), "b")].into_iter().collect();
        let ba: Catalog = vec![Entry::fresh(Vec::new(), "b"), Entry::fresh(Vec::new(), "a")].into_iter().collect();
        assert_ne!(ab, ba);
        assert_eq!(ab, ab.clone());
    }

    #[test]
    fn counts_translated_and_fuzzy() {
        let mut a = Entry::fresh(Vec::new(), "a");
        a.translation = "A".into();
        let mut b = Entry::fresh(Vec::new(), "b");
        b.translation = "B?".into();
        b.fuzzy = true;
        let c: Catalog = vec![a, b, Entry::fresh(Vec::new(), "c")].into_iter().collect();
        assert_eq!(c.translated_count(), 2);
        assert_eq!(c.fuzzy_count(), 1);
    }
}
