use crate::model::catalog::Catalog;
use crate::model::entry::Entry;

#[derive(Debug)]
pub struct Merged {
    /// Same entries, in the same order, as the fresh extraction.
    pub merged: Catalog,
    /// Entries of the old catalog that the game data no longer produces.
    pub stale: Catalog,
}

/// Carries translations from `existing` over to a `fresh` extraction.
///
/// Entries are correlated by (context, original) only. Reworded text is a new
/// untranslated entry; text that disappeared from the game ends up in `stale`.
pub fn merge(fresh: &Catalog, existing: &Catalog) -> Merged {
    let header = existing.header.clone().or_else(|| fresh.header.clone());
    let mut merged = Catalog::with_header(header);

    for e in fresh.entries() {
        let entry = match existing.get_by_key(&e.key()) {
            Some(old) => Entry {
                translation: old.translation.clone(),
                fuzzy: old.fuzzy,
                ..e.clone()
            },
            None => e.clone(),
        };
        merged.push(entry);
    }

    let mut stale = Catalog::with_header(existing.header.clone());
    for old in existing.entries() {
        if !fresh.contains_key(&old.key()) {
            stale.push(old.clone());
        }
    }

    tracing::debug!(
        event = "merged",
        entries = merged.len(),
        carried = merged.translated_count(),
        stale = stale.len()
    );

    Merged { merged, stale }
}
