//! Fills a catalog's translations from another game's catalog, joining on
//! the source text alone since the two data sets have unrelated layouts.

pub mod matcher;
pub mod normalize;

use crate::model::catalog::Catalog;
use crate::model::entry::Entry;

use matcher::{SourceIndex, Verdict};

#[derive(Debug)]
pub struct Matched {
    /// Destination entries in their original order.
    pub catalog: Catalog,
    pub matched: usize,
    pub fuzzy: usize,
    /// Destination entries with no counterpart at all.
    pub stale: Catalog,
}

pub fn match_catalogs(destination: &Catalog, source: &Catalog) -> Matched {
    let index = SourceIndex::new(source);

    let mut catalog = Catalog::with_header(destination.header.clone());
    let mut stale = Catalog::with_header(destination.header.clone());
    let mut matched = 0usize;
    let mut fuzzy = 0usize;

    for d in destination.entries() {
        let entry = match index.lookup(&d.original) {
            Verdict::Exact(answer) => {
                matched += 1;
                Entry {
                    translation: answer.to_string(),
                    fuzzy: false,
                    ..d.clone()
                }
            }
            Verdict::Fuzzy(answer) => {
                fuzzy += 1;
                Entry {
                    translation: answer.to_string(),
                    fuzzy: true,
                    ..d.clone()
                }
            }
            Verdict::Unmatched => {
                stale.push(d.clone());
                d.clone()
            }
        };
        catalog.push(entry);
    }

    tracing::debug!(event = "matched", matched, fuzzy, unmatched = stale.len());

    Matched {
        catalog,
        matched,
        fuzzy,
        stale,
    }
}
