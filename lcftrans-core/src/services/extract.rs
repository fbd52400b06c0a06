use encoding_rs::Encoding;
use indexmap::IndexMap;

use crate::error::Error;
use crate::model::catalog::Catalog;
use crate::model::config::ExtractOptions;
use crate::model::entry::Entry;
use crate::model::tree::{DataNode, TreeKind};
use crate::parsers::po::CONTEXT_DELIMITER;
use crate::services::encoding;

const EVENT_COMMANDS: &str = "event_commands";

const SHOW_MESSAGE: i64 = 10110;
const SHOW_MESSAGE_2: i64 = 20110;
const SHOW_CHOICE_OPTION: i64 = 20140;
const CHANGE_HERO_NAME: i64 = 10610;
const CHANGE_HERO_TITLE: i64 = 10620;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Terms,
    CommonEvents,
    BattleEvents,
    /// The only catalog of a map or map tree.
    Single,
}

impl Category {
    /// Appended to the game file name to form the catalog name.
    pub fn suffix(self) -> &'static str {
        match self {
            Category::Terms | Category::Single => "",
            Category::CommonEvents => ".common",
            Category::BattleEvents => ".battle",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Category::Terms => "in the database",
            Category::CommonEvents => "in Common Events",
            Category::BattleEvents => "in Battle Events",
            Category::Single => "",
        }
    }
}

#[derive(Debug)]
pub struct Extraction {
    /// One catalog per category, in a fixed order.
    pub catalogs: IndexMap<Category, Catalog>,
    /// Leaves that did not decode cleanly; they are kept with U+FFFD.
    pub decode_errors: Vec<Error>,
}

impl Extraction {
    pub fn catalog(&self, category: Category) -> Option<&Catalog> {
        self.catalogs.get(&category)
    }

    pub fn term_count(&self) -> usize {
        self.catalogs.values().map(Catalog::len).sum()
    }
}

struct Walker<'a> {
    kind: &'a TreeKind,
    source: &'a str,
    encoding: &'static Encoding,
    options: &'a ExtractOptions,
    path: Vec<String>,
    builders: IndexMap<Category, Catalog>,
    decode_errors: Vec<Error>,
}

/// Harvests every translatable string of `tree` into fresh catalogs.
/// `source` is the game file name used in location comments.
pub fn extract(
    tree: &DataNode,
    kind: &TreeKind,
    source: &str,
    encoding: &'static Encoding,
    options: &ExtractOptions,
) -> Extraction {
    let categories: &[Category] = match kind {
        TreeKind::Database => &[Category::Terms, Category::CommonEvents, Category::BattleEvents],
        TreeKind::MapTree | TreeKind::Map => &[Category::Single],
    };

    let mut walker = Walker {
        kind,
        source,
        encoding,
        options,
        path: Vec::new(),
        builders: categories
            .iter()
            .map(|c| (*c, Catalog::with_default_header()))
            .collect(),
        decode_errors: Vec::new(),
    };

    walker.walk(tree);

    tracing::debug!(
        event = "extracted",
        source = source,
        terms = walker.builders.values().map(Catalog::len).sum::<usize>(),
        decode_errors = walker.decode_errors.len()
    );

    Extraction {
        catalogs: walker.builders,
        decode_errors: walker.decode_errors,
    }
}

impl Walker<'_> {
    fn walk(&mut self, node: &DataNode) {
        match node {
            DataNode::Map(fields) => {
                for (name, value) in fields {
                    if self.options.skips(name) {
                        continue;
                    }
                    // Segments are joined with the msgctxt delimiter later.
                    self.path.push(name.replace(CONTEXT_DELIMITER, "_"));
                    match value {
                        DataNode::List(commands) if name == EVENT_COMMANDS => self.commands(commands),
                        _ => self.walk(value),
                    }
                    self.path.pop();
                }
            }
            DataNode::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.path.push(i.to_string());
                    self.walk(item);
                    self.path.pop();
                }
            }
            DataNode::Text(bytes) => {
                let text = self.decode(bytes);
                let location = format!("{}: {}", self.source, self.path.join("/"));
                self.add(self.path.clone(), text, location);
            }
            DataNode::Int(_) | DataNode::Other => {}
        }
    }

    /// Event scripts: consecutive message lines form one entry, and only
    /// commands that show text are harvested.
    fn commands(&mut self, commands: &[DataNode]) {
        let mut message: Option<(String, usize)> = None;

        for (i, cmd) in commands.iter().enumerate() {
            let Some(code) = cmd.get("code").and_then(DataNode::as_int) else {
                continue;
            };
            let text = match cmd.get("string").and_then(DataNode::as_bytes) {
                Some(bytes) => self.decode(bytes),
                None => String::new(),
            };

            if code == SHOW_MESSAGE_2 {
                match message.as_mut() {
                    Some((body, _)) => {
                        body.push('\n');
                        body.push_str(&text);
                    }
                    None => message = Some((text, i + 1)),
                }
                continue;
            }

            if let Some((body, line)) = message.take() {
                self.add_command(Vec::new(), body, line);
            }

            match code {
                SHOW_MESSAGE => message = Some((text, i + 1)),
                SHOW_CHOICE_OPTION => self.add_command(vec!["choice".into()], text, i + 1),
                CHANGE_HERO_NAME => self.add_command(vec!["hero_name".into()], text, i + 1),
                CHANGE_HERO_TITLE => self.add_command(vec!["hero_title".into()], text, i + 1),
                _ => {}
            }
        }

        if let Some((body, line)) = message {
            self.add_command(Vec::new(), body, line);
        }
    }

    fn add_command(&mut self, context: Vec<String>, text: String, line: usize) {
        let location = format!("{}: {}, line {line}", self.source, self.path.join("/"));
        self.add(context, text, location);
    }

    fn add(&mut self, context: Vec<String>, text: String, location: String) {
        if text.trim().is_empty() {
            return;
        }
        let category = self.category();
        if let Some(catalog) = self.builders.get_mut(&category) {
            catalog.push(Entry::fresh(context, text).with_location(location));
        }
    }

    fn decode(&mut self, bytes: &[u8]) -> String {
        let (text, had_errors) = encoding::decode(bytes, self.encoding);
        if had_errors {
            let path = format!("{}: {}", self.source, self.path.join("/"));
            tracing::warn!(event = "decode_failed", path = %path, encoding = self.encoding.name());
            self.decode_errors.push(Error::Decode {
                path,
                encoding: self.encoding.name().to_string(),
            });
        }
        text
    }

    fn category(&self) -> Category {
        if *self.kind != TreeKind::Database {
            return Category::Single;
        }
        match self.path.first().map(String::as_str) {
            Some("common_events") => Category::CommonEvents,
            Some("troops") if self.path.iter().any(|s| s == "pages") => Category::BattleEvents,
            _ => Category::Terms,
        }
    }
}
