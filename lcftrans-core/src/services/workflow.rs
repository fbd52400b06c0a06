use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;

use crate::error::{Error, ParseError, Result};
use crate::model::catalog::Catalog;
use crate::model::config::{Config, Mode};
use crate::model::tree::{DataNode, TreeKind};
use crate::parsers::po;
use crate::services::extract::{self, Category};
use crate::services::{encoding, matching, merge, store};

const DATABASE_FILE: &str = "rpg_rt.ldb";
const MAPTREE_FILE: &str = "rpg_rt.lmt";
const INI_FILE: &str = "rpg_rt.ini";
const MAP_EXT: &str = ".lmu";
const DUMP_EXT: &str = ".json";
const PO_EXT: &str = ".po";
const STALE_EXT: &str = ".stale.po";
const UNMATCHED_EXT: &str = ".unmatched.po";

#[derive(Debug, Default)]
pub struct CatalogReport {
    /// Catalog file name, without directory.
    pub name: String,
    pub category: Option<&'static str>,
    pub terms: usize,
    pub stale: usize,
    pub matched: usize,
    pub fuzzy: usize,
    /// Malformed records dropped while reading catalogs.
    pub skipped_records: usize,
    pub written: bool,
}

#[derive(Debug, Default)]
pub struct FileReport {
    pub source: String,
    pub kind: Option<&'static str>,
    pub catalogs: Vec<CatalogReport>,
    pub decode_errors: usize,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub encoding: Option<String>,
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_some()).count()
    }
}

/// Directory listing as (name, lowercase name), sorted by name.
fn list_dir(dir: &Path) -> Result<Vec<(String, String)>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        match entry.file_name().into_string() {
            Ok(name) => {
                let lower = name.to_lowercase();
                names.push((name, lower));
            }
            Err(name) => tracing::warn!(event = "non_utf8_file_name", name = ?name),
        }
    }
    names.sort();
    Ok(names)
}

fn find_ci<'a>(files: &'a [(String, String)], lower: &str) -> Option<&'a str> {
    files.iter().find(|(_, l)| l == lower).map(|(n, _)| n.as_str())
}

fn kind_of(game_lower: &str) -> Option<TreeKind> {
    if game_lower == DATABASE_FILE {
        Some(TreeKind::Database)
    } else if game_lower == MAPTREE_FILE {
        Some(TreeKind::MapTree)
    } else if game_lower.ends_with(MAP_EXT) {
        Some(TreeKind::Map)
    } else {
        None
    }
}

fn kind_label(kind: &TreeKind) -> &'static str {
    match kind {
        TreeKind::Database => "Database",
        TreeKind::MapTree => "Maptree",
        TreeKind::Map => "Map",
    }
}

pub fn load_dump(path: &Path) -> Result<DataNode> {
    let data = fs::read(path).map_err(|e| Error::io(path, e))?;
    let value: serde_json::Value = serde_json::from_slice(&data).map_err(|e| Error::Dump {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    DataNode::from_json(value).map_err(|reason| Error::Dump {
        path: path.to_path_buf(),
        reason,
    })
}

pub fn run(config: &Config) -> Result<RunReport> {
    config.validate()?;
    match config.mode {
        Mode::Create | Mode::Update => run_extract(config),
        Mode::Match => run_match(config),
    }
}

struct Dump {
    file: String,
    game: String,
    kind: TreeKind,
}

fn run_extract(config: &Config) -> Result<RunReport> {
    let update = config.mode == Mode::Update;
    let out_files = list_dir(&config.output_dir)?;
    let in_files = list_dir(&config.input_dir)?;

    let mut dumps = Vec::new();
    let mut ini: Option<PathBuf> = None;
    for (name, lower) in &in_files {
        if lower == INI_FILE {
            ini = Some(config.input_dir.join(name));
            continue;
        }
        let Some(game_lower) = lower.strip_suffix(DUMP_EXT) else {
            continue;
        };
        if let Some(kind) = kind_of(game_lower) {
            dumps.push(Dump {
                file: name.clone(),
                game: name[..name.len() - DUMP_EXT.len()].to_string(),
                kind,
            });
        }
    }

    // Loaded once: it feeds both encoding detection and extraction.
    let mut database: Option<Result<DataNode>> = dumps
        .iter()
        .find(|d| d.kind == TreeKind::Database)
        .map(|d| load_dump(&config.input_dir.join(&d.file)));

    let db_for_detection = match &database {
        Some(Ok(tree)) => Some(tree),
        _ => None,
    };
    let enc = encoding::resolve(config.encoding.as_deref(), ini.as_deref(), db_for_detection)?;
    tracing::info!(event = "encoding", name = enc.name());

    let mut report = RunReport {
        encoding: Some(enc.name().to_string()),
        files: Vec::new(),
    };

    for dump in &dumps {
        let path = config.input_dir.join(&dump.file);
        tracing::info!(event = "parsing", kind = kind_label(&dump.kind), path = %path.display());

        let mut file = FileReport {
            source: dump.game.clone(),
            kind: Some(kind_label(&dump.kind)),
            ..Default::default()
        };

        let tree = match dump.kind {
            TreeKind::Database => database.take().unwrap_or_else(|| load_dump(&path)),
            _ => load_dump(&path),
        };

        let result = tree.and_then(|tree| {
            extract_file(config, update, &out_files, dump, &tree, enc, &mut file)
        });
        if let Err(e) = result {
            tracing::warn!(event = "file_failed", path = %path.display(), error = %e);
            file.error = Some(e.to_string());
        }

        report.files.push(file);
    }

    Ok(report)
}

fn extract_file(
    config: &Config,
    update: bool,
    out_files: &[(String, String)],
    dump: &Dump,
    tree: &DataNode,
    enc: &'static Encoding,
    file: &mut FileReport,
) -> Result<()> {
    let extraction = extract::extract(tree, &dump.kind, &dump.game, enc, &config.extract);
    file.decode_errors = extraction.decode_errors.len();

    for (category, catalog) in &extraction.catalogs {
        let name = format!("{}{}", dump.game, category.suffix());
        let mut cat_report = CatalogReport {
            name: format!("{name}{PO_EXT}"),
            category: (*category != Category::Single).then(|| category.describe()),
            terms: catalog.len(),
            ..Default::default()
        };

        // Maps and the map tree without text get no catalog at all.
        if *category == Category::Single && catalog.is_empty() {
            file.catalogs.push(cat_report);
            continue;
        }

        let po_name = format!("{name}{PO_EXT}");
        let existing_name = if update {
            find_ci(out_files, &po_name.to_lowercase())
        } else {
            None
        };

        // An existing catalog keeps its spelling, and its stale file follows it.
        let target_name = existing_name.map(str::to_string).unwrap_or(po_name);
        let stem = &target_name[..target_name.len() - PO_EXT.len()];
        let target = config.output_dir.join(&target_name);

        let to_write = match existing_name {
            Some(existing_name) => {
                let parsed = store::read_catalog(&config.output_dir.join(existing_name))?;
                cat_report.skipped_records = parsed.errors.len();

                let merged = merge::merge(catalog, &parsed.catalog);
                cat_report.stale = merged.stale.len();
                if !merged.stale.is_empty() || !parsed.errors.is_empty() {
                    let stale_path = config.output_dir.join(format!("{stem}{STALE_EXT}"));
                    store::write_atomic(&stale_path, stale_text(&merged.stale, &parsed.errors).as_bytes())?;
                }
                merged.merged
            }
            None => catalog.clone(),
        };

        store::write_catalog(&target, &to_write)?;
        cat_report.name = target_name;
        cat_report.written = true;
        file.catalogs.push(cat_report);
    }

    Ok(())
}

/// Stale entries, then the unreadable records of the old catalog as they
/// were, so no translation disappears with the rewrite.
fn stale_text(stale: &Catalog, unreadable: &[ParseError]) -> String {
    let mut text = po::write(stale);
    for err in unreadable {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&err.record);
    }
    text
}

fn run_match(config: &Config) -> Result<RunReport> {
    let Some(source_dir) = config.match_dir.as_deref() else {
        return Err(Error::Config("match mode needs a source directory".into()));
    };

    // Checked up front so a bad output directory fails the run, not each file.
    list_dir(&config.output_dir)?;
    let dst_files = list_dir(&config.input_dir)?;
    let src_files = list_dir(source_dir)?;

    let mut report = RunReport::default();

    for (src_name, src_lower) in &src_files {
        if !src_lower.ends_with(PO_EXT) || src_lower.ends_with(STALE_EXT) || src_lower.ends_with(UNMATCHED_EXT) {
            continue;
        }
        let Some(dst_name) = find_ci(&dst_files, src_lower) else {
            tracing::debug!(event = "match_no_counterpart", name = %src_name);
            continue;
        };

        tracing::info!(event = "matching", name = %dst_name);
        let mut file = FileReport {
            source: dst_name.to_string(),
            ..Default::default()
        };

        let result = match_file(config, &source_dir.join(src_name), dst_name);
        match result {
            Ok(cat_report) => file.catalogs.push(cat_report),
            Err(e) => {
                tracing::warn!(event = "file_failed", name = %dst_name, error = %e);
                file.error = Some(e.to_string());
            }
        }
        report.files.push(file);
    }

    Ok(report)
}

fn match_file(config: &Config, source_path: &Path, dst_name: &str) -> Result<CatalogReport> {
    let source = store::read_catalog(source_path)?;
    let destination = store::read_catalog(&config.input_dir.join(dst_name))?;

    let out = matching::match_catalogs(&destination.catalog, &source.catalog);

    if !out.stale.is_empty() {
        let stem = &dst_name[..dst_name.len() - PO_EXT.len()];
        let unmatched = config.output_dir.join(format!("{stem}{UNMATCHED_EXT}"));
        store::write_catalog(&unmatched, &out.stale)?;
    }
    store::write_catalog(&config.output_dir.join(dst_name), &out.catalog)?;

    Ok(CatalogReport {
        name: dst_name.to_string(),
        category: None,
        terms: out.catalog.len(),
        stale: out.stale.len(),
        matched: out.matched,
        // Includes entries that were already fuzzy before matching.
        fuzzy: out.catalog.fuzzy_count(),
        skipped_records: source.errors.len() + destination.errors.len(),
        written: true,
    })
}
