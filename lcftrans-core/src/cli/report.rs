use std::io::{self, Write};

use crate::model::config::Mode;
use crate::services::workflow::{CatalogReport, FileReport, RunReport};

fn terms(n: usize) -> &'static str {
    if n == 1 {
        "term"
    } else {
        "terms"
    }
}

fn is_are(n: usize) -> &'static str {
    if n == 1 {
        "term is"
    } else {
        "terms are"
    }
}

/// Console report in the order the files were processed.
pub fn print<W: Write>(out: &mut W, mode: Mode, report: &RunReport) -> io::Result<()> {
    if mode != Mode::Match {
        writeln!(out, "lcftrans")?;
        if let Some(enc) = &report.encoding {
            writeln!(out, "Using encoding {enc}")?;
        }
    }

    for file in &report.files {
        match mode {
            Mode::Match => print_match(out, file)?,
            Mode::Create | Mode::Update => print_extract(out, file)?,
        }
        if let Some(err) = &file.error {
            writeln!(out, " Failed: {err}")?;
        }
    }

    Ok(())
}

fn print_extract<W: Write>(out: &mut W, file: &FileReport) -> io::Result<()> {
    writeln!(out, "Parsing {} {}", file.kind.unwrap_or("File"), file.source)?;
    if file.decode_errors > 0 {
        writeln!(out, " {} {} could not be decoded cleanly", file.decode_errors, is_are(file.decode_errors))?;
    }

    for cat in &file.catalogs {
        match cat.category {
            Some(place) => writeln!(out, " {} {} {place}", cat.terms, terms(cat.terms))?,
            None if cat.terms == 0 => {
                writeln!(out, " Skipped. No terms found.")?;
                continue;
            }
            None => writeln!(out, " {} {}", cat.terms, terms(cat.terms))?,
        }
        print_common(out, cat)?;
        if cat.stale > 0 {
            writeln!(out, " {} {} stale", cat.stale, is_are(cat.stale))?;
        }
    }
    Ok(())
}

fn print_match<W: Write>(out: &mut W, file: &FileReport) -> io::Result<()> {
    writeln!(out, "Matching {}", file.source)?;
    for cat in &file.catalogs {
        writeln!(out, " {} {} matched", cat.matched, terms(cat.matched))?;
        if cat.fuzzy > 0 {
            writeln!(out, " {} {} fuzzy matched", cat.fuzzy, is_are(cat.fuzzy))?;
        }
        if cat.stale > 0 {
            writeln!(out, " {} {} unmatched", cat.stale, is_are(cat.stale))?;
        }
        print_common(out, cat)?;
    }
    Ok(())
}

fn print_common<W: Write>(out: &mut W, cat: &CatalogReport) -> io::Result<()> {
    if cat.skipped_records > 0 {
        writeln!(
            out,
            " {} malformed {} skipped in {}",
            cat.skipped_records,
            if cat.skipped_records == 1 { "record" } else { "records" },
            cat.name
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(mode: Mode, report: &RunReport) -> String {
        let mut buf = Vec::new();
        print(&mut buf, mode, report).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn extract_report() {
        let report = RunReport {
            encoding: Some("Shift_JIS".into()),
            files: vec![
                FileReport {
                    source: "RPG_RT.ldb".into(),
                    kind: Some("Database"),
                    catalogs: vec![
                        CatalogReport {
                            name: "RPG_RT.ldb.po".into(),
                            category: Some("in the database"),
                            terms: 12,
                            stale: 1,
                            ..Default::default()
                        },
                        CatalogReport {
                            name: "RPG_RT.ldb.common.po".into(),
                            category: Some("in Common Events"),
                            terms: 1,
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                },
                FileReport {
                    source: "Map0002.lmu".into(),
                    kind: Some("Map"),
                    catalogs: vec![CatalogReport {
                        name: "Map0002.lmu.po".into(),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
                FileReport {
                    source: "Map0003.lmu".into(),
                    kind: Some("Map"),
                    error: Some("broken".into()),
                    ..Default::default()
                },
            ],
        };

        assert_eq!(
            render(Mode::Update, &report),
            "lcftrans\n\
             Using encoding Shift_JIS\n\
             Parsing Database RPG_RT.ldb\n \
             12 terms in the database\n \
             1 term is stale\n \
             1 term in Common Events\n\
             Parsing Map Map0002.lmu\n \
             Skipped. No terms found.\n\
             Parsing Map Map0003.lmu\n \
             Failed: broken\n"
        );
    }

    #[test]
    fn match_report() {
        let report = RunReport {
            encoding: None,
            files: vec![FileReport {
                source: "Map0001.lmu.po".into(),
                catalogs: vec![CatalogReport {
                    name: "Map0001.lmu.po".into(),
                    matched: 3,
                    fuzzy: 1,
                    stale: 2,
                    skipped_records: 1,
                    ..Default::default()
                }],
                ..Default::default()
            }],
        };

        assert_eq!(
            render(Mode::Match, &report),
            "Matching Map0001.lmu.po\n \
             3 terms matched\n \
             1 term is fuzzy matched\n \
             2 terms are unmatched\n \
             1 malformed record skipped in Map0001.lmu.po\n"
        );
    }
}
