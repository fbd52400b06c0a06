use std::sync::OnceLock;

use regex::Regex;

use crate::error::ParseError;
use crate::model::catalog::Catalog;
use crate::model::entry::Entry;

/// Separator between context segments inside `msgctxt`.
pub const CONTEXT_DELIMITER: &str = ".";

#[derive(Debug, Default)]
pub struct Parsed {
    pub catalog: Catalog,
    /// Records that were skipped.
    pub errors: Vec<ParseError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Context,
    Id,
    Str,
}

#[derive(Debug, Default)]
struct Record {
    locations: Vec<String>,
    fuzzy: bool,
    obsolete: bool,
    context: Option<String>,
    id: Option<String>,
    translation: Option<String>,
}

impl Record {
    fn field_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Context => &mut self.context,
            Field::Id => &mut self.id,
            Field::Str => &mut self.translation,
        }
    }
}

fn keyword_re() -> &'static Regex {
    static KEYWORD_RE: OnceLock<Regex> = OnceLock::new();
    KEYWORD_RE.get_or_init(|| {
        Regex::new(r#"^(?P<kw>msgctxt|msgid|msgstr)\s+(?P<value>".*")$"#).expect("static regex")
    })
}

pub fn parse(text: &str) -> Parsed {
    // Editors on Windows like to prepend a byte order mark.
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut parsed = Parsed::default();
    let mut seen_record = false;

    for (start, lines) in blocks(text) {
        let record = match parse_record(&lines) {
            Ok(r) => r,
            Err(reason) => {
                skip(&mut parsed, start, &lines, reason);
                continue;
            }
        };

        if record.obsolete {
            continue;
        }

        let Some(original) = record.id else {
            skip(&mut parsed, start, &lines, "record has no msgid".into());
            continue;
        };

        let is_first = !seen_record;
        seen_record = true;

        if original.is_empty() {
            if is_first && record.context.is_none() {
                let mut raw = lines.join("\n");
                raw.push('\n');
                parsed.catalog.header = Some(raw);
            } else {
                skip(&mut parsed, start, &lines, "empty msgid outside the header".into());
            }
            continue;
        }

        let entry = Entry {
            context: record
                .context
                .map(|c| c.split(CONTEXT_DELIMITER).map(str::to_string).collect())
                .unwrap_or_default(),
            original,
            translation: record.translation.unwrap_or_default(),
            fuzzy: record.fuzzy,
            locations: record.locations,
        };
        parsed.catalog.push(entry);
    }

    parsed
}

fn skip(parsed: &mut Parsed, line: usize, lines: &[&str], reason: String) {
    tracing::warn!(event = "po_record_skipped", line = line, reason = %reason);
    let mut record = lines.join("\n");
    record.push('\n');
    parsed.errors.push(ParseError { line, reason, record });
}

/// Splits `text` into runs of non-blank lines with the 1-based number of the
/// first line of each run.
fn blocks(text: &str) -> Vec<(usize, Vec<&str>)> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut start = 0;

    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push((start, std::mem::take(&mut current)));
            }
            continue;
        }
        if current.is_empty() {
            start = i + 1;
        }
        current.push(line);
    }

    if !current.is_empty() {
        out.push((start, current));
    }

    out
}

fn parse_record(lines: &[&str]) -> Result<Record, String> {
    let mut record = Record::default();
    let mut current: Option<Field> = None;

    for raw in lines {
        let line = raw.trim();

        if line.starts_with("#~") {
            record.obsolete = true;
            continue;
        }

        if let Some(loc) = line.strip_prefix("#:") {
            record.locations.push(loc.trim().to_string());
            continue;
        }

        if let Some(flags) = line.strip_prefix("#,") {
            if flags.split(',').any(|f| f.trim() == "fuzzy") {
                record.fuzzy = true;
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        if line.starts_with('"') {
            let Some(field) = current else {
                return Err(format!("string without keyword: {line}"));
            };
            let piece = unquote(line)?;
            record.field_mut(field).get_or_insert_with(String::new).push_str(&piece);
            continue;
        }

        let Some(caps) = keyword_re().captures(line) else {
            return Err(format!("unrecognized line: {line}"));
        };

        let field = match &caps["kw"] {
            "msgctxt" => Field::Context,
            "msgid" => Field::Id,
            _ => Field::Str,
        };
        let slot = record.field_mut(field);
        if slot.is_some() {
            return Err(format!("duplicate {}", &caps["kw"]));
        }
        *slot = Some(unquote(&caps["value"])?);
        current = Some(field);
    }

    Ok(record)
}

fn unquote(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.len() < 2 || !s.starts_with('"') || !s.ends_with('"') {
        return Err(format!("invalid quoted string: {s}"));
    }

    let inner = &s[1..s.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            if c == '"' {
                return Err(format!("unescaped quote in: {s}"));
            }
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => return Err(format!("dangling backslash in: {s}")),
        }
    }
    Ok(out)
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn write(catalog: &Catalog) -> String {
    let mut out = String::new();
    let mut first = true;

    if let Some(header) = &catalog.header {
        out.push_str(header);
        if !header.ends_with('\n') {
            out.push('\n');
        }
        first = false;
    }

    for e in catalog.entries() {
        if !first {
            out.push('\n');
        }
        first = false;
        write_entry(&mut out, e);
    }

    out
}

fn write_entry(out: &mut String, e: &Entry) {
    for loc in &e.locations {
        out.push_str("#: ");
        out.push_str(loc);
        out.push('\n');
    }
    if e.fuzzy {
        out.push_str("#, fuzzy\n");
    }
    if !e.context.is_empty() {
        write_field(out, "msgctxt", &e.context.join(CONTEXT_DELIMITER));
    }
    write_field(out, "msgid", &e.original);
    write_field(out, "msgstr", &e.translation);
}

fn write_field(out: &mut String, keyword: &str, value: &str) {
    out.push_str(keyword);
    if !value.contains('\n') {
        out.push_str(" \"");
        out.push_str(&escape(value));
        out.push_str("\"\n");
        return;
    }

    out.push_str(" \"\"\n");
    for piece in value.split_inclusive('\n') {
        out.push('"');
        out.push_str(&escape(piece));
        out.push_str("\"\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::DEFAULT_HEADER;
    use pretty_assertions::assert_eq;

    fn ctx(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    const SAMPLE: &str = r#"msgid ""
msgstr ""
"Project-Id-Version: lcftrans\n"
"Language: fr\n"

#: RPG_RT.ldb: actors/1/name
msgctxt "actors.1.name"
msgid "Alex"
msgstr "Alexandre"

#: Map0001.lmu: events/1/pages/0/event_commands, line 3
#: Map0002.lmu: events/4/pages/1/event_commands, line 1
#, fuzzy
msgid ""
"Hello \"there\"\n"
"second line"
msgstr ""
"Bonjour\n"
"deuxième ligne"

msgid "Tab\there"
msgstr ""
"#;

    #[test]
    fn parses_header_entries_and_fields() {
        let parsed = parse(SAMPLE);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);

        let c = &parsed.catalog;
        assert!(c.header.as_deref().unwrap().contains("Language: fr"));
        assert_eq!(c.len(), 3);

        let alex = c.get(&ctx(&["actors", "1", "name"]), "Alex").unwrap();
        assert_eq!(alex.translation, "Alexandre");
        assert!(!alex.fuzzy);
        assert_eq!(alex.locations, vec!["RPG_RT.ldb: actors/1/name"]);

        let hello = c.get(&[], "Hello \"there\"\nsecond line").unwrap();
        assert!(hello.fuzzy);
        assert_eq!(hello.translation, "Bonjour\ndeuxième ligne");
        assert_eq!(hello.locations.len(), 2);

        let tab = c.get(&[], "Tab\there").unwrap();
        assert!(tab.context.is_empty());
        assert_eq!(tab.translation, "");
    }

    #[test]
    fn write_reproduces_own_output() {
        let parsed = parse(SAMPLE);
        assert_eq!(write(&parsed.catalog), SAMPLE);
    }

    #[test]
    fn parse_of_written_catalog_is_equal() {
        let mut c = Catalog::with_default_header();
        let mut e = Entry::fresh(ctx(&["troops", "2", "pages", "0"]), "Line \\ one\nLine two\n")
            .with_location("RPG_RT.ldb: troops/2/pages/0/event_commands, line 1");
        e.translation = "Ligne\tune".into();
        e.fuzzy = true;
        c.push(e);
        c.push(Entry::fresh(Vec::new(), "Plain"));

        let text = write(&c);
        let parsed = parse(&text);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.catalog, c);
        assert_eq!(write(&parsed.catalog), text);
    }

    #[test]
    fn catalog_without_header_writes_no_header() {
        let c: Catalog = vec![Entry::fresh(Vec::new(), "A")].into_iter().collect();
        assert_eq!(write(&c), "msgid \"A\"\nmsgstr \"\"\n");
    }

    #[test]
    fn default_header_is_recognised() {
        let parsed = parse(DEFAULT_HEADER);
        assert_eq!(parsed.catalog.header.as_deref(), Some(DEFAULT_HEADER));
        assert!(parsed.catalog.is_empty());
    }

    #[test]
    fn malformed_records_are_skipped() {
        let text = r#"msgid "Good"
msgstr "Bon"

msgctxt "a"
msgstr "no id"

garbage here
msgid "x"

msgid "Bad "quote""
msgstr ""

msgid ""
msgstr "late header"

msgid "Also good"
msgstr ""
"#;
        let parsed = parse(text);
        assert_eq!(parsed.catalog.len(), 2);
        assert_eq!(parsed.errors.len(), 4);
        assert_eq!(parsed.errors[0].line, 4);
        assert_eq!(parsed.errors[1].line, 7);
        assert!(parsed.catalog.get(&[], "Also good").is_some());
        assert!(parsed.catalog.header.is_none());
    }

    #[test]
    fn obsolete_records_and_other_comments_are_dropped() {
        let text = "# translator note\n#. extracted\nmsgid \"A\"\nmsgstr \"B\"\n\n#~ msgid \"Old\"\n#~ msgstr \"Vieux\"\n";
        let parsed = parse(text);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.catalog.len(), 1);
        assert_eq!(parsed.catalog.get(&[], "A").unwrap().translation, "B");
    }

    #[test]
    fn fuzzy_flag_among_others() {
        let parsed = parse("#, c-format, fuzzy\nmsgid \"%d apples\"\nmsgstr \"%d pommes\"\n");
        assert!(parsed.catalog.get(&[], "%d apples").unwrap().fuzzy);
    }

    #[test]
    fn missing_msgstr_means_untranslated() {
        let parsed = parse("msgid \"Solo\"\n");
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.catalog.get(&[], "Solo").unwrap().translation, "");
    }

    #[test]
    fn escapes_are_symmetric() {
        let raw = "q\"b\\n\nt\tr\r";
        assert_eq!(unquote(&format!("\"{}\"", escape(raw))).unwrap(), raw);
        assert_eq!(unquote(r#""\x""#).unwrap(), "x");
        assert!(unquote(r#""abc\""#).is_err());
    }

    #[test]
    fn leading_byte_order_mark_is_ignored() {
        let parsed = parse("\u{FEFF}msgctxt \"actors.0.name\"\nmsgid \"Alex\"\nmsgstr \"Alexandre\"\n");
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let alex = parsed.catalog.get(&ctx(&["actors", "0", "name"]), "Alex").unwrap();
        assert_eq!(alex.translation, "Alexandre");

        let parsed = parse(&format!("\u{FEFF}{DEFAULT_HEADER}"));
        assert_eq!(parsed.catalog.header.as_deref(), Some(DEFAULT_HEADER));
    }

    #[test]
    fn skipped_record_keeps_its_text() {
        let parsed = parse("msgid \"A\"\nmsgstr \"B\"\n\n#: Map0001.lmu: x\nmsgid \"Bad \"q\"\"\nmsgstr \"Mauvais\"\n");
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].line, 4);
        assert_eq!(
            parsed.errors[0].record,
            "#: Map0001.lmu: x\nmsgid \"Bad \"q\"\"\nmsgstr \"Mauvais\"\n"
        );
    }
}
