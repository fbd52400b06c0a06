use std::fs;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, WINDOWS_1252};

use crate::error::{Error, Result};
use crate::model::tree::DataNode;

/// Maps a Windows code page number, as RPG_RT.ini stores it, to a label.
fn codepage_label(codepage: &str) -> Option<&'static str> {
    Some(match codepage {
        "932" => "shift_jis",
        "936" => "gbk",
        "949" => "euc-kr",
        "950" => "big5",
        "1250" => "windows-1250",
        "1251" => "windows-1251",
        "1252" => "windows-1252",
        "1253" => "windows-1253",
        "1254" => "windows-1254",
        "1255" => "windows-1255",
        "1256" => "windows-1256",
        "1257" => "windows-1257",
        "1258" => "windows-1258",
        "65001" => "utf-8",
        _ => return None,
    })
}

/// Resolves an encoding label or code page number.
pub fn lookup(label: &str) -> Result<&'static Encoding> {
    let trimmed = label.trim();
    let label = codepage_label(trimmed).unwrap_or(trimmed);

    Encoding::for_label(label.as_bytes()).ok_or_else(|| Error::UnknownEncoding(trimmed.to_string()))
}

/// Decodes without BOM sniffing. The flag is `true` when malformed
/// sequences were replaced with U+FFFD.
pub fn decode(bytes: &[u8], encoding: &'static Encoding) -> (String, bool) {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    (text.into_owned(), had_errors)
}

/// Reads `Encoding=` from the `[EasyRPG]` section of RPG_RT.ini.
pub fn from_ini(path: &Path) -> Result<Option<String>> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    // The ini itself is in the game encoding; keys are plain ASCII.
    let text = String::from_utf8_lossy(&bytes);

    let mut in_section = false;
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('[') && line.ends_with(']') {
            in_section = line[1..line.len() - 1].trim().eq_ignore_ascii_case("EasyRPG");
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            if key.trim().eq_ignore_ascii_case("Encoding") && !value.trim().is_empty() {
                return Ok(Some(value.trim().to_string()));
            }
        }
    }

    Ok(None)
}

/// Detections below this are not trusted.
const MIN_CONFIDENCE: f32 = 0.5;

/// Given to a guess that cannot even decode the bytes it was made from.
const UNDECODABLE: f32 = 0.35;

#[derive(Debug, Clone, Copy)]
pub struct Detection {
    pub encoding: &'static Encoding,
    pub confidence: f32,
}

/// Guesses the encoding of every text leaf in `tree`.
pub fn detect_from_tree(tree: &DataNode) -> Option<Detection> {
    let mut bytes = Vec::new();
    tree.for_each_text_leaf(|_, leaf| {
        bytes.extend_from_slice(leaf);
        bytes.push(b'\n');
    });

    if bytes.is_empty() {
        return None;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(&bytes, true);

    let encoding = detector.guess(None, true);
    Some(Detection {
        encoding,
        confidence: confidence(&bytes, encoding),
    })
}

/// Plain ASCII reads the same in every candidate, so only non-ASCII bytes
/// count as evidence.
fn confidence(bytes: &[u8], encoding: &'static Encoding) -> f32 {
    let (_, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return UNDECODABLE;
    }

    match bytes.iter().filter(|b| !b.is_ascii()).count() {
        0 => MIN_CONFIDENCE,
        1..=63 => 0.7,
        64..=1023 => 0.85,
        _ => 0.95,
    }
}

fn accept(detection: Detection) -> &'static Encoding {
    if detection.confidence >= MIN_CONFIDENCE {
        return detection.encoding;
    }
    tracing::warn!(
        event = "encoding_detection_unreliable",
        guess = detection.encoding.name(),
        confidence = detection.confidence,
        fallback = WINDOWS_1252.name()
    );
    WINDOWS_1252
}

/// Picks the encoding for a run: explicit label, then RPG_RT.ini, then
/// detection over the database, then windows-1252.
pub fn resolve(
    explicit: Option<&str>,
    ini: Option<&Path>,
    database: Option<&DataNode>,
) -> Result<&'static Encoding> {
    if let Some(label) = explicit.filter(|l| !l.trim().is_empty()) {
        return lookup(label);
    }

    if let Some(ini) = ini {
        match from_ini(ini) {
            Ok(Some(label)) => {
                tracing::debug!(event = "encoding_from_ini", label = %label);
                return lookup(&label);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(event = "encoding_ini_unreadable", error = %e),
        }
    }

    if let Some(detection) = database.and_then(detect_from_tree) {
        tracing::debug!(
            event = "encoding_detected",
            best = detection.encoding.name(),
            confidence = detection.confidence
        );
        return Ok(accept(detection));
    }

    Ok(WINDOWS_1252)
}
