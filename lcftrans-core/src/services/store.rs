use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::catalog::Catalog;
use crate::parsers::po::{self, Parsed};

/// Reads and parses a catalog file. Malformed records are reported in
/// `Parsed::errors`, only I/O problems fail.
pub fn read_catalog(path: &Path) -> Result<Parsed> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    // Catalogs are written as UTF-8; a stray byte should not lose the file.
    let text = String::from_utf8_lossy(&bytes);
    Ok(po::parse(&text))
}

/// Serializes `catalog` in memory and replaces `path` in one step.
pub fn write_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    write_atomic(path, po::write(catalog).as_bytes())
}

pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);

    if let Some(parent) = tmp.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }

    fs::write(&tmp, bytes).map_err(|e| Error::io(&tmp, e))?;

    // rename over an existing file is atomic on unix but fails on windows.
    if cfg!(windows) && path.exists() {
        fs::remove_file(path).map_err(|e| Error::io(path, e))?;
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(Error::io(path, e));
    }

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let file_name = match path.file_name().and_then(|s| s.to_str()) {
        Some(n) => n.to_string(),
        None => "catalog".to_string(),
    };
    p.set_file_name(format!("{file_name}.tmp"));
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entry::Entry;

    #[test]
    fn write_replaces_existing_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Map0001.lmu.po");
        fs::write(&path, "old contents").unwrap();

        let c: Catalog = vec![Entry::fresh(Vec::new(), "Hi")].into_iter().collect();
        write_catalog(&path, &c).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "msgid \"Hi\"\nmsgstr \"\"\n");
        assert!(!dir.path().join("Map0001.lmu.po.tmp").exists());
        assert_eq!(read_catalog(&path).unwrap().catalog, c);
    }

    #[test]
    fn write_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("RPG_RT.lmt.po");
        write_atomic(&path, b"x").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"x");
    }

    #[test]
    fn missing_catalog_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_catalog(&dir.path().join("missing.po")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
