use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Fields whose values are file names or resource references, never text
/// shown to the player.
pub const DEFAULT_SKIPPED_FIELDS: &[&str] = &[
    "face_name",
    "character_name",
    "battler_name",
    "animation_name",
    "chipset_name",
    "panorama_name",
    "background_name",
    "picture_name",
    "system_name",
    "system2_name",
    "title_name",
    "gameover_name",
    "frame_name",
    "battletest_background",
    "bgm",
    "se",
    "sound_effect",
    "music",
    "note",
];

fn default_skipped_fields() -> Vec<String> {
    DEFAULT_SKIPPED_FIELDS.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Create,
    Update,
    Match,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    #[serde(default = "default_skipped_fields")]
    pub skipped_fields: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            skipped_fields: default_skipped_fields(),
        }
    }
}

impl ExtractOptions {
    pub fn skips(&self, field: &str) -> bool {
        self.skipped_fields.iter().any(|f| f == field)
    }
}

/// Everything a run needs. Passed explicitly to the workflow, never global.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub input_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory whose catalogs supply the answers in match mode.
    #[serde(default)]
    pub match_dir: Option<PathBuf>,

    #[serde(default)]
    pub mode: Mode,

    /// Encoding label; resolved from RPG_RT.ini or detected when absent.
    #[serde(default)]
    pub encoding: Option<String>,

    #[serde(default)]
    pub extract: ExtractOptions,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input_dir: PathBuf::new(),
            output_dir: default_output_dir(),
            match_dir: None,
            mode: Mode::default(),
            encoding: None,
            extract: ExtractOptions::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let data = fs::read_to_string(path).map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

        serde_json::from_str::<Config>(&data).map_err(|e| Error::Config(format!("invalid {}: {e}", path.display())))
    }

    pub fn validate(&self) -> Result<()> {
        if self.mode == Mode::Match {
            let Some(match_dir) = &self.match_dir else {
                return Err(Error::Config("match mode needs a source directory".into()));
            };
            if match_dir == &self.output_dir {
                return Err(Error::Config(
                    "the output directory must differ from the match directory".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "input_dir": "game", "mode": "update" }"#).unwrap();
        assert_eq!(cfg.input_dir, PathBuf::from("game"));
        assert_eq!(cfg.output_dir, PathBuf::from("."));
        assert_eq!(cfg.mode, Mode::Update);
        assert!(cfg.encoding.is_none());
        assert!(cfg.extract.skips("face_name"));
    }

    #[test]
    fn match_needs_distinct_output() {
        let mut cfg = Config {
            mode: Mode::Match,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());

        cfg.match_dir = Some(PathBuf::from("."));
        assert!(cfg.validate().is_err());

        cfg.output_dir = PathBuf::from("out");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
