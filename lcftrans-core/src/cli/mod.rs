use std::path::PathBuf;

use clap::{Args, Parser};

use crate::error::Result;
use crate::model::config::{Config, Mode};

pub mod report;

#[derive(Parser, Debug)]
#[command(name = "lcftrans", version, about = "Translate RPG Maker 2000/2003 projects")]
pub struct Cli {
    /// Game directory holding the decoded data dumps (RPG_RT.ldb.json, MapXXXX.lmu.json, ...)
    #[arg(value_name = "DIRECTORY")]
    pub directory: PathBuf,

    #[command(flatten)]
    pub mode: ModeArgs,

    /// When not specified, is read from RPG_RT.ini or auto-detected
    #[arg(short, long, value_name = "ENC")]
    pub encoding: Option<String>,

    /// Output directory (default: working directory)
    #[arg(short, long, value_name = "OUTDIR")]
    pub output: Option<PathBuf>,

    /// JSON configuration file; command line flags take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Old spelling of `-e ENC`, still accepted after DIRECTORY
    #[arg(value_name = "ENCODING", hide = true)]
    pub legacy_encoding: Option<String>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct ModeArgs {
    /// Create a new translation
    #[arg(short, long)]
    pub create: bool,

    /// Update an existing translation
    #[arg(short, long)]
    pub update: bool,

    /// Match the translations in MDIR and DIRECTORY. When matched the
    /// original in MDIR becomes the translation of DIRECTORY. Used to
    /// generate translations from games where the translation is hardcoded
    /// in the game files.
    #[arg(short = 'm', long = "match", value_name = "MDIR")]
    pub match_dir: Option<PathBuf>,
}

impl ModeArgs {
    pub fn mode(&self) -> Mode {
        if self.update {
            Mode::Update
        } else if self.match_dir.is_some() {
            Mode::Match
        } else {
            Mode::Create
        }
    }
}

impl Cli {
    pub fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        config.mode = self.mode.mode();
        config.input_dir = self.directory;
        if self.mode.match_dir.is_some() {
            config.match_dir = self.mode.match_dir;
        }
        if self.encoding.is_some() {
            config.encoding = self.encoding;
        }
        if let Some(encoding) = self.legacy_encoding {
            tracing::warn!(
                event = "deprecated_encoding_argument",
                encoding = %encoding,
                "Specifying ENCODING as last argument is deprecated, `-e ENC` is the replacement."
            );
            config.encoding = Some(encoding);
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }

        config.validate()?;
        Ok(config)
    }
}
