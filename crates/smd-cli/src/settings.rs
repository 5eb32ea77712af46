//! Configuration layering for `smd`.
//!
//! Later layers win: the embedded `defaults/smd.default.toml`, then
//! `smd.toml` in the working directory, then `--config`, then flags.

use std::path::Path;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat};
use smd_core::Options;

const DEFAULT_TOML: &str = include_str!("../defaults/smd.default.toml");

/// Optional configuration file looked up in the working directory.
pub const LOCAL_CONFIG: &str = "smd.toml";

/// Stacks configuration sources over the embedded defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            builder: Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml)),
        }
    }

    /// Add a TOML file; `required` makes a missing file an error.
    pub fn file(mut self, path: &Path, required: bool) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path).format(FileFormat::Toml).required(required));
        self
    }

    /// Override the line-length limit from the command line.
    pub fn max_line_len(mut self, limit: usize) -> Result<Self, ConfigError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.builder = self.builder.set_override("max_line_len", limit)?;
        Ok(self)
    }

    pub fn build(self) -> Result<Options, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

/// Resolve options from every layer.
pub fn load(config: Option<&Path>, max_line_len: Option<usize>) -> Result<Options, ConfigError> {
    let mut loader = Loader::new().file(Path::new(LOCAL_CONFIG), false);
    if let Some(path) = config {
        loader = loader.file(path, true);
    }
    if let Some(limit) = max_line_len {
        loader = loader.max_line_len(limit)?;
    }
    loader.build()
}
