//! CLI configuration from `permalinks.toml`.
use anyhow::{Context, Result};
use permalinks::{Options, Permalinks, register_text_helpers};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_FILE: &str = "permalinks.toml";
pub const ENV_VAR: &str = "PERMALINKS_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pattern used when none is given on the command line.
    pub structure: Option<String>,
    /// Register `upper`, `lower` and `date`.
    pub text_helpers: bool,
    #[serde(flatten)]
    pub options: Options,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            structure: None,
            text_helpers: true,
            options: Options::default(),
        }
    }
}

impl Config {
    /// Resolve from `explicit`, then `$PERMALINKS_CONFIG`, then
    /// `./permalinks.toml`. Only the last one may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let chosen = explicit.map(Path::to_path_buf).or_else(|| {
            std::env::var(ENV_VAR)
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
        });

        match chosen {
            Some(path) => Self::read(&path),
            None => {
                let fallback = Path::new(DEFAULT_FILE);
                if fallback.is_file() {
                    Self::read(fallback)
                } else {
                    log::debug!("no {DEFAULT_FILE}, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let src = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let config = toml::from_str(&src).with_context(|| format!("parse {}", path.display()))?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn permalinks(&self) -> Permalinks {
        let mut permalinks = Permalinks::with_options(self.options.clone());
        if self.text_helpers {
            register_text_helpers(&mut permalinks);
        }
        permalinks
    }
}
