//! `rulebook.toml` loading.
//!
//! Every key is optional. Relative paths are resolved against the directory
//! holding the configuration file; without a file the embedded catalogs and
//! dialect are used.

use std::path::{Path, PathBuf};

use rulebook_codegen::{DialectError, SqlDialect, DEFAULT_MAX_REFERENCES};
use rulebook_core::{CatalogError, Catalogs};
use serde::Deserialize;

pub(crate) const DEFAULT_CONFIG_FILE: &str = "rulebook.toml";

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("error reading config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("error parsing config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Dialect(#[from] DialectError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CatalogSection {
    /// Directory holding `types.json` and `functions.json`.
    pub dir: Option<PathBuf>,
    pub dialect: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ReferenceSection {
    pub rules_dir: Option<PathBuf>,
    pub max_references: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub catalog: CatalogSection,
    pub references: ReferenceSection,
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl Config {
    /// Load `explicit` if given, else `./rulebook.toml` if it exists, else
    /// the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        match explicit {
            Some(path) => Config::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Config::load(default)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Config::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(s)
    }

    /// The file this configuration came from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn resolve(&self, p: &Path) -> PathBuf {
        match self.source.as_deref().and_then(Path::parent) {
            Some(base) if p.is_relative() => base.join(p),
            _ => p.to_path_buf(),
        }
    }

    pub fn catalogs(&self) -> Result<Catalogs, ConfigError> {
        Ok(match &self.catalog.dir {
            Some(dir) => Catalogs::load(&self.resolve(dir))?,
            None => Catalogs::builtin()?,
        })
    }

    pub fn dialect(&self) -> Result<SqlDialect, ConfigError> {
        Ok(match &self.catalog.dialect {
            Some(path) => SqlDialect::load(&self.resolve(path))?,
            None => SqlDialect::builtin()?,
        })
    }

    /// `--rules` wins over the configured directory.
    pub fn rules_dir(&self, cli: Option<&Path>) -> Option<PathBuf> {
        match cli {
            Some(dir) => Some(dir.to_path_buf()),
            None => self.references.rules_dir.as_deref().map(|d| self.resolve(d)),
        }
    }

    pub fn max_references(&self) -> usize {
        self.references
            .max_references
            .unwrap_or(DEFAULT_MAX_REFERENCES)
    }
}
