use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{Field, SynonymSource};
use crate::error::IntegrateError;

pub const DEFAULT_CONFIG_FILE: &str = "metab-int.json";
pub const DEFAULT_OUTPUT_PREFIX: &str = "DATABASE";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub output_prefix: Option<String>,
    #[serde(default)]
    pub compounds: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub synonyms: SynonymPaths,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct SynonymPaths {
    #[serde(default)]
    pub hmdb: Option<String>,
    #[serde(default)]
    pub lmid: Option<String>,
    #[serde(default)]
    pub pc_compound: Option<String>,
}

impl SynonymPaths {
    /// Configured tables in lookup order: HMDB, PubChem, LIPID MAPS.
    pub fn entries(&self) -> Vec<(SynonymSource, Utf8PathBuf)> {
        [
            (SynonymSource::Hmdb, &self.hmdb),
            (SynonymSource::PcCompound, &self.pc_compound),
            (SynonymSource::Lmid, &self.lmid),
        ]
        .into_iter()
        .filter_map(|(source, path)| path.as_ref().map(|p| (source, Utf8PathBuf::from(p))))
        .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub key: Field,
    pub input: Option<Utf8PathBuf>,
    pub output_prefix: Utf8PathBuf,
    pub compounds: Option<Utf8PathBuf>,
    pub output_dir: Utf8PathBuf,
    pub synonyms: Vec<(SynonymSource, Utf8PathBuf)>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, IntegrateError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(IntegrateError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| IntegrateError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| IntegrateError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    /// Like [`ConfigLoader::resolve`], but a missing default file yields defaults.
    pub fn resolve_or_default(path: Option<&str>) -> Result<ResolvedConfig, IntegrateError> {
        match Self::resolve(path) {
            Err(IntegrateError::MissingConfig) => Self::resolve_config(Config::default()),
            other => other,
        }
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, IntegrateError> {
        let key = match config.key.as_deref() {
            Some(name) => Field::parse_schema(name)?,
            None => Field::InchiKey,
        };

        Ok(ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            key,
            input: config.input.map(Utf8PathBuf::from),
            output_prefix: Utf8PathBuf::from(
                config
                    .output_prefix
                    .unwrap_or_else(|| DEFAULT_OUTPUT_PREFIX.to_string()),
            ),
            compounds: config.compounds.map(Utf8PathBuf::from),
            output_dir: Utf8PathBuf::from(config.output_dir.unwrap_or_else(|| ".".to_string())),
            synonyms: config.synonyms.entries(),
        })
    }
}
