use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::HostError;

/// Root runner configuration, parsed from TOML.
///
/// ```toml
/// [transform]
/// plugin = "target/release/libcdcflat_debezium.so"   # optional
///
/// [transform.config]
/// log_rejected = false
///
/// [output]
/// skip_rejected = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub transform: TransformConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransformConfig {
    /// Path to a transform .so plugin. The built-in transform is used when absent.
    #[serde(default)]
    pub plugin: Option<PathBuf>,

    /// Parameters forwarded to the transform, validated against its declarations.
    #[serde(default)]
    pub config: Option<toml::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Do not write `{}` lines for dropped records.
    #[serde(default)]
    pub skip_rejected: bool,
}

impl RunnerConfig {
    pub fn load(path: &Path) -> Result<Self, HostError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| HostError::Config(format!("{}: {e}", path.display())))?;
        Self::parse(&content).map_err(|e| e.with_context(path.display()))
    }

    pub fn parse(toml_str: &str) -> Result<Self, HostError> {
        toml::from_str(toml_str).map_err(|e| HostError::Config(e.to_string()))
    }

    /// Transform parameters as a format-independent JSON value.
    pub fn transform_params(&self) -> Result<Option<serde_json::Value>, HostError> {
        self.transform
            .config
            .as_ref()
            .map(|v| {
                serde_json::to_value(v)
                    .map_err(|e| HostError::Config(format!("transform config: {e}")))
            })
            .transpose()
    }
}
