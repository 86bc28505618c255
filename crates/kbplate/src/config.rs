use crate::types::{ExportFormat, Layer};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Process-wide settings shared by every build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Directory export files are written to.
    pub export_dir: PathBuf,
    /// Public prefix the export directory is served under.
    pub url_prefix: String,
    /// Formats requested for every layer, in export order.
    pub formats: Vec<ExportFormat>,
    /// Wall-clock limit for one build. `None` disables the check.
    pub build_budget_secs: Option<u64>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("static/exports"),
            url_prefix: "/static/exports".to_string(),
            formats: vec![ExportFormat::Dxf, ExportFormat::Svg, ExportFormat::Json],
            build_budget_secs: Some(7200),
        }
    }
}

impl BuilderConfig {
    /// Load a config from the provided path. Missing files yield the defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let data = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
        let config: BuilderConfig =
            serde_json::from_slice(&data).context("deserialize builder config")?;
        Ok(config)
    }

    /// Persist the config to the provided path, ensuring the directory exists.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create config directory {}", parent.display()))?;
        }

        let data = serde_json::to_vec_pretty(self).context("serialize builder config")?;
        fs::write(path, data).with_context(|| format!("write config {}", path.display()))
    }

    /// Resolve the default config path (`~/.kbplate/config.json`), creating directories.
    pub fn default_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
        let path = home.join(".kbplate").join("config.json");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create config directory {}", parent.display()))?;
        }

        Ok(path)
    }

    pub fn budget(&self) -> Option<Duration> {
        self.build_budget_secs.map(Duration::from_secs)
    }

    /// `<layer>_<request_id>.<ext>`
    pub fn export_file_name(layer: Layer, request_id: &str, format: ExportFormat) -> String {
        format!("{layer}_{request_id}.{}", format.extension())
    }

    pub fn export_path(&self, layer: Layer, request_id: &str, format: ExportFormat) -> PathBuf {
        self.export_dir
            .join(Self::export_file_name(layer, request_id, format))
    }

    pub fn export_url(&self, layer: Layer, request_id: &str, format: ExportFormat) -> String {
        format!(
            "{}/{}",
            self.url_prefix.trim_end_matches('/'),
            Self::export_file_name(layer, request_id, format)
        )
    }
}
