use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Snapshot file the store is loaded from and saved to.
    pub snapshot: PathBuf,
    /// Save the snapshot after every mutating command.
    pub autosave: bool,
    /// `trace`, `debug`, `info`, `warn`, or `error`.
    pub log_level: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            snapshot: PathBuf::from("armsim.json"),
            autosave: true,
            log_level: "warn".into(),
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn level(&self) -> anyhow::Result<tracing::Level> {
        self.log_level
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid log level '{}'", self.log_level))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config() {
        let c = SimConfig::default();
        assert_eq!(c.snapshot, PathBuf::from("armsim.json"));
        assert!(c.autosave);
        assert_eq!(c.level().unwrap(), tracing::Level::WARN);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = SimConfig::from_toml("autosave = false\nlog_level = \"debug\"\n").unwrap();
        assert!(!c.autosave);
        assert_eq!(c.level().unwrap(), tracing::Level::DEBUG);
        assert_eq!(c.snapshot, PathBuf::from("armsim.json"));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "snapshot = \"/tmp/state.json\"").unwrap();
        let c = SimConfig::load(file.path()).unwrap();
        assert_eq!(c.snapshot, PathBuf::from("/tmp/state.json"));
    }

    #[test]
    fn bad_level_is_rejected() {
        let c = SimConfig {
            log_level: "loud".into(),
            ..SimConfig::default()
        };
        assert!(c.level().is_err());
        assert!(SimConfig::from_toml("autosave = 3").is_err());
    }
}
