use anyhow::{Context, Result};
use directories::ProjectDirs;
use insight_extract::GeminiConfig;
use insight_import::TagClassifier;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: GeminiConfig,
    pub rules: RulesSection,
    pub intake: IntakeSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesSection {
    /// Replacement keyword table. The built-in table is used when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeSection {
    /// Folder watched by `watch`. Defaults to `<data dir>/intake`.
    pub dir: Option<PathBuf>,
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "statement-insight", "StatementInsight")
        .context("could not determine a home directory")
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

pub fn default_intake_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("intake"))
}

/// `--config` when given, else the per-user location.
pub fn resolve_path(override_path: Option<&Path>) -> Result<PathBuf> {
    match override_path {
        Some(p) => Ok(p.to_path_buf()),
        None => default_config_path(),
    }
}

/// A missing file is not an error; defaults apply.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Writes a default config unless one already exists. Returns whether a file
/// was written.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(path, &Config::default())?;
    Ok(true)
}

impl Config {
    pub fn classifier(&self) -> Result<TagClassifier> {
        match &self.rules.path {
            Some(path) => {
                let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
                TagClassifier::from_toml(&s).with_context(|| format!("load rule table {}", path.display()))
            }
            None => Ok(TagClassifier::builtin()),
        }
    }

    pub fn intake_dir(&self) -> Result<PathBuf> {
        match &self.intake.dir {
            Some(dir) => Ok(dir.clone()),
            None => default_intake_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[provider]\nmodel = \"gemini-test\"\n").unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.provider.model, "gemini-test");
        assert_eq!(cfg.provider.base_url, GeminiConfig::default().base_url);
        assert!(cfg.rules.path.is_none());
    }

    #[test]
    fn init_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        assert!(init_config(&path).unwrap());
        assert!(!init_config(&path).unwrap());
        assert_eq!(load_config(&path).unwrap(), Config::default());
    }

    #[test]
    fn save_then_load_keeps_intake_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.intake.dir = Some(dir.path().join("inbox"));
        save_config(&path, &cfg).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.intake_dir().unwrap(), dir.path().join("inbox"));
    }

    #[test]
    fn invalid_toml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[provider\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
    }

    #[test]
    fn custom_rule_table_replaces_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join("rules.toml");
        fs::write(&rules, "[[rules]]\ntag = \"vet\"\nkeywords = [\"PAWS\"]\n").unwrap();
        let mut cfg = Config::default();
        cfg.rules.path = Some(rules);
        let classifier = cfg.classifier().unwrap();
        assert_eq!(classifier.classify("PAWS CLINIC", "PAWS CLINIC"), "vet");
        assert_eq!(classifier.classify("SPINNEYS", "grocery"), "grocery");
        assert_eq!(classifier.classify("SPINNEYS", ""), "SPINNEYS");
    }

    #[test]
    fn missing_rule_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.rules.path = Some(dir.path().join("nope.toml"));
        assert!(cfg.classifier().is_err());
    }
}
