use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{HarvestError, Result};
use crate::models::NetSplit;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default)]
    pub owner_name: String,
    #[serde(default)]
    pub net_split: NetSplit,
    #[serde(default = "default_harvest_offset_months")]
    pub harvest_offset_months: u32,
}

fn default_harvest_offset_months() -> u32 {
    4
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            owner_name: String::new(),
            net_split: NetSplit::default(),
            harvest_offset_months: default_harvest_offset_months(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("harvestbook")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("harvestbook")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| HarvestError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(s.owner_name.is_empty());
        assert_eq!(s.net_split, NetSplit::Full);
        assert_eq!(s.harvest_offset_months, 4);
        assert!(s.data_dir.ends_with("harvestbook"));
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/farm", "net_split": "halved"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.net_split, NetSplit::Halved);
        assert_eq!(s.harvest_offset_months, 4);
        assert_eq!(s.data_dir, "/tmp/farm");
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/farm".to_string(),
            owner_name: "Lim Cruz".to_string(),
            net_split: NetSplit::Halved,
            harvest_offset_months: 3,
        };
        std::fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();
        let loaded: Settings =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.owner_name, "Lim Cruz");
        assert_eq!(loaded.net_split, NetSplit::Halved);
        assert_eq!(loaded.harvest_offset_months, 3);
    }

    #[test]
    fn test_shellexpand_tilde() {
        if let Some(home) = dirs::home_dir() {
            let expanded = shellexpand_path("~/farm");
            assert!(expanded.starts_with(&*home.to_string_lossy()));
            assert!(expanded.ends_with("farm"));
        }
    }
}
