use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use expanduser::expanduser;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
pub struct Profile {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
}

#[derive(Serialize, Deserialize, Default)]
pub struct Config {
    profiles: HashMap<String, Profile>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::profiles_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))?;

        Ok(())
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn set_profile(&mut self, name: &str, prof: Profile) {
        self.profiles.insert(name.to_string(), prof);
    }

    pub fn config_dir() -> Result<PathBuf> {
        let dir = expanduser("~/.s3ls").context("failed to resolve home directory")?;

        Ok(dir)
    }

    pub fn profiles_file() -> Result<PathBuf> {
        Ok(Self::profiles_file_in(&Self::config_dir()?))
    }

    pub fn profiles_file_in(dir: &Path) -> PathBuf {
        dir.join("profiles.yml")
    }
}
