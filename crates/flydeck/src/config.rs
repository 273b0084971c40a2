use anyhow::Result;
use flydeck_core::{SlideDeck, Tuning};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "flydeck";
const MAX_FPS: u32 = 240;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Fallback tuning for decks that carry none of their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<Tuning>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windowed: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `flydeck config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        if let Some(tuning) = &config.tuning {
            tuning.validate()?;
        }
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("using default config: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# flydeck configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn default_deck(&self) -> Option<PathBuf> {
        self.defaults.as_ref().and_then(|d| d.deck.clone())
    }

    pub fn default_windowed(&self) -> bool {
        self.defaults
            .as_ref()
            .and_then(|d| d.windowed)
            .unwrap_or(false)
    }

    pub fn default_fps(&self) -> Option<u32> {
        self.defaults.as_ref().and_then(|d| d.fps)
    }

    /// Tuning for `deck`: its own block wins, then the config file, then
    /// the built-in defaults.
    pub fn tuning_for(&self, deck: &SlideDeck) -> Tuning {
        deck.tuning()
            .or(self.tuning.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "defaults.deck" => {
                if value.trim().is_empty() {
                    anyhow::bail!("Invalid deck path: must not be empty.");
                }
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .deck = Some(PathBuf::from(value));
            }
            "defaults.windowed" => {
                let windowed = match value {
                    "true" | "yes" | "on" => true,
                    "false" | "no" | "off" => false,
                    _ => anyhow::bail!("Invalid windowed: {value}. Must be 'true' or 'false'."),
                };
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .windowed = Some(windowed);
            }
            "defaults.fps" => {
                let fps = match value.parse::<u32>() {
                    Ok(fps) if (1..=MAX_FPS).contains(&fps) => fps,
                    _ => anyhow::bail!("Invalid fps: {value}. Must be a number from 1 to {MAX_FPS}."),
                };
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .fps = Some(fps);
            }
            _ => match key.strip_prefix("tuning.") {
                Some(field) => self.set_tuning(field, value)?,
                None => anyhow::bail!(
                    "Unknown config key: {key}. Valid keys: defaults.deck, defaults.windowed, defaults.fps, tuning.<name>"
                ),
            },
        }
        Ok(())
    }

    fn set_tuning(&mut self, field: &str, value: &str) -> Result<()> {
        let number: f64 = value
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid number for tuning.{field}: {value}"))?;

        let current = self.tuning.clone().unwrap_or_default();
        let mut fields = serde_yaml::to_value(&current)?;
        let serde_yaml::Value::Mapping(map) = &mut fields else {
            anyhow::bail!("Tuning did not serialize as a mapping");
        };
        let slot = map
            .get_mut(field)
            .ok_or_else(|| anyhow::anyhow!("Unknown tuning key: {field}"))?;
        *slot = serde_yaml::Value::from(number);

        let tuning: Tuning = serde_yaml::from_value(fields)?;
        tuning.validate()?;
        self.tuning = Some(tuning);
        Ok(())
    }
}
