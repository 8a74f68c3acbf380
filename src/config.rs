use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::hwp::{StructuralDecoder, decoder_for_command};
use crate::document::hwpx::TierPreference;
use crate::error::Result;

/// User configuration for hwpdoc
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub decoder: DecoderConfig,
    pub editor: EditorConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// External structural decoder argv; `{path}` is replaced by the document
    /// path, which is appended when no argument contains it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub tier: TierPreference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Prefix CSV files with a UTF-8 byte-order mark
    pub csv_bom: bool,
    pub json_pretty: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            csv_bom: true,
            json_pretty: true,
        }
    }
}

impl Config {
    /// Load from the config directory, or defaults when there is no file
    pub fn load() -> Result<Self> {
        match Self::get_config_path() {
            Some(config_path) if config_path.exists() => Self::load_from(&config_path),
            _ => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save to the config directory
    pub fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::get_config_path() {
            self.save_to(&config_path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hwpdoc").join("config.toml"))
    }

    /// Decoder built from `decoder.command`, or one that always reports
    /// itself unavailable
    pub fn decoder(&self) -> Box<dyn StructuralDecoder> {
        decoder_for_command(self.decoder.command.as_deref())
    }
}
