use crate::casing::CasingMode;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_DELAY_MS: u64 = 5000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default)]
    pub capitalisation_mode: CasingMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            capitalisation_mode: CasingMode::Sentence,
        }
    }
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
    pub undo_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "kelly", "fnote-capitaliser")
        .context("OS標準設定ディレクトリを取得できませんでした")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        undo_path: config_dir.join("undo-last.json"),
        config_dir,
    })
}

pub fn load_config() -> Result<AppConfig> {
    let paths = app_paths()?;
    if !paths.config_path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(&paths.config_path).with_context(|| {
        format!(
            "設定ファイルを読めませんでした: {}",
            paths.config_path.display()
        )
    })?;

    let config = toml::from_str::<AppConfig>(&raw).context("設定ファイルのパースに失敗しました")?;
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    let paths = app_paths()?;
    fs::create_dir_all(&paths.config_dir).with_context(|| {
        format!(
            "設定ディレクトリを作成できませんでした: {}",
            paths.config_dir.display()
        )
    })?;
    let body = toml::to_string_pretty(config).context("設定のシリアライズに失敗しました")?;
    fs::write(&paths.config_path, body).with_context(|| {
        format!(
            "設定ファイルを書き込めませんでした: {}",
            paths.config_path.display()
        )
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = toml::from_str::<AppConfig>("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn absent_fields_keep_defaults() {
        let config = toml::from_str::<AppConfig>("capitalisation_mode = \"title\"\n").unwrap();
        assert_eq!(config.capitalisation_mode, CasingMode::Title);
        assert_eq!(config.delay_ms, DEFAULT_DELAY_MS);

        let config = toml::from_str::<AppConfig>("delay_ms = 250\n").unwrap();
        assert_eq!(config.delay_ms, 250);
        assert_eq!(config.capitalisation_mode, CasingMode::Sentence);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = AppConfig {
            delay_ms: 1200,
            capitalisation_mode: CasingMode::Title,
        };
        let body = toml::to_string_pretty(&config).unwrap();
        assert_eq!(toml::from_str::<AppConfig>(&body).unwrap(), config);
    }
}
