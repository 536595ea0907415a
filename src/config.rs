use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::snippet;

const DEFAULT_ENV_PREFIX: &str = "SNIPBOX";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub snippets: SnippetsConfig,
    #[serde(default)]
    pub ui: UIConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnippetsConfig {
    #[serde(default = "default_home")]
    pub home: Option<PathBuf>,
    #[serde(default = "default_file")]
    pub file: String,
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for SnippetsConfig {
    fn default() -> Self {
        Self {
            home: default_home(),
            file: default_file(),
            default_language: default_language(),
        }
    }
}

fn default_home() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("snipbox"))
}

fn default_file() -> String {
    "snippets.json".to_string()
}

fn default_language() -> String {
    snippet::DEFAULT_LANGUAGE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UIConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default = "default_primary_color_subdued")]
    pub primary_color_subdued: String,
    #[serde(default = "default_green_color")]
    pub green_color: String,
    #[serde(default = "default_bright_green_color")]
    pub bright_green_color: String,
    #[serde(default = "default_red_color")]
    pub red_color: String,
    #[serde(default = "default_bright_red_color")]
    pub bright_red_color: String,
    #[serde(default = "default_gray_color")]
    pub gray_color: String,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            primary_color: default_primary_color(),
            primary_color_subdued: default_primary_color_subdued(),
            green_color: default_green_color(),
            bright_green_color: default_bright_green_color(),
            red_color: default_red_color(),
            bright_red_color: default_bright_red_color(),
            gray_color: default_gray_color(),
        }
    }
}

fn default_theme() -> String {
    "base16-ocean.dark".to_string()
}

fn default_primary_color() -> String {
    "#AFBEE1".into()
}

fn default_primary_color_subdued() -> String {
    "#64708D".into()
}

fn default_green_color() -> String {
    "#527251".into()
}

fn default_bright_green_color() -> String {
    "#BCE1AF".into()
}

fn default_red_color() -> String {
    "#A46060".into()
}

fn default_bright_red_color() -> String {
    "#E49393".into()
}

fn default_gray_color() -> String {
    "#6C7086".into()
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(path) = options.config_file.as_ref() {
        if path.exists() {
            let from_file = read_config_file(path)?;
            cfg = merge_config(cfg, from_file);
        }
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            let from_file = read_config_file(&default_path)?;
            cfg = merge_config(cfg, from_file);
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    cfg = merge_config(cfg, load_env(prefix)?);

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn merge_config(mut base: Config, other: Config) -> Config {
    if other.snippets.home.is_some() {
        base.snippets.home = other.snippets.home;
    }
    if !other.snippets.file.is_empty() {
        base.snippets.file = other.snippets.file;
    }
    if !other.snippets.default_language.is_empty() {
        base.snippets.default_language = other.snippets.default_language;
    }

    if !other.ui.theme.is_empty() {
        base.ui.theme = other.ui.theme;
    }
    if !other.ui.primary_color.is_empty() {
        base.ui.primary_color = other.ui.primary_color;
    }
    if !other.ui.primary_color_subdued.is_empty() {
        base.ui.primary_color_subdued = other.ui.primary_color_subdued;
    }
    if !other.ui.green_color.is_empty() {
        base.ui.green_color = other.ui.green_color;
    }
    if !other.ui.bright_green_color.is_empty() {
        base.ui.bright_green_color = other.ui.bright_green_color;
    }
    if !other.ui.red_color.is_empty() {
        base.ui.red_color = other.ui.red_color;
    }
    if !other.ui.bright_red_color.is_empty() {
        base.ui.bright_red_color = other.ui.bright_red_color;
    }
    if !other.ui.gray_color.is_empty() {
        base.ui.gray_color = other.ui.gray_color;
    }

    base
}

fn load_env(prefix: &str) -> Result<Config> {
    let mut map: HashMap<String, String> = HashMap::new();
    let upper_prefix = format!("{}_", prefix.to_uppercase());

    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            map.insert(normalized, value);
        }
    }

    if map.is_empty() {
        return Ok(Config::default());
    }

    let mut cfg = Config::default();

    for (key, value) in map {
        apply_env_value(&mut cfg, &key, value);
    }

    Ok(cfg)
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "snippets.home" | "home" => cfg.snippets.home = Some(PathBuf::from(value)),
        "snippets.file" | "file" => cfg.snippets.file = value,
        "snippets.default_language" | "default_language" => {
            cfg.snippets.default_language = value;
        }
        "ui.theme" | "theme" => cfg.ui.theme = value,
        "ui.primary_color" => cfg.ui.primary_color = value,
        "ui.primary_color_subdued" => cfg.ui.primary_color_subdued = value,
        "ui.green_color" => cfg.ui.green_color = value,
        "ui.bright_green_color" => cfg.ui.bright_green_color = value,
        "ui.red_color" => cfg.ui.red_color = value,
        "ui.bright_red_color" => cfg.ui.bright_red_color = value,
        "ui.gray_color" => cfg.ui.gray_color = value,
        _ => {}
    }
}

pub fn default_path() -> Option<PathBuf> {
    default_config_path()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("snipbox").join("config.yaml"))
}
