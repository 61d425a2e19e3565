// 配置模块
// 加载顺序：默认值 -> JSON 配置文件（QBANK_CONFIG）-> 环境变量覆盖

use crate::error::{AppError, AppResult};
use crate::utils::get_database_path;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "QBANK_CONFIG";
pub const DATABASE_PATH_ENV: &str = "QBANK_DATABASE_PATH";
pub const LOG_LEVEL_ENV: &str = "QBANK_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    pub log_level: String,
    pub default_page_size: i64,
    pub max_page_size: i64,
    pub seed_default_categories: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: get_database_path(),
            log_level: "info".to_string(),
            default_page_size: 20,
            max_page_size: 100,
            seed_default_categories: true,
        }
    }
}

impl Config {
    /// 从环境加载完整配置
    pub fn load() -> AppResult<Self> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(DATABASE_PATH_ENV).filter(|v| !v.is_empty()) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|v| !v.is_empty()) {
            self.log_level = level;
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.default_page_size <= 0 || self.max_page_size <= 0 {
            return Err(AppError::Config("page sizes must be positive".to_string()));
        }
        if self.default_page_size > self.max_page_size {
            return Err(AppError::Config(format!(
                "default_page_size ({}) exceeds max_page_size ({})",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }
}
