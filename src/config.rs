use crate::error::{Result, TaggerError};
use comment_tagger_common::{StorageKey, Variant};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 列数から判定できないときに使うバリアント
    pub default_variant: Variant,
    /// バリアントごとに保存枠を分ける
    pub isolate_storage: bool,
    /// `tag` コマンドの保存先（省略時は設定ディレクトリ配下）
    pub storage_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_variant: Variant::Category,
            isolate_storage: false,
            storage_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            log::debug!("設定を読み込みました: {}", config_path.display());
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| TaggerError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("comment-tagger"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    pub fn storage_dir(&self) -> Result<PathBuf> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::config_dir()?.join("storage")),
        }
    }

    pub fn storage_key(&self) -> StorageKey {
        StorageKey::from_isolate(self.isolate_storage)
    }

    pub fn set_variant(&mut self, variant: Variant) -> Result<()> {
        self.default_variant = variant;
        self.save()
    }

    pub fn set_isolate_storage(&mut self, isolate: bool) -> Result<()> {
        self.isolate_storage = isolate;
        self.save()
    }
}
