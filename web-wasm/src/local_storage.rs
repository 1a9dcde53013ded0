//! ブラウザの localStorage

use comment_tagger_common::{Error, Result, Storage};

pub struct LocalStorage {
    inner: web_sys::Storage,
}

impl LocalStorage {
    /// localStorage を開く（使えない環境では None）
    pub fn open() -> Option<Self> {
        let window = web_sys::window()?;
        match window.local_storage() {
            Ok(Some(inner)) => Some(Self { inner }),
            Ok(None) => {
                log::warn!("localStorageが使用できません");
                None
            }
            Err(e) => {
                log::warn!("localStorageへのアクセスが拒否されました: {:?}", e);
                None
            }
        }
    }
}

impl Storage for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.inner
            .get_item(key)
            .map_err(|e| Error::Storage(format!("読込失敗: {:?}", e)))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.inner
            .set_item(key, value)
            .map_err(|e| Error::Storage(format!("保存失敗: {:?}", e)))
    }
}
