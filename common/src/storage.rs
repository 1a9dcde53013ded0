//! バッファの永続化
//!
//! バッファ全体を1つの保存枠にそのまま書き込む。保存先はトレイトで差し替える
//! （ブラウザの localStorage、CLI のファイル、テスト用のメモリ）。

use crate::error::Result;
use crate::schema::Variant;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// 全バリアント共通の保存枠の名前
pub const STORAGE_FIELD: &str = "CommentTaggerData";

/// キー・値の文字列ストレージ
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
}

/// 保存枠の選び方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKey {
    /// 全バリアントで同じ枠を使う（既存データと互換）
    #[default]
    Shared,
    /// バリアントごとに枠を分ける
    PerVariant,
}

impl StorageKey {
    pub fn from_isolate(isolate: bool) -> Self {
        if isolate {
            StorageKey::PerVariant
        } else {
            StorageKey::Shared
        }
    }

    pub fn slot(self, variant: Variant) -> String {
        match self {
            StorageKey::Shared => STORAGE_FIELD.to_string(),
            StorageKey::PerVariant => format!("{}.{}", STORAGE_FIELD, variant),
        }
    }
}

/// メモリ上のストレージ
///
/// clone したものは同じ中身を共有する（同一ページ内の localStorage と同じ振る舞い）。
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// ディレクトリ内に枠ごとのファイルを置くストレージ（非WASM環境のみ）
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStorage {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> std::path::PathBuf {
        self.dir.join(format!("{}.txt", key))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// 保存枠に結び付いたストレージ
///
/// ストレージが使えない環境では読み込みは空、保存は何もしない。
/// ストレージのエラーは警告ログに出すだけで呼び出し側には返さない。
pub struct Persistence {
    storage: Option<Box<dyn Storage>>,
    slot: String,
}

impl Persistence {
    pub fn new(storage: Option<Box<dyn Storage>>, slot: impl Into<String>) -> Self {
        Self {
            storage,
            slot: slot.into(),
        }
    }

    /// ストレージなし
    pub fn disabled() -> Self {
        Self::new(None, STORAGE_FIELD)
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    pub fn load(&self) -> Option<String> {
        let storage = self.storage.as_ref()?;
        match storage.get_item(&self.slot) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("保存データの読み込みに失敗: {}", e);
                None
            }
        }
    }

    pub fn save(&mut self, text: &str) {
        let Some(storage) = self.storage.as_mut() else {
            log::debug!("ストレージが使えないため保存をスキップ");
            return;
        };
        if let Err(e) = storage.set_item(&self.slot, text) {
            log::warn!("保存に失敗: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// 書き込みを常に失敗させるストレージ
    #[derive(Debug, Default)]
    struct ReadOnlyStorage {
        items: HashMap<String, String>,
    }

    impl Storage for ReadOnlyStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>> {
            Ok(self.items.get(key).cloned())
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Storage("読み取り専用です".into()))
        }
    }

    #[test]
    fn test_slot_names() {
        assert_eq!(StorageKey::Shared.slot(Variant::Category), "CommentTaggerData");
        assert_eq!(StorageKey::Shared.slot(Variant::Extended), "CommentTaggerData");
        assert_eq!(
            StorageKey::PerVariant.slot(Variant::Extended),
            "CommentTaggerData.extended"
        );
        assert_eq!(StorageKey::from_isolate(true), StorageKey::PerVariant);
    }

    #[test]
    fn test_memory_storage_clones_share_items() {
        let mut a = MemoryStorage::new();
        let b = a.clone();
        a.set_item("k", "v").unwrap();
        assert_eq!(b.get_item("k").unwrap(), Some("v".to_string()));
        assert_eq!(b.get_item("other").unwrap(), None);
    }

    #[test]
    fn test_shared_slot_collides_across_variants() {
        let storage = MemoryStorage::new();
        let text = "#START\nc000,m,true,5\n#END";

        let mut a = Persistence::new(
            Some(Box::new(storage.clone())),
            StorageKey::Shared.slot(Variant::Category),
        );
        a.save(text);

        let c = Persistence::new(
            Some(Box::new(storage.clone())),
            StorageKey::Shared.slot(Variant::Extended),
        );
        assert_eq!(c.load().as_deref(), Some(text));

        let isolated = Persistence::new(
            Some(Box::new(storage)),
            StorageKey::PerVariant.slot(Variant::Extended),
        );
        assert_eq!(isolated.load(), None);
    }

    #[test]
    fn test_disabled_persistence() {
        let mut p = Persistence::disabled();
        assert!(!p.is_available());
        p.save("anything");
        assert_eq!(p.load(), None);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let mut storage = ReadOnlyStorage::default();
        storage.items.insert(STORAGE_FIELD.into(), "old".into());
        let mut p = Persistence::new(Some(Box::new(storage)), STORAGE_FIELD);
        p.save("new");
        assert_eq!(p.load().as_deref(), Some("old"));
    }

    #[test]
    #[cfg(not(target_arch = "wasm32"))]
    fn test_file_storage() {
        let dir = std::env::temp_dir().join(format!(
            "comment-tagger-storage-{}",
            std::process::id()
        ));
        let mut storage = FileStorage::new(&dir);
        assert_eq!(storage.get_item("slot").unwrap(), None);
        storage.set_item("slot", "#START\n#END").unwrap();
        assert_eq!(storage.get_item("slot").unwrap().as_deref(), Some("#START\n#END"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
