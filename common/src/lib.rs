//! Comment Tagger Common Library
//!
//! CLIとWeb(WASM)で共有されるタグ付けの中核部分:
//! スキーマ、レコード、テキスト形式、コントロール記述、同期エンジン、永続化

pub mod schema;
pub mod record;
pub mod format;
pub mod controls;
pub mod storage;
pub mod sync;
pub mod merge;
pub mod summary;
pub mod export;
pub mod error;

pub use schema::{FieldKind, FieldRole, FieldSpec, Schema, Variant};
pub use record::{FieldValue, IntValue, Record, TagSet};
pub use format::{extract_block, import_text, parse, parse_with_report, serialize, Diagnostic};
pub use controls::{build_controls, ControlId, ControlSpec, ControlValue, OptionSpec};
pub use storage::{MemoryStorage, Persistence, Storage, StorageKey, STORAGE_FIELD};
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
pub use sync::{Clock, ControlSurface, TagSession};
pub use merge::merge_tag_sets;
pub use summary::{summarize, Summary};
pub use error::{Error, Result};
