//! エクスポート（CLIとWASMで共有）

use crate::error::Result;
use crate::record::TagSet;

#[cfg(feature = "excel")]
pub mod xlsx_core;

/// キー → フィールド名 → 値 のJSONに書き出す
pub fn to_json(tags: &TagSet) -> Result<String> {
    Ok(serde_json::to_string_pretty(tags)?)
}
