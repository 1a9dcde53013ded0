//! Comment Tagger Web (WASM)
//!
//! `ui` クラスの要素ごとにタグ付けコントロールを追加し、textarea のテキストと
//! localStorage に同期する。

mod console_log;
mod dom;
mod local_storage;
mod tagger;

use comment_tagger_common::{StorageKey, Variant};
use wasm_bindgen::prelude::*;

pub use tagger::Tagger;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    console_log::init(log::LevelFilter::Info);
}

/// category バリアントを共通の保存枠で起動
#[wasm_bindgen]
pub fn run(textarea_id: &str) -> Result<Tagger, JsValue> {
    Tagger::start(textarea_id, Variant::Category, StorageKey::Shared)
}

/// バリアントと保存枠を指定して起動
#[wasm_bindgen(js_name = "runWith")]
pub fn run_with(textarea_id: &str, variant: &str, isolate_storage: bool) -> Result<Tagger, JsValue> {
    let variant: Variant = variant
        .parse()
        .map_err(|e: comment_tagger_common::Error| JsValue::from_str(&e.to_string()))?;
    Tagger::start(textarea_id, variant, StorageKey::from_isolate(isolate_storage))
}
