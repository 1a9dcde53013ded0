//! 端末での対話式タグ付け
//!
//! ブラウザ版と同じ TagSession を使い、コントロールの代わりに端末のプロンプトで
//! 値を選ぶ。バッファは FileStorage に保存されるので、途中で終了しても続きから再開できる。

use crate::error::{Result, TaggerError};
use comment_tagger_common::{
    build_controls, serialize, ControlId, ControlSpec, ControlSurface, ControlValue,
    OptionSpec, Persistence, TagSession, Variant,
};
use dialoguer::{Confirm, Select};
use std::collections::HashMap;

/// 端末上のコントロール状態
#[derive(Debug, Default)]
pub struct TerminalSurface {
    controls: HashMap<String, ControlValue>,
}

impl TerminalSurface {
    /// キーごとのコントロールを未選択・未チェックの状態で用意
    pub fn render(specs: impl IntoIterator<Item = ControlSpec>) -> Self {
        let mut controls = HashMap::new();
        for spec in specs {
            match spec {
                ControlSpec::Select { id, .. } => {
                    controls.insert(id.encode(), ControlValue::Selected(String::new()));
                }
                ControlSpec::Checkbox { id, .. } => {
                    controls.insert(id.encode(), ControlValue::Checked(false));
                }
                ControlSpec::Spacer => {}
            }
        }
        Self { controls }
    }
}

impl ControlSurface for TerminalSurface {
    fn read(&self, id: &ControlId) -> Option<ControlValue> {
        self.controls.get(&id.encode()).cloned()
    }

    fn write(&mut self, id: &ControlId, value: &ControlValue) {
        if let Some(slot) = self.controls.get_mut(&id.encode()) {
            *slot = value.clone();
        }
    }
}

/// 選択リストでの操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectAction {
    Keep,
    Choose(String),
    Quit,
}

/// 選択肢の並び: [変更しない, 選択肢..., 保存して終了]
fn select_items(options: &[OptionSpec]) -> Vec<String> {
    let mut items = Vec::with_capacity(options.len() + 2);
    items.push("- 変更しない".to_string());
    items.extend(options.iter().map(|o| o.text.clone()));
    items.push("q 保存して終了".to_string());
    items
}

fn select_action(index: usize, options: &[OptionSpec]) -> SelectAction {
    match index {
        0 => SelectAction::Keep,
        i if i <= options.len() => SelectAction::Choose(options[i - 1].value.clone()),
        _ => SelectAction::Quit,
    }
}

fn current_index(current: Option<&ControlValue>, options: &[OptionSpec]) -> usize {
    match current {
        Some(ControlValue::Selected(code)) => options
            .iter()
            .position(|o| &o.value == code)
            .map_or(0, |i| i + 1),
        _ => 0,
    }
}

/// 未分類のキーか
fn is_untagged(session: &TagSession, key: &str) -> bool {
    let Some(field) = session.schema().primary_choice() else {
        return true;
    };
    session
        .tags()
        .get(key)
        .and_then(|r| r.get(field.role))
        .and_then(|v| v.as_code())
        .map_or(true, str::is_empty)
}

/// 書き出すバッファ
///
/// 一度も保存されていなければ、全キーの初期レコードを正規形で書き出す。
fn final_buffer(session: &TagSession) -> String {
    if session.buffer().trim().is_empty() {
        serialize(session.tags())
    } else {
        session.buffer().to_string()
    }
}

/// 対話式タグ付けを実行し、最終的なバッファを返す
pub fn run_tag_session(
    variant: Variant,
    keys: &[String],
    persistence: Persistence,
    only_untagged: bool,
) -> Result<String> {
    let schema = variant.schema();
    let clock = Box::new(|| chrono::Utc::now().timestamp_millis());
    let mut session = TagSession::start(schema, keys, persistence, clock);
    let mut surface =
        TerminalSurface::render(keys.iter().flat_map(|key| build_controls(schema, key)));
    session.push_controls(&mut surface);

    let targets: Vec<&String> = keys
        .iter()
        .filter(|key| !only_untagged || is_untagged(&session, key))
        .collect();
    if targets.is_empty() {
        println!("✓ タグ付けが必要な要素はありません");
        return Ok(final_buffer(&session));
    }

    println!("🏷  {} 件 ({})", targets.len(), variant);
    println!("---");

    'keys: for (count, key) in targets.iter().enumerate() {
        let line = session
            .tags()
            .get(key)
            .map(|r| r.to_line(key))
            .unwrap_or_default();
        println!("[{}/{}] {}", count + 1, targets.len(), line);

        for spec in build_controls(schema, key) {
            match spec {
                ControlSpec::Select { id, options } => {
                    let items = select_items(&options);
                    let default = current_index(surface.read(&id).as_ref(), &options);
                    let index = Select::new()
                        .with_prompt(id.role.name())
                        .items(&items)
                        .default(default)
                        .interact()
                        .map_err(|e| TaggerError::Prompt(e.to_string()))?;

                    match select_action(index, &options) {
                        SelectAction::Keep => {}
                        SelectAction::Choose(code) => {
                            let value = ControlValue::Selected(code);
                            surface.write(&id, &value);
                            session.on_control_changed(&id.encode(), value);
                        }
                        SelectAction::Quit => {
                            println!("保存して終了します...");
                            break 'keys;
                        }
                    }
                }
                ControlSpec::Checkbox { id, caption } => {
                    let current = matches!(surface.read(&id), Some(ControlValue::Checked(true)));
                    let checked = Confirm::new()
                        .with_prompt(caption)
                        .default(current)
                        .interact()
                        .map_err(|e| TaggerError::Prompt(e.to_string()))?;
                    if checked != current {
                        let value = ControlValue::Checked(checked);
                        surface.write(&id, &value);
                        session.on_control_changed(&id.encode(), value);
                    }
                }
                ControlSpec::Spacer => {}
            }
        }
        println!();
    }

    Ok(final_buffer(&session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use comment_tagger_common::{MemoryStorage, Storage, StorageKey, STORAGE_FIELD};

    fn options() -> Vec<OptionSpec> {
        vec![
            OptionSpec { value: "m".into(), text: "m)Meta Info.".into() },
            OptionSpec { value: "o".into(), text: "o)Value Desc.".into() },
        ]
    }

    #[test]
    fn test_select_items_and_actions() {
        let options = options();
        let items = select_items(&options);
        assert_eq!(items.len(), 4);
        assert_eq!(items[1], "m)Meta Info.");

        assert_eq!(select_action(0, &options), SelectAction::Keep);
        assert_eq!(select_action(2, &options), SelectAction::Choose("o".into()));
        assert_eq!(select_action(3, &options), SelectAction::Quit);
    }

    #[test]
    fn test_current_index() {
        let options = options();
        assert_eq!(current_index(Some(&ControlValue::Selected("o".into())), &options), 2);
        assert_eq!(current_index(Some(&ControlValue::Selected("".into())), &options), 0);
        assert_eq!(current_index(None, &options), 0);
    }

    #[test]
    fn test_surface_reflects_saved_buffer() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(STORAGE_FIELD, "#START\nc000,o,true,5\n#END")
            .unwrap();
        let persistence = Persistence::new(
            Some(Box::new(storage)),
            StorageKey::Shared.slot(Variant::Category),
        );
        let schema = Variant::Category.schema();
        let keys = vec!["c000".to_string(), "c001".to_string()];
        let session = TagSession::start(schema, &keys, persistence, Box::new(|| 0));

        let mut surface =
            TerminalSurface::render(keys.iter().flat_map(|key| build_controls(schema, key)));
        let written = session.push_controls(&mut surface);

        assert_eq!(written, 2);
        assert_eq!(
            surface.read(&ControlId::new(comment_tagger_common::FieldRole::Category, "c000")),
            Some(ControlValue::Selected("o".into()))
        );
        assert!(!is_untagged(&session, "c000"));
        assert!(is_untagged(&session, "c001"));
    }

    #[test]
    fn test_final_buffer_without_saved_data() {
        let storage = MemoryStorage::new();
        let persistence = Persistence::new(
            Some(Box::new(storage)),
            StorageKey::Shared.slot(Variant::Simple),
        );
        let session = TagSession::start(
            Variant::Simple.schema(),
            ["item2", "item1"],
            persistence,
            Box::new(|| 0),
        );

        assert_eq!(session.buffer(), "");
        assert_eq!(final_buffer(&session), "#START\nitem1,,0\nitem2,,0\n#END");
    }

    #[test]
    fn test_final_buffer_keeps_saved_text() {
        let mut storage = MemoryStorage::new();
        storage.set_item(STORAGE_FIELD, "#START\nitem1,j,1\n#END").unwrap();
        let persistence = Persistence::new(
            Some(Box::new(storage)),
            StorageKey::Shared.slot(Variant::Simple),
        );
        let session =
            TagSession::start(Variant::Simple.schema(), ["item1"], persistence, Box::new(|| 0));

        assert_eq!(final_buffer(&session), "#START\nitem1,j,1\n#END");
    }
}
