//! コントロールとテキストバッファの双方向同期
//!
//! - コントロール → レコード: 変更イベントで該当フィールドを書き換え、時刻を更新し、
//!   バッファを再生成して保存する。
//! - テキスト → レコード → コントロール: バッファ全体を再解析してレコードに取り込み、
//!   全レコードの値をコントロールに反映して保存する。
//!
//! 競合解決はしない。直接編集されたバッファが常に勝つ。

use crate::controls::{ControlId, ControlValue};
use crate::format::{import_text, serialize};
use crate::record::TagSet;
use crate::schema::Schema;
use crate::storage::Persistence;

/// 画面上のコントロール群（描画アダプタが実装する）
pub trait ControlSurface {
    /// 現在の状態（コントロールがなければ None）
    fn read(&self, id: &ControlId) -> Option<ControlValue>;

    /// 状態を書き込む（コントロールがなければ何もしない）
    fn write(&mut self, id: &ControlId, value: &ControlValue);
}

/// 現在時刻（エポックミリ秒）
pub type Clock = Box<dyn Fn() -> i64>;

/// ページ1枚分のタグ付け状態
pub struct TagSession {
    tags: TagSet,
    buffer: String,
    persistence: Persistence,
    clock: Clock,
}

impl TagSession {
    /// 保存データを読み込み、発見した要素キーごとにレコードを用意する
    ///
    /// 保存データがなければバッファは空。起動時には保存しない。
    pub fn start<I, K>(schema: &'static Schema, keys: I, persistence: Persistence, clock: Clock) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let buffer = persistence.load().unwrap_or_default();
        let mut tags = TagSet::new(schema);
        for key in keys {
            tags.ensure(key.as_ref());
        }
        let imported = import_text(&mut tags, &buffer);
        if persistence.is_available() {
            log::info!(
                "タグ付け開始: {} ({}件, 保存データ{}行, 保存枠 {})",
                schema.variant,
                tags.len(),
                imported,
                persistence.slot()
            );
        } else {
            log::info!(
                "タグ付け開始: {} ({}件, 保存先なし)",
                schema.variant,
                tags.len()
            );
        }

        Self {
            tags,
            buffer,
            persistence,
            clock,
        }
    }

    pub fn schema(&self) -> &'static Schema {
        self.tags.schema()
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// コントロールの変更を反映
    ///
    /// id を解読できない、レコードがない、値の種類が合わない場合は何もせず None。
    /// 反映した場合は再生成したバッファを返す。
    pub fn on_control_changed(&mut self, raw_id: &str, value: ControlValue) -> Option<&str> {
        let Some(id) = ControlId::decode(self.schema(), raw_id) else {
            log::warn!("不明なコントロール: {}", raw_id);
            return None;
        };
        self.apply_control(&id, value)
    }

    /// 解読済みの id でコントロールの変更を反映
    pub fn apply_control(&mut self, id: &ControlId, value: ControlValue) -> Option<&str> {
        let kind = self.schema().field(id.role)?.kind;
        let Some(field_value) = value.into_field(kind) else {
            log::warn!("コントロールの値の種類が不正: {}", id);
            return None;
        };
        let Some(record) = self.tags.get_mut(&id.key) else {
            log::warn!("レコードがありません: {}", id.key);
            return None;
        };

        record.set(id.role, field_value);
        record.touch((self.clock)());

        self.buffer = serialize(&self.tags);
        self.persistence.save(&self.buffer);
        Some(&self.buffer)
    }

    /// バッファの直接編集を反映
    ///
    /// 書き換えたコントロールの数を返す。
    pub fn on_buffer_input<S>(&mut self, text: &str, surface: &mut S) -> usize
    where
        S: ControlSurface + ?Sized,
    {
        self.buffer = text.to_string();
        import_text(&mut self.tags, &self.buffer);
        let written = self.push_controls(surface);
        self.persistence.save(&self.buffer);
        written
    }

    /// 全レコードの値をコントロールに反映
    ///
    /// 現在の状態と異なるコントロールだけを書き換え、その数を返す。
    pub fn push_controls<S>(&self, surface: &mut S) -> usize
    where
        S: ControlSurface + ?Sized,
    {
        let schema = self.schema();
        let mut written = 0;

        for (key, record) in &self.tags {
            for (field, value) in schema.fields.iter().zip(record.values()) {
                let Some(wanted) = ControlValue::from_field(field.kind, value) else {
                    continue;
                };
                let id = ControlId::new(field.role, key.as_str());
                match surface.read(&id) {
                    None => continue,
                    Some(current) if current == wanted => continue,
                    Some(_) => {
                        surface.write(&id, &wanted);
                        written += 1;
                    }
                }
            }
        }

        log::debug!("コントロール{}件を更新", written);
        written
    }
}
