//! 入力コントロールの組み立て
//!
//! 要素キーとスキーマから、画面に置くコントロールの宣言的な記述を作る。
//! 実際の DOM 生成は描画アダプタ（web-wasm の dom モジュール）が行う。

use crate::record::{FieldValue, IntValue};
use crate::schema::{split_choice, FieldKind, FieldRole, FieldSpec, Schema};
use std::fmt;

/// コントロールの識別子（役割 + レコードキー）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControlId {
    pub role: FieldRole,
    pub key: String,
}

impl ControlId {
    pub fn new(role: FieldRole, key: impl Into<String>) -> Self {
        Self {
            role,
            key: key.into(),
        }
    }

    /// DOM の id 属性に使う文字列（接頭辞 + キー）
    pub fn encode(&self) -> String {
        format!("{}{}", self.role.prefix(), self.key)
    }

    /// id 属性からスキーマ内のコントロールを逆引き
    pub fn decode(schema: &Schema, id: &str) -> Option<Self> {
        schema
            .fields
            .iter()
            .filter(|f| f.has_control())
            .find_map(|f| {
                id.strip_prefix(f.role.prefix())
                    .filter(|key| !key.is_empty())
                    .map(|key| ControlId::new(f.role, key))
            })
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// コントロールの状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlValue {
    Selected(String),
    Checked(bool),
}

impl ControlValue {
    /// フィールド値をコントロールの状態に変換（時刻フィールドは None）
    pub fn from_field(kind: FieldKind, value: &FieldValue) -> Option<Self> {
        match kind {
            FieldKind::Choice(_) => Some(ControlValue::Selected(value.to_string())),
            FieldKind::Bool | FieldKind::Flag01 => Some(ControlValue::Checked(value.is_set())),
            FieldKind::Timestamp => None,
        }
    }

    /// コントロールの状態をフィールド値に変換（種類が合わなければ None）
    pub fn into_field(self, kind: FieldKind) -> Option<FieldValue> {
        match (kind, self) {
            (FieldKind::Choice(_), ControlValue::Selected(code)) => Some(FieldValue::Code(code)),
            (FieldKind::Bool, ControlValue::Checked(b)) => Some(FieldValue::Flag(b)),
            (FieldKind::Flag01, ControlValue::Checked(b)) => {
                Some(FieldValue::Int(IntValue::Num(i64::from(b))))
            }
            _ => None,
        }
    }
}

/// 選択肢1件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub value: String,
    /// 表示文字列 "<code>)<label>"
    pub text: String,
}

/// コントロールの宣言的な記述
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlSpec {
    Select {
        id: ControlId,
        options: Vec<OptionSpec>,
    },
    Checkbox {
        id: ControlId,
        caption: &'static str,
    },
    /// コントロール間の空白
    Spacer,
}

impl ControlSpec {
    pub fn id(&self) -> Option<&ControlId> {
        match self {
            ControlSpec::Select { id, .. } | ControlSpec::Checkbox { id, .. } => Some(id),
            ControlSpec::Spacer => None,
        }
    }
}

/// 要素1つ分のコントロールを組み立てる
pub fn build_controls(schema: &Schema, key: &str) -> Vec<ControlSpec> {
    let mut specs = Vec::new();
    for field in schema.fields.iter().filter(|f| f.has_control()) {
        if !specs.is_empty() {
            specs.push(ControlSpec::Spacer);
        }
        specs.push(control_for(field, key));
    }
    specs
}

fn control_for(field: &FieldSpec, key: &str) -> ControlSpec {
    let id = ControlId::new(field.role, key);
    match field.kind {
        FieldKind::Choice(choices) => ControlSpec::Select {
            id,
            options: choices
                .iter()
                .map(|entry| {
                    let (code, label) = split_choice(entry);
                    OptionSpec {
                        value: code.to_string(),
                        text: format!("{}){}", code, label),
                    }
                })
                .collect(),
        },
        _ => ControlSpec::Checkbox {
            id,
            caption: field.caption,
        },
    }
}
