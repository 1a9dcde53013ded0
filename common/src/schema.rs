//! タグ付けスキーマ定義
//!
//! 3種類のバリアントごとに、レコードのフィールド構成（順序・種類・選択肢表）を定義する。
//! - category: 分類, 非文法フラグ, 更新時刻
//! - simple: 言語, スキップフラグ(0/1)
//! - extended: 先頭フラグ, 対象, 分類, 非文法フラグ, 更新時刻

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// コメント分類の選択肢（"コード:ラベル"）
pub const CATEGORY_CHOICES: &[&str] = &[
    "m:Meta Info.",
    "o:Value Desc.",
    "a:Precondition",
    "p:Postcondition",
    "t:Type/Enum/Iface",
    "i:Instruction",
    "g:Guide",
    "c:Comment Out",
    "v:Visual Cue",
    "d:Directive",
    "u:Uncategorized",
];

/// コメントが説明している対象
pub const TARGET_CHOICES: &[&str] = &[
    "n:Next Line",
    "b:Following Block",
    "p:Preceding Code",
    "e:Enclosing Scope",
    "d:Declaration",
    "x:None",
];

/// コメントの記述言語
pub const LANGUAGE_CHOICES: &[&str] = &[
    "e:English",
    "j:Japanese",
    "c:Chinese",
    "o:Other",
];

/// "コード:ラベル" を (コード, ラベル) に分割
///
/// 区切りがない場合はエントリ全体をコードとして扱う。
pub fn split_choice(entry: &str) -> (&str, &str) {
    entry.split_once(':').unwrap_or((entry, ""))
}

/// フィールドの役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    Beginning,
    Target,
    Category,
    Language,
    Skip,
    Ungrammatical,
    Updated,
}

impl FieldRole {
    /// コントロールID の接頭辞
    pub fn prefix(self) -> &'static str {
        match self {
            FieldRole::Beginning => "B",
            FieldRole::Target => "T",
            FieldRole::Category | FieldRole::Language => "S",
            FieldRole::Skip | FieldRole::Ungrammatical => "C",
            FieldRole::Updated => "U",
        }
    }

    /// エクスポート時のフィールド名
    pub fn name(self) -> &'static str {
        match self {
            FieldRole::Beginning => "beginning",
            FieldRole::Target => "target",
            FieldRole::Category => "ctype",
            FieldRole::Language => "choice",
            FieldRole::Skip => "flag",
            FieldRole::Ungrammatical => "ung",
            FieldRole::Updated => "updated",
        }
    }
}

/// フィールドの値の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 選択肢表から選ぶコード
    Choice(&'static [&'static str]),
    /// true/false で書き出すフラグ
    Bool,
    /// 0/1 の整数で書き出すフラグ
    Flag01,
    /// 最終更新時刻（エポックミリ秒）
    Timestamp,
}

/// フィールド定義
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub role: FieldRole,
    pub kind: FieldKind,
    /// チェックボックスの見出し（選択リストでは空）
    pub caption: &'static str,
}

impl FieldSpec {
    /// 画面上にコントロールを持つか
    pub fn has_control(&self) -> bool {
        !matches!(self.kind, FieldKind::Timestamp)
    }
}

/// バリアントのフィールド構成
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    pub variant: Variant,
    pub fields: &'static [FieldSpec],
}

impl Schema {
    pub fn field(&self, role: FieldRole) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.role == role)
    }

    pub fn position(&self, role: FieldRole) -> Option<usize> {
        self.fields.iter().position(|f| f.role == role)
    }

    /// 集計に使う主たる選択肢フィールド
    pub fn primary_choice(&self) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .rev()
            .find(|f| matches!(f.kind, FieldKind::Choice(_)))
    }

    /// 集計に使うフラグフィールド
    pub fn primary_flag(&self) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .rev()
            .find(|f| matches!(f.kind, FieldKind::Bool | FieldKind::Flag01))
    }

    pub fn has_timestamp(&self) -> bool {
        self.fields.iter().any(|f| f.kind == FieldKind::Timestamp)
    }
}

const CATEGORY_FIELDS: &[FieldSpec] = &[
    FieldSpec { role: FieldRole::Category, kind: FieldKind::Choice(CATEGORY_CHOICES), caption: "" },
    FieldSpec { role: FieldRole::Ungrammatical, kind: FieldKind::Bool, caption: "Ung?" },
    FieldSpec { role: FieldRole::Updated, kind: FieldKind::Timestamp, caption: "" },
];

const SIMPLE_FIELDS: &[FieldSpec] = &[
    FieldSpec { role: FieldRole::Language, kind: FieldKind::Choice(LANGUAGE_CHOICES), caption: "" },
    FieldSpec { role: FieldRole::Skip, kind: FieldKind::Flag01, caption: "Skip?" },
];

const EXTENDED_FIELDS: &[FieldSpec] = &[
    FieldSpec { role: FieldRole::Beginning, kind: FieldKind::Bool, caption: "Beg?" },
    FieldSpec { role: FieldRole::Target, kind: FieldKind::Choice(TARGET_CHOICES), caption: "" },
    FieldSpec { role: FieldRole::Category, kind: FieldKind::Choice(CATEGORY_CHOICES), caption: "" },
    FieldSpec { role: FieldRole::Ungrammatical, kind: FieldKind::Bool, caption: "Ung?" },
    FieldSpec { role: FieldRole::Updated, kind: FieldKind::Timestamp, caption: "" },
];

static CATEGORY_SCHEMA: Schema = Schema { variant: Variant::Category, fields: CATEGORY_FIELDS };
static SIMPLE_SCHEMA: Schema = Schema { variant: Variant::Simple, fields: SIMPLE_FIELDS };
static EXTENDED_SCHEMA: Schema = Schema { variant: Variant::Extended, fields: EXTENDED_FIELDS };

/// タグ付けバリアント
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Category,
    Simple,
    Extended,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Category, Variant::Simple, Variant::Extended];

    pub fn schema(self) -> &'static Schema {
        match self {
            Variant::Category => &CATEGORY_SCHEMA,
            Variant::Simple => &SIMPLE_SCHEMA,
            Variant::Extended => &EXTENDED_SCHEMA,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Category => "category",
            Variant::Simple => "simple",
            Variant::Extended => "extended",
        }
    }

    /// テキストの列数からバリアントを推定
    ///
    /// コメント行・空行・1列しかない行を除いた行の列数（キーを除く）の最頻値で判定する。
    pub fn detect(text: &str) -> Option<Variant> {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for line in text.split('\n').map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let cols = line.split(',').count();
            if cols >= 2 {
                *counts.entry(cols - 1).or_default() += 1;
            }
        }

        // 同数の場合は列数の少ない方を優先して結果を安定させる
        let (fields, _) = counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))?;
        Variant::ALL
            .into_iter()
            .find(|v| v.schema().fields.len() == fields)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "category" | "a" => Ok(Variant::Category),
            "simple" | "b" => Ok(Variant::Simple),
            "extended" | "c" => Ok(Variant::Extended),
            other => Err(Error::UnknownVariant(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_split_choice() {
        assert_eq!(split_choice("m:Meta Info."), ("m", "Meta Info."));
        assert_eq!(split_choice("t:Type/Enum/Iface"), ("t", "Type/Enum/Iface"));
        assert_eq!(split_choice("x"), ("x", ""));
    }

    #[test]
    fn test_control_prefixes_unique_per_schema() {
        for variant in Variant::ALL {
            let mut seen = HashSet::new();
            for field in variant.schema().fields.iter().filter(|f| f.has_control()) {
                assert!(
                    seen.insert(field.role.prefix()),
                    "{} で接頭辞が重複: {}",
                    variant,
                    field.role.prefix()
                );
            }
        }
    }

    #[test]
    fn test_field_counts() {
        assert_eq!(Variant::Category.schema().fields.len(), 3);
        assert_eq!(Variant::Simple.schema().fields.len(), 2);
        assert_eq!(Variant::Extended.schema().fields.len(), 5);
        assert!(Variant::Category.schema().has_timestamp());
        assert!(!Variant::Simple.schema().has_timestamp());
    }

    #[test]
    fn test_primary_fields() {
        let schema = Variant::Extended.schema();
        assert_eq!(schema.primary_choice().unwrap().role, FieldRole::Category);
        assert_eq!(schema.primary_flag().unwrap().role, FieldRole::Ungrammatical);

        let schema = Variant::Simple.schema();
        assert_eq!(schema.primary_choice().unwrap().role, FieldRole::Language);
        assert_eq!(schema.primary_flag().unwrap().role, FieldRole::Skip);
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!("category".parse::<Variant>().unwrap(), Variant::Category);
        assert_eq!("Simple".parse::<Variant>().unwrap(), Variant::Simple);
        assert_eq!("c".parse::<Variant>().unwrap(), Variant::Extended);
        assert!(matches!(
            "unknown".parse::<Variant>(),
            Err(Error::UnknownVariant(_))
        ));
    }

    #[test]
    fn test_detect_variant() {
        let a = "#START\nc000,m,true,1700000000000\nc001,o,false,0\n#END";
        let b = "#START\nitem2,zoo,1\nitem1,moo,0\n#END";
        let c = "#START\nc000,true,n,m,false,1\n#END";
        assert_eq!(Variant::detect(a), Some(Variant::Category));
        assert_eq!(Variant::detect(b), Some(Variant::Simple));
        assert_eq!(Variant::detect(c), Some(Variant::Extended));
        assert_eq!(Variant::detect("#START\n#END"), None);
        assert_eq!(Variant::detect("k,a,b,c,d"), None);
    }

    #[test]
    fn test_variant_serde_lowercase() {
        let json = serde_json::to_string(&Variant::Extended).unwrap();
        assert_eq!(json, "\"extended\"");
        let v: Variant = serde_json::from_str("\"simple\"").unwrap();
        assert_eq!(v, Variant::Simple);
    }
}
