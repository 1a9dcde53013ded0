//! レコードとタグ集合の型定義
//!
//! レコードはスキーマのフィールド順に並んだ値の列として保持する。
//! タグ集合はキー（要素ID）でソートされたマップ。

use crate::schema::{FieldKind, FieldRole, Schema};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// 整数値（解析できなかった場合は NaN）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntValue {
    Num(i64),
    NaN,
}

impl IntValue {
    /// 先頭の整数部分だけを読み取る緩い解析
    ///
    /// 先頭の空白を読み飛ばし、符号と数字の並びを解釈する。数字がなければ NaN。
    /// "123abc" は 123、"abc" と "" は NaN になる。
    pub fn parse_lenient(s: &str) -> Self {
        let s = s.trim_start();
        let (negative, digits) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let end = digits
            .bytes()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(digits.len());
        if end == 0 {
            return IntValue::NaN;
        }

        let mut value: i64 = 0;
        for b in digits[..end].bytes() {
            value = match value
                .checked_mul(10)
                .and_then(|v| v.checked_add(i64::from(b - b'0')))
            {
                Some(v) => v,
                None => return IntValue::NaN,
            };
        }
        IntValue::Num(if negative { -value } else { value })
    }

    pub fn as_num(self) -> Option<i64> {
        match self {
            IntValue::Num(n) => Some(n),
            IntValue::NaN => None,
        }
    }

    pub fn is_nan(self) -> bool {
        matches!(self, IntValue::NaN)
    }
}

impl Default for IntValue {
    fn default() -> Self {
        IntValue::Num(0)
    }
}

impl fmt::Display for IntValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntValue::Num(n) => write!(f, "{}", n),
            IntValue::NaN => f.write_str("NaN"),
        }
    }
}

impl Serialize for IntValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            IntValue::Num(n) => serializer.serialize_i64(*n),
            IntValue::NaN => serializer.serialize_str("NaN"),
        }
    }
}

/// フィールド値
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Code(String),
    Flag(bool),
    Int(IntValue),
}

impl FieldValue {
    /// 新規レコードの初期値
    pub fn default_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Choice(_) => FieldValue::Code(String::new()),
            FieldKind::Bool => FieldValue::Flag(false),
            FieldKind::Flag01 | FieldKind::Timestamp => FieldValue::Int(IntValue::Num(0)),
        }
    }

    /// 1列分のテキストを解析（列がない場合は None）
    pub fn parse(kind: FieldKind, column: Option<&str>) -> Self {
        match kind {
            FieldKind::Choice(_) => FieldValue::Code(column.unwrap_or_default().to_string()),
            FieldKind::Bool => FieldValue::Flag(column == Some("true")),
            FieldKind::Flag01 | FieldKind::Timestamp => {
                FieldValue::Int(column.map_or(IntValue::NaN, IntValue::parse_lenient))
            }
        }
    }

    pub fn as_code(&self) -> Option<&str> {
        match self {
            FieldValue::Code(code) => Some(code),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<IntValue> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// フラグとして真か（0/1 フラグは 0 以外を真とみなす）
    pub fn is_set(&self) -> bool {
        match self {
            FieldValue::Flag(b) => *b,
            FieldValue::Int(IntValue::Num(n)) => *n != 0,
            FieldValue::Int(IntValue::NaN) => false,
            FieldValue::Code(code) => !code.is_empty(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Code(code) => f.write_str(code),
            FieldValue::Flag(b) => write!(f, "{}", b),
            FieldValue::Int(v) => write!(f, "{}", v),
        }
    }
}

/// 1要素分のタグ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    schema: &'static Schema,
    values: Vec<FieldValue>,
}

impl Record {
    /// 初期値のレコードを作成
    pub fn new(schema: &'static Schema) -> Self {
        let values = schema
            .fields
            .iter()
            .map(|f| FieldValue::default_for(f.kind))
            .collect();
        Self { schema, values }
    }

    /// キーを除いた列からレコードを作成
    ///
    /// 列はスキーマ順に対応付け、足りない列は空・false・NaN、余分な列は無視する。
    pub fn from_columns(schema: &'static Schema, columns: &[&str]) -> Self {
        let values = schema
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| FieldValue::parse(f.kind, columns.get(i).copied()))
            .collect();
        Self { schema, values }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn get(&self, role: FieldRole) -> Option<&FieldValue> {
        self.schema.position(role).map(|i| &self.values[i])
    }

    /// 値を設定（スキーマにない役割なら false）
    pub fn set(&mut self, role: FieldRole, value: FieldValue) -> bool {
        match self.schema.position(role) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn updated(&self) -> Option<IntValue> {
        self.get(FieldRole::Updated).and_then(FieldValue::as_int)
    }

    /// 更新時刻を進める
    ///
    /// 新しい値は必ず直前の値より大きくなる（同一ミリ秒内の連続更新でも単調増加）。
    pub fn touch(&mut self, now_millis: i64) {
        let Some(i) = self.schema.position(FieldRole::Updated) else {
            return;
        };
        let next = match self.values[i].as_int() {
            Some(IntValue::Num(prev)) if prev >= now_millis => prev.saturating_add(1),
            _ => now_millis,
        };
        self.values[i] = FieldValue::Int(IntValue::Num(next));
    }

    /// "キー,値1,値2,..." の1行に整形
    pub fn to_line(&self, key: &str) -> String {
        let mut line = key.to_string();
        for value in &self.values {
            line.push(',');
            line.push_str(&value.to_string());
        }
        line
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.schema.fields.iter().zip(&self.values) {
            map.serialize_entry(field.role.name(), value)?;
        }
        map.end()
    }
}

/// キー → レコードの対応表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    schema: &'static Schema,
    records: BTreeMap<String, Record>,
}

impl TagSet {
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            records: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Record> {
        self.records.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// レコードを追加（既存のキーは置き換え）
    pub fn insert(&mut self, key: impl Into<String>, record: Record) -> Option<Record> {
        self.records.insert(key.into(), record)
    }

    /// キーがなければ初期値のレコードを作成
    pub fn ensure(&mut self, key: &str) -> &mut Record {
        let schema = self.schema;
        self.records
            .entry(key.to_string())
            .or_insert_with(|| Record::new(schema))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// キー順に走査
    pub fn iter(&self) -> btree_map::Iter<'_, String, Record> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = (&'a String, &'a Record);
    type IntoIter = btree_map::Iter<'a, String, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for (key, record) in &self.records {
            map.serialize_entry(key, record)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Variant;

    #[test]
    fn test_parse_lenient() {
        assert_eq!(IntValue::parse_lenient("1700000000000"), IntValue::Num(1700000000000));
        assert_eq!(IntValue::parse_lenient("  42"), IntValue::Num(42));
        assert_eq!(IntValue::parse_lenient("-7"), IntValue::Num(-7));
        assert_eq!(IntValue::parse_lenient("123abc"), IntValue::Num(123));
        assert_eq!(IntValue::parse_lenient("abc"), IntValue::NaN);
        assert_eq!(IntValue::parse_lenient(""), IntValue::NaN);
        assert_eq!(IntValue::parse_lenient("-"), IntValue::NaN);
        assert_eq!(IntValue::parse_lenient("NaN"), IntValue::NaN);
    }

    #[test]
    fn test_int_value_display() {
        assert_eq!(IntValue::Num(5).to_string(), "5");
        assert_eq!(IntValue::NaN.to_string(), "NaN");
    }

    #[test]
    fn test_new_record_defaults() {
        let record = Record::new(Variant::Category.schema());
        assert_eq!(record.to_line("c000"), "c000,,false,0");

        let record = Record::new(Variant::Simple.schema());
        assert_eq!(record.to_line("c000"), "c000,,0");

        let record = Record::new(Variant::Extended.schema());
        assert_eq!(record.to_line("c000"), "c000,false,,,false,0");
    }

    #[test]
    fn test_from_columns_missing_and_extra() {
        let schema = Variant::Category.schema();

        let record = Record::from_columns(schema, &["m"]);
        assert_eq!(record.get(FieldRole::Category), Some(&FieldValue::Code("m".into())));
        assert_eq!(record.get(FieldRole::Ungrammatical), Some(&FieldValue::Flag(false)));
        assert_eq!(record.updated(), Some(IntValue::NaN));

        let record = Record::from_columns(schema, &["o", "true", "10", "extra"]);
        assert_eq!(record.to_line("k"), "k,o,true,10");
    }

    #[test]
    fn test_bool_requires_exact_true() {
        let schema = Variant::Category.schema();
        let record = Record::from_columns(schema, &["m", "TRUE", "0"]);
        assert_eq!(record.get(FieldRole::Ungrammatical), Some(&FieldValue::Flag(false)));
        let record = Record::from_columns(schema, &["m", " true", "0"]);
        assert_eq!(record.get(FieldRole::Ungrammatical), Some(&FieldValue::Flag(false)));
    }

    #[test]
    fn test_touch_is_strictly_increasing() {
        let mut record = Record::new(Variant::Category.schema());
        record.touch(1000);
        assert_eq!(record.updated(), Some(IntValue::Num(1000)));

        // 同じ時刻でも前の値より大きくなる
        record.touch(1000);
        assert_eq!(record.updated(), Some(IntValue::Num(1001)));

        // 時計が戻っても減らない
        record.touch(500);
        assert_eq!(record.updated(), Some(IntValue::Num(1002)));

        record.touch(5000);
        assert_eq!(record.updated(), Some(IntValue::Num(5000)));
    }

    #[test]
    fn test_touch_replaces_nan() {
        let schema = Variant::Category.schema();
        let mut record = Record::from_columns(schema, &["m", "false", "oops"]);
        assert_eq!(record.updated(), Some(IntValue::NaN));
        record.touch(1234);
        assert_eq!(record.updated(), Some(IntValue::Num(1234)));
    }

    #[test]
    fn test_touch_without_timestamp_is_noop() {
        let schema = Variant::Simple.schema();
        let mut record = Record::from_columns(schema, &["e", "1"]);
        record.touch(1234);
        assert_eq!(record.to_line("k"), "k,e,1");
    }

    #[test]
    fn test_set_unknown_role() {
        let mut record = Record::new(Variant::Simple.schema());
        assert!(!record.set(FieldRole::Target, FieldValue::Code("n".into())));
        assert!(record.set(FieldRole::Language, FieldValue::Code("j".into())));
        assert_eq!(record.to_line("k"), "k,j,0");
    }

    #[test]
    fn test_tagset_ensure_keeps_existing() {
        let schema = Variant::Category.schema();
        let mut tags = TagSet::new(schema);
        tags.insert("c001", Record::from_columns(schema, &["m", "true", "5"]));
        tags.ensure("c001");
        tags.ensure("c000");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.get("c001").unwrap().to_line("c001"), "c001,m,true,5");
        assert_eq!(tags.keys().collect::<Vec<_>>(), vec!["c000", "c001"]);
    }

    #[test]
    fn test_tagset_json() {
        let schema = Variant::Category.schema();
        let mut tags = TagSet::new(schema);
        tags.insert("c000", Record::from_columns(schema, &["m", "true", "5"]));
        tags.insert("c001", Record::from_columns(schema, &["o", "false", "x"]));

        let json = serde_json::to_value(&tags).unwrap();
        assert_eq!(json["c000"]["ctype"], "m");
        assert_eq!(json["c000"]["ung"], true);
        assert_eq!(json["c000"]["updated"], 5);
        assert_eq!(json["c001"]["updated"], "NaN");
    }
}
