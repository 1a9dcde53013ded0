//! テキストバッファ形式の読み書き
//!
//! ```text
//! #START
//! <key>,<field1>,<field2>,...
//! #END
//! ```
//!
//! `#` で始まる行と空行は読み飛ばし、列が2つ未満の行は黙って捨てる。
//! 書き出しは常にキー順。

use crate::record::{Record, TagSet};
use crate::schema::Schema;
use std::fmt;

pub const START_MARKER: &str = "#START";
pub const END_MARKER: &str = "#END";

/// 読み捨てた行の情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1始まりの行番号
    pub line: usize,
    pub text: String,
    pub reason: &'static str,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}行目: {} ({})", self.line, self.reason, self.text)
    }
}

/// テキストを新しいタグ集合として解析
pub fn parse(schema: &'static Schema, text: &str) -> TagSet {
    let mut tags = TagSet::new(schema);
    import_text(&mut tags, text);
    tags
}

/// テキストを既存のタグ集合に取り込む
///
/// 行に現れたキーのレコードは置き換え、行に現れないキーはそのまま残す。
/// 取り込んだ行数を返す。
pub fn import_text(tags: &mut TagSet, text: &str) -> usize {
    import_lines(tags, text, |_| {})
}

/// 解析結果と読み捨てた行の一覧を返す
pub fn parse_with_report(schema: &'static Schema, text: &str) -> (TagSet, Vec<Diagnostic>) {
    let mut tags = TagSet::new(schema);
    let mut diagnostics = Vec::new();
    import_lines(&mut tags, text, |d| diagnostics.push(d));
    (tags, diagnostics)
}

fn import_lines<F>(tags: &mut TagSet, text: &str, mut on_dropped: F) -> usize
where
    F: FnMut(Diagnostic),
{
    let schema = tags.schema();
    let mut imported = 0;

    for (index, line) in text.split('\n').enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let cols: Vec<&str> = line.split(',').collect();
        if cols.len() < 2 {
            on_dropped(Diagnostic {
                line: index + 1,
                text: line.to_string(),
                reason: "列が2つ未満",
            });
            continue;
        }

        tags.insert(cols[0], Record::from_columns(schema, &cols[1..]));
        imported += 1;
    }

    log::debug!("{}行を取り込みました", imported);
    imported
}

/// タグ集合をテキストに書き出す
pub fn serialize(tags: &TagSet) -> String {
    let mut lines = Vec::with_capacity(tags.len() + 2);
    lines.push(START_MARKER.to_string());
    for (key, record) in tags {
        lines.push(record.to_line(key));
    }
    lines.push(END_MARKER.to_string());
    lines.join("\n")
}

/// メール本文などから `#START`〜`#END` の範囲を切り出す
///
/// 範囲が見つからない場合はテキスト全体を返す。
pub fn extract_block(text: &str) -> &str {
    let Some(start) = find_marker_line(text, START_MARKER, 0) else {
        return text;
    };
    let Some(end) = find_marker_line(text, END_MARKER, start) else {
        return text;
    };
    &text[start..end + END_MARKER.len()]
}

/// 行頭（前後の空白は許す）にあるマーカーのバイト位置
fn find_marker_line(text: &str, marker: &str, from: usize) -> Option<usize> {
    let mut offset = from;
    for line in text[from..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.trim_end() == marker {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldValue, IntValue};
    use crate::schema::{FieldRole, Variant};

    #[test]
    fn test_simple_example() {
        let text = "#START\nitem2,zoo,1\nitem1,moo,0\n#END";
        let tags = parse(Variant::Simple.schema(), text);

        assert_eq!(tags.len(), 2);
        let item1 = tags.get("item1").unwrap();
        assert_eq!(item1.get(FieldRole::Language), Some(&FieldValue::Code("moo".into())));
        assert_eq!(item1.get(FieldRole::Skip), Some(&FieldValue::Int(IntValue::Num(0))));
        let item2 = tags.get("item2").unwrap();
        assert_eq!(item2.get(FieldRole::Language), Some(&FieldValue::Code("zoo".into())));
        assert_eq!(item2.get(FieldRole::Skip), Some(&FieldValue::Int(IntValue::Num(1))));

        assert_eq!(serialize(&tags), "#START\nitem1,moo,0\nitem2,zoo,1\n#END");
    }

    #[test]
    fn test_round_trip_canonical() {
        let cases = [
            (Variant::Category, "#START\nc000,m,false,1700000000000\nc001,u,true,1700000000123\n#END"),
            (Variant::Simple, "#START\na,e,0\nb,j,1\n#END"),
            (Variant::Extended, "#START\nc000,true,n,p,false,42\nc010,false,x,c,true,NaN\n#END"),
        ];
        for (variant, text) in cases {
            let tags = parse(variant.schema(), text);
            assert_eq!(serialize(&tags), text, "{}", variant);
        }
    }

    #[test]
    fn test_sort_order() {
        let text = "c2,m,false,0\nc10,o,false,0\nC1,a,false,0\nc1,p,true,0";
        let tags = parse(Variant::Category.schema(), text);
        assert_eq!(
            serialize(&tags),
            "#START\nC1,a,false,0\nc1,p,true,0\nc10,o,false,0\nc2,m,false,0\n#END"
        );
    }

    #[test]
    fn test_malformed_lines_dropped() {
        let text = "#START\nlonely\n\n   \nc000,m,true,7\n#comment,with,commas\n#END";
        let (tags, diagnostics) = parse_with_report(Variant::Category.schema(), text);

        assert_eq!(tags.len(), 1);
        assert!(tags.get("lonely").is_none());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 2);
        assert_eq!(diagnostics[0].text, "lonely");
    }

    #[test]
    fn test_lines_are_trimmed_and_crlf_tolerated() {
        let text = "#START\r\n  c000,m,true,7  \r\n#END\r\n";
        let tags = parse(Variant::Category.schema(), text);
        assert_eq!(serialize(&tags), "#START\nc000,m,true,7\n#END");
    }

    #[test]
    fn test_nan_timestamp_round_trip() {
        let text = "c000,m,true,soon";
        let tags = parse(Variant::Category.schema(), text);
        assert_eq!(tags.get("c000").unwrap().updated(), Some(IntValue::NaN));
        assert_eq!(serialize(&tags), "#START\nc000,m,true,NaN\n#END");
    }

    #[test]
    fn test_later_line_wins_for_same_key() {
        let text = "c000,m,false,1\nc000,o,true,2";
        let tags = parse(Variant::Category.schema(), text);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get("c000").unwrap().to_line("c000"), "c000,o,true,2");
    }

    #[test]
    fn test_import_keeps_stale_keys() {
        let schema = Variant::Category.schema();
        let mut tags = parse(schema, "a,m,false,1\nb,o,false,1");
        let imported = import_text(&mut tags, "#START\nb,t,true,2\n#END");

        assert_eq!(imported, 1);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.get("a").unwrap().to_line("a"), "a,m,false,1");
        assert_eq!(tags.get("b").unwrap().to_line("b"), "b,t,true,2");
    }

    #[test]
    fn test_serialize_empty() {
        let tags = TagSet::new(Variant::Simple.schema());
        assert_eq!(serialize(&tags), "#START\n#END");
    }

    #[test]
    fn test_extract_block() {
        let mail = "Hello,\nhere are my results:\n\n#START\nc000,m,false,1\n#END\n\nThanks!";
        assert_eq!(extract_block(mail), "#START\nc000,m,false,1\n#END");

        let indented = "> #START\n> c000,m,false,1\n> #END";
        assert_eq!(extract_block(indented), indented);

        let plain = "c000,m,false,1";
        assert_eq!(extract_block(plain), plain);

        let unterminated = "#START\nc000,m,false,1";
        assert_eq!(extract_block(unterminated), unterminated);
    }
}
