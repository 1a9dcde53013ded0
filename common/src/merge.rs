//! 複数のバッファの統合
//!
//! 同じ作業者が複数のブラウザで作業した結果などをまとめる。キーごとに
//! 更新時刻の新しいレコードを採用する（時刻を持たないバリアントや同時刻は後勝ち）。

use crate::record::{IntValue, Record, TagSet};
use crate::schema::Schema;

/// タグ集合を順に統合
pub fn merge_tag_sets<I>(schema: &'static Schema, sets: I) -> TagSet
where
    I: IntoIterator<Item = TagSet>,
{
    let mut merged = TagSet::new(schema);
    for set in sets {
        for (key, record) in &set {
            let replace = match merged.get(key) {
                Some(current) => is_newer_or_equal(record, current),
                None => true,
            };
            if replace {
                merged.insert(key.as_str(), record.clone());
            }
        }
    }
    merged
}

fn is_newer_or_equal(candidate: &Record, current: &Record) -> bool {
    match (candidate.updated(), current.updated()) {
        (Some(a), Some(b)) => rank(a) >= rank(b),
        _ => true,
    }
}

/// NaN はどの数値よりも古いとみなす
fn rank(value: IntValue) -> Option<i64> {
    value.as_num()
}
