//! タグ付け結果の集計

use crate::record::{IntValue, TagSet};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// 1つのバッファの集計結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// レコード数
    pub total: usize,
    /// 分類コードごとの件数（件数の多い順、同数はコード順）
    pub counts: Vec<(String, usize)>,
    /// 分類が未設定のレコード数
    pub untagged: usize,
    /// フラグが立っているレコード数
    pub flagged: usize,
    /// 更新時刻が NaN のレコード数
    pub invalid_timestamps: usize,
    /// 最新の更新時刻
    pub last_updated: Option<i64>,
}

impl Summary {
    pub fn ratio(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64
        }
    }
}

/// 集計する
pub fn summarize(tags: &TagSet) -> Summary {
    let schema = tags.schema();
    let choice_role = schema.primary_choice().map(|f| f.role);
    let flag_role = schema.primary_flag().map(|f| f.role);

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut untagged = 0;
    let mut flagged = 0;
    let mut invalid_timestamps = 0;
    let mut last_updated: Option<i64> = None;

    for (_, record) in tags {
        if let Some(code) = choice_role.and_then(|r| record.get(r)).and_then(|v| v.as_code()) {
            if code.is_empty() {
                untagged += 1;
            } else {
                *counts.entry(code.to_string()).or_default() += 1;
            }
        }
        if flag_role.and_then(|r| record.get(r)).is_some_and(|v| v.is_set()) {
            flagged += 1;
        }
        match record.updated() {
            Some(IntValue::NaN) => invalid_timestamps += 1,
            Some(IntValue::Num(n)) if n > 0 => {
                last_updated = Some(last_updated.map_or(n, |m| m.max(n)));
            }
            _ => {}
        }
    }

    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Summary {
        total: tags.len(),
        counts,
        untagged,
        flagged,
        invalid_timestamps,
        last_updated,
    }
}

impl fmt::Display for Summary {
    /// "total code:n(0.50) ..." 形式
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.total)?;
        for (code, n) in &self.counts {
            write!(f, " {}:{}({:.2})", code, n, self.ratio(*n))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::parse;
    use crate::schema::Variant;

    #[test]
    fn test_summarize_category() {
        let text = "#START\nc0,m,false,10\nc1,m,true,30\nc2,o,true,20\nc3,,false,0\n#END";
        let summary = summarize(&parse(Variant::Category.schema(), text));

        assert_eq!(summary.total, 4);
        assert_eq!(summary.counts, vec![("m".to_string(), 2), ("o".to_string(), 1)]);
        assert_eq!(summary.untagged, 1);
        assert_eq!(summary.flagged, 2);
        assert_eq!(summary.last_updated, Some(30));
        assert_eq!(summary.to_string(), "4 m:2(0.50) o:1(0.25)");
    }

    #[test]
    fn test_summarize_simple_flag01() {
        let text = "a,e,1\nb,e,0\nc,j,1";
        let summary = summarize(&parse(Variant::Simple.schema(), text));
        assert_eq!(summary.flagged, 2);
        assert_eq!(summary.last_updated, None);
        assert_eq!(summary.counts[0], ("e".to_string(), 2));
    }

    #[test]
    fn test_summarize_counts_nan() {
        let text = "k,true,n,m,false,oops";
        let summary = summarize(&parse(Variant::Extended.schema(), text));
        assert_eq!(summary.invalid_timestamps, 1);
        assert_eq!(summary.counts, vec![("m".to_string(), 1)]);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&parse(Variant::Category.schema(), ""));
        assert_eq!(summary.total, 0);
        assert_eq!(summary.to_string(), "0");
    }
}
