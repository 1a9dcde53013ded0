//! 実験ページ（HTML）からタグ付け対象の要素IDを取り出す

use crate::error::{Result, TaggerError};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

/// タグ付け対象の要素に付けるクラス名（Web版と同じ）
pub const MARKER_CLASS: &str = "ui";

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"<[A-Za-z][^>]*>").unwrap();
    static ref ID_RE: Regex =
        Regex::new(r#"\sid\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#).unwrap();
    static ref CLASS_RE: Regex =
        Regex::new(r#"\sclass\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#).unwrap();
}

fn attribute<'a>(re: &Regex, tag: &'a str) -> Option<&'a str> {
    let caps = re.captures(tag)?;
    (1..=3).find_map(|i| caps.get(i)).map(|m| m.as_str())
}

/// 指定クラスを持つ要素のIDを出現順に列挙（重複は除く）
pub fn marked_ids(html: &str, class_name: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for tag in TAG_RE.find_iter(html).map(|m| m.as_str()) {
        let has_class = attribute(&CLASS_RE, tag)
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name));
        if !has_class {
            continue;
        }
        if let Some(id) = attribute(&ID_RE, tag).filter(|id| !id.is_empty()) {
            if !ids.iter().any(|known| known == id) {
                ids.push(id.to_string());
            }
        }
    }
    ids
}

/// キー一覧を読む
///
/// `.html` / `.htm` は実験ページとみなし、`ui` クラスの要素IDを使う。
pub fn load_keys(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(TaggerError::FileNotFound(path.display().to_string()));
    }
    let text = std::fs::read_to_string(path)?;
    let is_html = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| ext == "html" || ext == "htm");

    let keys = if is_html {
        marked_ids(&text, MARKER_CLASS)
    } else {
        keys_from_list(&text)
    };
    if keys.is_empty() {
        return Err(TaggerError::NoInput(path.display().to_string()));
    }
    log::debug!("{}: キー{}件", path.display(), keys.len());
    Ok(keys)
}

/// キー一覧ファイル（1行1キー、`#` で始まる行は無視）を読む
pub fn keys_from_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
