//! 提出ファイルの読み込み
//!
//! 作業者から集めたバッファ（メール本文ごと保存されたものを含む）を読み込み、
//! `#START`〜`#END` の範囲を解析する。

use crate::error::{Result, TaggerError};
use comment_tagger_common::{extract_block, parse_with_report, Diagnostic, TagSet, Variant};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const BUFFER_EXTENSIONS: &[&str] = &["txt", "tags", "eml"];

/// 読み込んだ1ファイル分
#[derive(Debug, Clone)]
pub struct LoadedBuffer {
    pub path: PathBuf,
    pub variant: Variant,
    pub tags: TagSet,
    pub diagnostics: Vec<Diagnostic>,
}

/// ファイルとフォルダの指定から入力ファイルを列挙
///
/// フォルダは直下のみを対象にし、拡張子で絞り込んだうえでファイル名順に並べる。
pub fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            return Err(TaggerError::FileNotFound(path.display().to_string()));
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && is_buffer_file(p))
            .collect();
        found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        log::debug!("{}: {}件", path.display(), found.len());
        files.extend(found);
    }

    if files.is_empty() {
        let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        return Err(TaggerError::NoInput(names.join(", ")));
    }
    Ok(files)
}

fn is_buffer_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| BUFFER_EXTENSIONS.contains(&ext.as_str()))
}

/// バッファ部分のテキストを読む
pub fn read_buffer(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(TaggerError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(extract_block(&content).to_string())
}

/// 使うバリアントを決める（指定 > 列数からの推定 > 既定値）
pub fn resolve_variant(explicit: Option<Variant>, text: &str, fallback: Variant) -> Variant {
    if let Some(variant) = explicit {
        return variant;
    }
    match Variant::detect(text) {
        Some(variant) => {
            log::debug!("列数からバリアントを判定: {}", variant);
            variant
        }
        None => {
            log::debug!("バリアントを判定できないため既定値を使用: {}", fallback);
            fallback
        }
    }
}

/// ファイルを読み込んで解析
pub fn load_buffer(path: &Path, explicit: Option<Variant>, fallback: Variant) -> Result<LoadedBuffer> {
    let text = read_buffer(path)?;
    let variant = resolve_variant(explicit, &text, fallback);
    let (tags, diagnostics) = parse_with_report(variant.schema(), &text);
    Ok(LoadedBuffer {
        path: path.to_path_buf(),
        variant,
        tags,
        diagnostics,
    })
}

/// 複数ファイルを同じバリアントで読み込む
///
/// バリアント未指定の場合は最初のファイルで判定したものを残りにも使う。
pub fn load_buffers(paths: &[PathBuf], explicit: Option<Variant>, fallback: Variant) -> Result<Vec<LoadedBuffer>> {
    let mut variant = explicit;
    let mut loaded = Vec::with_capacity(paths.len());
    for path in paths {
        let buffer = load_buffer(path, variant, fallback)?;
        variant.get_or_insert(buffer.variant);
        loaded.push(buffer);
    }
    Ok(loaded)
}
