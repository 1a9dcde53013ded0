//! タグ付け結果のファイル出力

use crate::cli::ExportFormat;
use crate::error::{Result, TaggerError};
use comment_tagger_common::{export, Summary, TagSet};
use std::path::{Path, PathBuf};

/// 出力先の決定（省略時は入力ファイルの拡張子を差し替える）
pub fn output_path_for_format(input: &Path, output: Option<&Path>, format: ExportFormat) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => {
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("tags");
            path.join(format!("{}.{}", stem, format.extension()))
        }
        Some(path) => path.to_path_buf(),
        None => input.with_extension(format.extension()),
    }
}

pub fn export_tags(tags: &TagSet, format: ExportFormat, output_path: &Path) -> Result<()> {
    match format {
        ExportFormat::Json => {
            println!("- JSONを生成中...");
            let json = export::to_json(tags)?;
            std::fs::write(output_path, json)?;
            println!("✔ JSON出力: {}", output_path.display());
        }
        ExportFormat::Excel => {
            println!("- Excelを生成中...");
            let buffer = export::xlsx_core::generate_xlsx_buffer(tags)
                .map_err(TaggerError::ExcelGeneration)?;
            std::fs::write(output_path, buffer)?;
            println!("✔ Excel出力: {}", output_path.display());
        }
    }

    Ok(())
}

/// 集計結果の表示用テキスト
pub fn format_summary(name: &str, summary: &Summary) -> String {
    let mut lines = vec![format!("{}: {}", name, summary)];
    lines.push(format!(
        "  未分類: {}  フラグ: {}  不正な時刻: {}",
        summary.untagged, summary.flagged, summary.invalid_timestamps
    ));
    if let Some(updated) = summary.last_updated.and_then(format_timestamp) {
        lines.push(format!("  最終更新: {}", updated));
    }
    lines.join("\n")
}

/// ミリ秒のタイムスタンプをローカル時刻で表示
fn format_timestamp(millis: i64) -> Option<String> {
    let utc = chrono::DateTime::from_timestamp_millis(millis)?;
    Some(
        utc.with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    )
}
