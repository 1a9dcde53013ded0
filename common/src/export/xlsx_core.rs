//! Excel生成（共通ライブラリ）
//!
//! 1行1レコードの一覧表を作る。選択肢フィールドにはラベル列を添える。

use crate::record::{FieldValue, IntValue, TagSet};
use crate::schema::{split_choice, FieldKind};
use rust_xlsxwriter::*;

/// 選択肢コードのラベル（表にないコードは空）
fn choice_label(choices: &[&'static str], code: &str) -> &'static str {
    choices
        .iter()
        .map(|entry| split_choice(*entry))
        .find(|(c, _)| *c == code)
        .map(|(_, label)| label)
        .unwrap_or("")
}

/// Excelをバッファに生成
pub fn generate_xlsx_buffer(tags: &TagSet) -> Result<Vec<u8>, String> {
    let schema = tags.schema();
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::RGB(0x333333))
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(schema.variant.as_str())
        .map_err(|e| format!("シート名設定エラー: {}", e))?;

    // ヘッダ行
    let mut col: u16 = 0;
    worksheet
        .write_string_with_format(0, col, "key", &header_format)
        .map_err(|e| format!("ヘッダ書き込みエラー: {}", e))?;
    for field in schema.fields {
        col += 1;
        worksheet
            .write_string_with_format(0, col, field.role.name(), &header_format)
            .map_err(|e| format!("ヘッダ書き込みエラー: {}", e))?;
        if let FieldKind::Choice(_) = field.kind {
            col += 1;
            let label = format!("{}_label", field.role.name());
            worksheet
                .write_string_with_format(0, col, &label, &header_format)
                .map_err(|e| format!("ヘッダ書き込みエラー: {}", e))?;
        }
    }
    worksheet
        .set_column_width(0, 14)
        .map_err(|e| format!("列幅設定エラー: {}", e))?;
    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| format!("ウィンドウ枠固定エラー: {}", e))?;

    // データ行
    for (row, (key, record)) in (1u32..).zip(tags) {
        let mut col: u16 = 0;
        worksheet
            .write_string(row, col, key)
            .map_err(|e| format!("値書き込みエラー: {}", e))?;

        for (field, value) in schema.fields.iter().zip(record.values()) {
            col += 1;
            let written = match value {
                FieldValue::Code(code) => worksheet.write_string(row, col, code),
                FieldValue::Flag(b) => worksheet.write_boolean(row, col, *b),
                FieldValue::Int(IntValue::Num(n)) => worksheet.write_number(row, col, *n as f64),
                FieldValue::Int(IntValue::NaN) => worksheet.write_string(row, col, "NaN"),
            };
            written.map_err(|e| format!("値書き込みエラー: {}", e))?;

            if let FieldKind::Choice(choices) = field.kind {
                col += 1;
                let label = value.as_code().map_or("", |code| choice_label(choices, code));
                worksheet
                    .write_string(row, col, label)
                    .map_err(|e| format!("ラベル書き込みエラー: {}", e))?;
            }
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}
