use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaggerError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("入力ファイルがありません: {0}")]
    NoInput(String),

    #[error("タグ付けデータのエラー: {0}")]
    Common(#[from] comment_tagger_common::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("入力エラー: {0}")]
    Prompt(String),
}

pub type Result<T> = std::result::Result<T, TaggerError>;
