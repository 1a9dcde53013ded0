use clap::{Parser, Subcommand};
use comment_tagger_common::Variant;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "comment-tagger")]
#[command(about = "コメント分類実験のタグ付けデータ管理ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// バリアント (category/simple/extended)。省略時は列数から判定
    #[arg(long, global = true)]
    pub variant: Option<Variant>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// バッファを検査して読み飛ばされる行を表示
    Check {
        /// バッファファイル
        #[arg(required = true)]
        file: PathBuf,
    },

    /// キー順に並べ直した正規形で書き出す
    Normalize {
        /// バッファファイル
        #[arg(required = true)]
        file: PathBuf,

        /// 出力ファイル（省略時は上書き）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// ドライラン（書き込まずに表示）
        #[arg(long)]
        dry_run: bool,
    },

    /// 複数のバッファを統合（キーごとに更新時刻の新しい方を採用）
    Merge {
        /// バッファファイルまたはフォルダ
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// 出力ファイル
        #[arg(short, long)]
        output: PathBuf,
    },

    /// 分類ごとの件数を集計
    Summary {
        /// バッファファイルまたはフォルダ
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// レコードをJSON/Excelに出力
    Export {
        /// バッファファイル
        #[arg(required = true)]
        file: PathBuf,

        /// 出力形式 (json/xlsx)
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,

        /// 出力ファイル（省略時は入力ファイルの拡張子を変えたもの）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 端末で対話的にタグ付け
    Tag {
        /// 結果のバッファを書き出すファイル
        #[arg(required = true)]
        file: PathBuf,

        /// 対象キーの一覧（1行1キー、またはHTMLページ）
        #[arg(short, long)]
        keys: PathBuf,

        /// 分類が未設定のキーだけを対象にする
        #[arg(long)]
        untagged: bool,
    },

    /// 設定を表示/編集
    Config {
        /// 既定のバリアントを設定
        #[arg(long)]
        set_variant: Option<Variant>,

        /// バリアントごとに保存枠を分けるか
        #[arg(long)]
        set_isolate: Option<bool>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Excel,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Excel => "xlsx",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            _ => Err(format!("Unknown format: {}. Use json or xlsx", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Excel => write!(f, "xlsx"),
        }
    }
}
