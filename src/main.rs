use clap::Parser;
use comment_tagger::{cli, config, error, export, input, page, session};
use cli::{Cli, Commands};
use comment_tagger_common::{
    merge_tag_sets, serialize, summarize, FileStorage, IntValue, Persistence,
};
use config::Config;
use error::Result;

fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    let config = Config::load()?;
    let fallback = config.default_variant;

    match cli.command {
        Commands::Check { file } => {
            println!("🔍 comment-tagger - 検査\n");

            let loaded = input::load_buffer(&file, cli.variant, fallback)?;
            println!("バリアント: {}", loaded.variant);
            println!("レコード数: {}", loaded.tags.len());

            let nan_keys: Vec<&String> = loaded
                .tags
                .iter()
                .filter(|(_, record)| record.updated() == Some(IntValue::NaN))
                .map(|(key, _)| key)
                .collect();

            if loaded.diagnostics.is_empty() && nan_keys.is_empty() {
                println!("\n✅ 問題はありません");
            } else {
                if !loaded.diagnostics.is_empty() {
                    println!("\n⚠ 読み飛ばされる行: {}件", loaded.diagnostics.len());
                    for diagnostic in &loaded.diagnostics {
                        println!("  {}", diagnostic);
                    }
                }
                if !nan_keys.is_empty() {
                    println!("\n⚠ 更新時刻が NaN のレコード: {}件", nan_keys.len());
                    for key in nan_keys {
                        println!("  {}", key);
                    }
                }
            }
        }

        Commands::Normalize { file, output, dry_run } => {
            println!("🧹 comment-tagger - 正規化\n");

            let loaded = input::load_buffer(&file, cli.variant, fallback)?;
            let text = serialize(&loaded.tags);

            if !loaded.diagnostics.is_empty() {
                println!("- {}行を読み飛ばしました", loaded.diagnostics.len());
            }

            if dry_run {
                println!("{}", text);
                println!("\n（ドライラン: ファイルは変更されていません）");
            } else {
                let output_path = output.unwrap_or(file);
                std::fs::write(&output_path, &text)?;
                println!("✔ {}件を保存: {}", loaded.tags.len(), output_path.display());
            }
        }

        Commands::Merge { inputs, output } => {
            println!("🔀 comment-tagger - 統合\n");

            let files = input::collect_files(&inputs)?;
            println!("[1/2] {}ファイルを読み込み中...", files.len());
            let loaded = input::load_buffers(&files, cli.variant, fallback)?;
            for buffer in &loaded {
                println!("  {}: {}件", buffer.path.display(), buffer.tags.len());
            }

            let variant = loaded.first().map(|b| b.variant).unwrap_or(fallback);
            let merged = merge_tag_sets(variant.schema(), loaded.into_iter().map(|b| b.tags));

            println!("[2/2] 結果を保存中...");
            std::fs::write(&output, serialize(&merged))?;
            println!("✔ {}件を保存: {}", merged.len(), output.display());

            println!("\n✅ 統合完了");
        }

        Commands::Summary { inputs, json } => {
            let files = input::collect_files(&inputs)?;
            let loaded = input::load_buffers(&files, cli.variant, fallback)?;

            if json {
                let rows: Vec<serde_json::Value> = loaded
                    .iter()
                    .map(|b| {
                        serde_json::json!({
                            "file": b.path.display().to_string(),
                            "variant": b.variant,
                            "summary": summarize(&b.tags),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("📊 comment-tagger - 集計\n");
                for buffer in &loaded {
                    let name = buffer
                        .path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| buffer.path.display().to_string());
                    println!("{}", export::format_summary(&name, &summarize(&buffer.tags)));
                }
            }
        }

        Commands::Export { file, format, output } => {
            println!("📄 comment-tagger - エクスポート\n");

            let loaded = input::load_buffer(&file, cli.variant, fallback)?;
            let output_path = export::output_path_for_format(&file, output.as_deref(), format);
            export::export_tags(&loaded.tags, format, &output_path)?;

            println!("\n✅ エクスポート完了");
        }

        Commands::Tag { file, keys, untagged } => {
            println!("🏷  comment-tagger - タグ付け\n");

            let keys = page::load_keys(&keys)?;
            let variant = cli.variant.unwrap_or(fallback);
            let storage = FileStorage::new(config.storage_dir()?);
            let slot = config.storage_key().slot(variant);
            log::info!("保存先: {}", storage.path_for(&slot).display());

            let persistence = Persistence::new(Some(Box::new(storage)), slot);
            let buffer = session::run_tag_session(variant, &keys, persistence, untagged)?;

            std::fs::write(&file, &buffer)?;
            println!("✔ 結果を保存: {}", file.display());
        }

        Commands::Config { set_variant, set_isolate, show } => {
            let mut config = config;

            if let Some(variant) = set_variant {
                config.set_variant(variant)?;
                println!("✔ 既定のバリアントを設定しました: {}", variant);
            }

            if let Some(isolate) = set_isolate {
                config.set_isolate_storage(isolate)?;
                println!(
                    "✔ 保存枠を{}にしました",
                    if isolate { "バリアントごと" } else { "共有" }
                );
            }

            if show {
                println!("設定:");
                println!("  設定ファイル: {}", Config::config_path()?.display());
                println!("  既定のバリアント: {}", config.default_variant);
                println!(
                    "  保存枠: {}",
                    if config.isolate_storage { "バリアントごと" } else { "共有" }
                );
                println!("  保存先: {}", config.storage_dir()?.display());
            }
        }
    }

    Ok(())
}
