use anyhow::bail;
use clap::Parser;
use dialoguer::Select;
use indicatif::{ProgressBar, ProgressStyle};
use outfit_ai::api::{GeminiClient, SearchClient};
use outfit_ai::cli::{Cli, Commands};
use outfit_ai::config::Config;
use outfit_ai::ingest::{Ingestor, TempPreviewStore};
use outfit_ai::pipeline::Pipeline;
use outfit_ai::{logging, render};
use outfit_ai_common::Phase;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Analyze { image, mime, item, no_search, output } => {
            println!("👗 outfit-ai - コーディネート解析\n");
            run_analyze(&config, &image, mime.as_deref(), Cli::item_index(item), no_search, output).await?;
        }

        Commands::Search { query } => {
            println!("🔍 outfit-ai - 類似商品検索\n");
            let client = SearchClient::from_config(&config)?;
            match client.search(&query).await {
                Ok(suggestions) => print!("{}", render::render_suggestions(&suggestions)),
                Err(e) => bail!(e.user_message()),
            }
        }

        Commands::Config { set_gemini_key, set_google_key, set_search_engine_id, show } => {
            let mut config = config;

            if let Some(key) = set_gemini_key {
                config.set_gemini_api_key(key)?;
                println!("✔ Gemini APIキーを設定しました");
            }
            if let Some(key) = set_google_key {
                config.set_google_api_key(key)?;
                println!("✔ Google APIキーを設定しました");
            }
            if let Some(id) = set_search_engine_id {
                config.set_search_engine_id(id)?;
                println!("✔ 検索エンジンIDを設定しました");
            }

            if show {
                let state = |v: &Option<String>| if v.is_some() { "設定済み" } else { "未設定" };
                println!("設定:");
                println!("  パス: {}", Config::config_path()?.display());
                println!("  モデル: {}", config.model);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  検索件数: {}", config.search_result_count);
                println!("  画像サイズ: {}", config.search_image_size);
                println!("  セーフサーチ: {}", config.search_safe);
                println!("  Gemini APIキー: {}", state(&config.gemini_api_key));
                println!("  Google APIキー: {}", state(&config.google_api_key));
                println!("  検索エンジンID: {}", state(&config.search_engine_id));
            }
        }
    }

    Ok(())
}

async fn run_analyze(
    config: &Config,
    image: &Path,
    mime: Option<&str>,
    item: Option<usize>,
    no_search: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let store = Arc::new(TempPreviewStore::in_temp_dir()?);
    let mut pipeline = Pipeline::new(
        Ingestor::new(store),
        GeminiClient::from_config(config)?,
        SearchClient::from_config(config)?,
    );

    // 1. 解析
    println!("[1/2] 写真を解析中...");
    let spinner = spinner("Analyzing your outfit...");
    let phase = pipeline.analyze(image, mime).await;
    spinner.finish_and_clear();

    match phase {
        Err(e) => bail!(e.user_message()),
        Ok(Phase::Error) => {
            let message = pipeline.session().error_message().unwrap_or_default().to_string();
            pipeline.reset();
            bail!("Analysis Failed: {}", message);
        }
        Ok(_) => {}
    }

    let items = pipeline.session().items().map(<[_]>::to_vec).unwrap_or_default();
    println!("✔ 解析完了\n");
    print!("{}", render::render_items(&items, pipeline.session().selected_item()));

    // 2. 類似商品検索
    if !no_search && !items.is_empty() {
        println!("\n[2/2] 類似商品を検索中...");
        if let Some(index) = item {
            show_item(&mut pipeline, index).await?;
        } else {
            show_selected(&mut pipeline).await?;
            if std::io::stdin().is_terminal() {
                browse_items(&mut pipeline, &items).await?;
            }
        }
    }

    if let Some(path) = output {
        if let Some(report) = pipeline.report() {
            std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
            println!("\n✔ 結果を保存: {}", path.display());
        }
    }

    pipeline.reset();
    println!("\n✅ 完了");
    Ok(())
}

/// 対話的にアイテムを切り替えて検索する
async fn browse_items(pipeline: &mut Pipeline, items: &[outfit_ai_common::IdentifiedItem]) -> anyhow::Result<()> {
    let mut labels: Vec<String> = items.iter().map(|i| i.item_name.clone()).collect();
    labels.push("Done".to_string());

    loop {
        let current = pipeline
            .session()
            .selected_item()
            .and_then(|s| items.iter().position(|i| i == s))
            .unwrap_or(0);
        let choice = Select::new()
            .with_prompt("Select an item to shop the look")
            .items(&labels)
            .default(current)
            .interact_opt()?;

        match choice {
            Some(index) if index < items.len() => show_item(pipeline, index).await?,
            _ => return Ok(()),
        }
    }
}

async fn show_item(pipeline: &mut Pipeline, index: usize) -> anyhow::Result<()> {
    let spinner = spinner("Searching...");
    let result = pipeline.show_item(index).await;
    spinner.finish_and_clear();
    result?;
    print_search(pipeline);
    Ok(())
}

async fn show_selected(pipeline: &mut Pipeline) -> anyhow::Result<()> {
    let spinner = spinner("Searching...");
    let result = pipeline.show_selected().await;
    spinner.finish_and_clear();
    result?;
    print_search(pipeline);
    Ok(())
}

fn print_search(pipeline: &Pipeline) {
    let session = pipeline.session();
    if let (Some(item), Some(state)) = (session.selected_item(), session.search_state()) {
        println!();
        print!("{}", render::render_search(item, state));
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
