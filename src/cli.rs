use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "outfit-ai")]
#[command(about = "コーディネート写真から衣類を識別し、類似商品を検索するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 写真を解析してアイテムと類似商品を表示
    Analyze {
        /// 画像ファイル（PNG/JPEG/WebP）
        #[arg(required = true)]
        image: PathBuf,

        /// MIMEタイプを明示（省略時は拡張子・内容から判定）
        #[arg(long)]
        mime: Option<String>,

        /// 検索するアイテム番号（1始まり、省略時は対話選択）
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        item: Option<u64>,

        /// 類似商品の検索を行わない
        #[arg(long)]
        no_search: bool,

        /// 結果をJSONで保存
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// アイテム名で類似商品を検索
    Search {
        /// 検索クエリ（例: "Black Leather Biker Jacket"）
        #[arg(required = true)]
        query: String,
    },

    /// 設定を表示/編集
    Config {
        /// Gemini APIキーを設定
        #[arg(long)]
        set_gemini_key: Option<String>,

        /// Google APIキーを設定
        #[arg(long)]
        set_google_key: Option<String>,

        /// 検索エンジンID (cx) を設定
        #[arg(long)]
        set_search_engine_id: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

impl Cli {
    /// `--item` は1始まりなので0始まりに変換
    pub fn item_index(item: Option<u64>) -> Option<usize> {
        item.and_then(|n| n.checked_sub(1))
            .and_then(|n| usize::try_from(n).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from(["outfit-ai", "analyze", "look.jpg", "--item", "2", "-o", "out.json"])
            .expect("パース失敗");
        match cli.command {
            Commands::Analyze { image, item, output, no_search, mime } => {
                assert_eq!(image, PathBuf::from("look.jpg"));
                assert_eq!(item, Some(2));
                assert_eq!(output, Some(PathBuf::from("out.json")));
                assert!(!no_search);
                assert!(mime.is_none());
            }
            _ => panic!("Expected Analyze"),
        }
    }

    #[test]
    fn test_parse_search_with_verbose() {
        let cli = Cli::try_parse_from(["outfit-ai", "search", "White Sneakers", "-v"]).expect("パース失敗");
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Search { ref query } if query == "White Sneakers"));
    }

    #[test]
    fn test_analyze_requires_image() {
        assert!(Cli::try_parse_from(["outfit-ai", "analyze"]).is_err());
    }

    #[test]
    fn test_item_zero_is_rejected() {
        let result = Cli::try_parse_from(["outfit-ai", "analyze", "look.jpg", "--item", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_item_index_is_one_based() {
        assert_eq!(Cli::item_index(Some(1)), Some(0));
        assert_eq!(Cli::item_index(Some(3)), Some(2));
        assert_eq!(Cli::item_index(Some(0)), None);
        assert_eq!(Cli::item_index(None), None);
    }
}
