mod commands;
mod project;
mod utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "strato")]
#[command(about = "書いた通りに、雲が並ぶ。KDLで宣言するCivoインフラ。", long_about = None)]
struct Cli {
    /// 指定ディレクトリに移動してから実行
    #[arg(short = 'C', long = "chdir", global = true, value_name = "DIR")]
    chdir: Option<PathBuf>,

    /// デバッグログを出力
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 設定ファイルを検証
    Validate,
    /// 変更内容を表示（リモートは変更しない）
    Plan {
        /// 計画前にリソースを再読み込みしない
        #[arg(long)]
        no_refresh: bool,
    },
    /// 変更を適用
    Apply {
        /// 確認をスキップ
        #[arg(short, long)]
        yes: bool,
        /// 計画前にリソースを再読み込みしない
        #[arg(long)]
        no_refresh: bool,
    },
    /// 管理中のリソースを削除
    Destroy {
        /// 確認をスキップ
        #[arg(short, long)]
        yes: bool,
        /// 指定リソースとそれに依存するリソースだけを削除
        #[arg(short, long, value_name = "ADDR")]
        target: Option<String>,
    },
    /// ステートをリモートの状態に合わせる
    Refresh,
    /// 既存のリソースをステートに取り込む
    Import {
        /// 取り込み先アドレス（例: civo_network.main）
        address: String,
        /// リモートのID
        id: String,
    },
    /// 出力値を表示
    Output {
        /// 出力名（指定しない場合は全て）
        name: Option<String>,
    },
    /// ステートを操作
    #[command(subcommand)]
    State(StateCommands),
    /// リソース・データソースのスキーマを表示
    Schema {
        /// タイプ名（例: civo_instance）。指定しない場合は一覧
        type_name: Option<String>,
    },
    /// バージョン情報を表示
    Version,
}

#[derive(Subcommand)]
enum StateCommands {
    /// 管理中のリソースを一覧表示
    List,
    /// リソースの属性を表示
    Show {
        /// リソースアドレス
        address: String,
    },
    /// リソースをステートから外す（リモートは削除しない）
    Rm {
        /// リソースアドレス
        address: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!();
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(dir) = &cli.chdir {
        std::env::set_current_dir(dir).map_err(|e| {
            anyhow::anyhow!("ディレクトリ {} に移動できません: {}", dir.display(), e)
        })?;
    }

    match cli.command {
        Commands::Version => {
            println!("strato {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Schema { type_name } => commands::schema::handle(type_name.as_deref()),
        Commands::Validate => commands::validate::handle(),
        Commands::Plan { no_refresh } => commands::plan::handle(no_refresh).await,
        Commands::Apply { yes, no_refresh } => commands::apply::handle(yes, no_refresh).await,
        Commands::Destroy { yes, target } => {
            commands::destroy::handle(yes, target.as_deref()).await
        }
        Commands::Refresh => commands::refresh::handle().await,
        Commands::Import { address, id } => commands::import::handle(&address, &id).await,
        Commands::Output { name } => commands::output::handle(name.as_deref()).await,
        Commands::State(cmd) => match cmd {
            StateCommands::List => commands::state::handle_list().await,
            StateCommands::Show { address } => commands::state::handle_show(&address).await,
            StateCommands::Rm { address } => commands::state::handle_rm(&address).await,
        },
    }
}
