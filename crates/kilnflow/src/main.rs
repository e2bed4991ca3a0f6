mod commands;
mod docker;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "リポジトリを、そのままコンテナイメージに。", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// リポジトリを検出してイメージをビルド
    Build {
        /// リポジトリのパス（省略時はカレントディレクトリ）
        path: Option<PathBuf>,
        /// イメージタグ（省略時は kiln-<ディレクトリ名>:latest）
        #[arg(short = 't', long, env = "KILN_IMAGE_TAG")]
        tag: Option<String>,
        /// ビルド時のメモリ上限（例: 2g, 512m）
        #[arg(long)]
        memory_limit: Option<String>,
        /// ビルド引数 (KEY=VALUE 形式、複数指定可)
        #[arg(long = "build-arg")]
        build_args: Vec<String>,
        /// レイヤーキャッシュの取得元イメージ（複数指定可）
        #[arg(long = "cache-from")]
        cache_from: Vec<String>,
        /// エンジンオプションの上書き (KEY=VALUE 形式、複数指定可)
        #[arg(long = "engine-option", hide = true)]
        engine_options: Vec<String>,
        /// ビルドせずに生成されるDockerfileを表示
        #[arg(long)]
        no_build: bool,
    },
    /// 適用されるbuildpackを表示
    Detect {
        /// リポジトリのパス（省略時はカレントディレクトリ）
        path: Option<PathBuf>,
    },
    /// 生成されるDockerfileを表示
    Render {
        /// リポジトリのパス（省略時はカレントディレクトリ）
        path: Option<PathBuf>,
    },
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログはstderrに出力
    tracing_subscriber::fmt::init();

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("kilnflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    match cli.command {
        Commands::Build {
            path,
            tag,
            memory_limit,
            build_args,
            cache_from,
            engine_options,
            no_build,
        } => {
            commands::build::handle(
                path,
                tag,
                memory_limit,
                build_args,
                cache_from,
                engine_options,
                no_build,
            )
            .await?;
        }
        Commands::Detect { path } => {
            commands::detect::handle(path)?;
        }
        Commands::Render { path } => {
            commands::render::handle(path)?;
        }
        Commands::Version => {
            unreachable!("Version is handled before config loading");
        }
    }

    Ok(())
}
