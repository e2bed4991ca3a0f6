use crate::{docker, utils};
use colored::Colorize;
use futures_util::stream::StreamExt;
use kilnflow_build::{BuildProgress, DockerEngine};
use kilnflow_core::{BuildRequest, default_buildpacks, detect_buildpack};
use std::collections::HashMap;
use std::path::PathBuf;

/// ビルドコマンドを処理
///
/// buildpackを優先順に検出し、最初に適用可能だったものでビルドする。
/// ログストリームは最後まで消費する（失敗はストリーム内のエラーとして
/// 現れるため、消費しきらないと成否が確定しない）。
pub async fn handle(
    path: Option<PathBuf>,
    tag: Option<String>,
    memory_limit: Option<String>,
    build_args: Vec<String>,
    cache_from: Vec<String>,
    engine_options: Vec<String>,
    no_build: bool,
) -> anyhow::Result<()> {
    let repo = utils::resolve_repo(path)?;
    let config = kilnflow_config::load_for(&repo)?;
    let template = utils::rewrite_template_from(&config);

    let packs = default_buildpacks(&repo, template);
    let Some(pack) = detect_buildpack(&packs) else {
        return Err(anyhow::anyhow!(
            "適用できるbuildpackが見つかりません: {}\n\
             リポジトリ直下に Dockerfile があるか確認してください",
            repo.display()
        ));
    };

    println!("{} {}", "検出されたbuildpack:".green(), pack.name().cyan());

    if no_build {
        // dry-run: ビルドされるDockerfileを表示して終了
        print!("{}", pack.render()?);
        return Ok(());
    }

    // ビルド引数は設定ファイルよりCLI指定が優先
    let mut args: HashMap<String, String> = config.build_args.clone();
    for arg in &build_args {
        let (key, value) = utils::parse_build_arg(arg)?;
        args.insert(key, value);
    }
    for key in args.keys() {
        utils::warn_sensitive_build_arg(key);
    }

    let memory_limit = match memory_limit.or(config.memory_limit) {
        Some(s) => Some(utils::parse_memory_limit(&s)?),
        None => None,
    };

    let mut extra_options = serde_json::Map::new();
    for opt in &engine_options {
        let (key, value) = utils::parse_engine_option(opt)?;
        extra_options.insert(key, value);
    }

    let image_tag = tag.unwrap_or_else(|| utils::default_image_tag(&repo));

    let docker = docker::init_docker_with_error_handling().await?;
    let engine = DockerEngine::new(docker);

    // キャッシュ元イメージの存在を事前確認（無くてもビルドは続行する）
    for image in &cache_from {
        if !engine.image_exists(image).await.unwrap_or(false) {
            tracing::warn!("キャッシュ元イメージが見つかりません: {}", image);
        }
    }

    let request = BuildRequest {
        image_tag: image_tag.clone(),
        memory_limit,
        build_args: args,
        cache_from,
        extra_options,
    };

    println!("{}", "イメージをビルド中...".green());
    println!("タグ: {}", image_tag.cyan());

    let progress = BuildProgress::new(&image_tag);
    let mut stream = pack.build(&engine, &request)?;
    while let Some(record) = stream.next().await {
        match record {
            Ok(record) => progress.handle_record(&record),
            Err(e) => {
                progress.finish_error(&e.to_string());
                return Err(anyhow::anyhow!(e.user_message()));
            }
        }
    }
    progress.finish_success();

    println!("{} {}", "✓ ビルド完了:".green(), image_tag.cyan());
    Ok(())
}
