use crate::utils;
use colored::Colorize;
use kilnflow_core::{default_buildpacks, detect_buildpack};
use std::path::PathBuf;

/// 適用されるbuildpackを表示
pub fn handle(path: Option<PathBuf>) -> anyhow::Result<()> {
    let repo = utils::resolve_repo(path)?;
    let config = kilnflow_config::load_for(&repo)?;
    let packs = default_buildpacks(&repo, utils::rewrite_template_from(&config));

    match detect_buildpack(&packs) {
        Some(pack) => {
            println!("{}", pack.name());
            Ok(())
        }
        None => Err(anyhow::anyhow!(
            "適用できるbuildpackが見つかりません: {}\n\
             リポジトリ直下に {} があるか確認してください",
            repo.display().to_string().cyan(),
            "Dockerfile".cyan()
        )),
    }
}
