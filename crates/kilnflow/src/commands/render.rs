use crate::utils;
use kilnflow_core::{default_buildpacks, detect_buildpack};
use std::path::PathBuf;

/// ビルドされるDockerfileを表示（dry-run）
///
/// リポジトリは変更しない。書き換え戦略の場合は合成結果が出る。
pub fn handle(path: Option<PathBuf>) -> anyhow::Result<()> {
    let repo = utils::resolve_repo(path)?;
    let config = kilnflow_config::load_for(&repo)?;
    let packs = default_buildpacks(&repo, utils::rewrite_template_from(&config));

    let Some(pack) = detect_buildpack(&packs) else {
        return Err(anyhow::anyhow!(
            "適用できるbuildpackが見つかりません: {}",
            repo.display()
        ));
    };

    print!("{}", pack.render()?);
    Ok(())
}
