//! Buildpack（リポジトリ規約ごとのビルド戦略）
//!
//! buildpackは閉じた優先順リストとして登録され、orchestratorが先頭から
//! `detect()`を呼んで最初に適用可能と答えたものを採用する。深い継承では
//! なく、共通のビルド実行部（[`DockerExecutor`]）と戦略ごとの
//! detect/renderの組という合成で表現する。

pub mod docker;
pub mod executor;
pub mod legacy;

pub use docker::DockerBuildPack;
pub use executor::DockerExecutor;
pub use legacy::{LegacyRewriteBuildPack, REWRITE_DOCKERFILE, RewriteTemplate};

use crate::engine::{BuildRequest, ImageBuildEngine, LogStream};
use crate::error::Result;
use std::path::Path;

/// ビルドコンテキストへ配置する補助ファイル
///
/// sourceはbuildpack同梱アセットの名前で、ユーザーリポジトリ側の
/// パスではない。エンジン呼び出しの直前にdestへコピーされる。
#[derive(Debug, Clone, Copy)]
pub struct ScriptFile {
    /// buildpack同梱アセットの名前
    pub source: &'static str,
    /// コンテキストルートからの相対配置先
    pub dest: &'static str,
    /// クレートに埋め込まれた内容（バイト単位でそのままコピー）
    pub contents: &'static str,
}

/// 1つのリポジトリ規約に対するビルド戦略
pub trait BuildPack {
    /// 表示用の戦略名
    fn name(&self) -> &'static str;

    /// このbuildpackが適用できるかを判定する
    ///
    /// 副作用なしの純粋な検査。ファイルの不在は「適用外」という
    /// 正当な判定結果であって、エラーではない。
    fn detect(&self) -> bool;

    /// ビルドされるDockerfileのテキストを返す
    ///
    /// dry-run・確認用途のため`build()`とは独立に呼び出せる。
    /// リポジトリは変更しない。
    fn render(&self) -> Result<String>;

    /// stage対象の補助ファイル一覧。デフォルトは空
    fn build_script_files(&self) -> Vec<ScriptFile> {
        Vec::new()
    }

    /// ビルドに使うDockerfileのコンテキスト内パス
    fn dockerfile_name(&self) -> &str {
        crate::dockerfile::DOCKERFILE
    }

    /// ビルドを実行してログストリームを返す
    ///
    /// 補助ファイルの配置、（戦略が必要とする場合の）生成Dockerfileの
    /// 書き出し、エンジンへの委譲をこの順で行う。
    fn build<'a>(
        &self,
        engine: &'a dyn ImageBuildEngine,
        request: &BuildRequest,
    ) -> Result<LogStream<'a>>;
}

/// 優先順に並んだbuildpack一覧を作る
///
/// 旧Binder書き換えはネイティブDockerfileの特殊形なので、
/// 必ずDockerBuildPackより先に試す。
pub fn default_buildpacks(repo: &Path, template: RewriteTemplate) -> Vec<Box<dyn BuildPack>> {
    vec![
        Box::new(LegacyRewriteBuildPack::with_template(repo, template)),
        Box::new(DockerBuildPack::new(repo)),
    ]
}

/// `detect()`が最初にtrueを返したbuildpackを選ぶ
pub fn detect_buildpack<'a>(packs: &'a [Box<dyn BuildPack>]) -> Option<&'a dyn BuildPack> {
    packs
        .iter()
        .find(|pack| pack.detect())
        .map(|pack| pack.as_ref())
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_detect_prefers_legacy_rewrite() {
        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join("Dockerfile"),
            "FROM andrewosh/binder-base\nRUN true\n",
        )
        .unwrap();

        let packs = default_buildpacks(temp_dir.path(), RewriteTemplate::default());
        let pack = detect_buildpack(&packs).unwrap();
        assert_eq!(pack.name(), "legacy-rewrite");
    }

    #[test]
    fn test_detect_plain_dockerfile() {
        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join("Dockerfile"),
            "FROM ubuntu:20.04\nRUN echo hi\n",
        )
        .unwrap();

        let packs = default_buildpacks(temp_dir.path(), RewriteTemplate::default());
        let pack = detect_buildpack(&packs).unwrap();
        assert_eq!(pack.name(), "docker");
    }

    #[test]
    fn test_detect_nothing_applicable() {
        let temp_dir = tempdir().unwrap();
        let packs = default_buildpacks(temp_dir.path(), RewriteTemplate::default());
        assert!(detect_buildpack(&packs).is_none());
    }
}
