use crate::buildpack::ScriptFile;
use crate::engine::{BuildRequest, BuildSpec, ImageBuildEngine, LogStream};
use crate::error::{PackError, Result};
use std::path::{Path, PathBuf};

/// DockerベースのBuildPackが共有するビルド実行部
///
/// staging・仕様の確定・エンジン呼び出しをここに集約し、
/// 各戦略はdetect/renderの差分だけを持つ。
#[derive(Debug, Clone)]
pub struct DockerExecutor {
    repo: PathBuf,
}

impl DockerExecutor {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    /// 対象リポジトリのルート
    ///
    /// 検出・ファイル参照はすべてここからの相対で行う。
    /// ビルドコンテキストもこのディレクトリになる。
    pub fn repo(&self) -> &Path {
        &self.repo
    }

    /// 補助ファイルをコンテキストルートへ配置する
    ///
    /// エンジン呼び出しの前に完了していなければならない。配置順序は
    /// 正しさの要件であって最適化ではない（未配置のままビルドすると
    /// missing fileで失敗する）。配置したファイルの後始末は行わない。
    pub fn stage_script_files(&self, files: &[ScriptFile]) -> Result<()> {
        for file in files {
            let dest = self.repo.join(file.dest);
            std::fs::write(&dest, file.contents).map_err(|e| PackError::StageFailed {
                path: dest.clone(),
                message: e.to_string(),
            })?;
            tracing::debug!("Staged {} -> {}", file.source, dest.display());
        }
        Ok(())
    }

    /// 仕様を確定してエンジンへ渡し、ログストリームを返す
    pub fn execute<'a>(
        &self,
        dockerfile: &str,
        request: &BuildRequest,
        engine: &'a dyn ImageBuildEngine,
    ) -> Result<LogStream<'a>> {
        let spec = BuildSpec::resolve(&self.repo, dockerfile, request)?;
        tracing::debug!("Build spec: {:?}", spec);
        Ok(engine.build(spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_stage_script_files() {
        let temp_dir = tempdir().unwrap();
        let executor = DockerExecutor::new(temp_dir.path());

        let files = [ScriptFile {
            source: "assets/env.yml",
            dest: "env.yml",
            contents: "name: test\n",
        }];
        executor.stage_script_files(&files).unwrap();

        let staged = fs::read_to_string(temp_dir.path().join("env.yml")).unwrap();
        assert_eq!(staged, "name: test\n");
    }

    #[test]
    fn test_stage_script_files_reports_destination() {
        let temp_dir = tempdir().unwrap();
        let executor = DockerExecutor::new(temp_dir.path());

        // 配置先の親ディレクトリが存在しない
        let files = [ScriptFile {
            source: "assets/env.yml",
            dest: "missing/env.yml",
            contents: "name: test\n",
        }];
        let result = executor.stage_script_files(&files);
        match result {
            Err(PackError::StageFailed { path, .. }) => {
                assert!(path.ends_with("missing/env.yml"));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
