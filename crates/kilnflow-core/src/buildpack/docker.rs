//! ネイティブDockerfileをそのままビルドする戦略

use crate::buildpack::{BuildPack, DockerExecutor};
use crate::dockerfile::DOCKERFILE;
use crate::engine::{BuildRequest, ImageBuildEngine, LogStream};
use crate::error::{PackError, Result};
use std::path::Path;

/// リポジトリ直下のDockerfileを無加工でビルドするbuildpack
pub struct DockerBuildPack {
    exec: DockerExecutor,
}

impl DockerBuildPack {
    pub fn new(repo: impl AsRef<Path>) -> Self {
        Self {
            exec: DockerExecutor::new(repo.as_ref()),
        }
    }
}

impl BuildPack for DockerBuildPack {
    fn name(&self) -> &'static str {
        "docker"
    }

    /// リポジトリルートに`Dockerfile`という名前のファイルがあるか。
    /// 内容は一切見ない
    fn detect(&self) -> bool {
        self.exec.repo().join(DOCKERFILE).exists()
    }

    /// Dockerfileの全文を無変更で返す
    ///
    /// detectとrenderの間に外部からファイルが消された場合は
    /// `DockerfileMissing`として表面化させる（握りつぶさない）。
    fn render(&self) -> Result<String> {
        let path = self.exec.repo().join(DOCKERFILE);
        std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PackError::DockerfileMissing(path)
            } else {
                PackError::Io(e)
            }
        })
    }

    fn build<'a>(
        &self,
        engine: &'a dyn ImageBuildEngine,
        request: &BuildRequest,
    ) -> Result<LogStream<'a>> {
        self.exec.stage_script_files(&self.build_script_files())?;
        self.exec.execute(self.dockerfile_name(), request, engine)
    }
}
