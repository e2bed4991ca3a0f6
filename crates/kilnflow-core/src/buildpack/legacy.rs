//! 旧Binderベースイメージの書き換え戦略
//!
//! メンテナンスが終了したベースイメージでビルドされてきたリポジトリを、
//! リポジトリ側の変更なしで維持された環境へ移行させる。元のDockerfileを
//! 行ストリームとして走査し、ベースイメージ宣言より上を捨てて、
//! 固定のpreamble/postambleで残りを挟み込む。

use crate::buildpack::{BuildPack, DockerExecutor, ScriptFile};
use crate::dockerfile::{DOCKERFILE, split_at_base_image, strip_line_comment};
use crate::engine::{BuildRequest, ImageBuildEngine, LogStream};
use crate::error::{PackError, Result};
use std::path::Path;

/// 書き換え結果の書き出し先
///
/// 元の`Dockerfile`を上書きしないための固定の別名。
pub const REWRITE_DOCKERFILE: &str = "._binder.Dockerfile";

/// コンテキストへstageする環境定義ファイルの名前
const ROOT_ENV_FILE: &str = "root.frozen.yml";
const PYTHON3_ENV_FILE: &str = "python3.frozen.yml";

/// buildpack同梱の環境定義。内容には立ち入らず、そのままコピーする
const ROOT_FROZEN_ENV: &str = include_str!("legacy/root.frozen.yml");
const PYTHON3_FROZEN_ENV: &str = include_str!("legacy/python3.frozen.yml");

const DEFAULT_LEGACY_IMAGE: &str = "andrewosh/binder-base";

// アーカイブ済みイメージに対する決定性を保つため、latestではなく
// digest固定の参照にする
const DEFAULT_BASE_IMAGE: &str =
    "andrewosh/binder-base@sha256:eabde24f4c55174832ed8795faa40cea62fc9e2a4a9f1ee1444f8a2e4f9710ee";

const DEFAULT_PREAMBLE: &str = r#"COPY python3.frozen.yml /tmp/python3.frozen.yml
COPY root.frozen.yml /tmp/root.frozen.yml
# update conda in two steps because the base image
# has very old conda that can't upgrade past 4.3
RUN conda install -yq conda>=4.3 && \
    conda install -yq conda==4.4.11 && \
    conda env update -n python3 -f /tmp/python3.frozen.yml && \
    conda remove -yq -n python3 nb_conda_kernels && \
    conda env update -n root -f /tmp/root.frozen.yml && \
    /home/main/anaconda2/envs/python3/bin/ipython kernel install --sys-prefix && \
    /home/main/anaconda2/bin/ipython kernel install --prefix=/home/main/anaconda2/envs/python3 && \
    /home/main/anaconda2/bin/ipython kernel install --sys-prefix"#;

const DEFAULT_POSTAMBLE: &str = r#"USER root
COPY . /home/main/notebooks
RUN chown -R main:main /home/main/notebooks && \
    rm /home/main/notebooks/root.frozen.yml && \
    rm /home/main/notebooks/python3.frozen.yml
USER main
WORKDIR /home/main/notebooks
ENV PATH /home/main/anaconda2/envs/python3/bin:$PATH
ENV JUPYTER_PATH /home/main/anaconda2/share/jupyter:$JUPYTER_PATH
CMD jupyter notebook --ip 0.0.0.0"#;

/// 書き換えテンプレート
///
/// preamble/postambleはバージョン付きのツール呼び出しを含む不透明な
/// テキストとして扱う。既定値はクレートに埋め込みだが、設定ファイルで
/// 差し替えられる（内容が更新されてもロジックは変わらない）。
#[derive(Debug, Clone)]
pub struct RewriteTemplate {
    /// 検出対象の旧ベースイメージ名。比較は大文字小文字を無視する
    pub legacy_image: String,
    /// 置き換え先のベースイメージ参照
    pub base_image: String,
    /// 本文の前に差し込む環境アップグレードブロック
    pub preamble: String,
    /// 本文の後に差し込む所有権・起動設定ブロック
    pub postamble: String,
}

impl Default for RewriteTemplate {
    fn default() -> Self {
        Self {
            legacy_image: DEFAULT_LEGACY_IMAGE.to_string(),
            base_image: DEFAULT_BASE_IMAGE.to_string(),
            preamble: DEFAULT_PREAMBLE.to_string(),
            postamble: DEFAULT_POSTAMBLE.to_string(),
        }
    }
}

/// 旧Binderイメージを検出して書き換える buildpack
///
/// 実行はDockerBuildPackと同じ共有実行部に委譲し、
/// detect/renderだけを差し替える。
pub struct LegacyRewriteBuildPack {
    exec: DockerExecutor,
    template: RewriteTemplate,
}

impl LegacyRewriteBuildPack {
    pub fn new(repo: impl AsRef<Path>) -> Self {
        Self::with_template(repo, RewriteTemplate::default())
    }

    pub fn with_template(repo: impl AsRef<Path>, template: RewriteTemplate) -> Self {
        Self {
            exec: DockerExecutor::new(repo.as_ref()),
            template,
        }
    }

    fn read_dockerfile(&self) -> Result<String> {
        let path = self.exec.repo().join(DOCKERFILE);
        std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PackError::DockerfileMissing(path)
            } else {
                PackError::Io(e)
            }
        })
    }
}

impl BuildPack for LegacyRewriteBuildPack {
    fn name(&self) -> &'static str {
        "legacy-rewrite"
    }

    /// 最初のFROM行が旧ベースイメージを指しているか
    ///
    /// 行末の`#`コメントは比較から除外する。FROM行が別のイメージを
    /// 指していれば明示的にfalse（「不明」ではない）。ファイルが
    /// 無ければfalseで、エラーにはしない。
    fn detect(&self) -> bool {
        let text = match self.read_dockerfile() {
            Ok(text) => text,
            Err(_) => return false,
        };

        match split_at_base_image(&text).base_line {
            Some(line) => strip_line_comment(line)
                .to_lowercase()
                .contains(&self.template.legacy_image.to_lowercase()),
            None => false,
        }
    }

    /// 書き換え後のDockerfileを生成する
    ///
    /// 新しいベースイメージ宣言、preamble、元のDockerfileの
    /// ベースイメージ宣言より後の本文（バイト単位でそのまま）、
    /// postambleを改行で連結する。
    fn render(&self) -> Result<String> {
        let original = self.read_dockerfile()?;
        let split = split_at_base_image(&original);

        if split.base_line.is_none() {
            // FROM行が無い場合はファイル全体をそのまま引き継ぐ。
            // 歴史的挙動の温存で、修正するかは未確定（TODO: 空の本文に
            // 切り替えるか判断する）
            tracing::warn!(
                "FROM行が見つかりません。Dockerfile全体をそのまま引き継ぎます: {}",
                self.exec.repo().join(DOCKERFILE).display()
            );
        }

        let segments = [
            format!("FROM {}", self.template.base_image),
            self.template.preamble.clone(),
            split.body.to_string(),
            self.template.postamble.clone(),
        ];
        Ok(segments.join("\n"))
    }

    fn build_script_files(&self) -> Vec<ScriptFile> {
        vec![
            ScriptFile {
                source: "legacy/root.frozen.yml",
                dest: ROOT_ENV_FILE,
                contents: ROOT_FROZEN_ENV,
            },
            ScriptFile {
                source: "legacy/python3.frozen.yml",
                dest: PYTHON3_ENV_FILE,
                contents: PYTHON3_FROZEN_ENV,
            },
        ]
    }

    fn dockerfile_name(&self) -> &str {
        REWRITE_DOCKERFILE
    }

    /// 書き換え結果を固定の別名で書き出し、環境定義をstageしてから
    /// 共有実行部へ委譲する
    fn build<'a>(
        &self,
        engine: &'a dyn ImageBuildEngine,
        request: &BuildRequest,
    ) -> Result<LogStream<'a>> {
        let rendered = self.render()?;
        let dockerfile = self.exec.repo().join(REWRITE_DOCKERFILE);
        std::fs::write(&dockerfile, &rendered)?;

        self.exec.stage_script_files(&self.build_script_files())?;
        self.exec.execute(self.dockerfile_name(), request, engine)
    }
}
