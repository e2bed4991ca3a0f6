// Bollard 0.19 の非推奨APIを一時的に使用
#![allow(deprecated)]

use crate::context::ContextBuilder;
use crate::error::{BuildError, BuildResult};
use bollard::Docker;
use bollard::image::BuildImageOptions;
use bytes::Bytes;
use futures_util::stream::StreamExt;
use http_body_util::{Either, Full};
use kilnflow_core::{BuildRecord, BuildSpec, EngineError, ImageBuildEngine, LogStream};

/// bollard経由でDocker Engineにビルドを依頼するエンジン実装
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// イメージの存在確認
    pub async fn image_exists(&self, image_tag: &str) -> BuildResult<bool> {
        match self.docker.inspect_image(image_tag).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(BuildError::DockerConnection(e)),
        }
    }
}

impl ImageBuildEngine for DockerEngine {
    /// 仕様に従ってイメージをビルドし、進捗レコードを遅延ストリームで返す
    ///
    /// コンテキストの作成失敗は単一のErr要素として同じストリームに乗せる。
    /// エンジンが報告したビルドエラーもErr要素になる（リトライはしない）。
    fn build(&self, spec: BuildSpec) -> LogStream<'_> {
        tracing::info!("Building image: {}", spec.tag);

        let context_data = match ContextBuilder::create_context(&spec.path) {
            Ok(data) => data,
            Err(e) => {
                let err = EngineError::Context(e.to_string());
                return futures_util::stream::once(async move { Err(err) }).boxed();
            }
        };

        let options = BuildImageOptions {
            dockerfile: spec.dockerfile.clone(),
            t: spec.tag.clone(),
            buildargs: spec.build_args.clone(),
            cachefrom: spec.cache_from.clone(),
            memory: spec.memory,
            memswap: Some(spec.memswap),
            rm: spec.rm,
            forcerm: spec.forcerm,
            ..Default::default()
        };
        tracing::debug!("Build options: {:?}", options);

        let body = Full::new(Bytes::from(context_data));
        self.docker
            .build_image(options, None, Some(Either::Left(body)))
            .map(|msg| match msg {
                Ok(info) => record_from_info(info),
                Err(e) => Err(EngineError::Connection(e.to_string())),
            })
            .boxed()
    }
}

/// エンジンの出力をレコードへ変換する。エラー報告はErrに落とす
fn record_from_info(
    info: bollard::models::BuildInfo,
) -> std::result::Result<BuildRecord, EngineError> {
    if let Some(error) = info.error {
        return Err(EngineError::BuildFailed(error));
    }

    if let Some(error_detail) = info.error_detail {
        let message = error_detail
            .message
            .unwrap_or_else(|| "Unknown build error".to_string());
        return Err(EngineError::BuildFailed(message));
    }

    Ok(BuildRecord {
        stream: info.stream,
        status: info.status,
        progress: info.progress,
    })
}
