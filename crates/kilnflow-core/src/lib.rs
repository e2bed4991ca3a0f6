//! Kilnflow Core
//!
//! リポジトリの内容からビルド戦略（buildpack）を選択し、
//! ビルドされるDockerfileを合成するためのコア機能を提供します。
//! エンジン（Docker等）への接続は持たず、注入された
//! [`engine::ImageBuildEngine`]に対して仕様を渡すだけです。

pub mod buildpack;
pub mod dockerfile;
pub mod engine;
pub mod error;

pub use buildpack::{
    BuildPack, DockerBuildPack, DockerExecutor, LegacyRewriteBuildPack, REWRITE_DOCKERFILE,
    RewriteTemplate, ScriptFile, default_buildpacks, detect_buildpack,
};
pub use dockerfile::{DOCKERFILE, DockerfileSplit, split_at_base_image, strip_line_comment};
pub use engine::{
    BuildRecord, BuildRequest, BuildSpec, ImageBuildEngine, LogStream, NO_SWAP,
};
pub use error::{EngineError, PackError, Result};
