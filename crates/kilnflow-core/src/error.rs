use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackError {
    #[error("Dockerfileが見つかりません: {0}")]
    DockerfileMissing(PathBuf),

    #[error("補助ファイルの配置に失敗しました: {path}\n理由: {message}")]
    StageFailed { path: PathBuf, message: String },

    #[error("ビルドオプションが無効です: {0}")]
    InvalidOptions(String),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),
}

/// ビルドエンジン側で発生するエラー
///
/// ログストリームの要素として呼び出し側へ流れる。
/// コア側でのリトライは行わない（リトライ方針は呼び出し側の責務）。
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("ビルドエンジンへの接続エラー: {0}")]
    Connection(String),

    #[error("ビルドコンテキストの作成に失敗しました: {0}")]
    Context(String),

    #[error("ビルドに失敗しました: {0}")]
    BuildFailed(String),
}

impl EngineError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            EngineError::BuildFailed(msg) => {
                format!(
                    "ビルドに失敗しました: {}\n\
                     \n\
                     Dockerfileの内容を確認してください。",
                    msg
                )
            }
            EngineError::Connection(msg) => {
                format!(
                    "ビルドエンジンに接続できません: {}\n\
                     \n\
                     Dockerが起動しているか確認してください。",
                    msg
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, PackError>;
