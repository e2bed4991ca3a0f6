//! ビルドエンジンとの境界
//!
//! コアが利用するエンジン操作は`build`ただ一つ。仕様（[`BuildSpec`]）を
//! 渡すとログレコードの遅延ストリームが返る。エンジン本体は注入され、
//! コアは接続方法を知らない。

use crate::error::{EngineError, PackError, Result};
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// ビルド中のswapを無効化するsentinel値
///
/// メモリ上限の有無にかかわらず常にこの値を設定する。制限付きビルドで
/// swapを許すと、失敗ではなく診断しづらい低速化として現れるため。
pub const NO_SWAP: i64 = -1;

/// 呼び出し側が指定するビルド要求
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// 生成するイメージのタグ
    pub image_tag: String,
    /// コンテナメモリ上限（バイト）。0または未指定で無制限
    pub memory_limit: Option<u64>,
    /// ビルド引数（名前→値）
    pub build_args: HashMap<String, String>,
    /// レイヤーキャッシュの取得元イメージ（順序あり）
    pub cache_from: Vec<String>,
    /// エンジンオプションの上書き。最後にマージされ、算出済みの
    /// デフォルトをすべて上書きできる（意図的なescape hatch）
    pub extra_options: serde_json::Map<String, serde_json::Value>,
}

/// エンジンへ渡す確定済みのビルド仕様
///
/// フィールド名が`extra_options`の上書きキーになる。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSpec {
    /// ビルドコンテキストのディレクトリ
    pub path: PathBuf,
    /// コンテキスト内のDockerfileパス
    pub dockerfile: String,
    /// イメージタグ
    pub tag: String,
    /// ビルド引数
    pub build_args: HashMap<String, String>,
    /// レイヤーキャッシュの取得元
    pub cache_from: Vec<String>,
    /// コンテナメモリ上限（バイト）。Noneで無制限
    pub memory: Option<u64>,
    /// memory-swap設定。常に[`NO_SWAP`]
    pub memswap: i64,
    /// 成功時に中間コンテナを削除
    pub rm: bool,
    /// 失敗時にも中間コンテナを削除
    pub forcerm: bool,
}

impl BuildSpec {
    /// リポジトリと要求から仕様を組み立てる
    ///
    /// 固定ポリシー:
    /// - memswapは常に無効（[`NO_SWAP`]）
    /// - メモリ上限は正の値が与えられたときだけ設定
    /// - コンテキストはリポジトリルート、中間コンテナは常に強制削除
    /// - `extra_options`は最後にマージされ、どのデフォルトも上書きできる
    pub fn resolve(repo: &Path, dockerfile: &str, request: &BuildRequest) -> Result<Self> {
        let spec = BuildSpec {
            path: repo.to_path_buf(),
            dockerfile: dockerfile.to_string(),
            tag: request.image_tag.clone(),
            build_args: request.build_args.clone(),
            cache_from: request.cache_from.clone(),
            memory: request.memory_limit.filter(|limit| *limit > 0),
            memswap: NO_SWAP,
            rm: true,
            forcerm: true,
        };

        if request.extra_options.is_empty() {
            return Ok(spec);
        }
        spec.apply_overrides(&request.extra_options)
    }

    /// 上書きマップをフィールドへマージする
    ///
    /// serde_json経由の往復でフィールド単位に適用する。存在しない
    /// フィールド名はエラー（silent dropはしない）。
    fn apply_overrides(self, extra: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let mut value = serde_json::to_value(&self)
            .map_err(|e| PackError::InvalidOptions(e.to_string()))?;

        if let serde_json::Value::Object(fields) = &mut value {
            for (key, val) in extra {
                fields.insert(key.clone(), val.clone());
            }
        }

        serde_json::from_value(value).map_err(|e| PackError::InvalidOptions(e.to_string()))
    }
}

/// エンジンが流すビルド進捗レコード
///
/// エンジンの出力を加工せずそのまま呼び出し側へ転送する。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// ビルドステップの出力テキスト
    pub stream: Option<String>,
    /// ステータスメッセージ（pull等）
    pub status: Option<String>,
    /// 進捗表示
    pub progress: Option<String>,
}

/// ビルドログの遅延ストリーム
///
/// pull型で一度しか消費できない。ビルド失敗はストリーム内の
/// `Err`要素として現れる。キャンセルは呼び出し側がイテレーションを
/// 放棄することで行う（コアはキャンセル機構を持たない）。
pub type LogStream<'a> = BoxStream<'a, std::result::Result<BuildRecord, EngineError>>;

/// 注入されるビルドエンジン
pub trait ImageBuildEngine: Send + Sync {
    /// 仕様に従ってイメージをビルドし、ログストリームを返す
    fn build(&self, spec: BuildSpec) -> LogStream<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> BuildRequest {
        BuildRequest {
            image_tag: "kiln-test:latest".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let spec = BuildSpec::resolve(Path::new("/repo"), "Dockerfile", &request()).unwrap();
        assert_eq!(spec.path, PathBuf::from("/repo"));
        assert_eq!(spec.dockerfile, "Dockerfile");
        assert_eq!(spec.tag, "kiln-test:latest");
        assert_eq!(spec.memory, None);
        assert_eq!(spec.memswap, NO_SWAP);
        assert!(spec.rm);
        assert!(spec.forcerm);
    }

    #[test]
    fn test_resolve_memory_zero_is_unbounded() {
        let mut req = request();
        req.memory_limit = Some(0);
        let spec = BuildSpec::resolve(Path::new("/repo"), "Dockerfile", &req).unwrap();
        assert_eq!(spec.memory, None);
        assert_eq!(spec.memswap, NO_SWAP);
    }

    #[test]
    fn test_resolve_memory_positive() {
        let mut req = request();
        req.memory_limit = Some(2 * 1024 * 1024 * 1024);
        let spec = BuildSpec::resolve(Path::new("/repo"), "Dockerfile", &req).unwrap();
        assert_eq!(spec.memory, Some(2 * 1024 * 1024 * 1024));
        assert_eq!(spec.memswap, NO_SWAP);
    }

    #[test]
    fn test_extra_options_override_defaults() {
        let mut req = request();
        req.extra_options
            .insert("forcerm".to_string(), json!(false));
        req.extra_options
            .insert("dockerfile".to_string(), json!("Dockerfile.alt"));
        let spec = BuildSpec::resolve(Path::new("/repo"), "Dockerfile", &req).unwrap();
        assert!(!spec.forcerm);
        assert_eq!(spec.dockerfile, "Dockerfile.alt");
        // 上書きされていないデフォルトはそのまま
        assert!(spec.rm);
    }

    #[test]
    fn test_extra_options_unknown_key_is_rejected() {
        let mut req = request();
        req.extra_options
            .insert("no_such_field".to_string(), json!(1));
        let result = BuildSpec::resolve(Path::new("/repo"), "Dockerfile", &req);
        assert!(matches!(result, Err(PackError::InvalidOptions(_))));
    }
}
