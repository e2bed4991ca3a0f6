pub mod error;

pub use error::*;

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Kilnflowの設定
///
/// すべて省略可能。設定ファイルが無ければ既定値で動作する。
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct KilnConfig {
    /// ビルド時のメモリ上限（例: "2g", "512m"）
    #[serde(default)]
    pub memory_limit: Option<String>,

    /// 既定のビルド引数（CLI指定が優先される）
    #[serde(default)]
    pub build_args: HashMap<String, String>,

    /// 旧Binder書き換えテンプレートの上書き
    #[serde(default)]
    pub legacy: Option<LegacyTemplateConfig>,
}

/// 書き換えテンプレートの上書き項目
///
/// 指定したフィールドだけが埋め込みの既定値を置き換える。
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LegacyTemplateConfig {
    #[serde(default)]
    pub legacy_image: Option<String>,

    #[serde(default)]
    pub base_image: Option<String>,

    #[serde(default)]
    pub preamble: Option<String>,

    #[serde(default)]
    pub postamble: Option<String>,
}

/// 設定ファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 KILN_CONFIG_PATH (直接パス指定)
/// 2. 対象ディレクトリ: kiln.yaml, .kiln.yaml
/// 3. ~/.config/kilnflow/kiln.yaml (グローバル設定)
///
/// どこにも無ければNone（設定なしで動作する）。
pub fn find_config_file(base_dir: &Path) -> Option<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var("KILN_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. 対象ディレクトリで検索
    for filename in ["kiln.yaml", ".kiln.yaml"] {
        let path = base_dir.join(filename);
        if path.exists() {
            return Some(path);
        }
    }

    // 3. グローバル設定ファイル (~/.config/kilnflow/kiln.yaml)
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("kilnflow").join("kiln.yaml");
        if global_config.exists() {
            return Some(global_config);
        }
    }

    None
}

/// 設定ファイルを読み込む
pub fn load_config(path: &Path) -> Result<KilnConfig> {
    let contents = std::fs::read_to_string(path)?;

    // 空ファイルは設定なしとして扱う
    if contents.trim().is_empty() {
        return Ok(KilnConfig::default());
    }

    Ok(serde_yaml::from_str(&contents)?)
}

/// 対象ディレクトリに対する設定を読み込む
///
/// 見つからなければ既定値を返す。
pub fn load_for(base_dir: &Path) -> Result<KilnConfig> {
    match find_config_file(base_dir) {
        Some(path) => load_config(&path),
        None => Ok(KilnConfig::default()),
    }
}
