use kilnflow_core::RewriteTemplate;
use std::path::{Path, PathBuf};

/// 対象リポジトリのパスを解決（省略時はカレントディレクトリ）
pub fn resolve_repo(path: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let repo = match path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    if !repo.is_dir() {
        return Err(anyhow::anyhow!(
            "リポジトリディレクトリが見つかりません: {}",
            repo.display()
        ));
    }

    Ok(repo)
}

/// KEY=VALUE 形式のビルド引数をパース
pub fn parse_build_arg(s: &str) -> anyhow::Result<(String, String)> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(anyhow::anyhow!(
            "ビルド引数は KEY=VALUE 形式で指定してください: {}",
            s
        )),
    }
}

/// メモリ上限をパース（k/m/g 接尾辞、大文字小文字は無視）
///
/// 接尾辞なしはバイト数として扱う。
pub fn parse_memory_limit(s: &str) -> anyhow::Result<u64> {
    let trimmed = s.trim();
    let (digits, multiplier): (&str, u64) = if let Some(d) = trimmed.strip_suffix(['k', 'K']) {
        (d, 1024)
    } else if let Some(d) = trimmed.strip_suffix(['m', 'M']) {
        (d, 1024 * 1024)
    } else if let Some(d) = trimmed.strip_suffix(['g', 'G']) {
        (d, 1024 * 1024 * 1024)
    } else {
        (trimmed, 1)
    };

    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("メモリ上限の形式が不正です: {}", s))?;

    Ok(value * multiplier)
}

/// イメージタグの自動生成: kiln-<ディレクトリ名>:latest
pub fn default_image_tag(repo: &Path) -> String {
    let name = repo
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("repo");

    // Dockerタグとして使えない文字は '-' に置き換える
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let sanitized = sanitized.trim_matches(|c: char| !c.is_ascii_alphanumeric());

    if sanitized.is_empty() {
        "kiln-repo:latest".to_string()
    } else {
        format!("kiln-{}:latest", sanitized)
    }
}

/// ビルド引数の検証（機密情報の警告）
pub fn warn_sensitive_build_arg(key: &str) {
    let sensitive_patterns = ["password", "token", "secret", "api_key", "private_key"];

    let key_lower = key.to_lowercase();
    for pattern in &sensitive_patterns {
        if key_lower.contains(pattern) {
            tracing::warn!(
                "警告: ビルド引数 '{}' は機密情報を含む可能性があります。\n\
                 ビルド引数はイメージ履歴に記録されます。\n\
                 機密情報はビルド引数ではなく、環境変数やシークレットマウントを使用してください。",
                key
            );
        }
    }
}

/// エンジンオプションをパース（KEY=VALUE、VALUEはJSONとして解釈）
///
/// JSONとして読めない値は文字列として扱う。
pub fn parse_engine_option(s: &str) -> anyhow::Result<(String, serde_json::Value)> {
    let (key, value) = s.split_once('=').ok_or_else(|| {
        anyhow::anyhow!("エンジンオプションは KEY=VALUE 形式で指定してください: {}", s)
    })?;

    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));

    Ok((key.to_string(), value))
}

/// 書き換えテンプレートに設定ファイルの上書きを適用する
pub fn rewrite_template_from(config: &kilnflow_config::KilnConfig) -> RewriteTemplate {
    let mut template = RewriteTemplate::default();

    if let Some(legacy) = &config.legacy {
        if let Some(v) = &legacy.legacy_image {
            template.legacy_image = v.clone();
        }
        if let Some(v) = &legacy.base_image {
            template.base_image = v.clone();
        }
        if let Some(v) = &legacy.preamble {
            template.preamble = v.clone();
        }
        if let Some(v) = &legacy.postamble {
            template.postamble = v.clone();
        }
    }

    template
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_arg() {
        assert_eq!(
            parse_build_arg("NODE_ENV=production").unwrap(),
            ("NODE_ENV".to_string(), "production".to_string())
        );
        // 値に '=' が含まれても最初の '=' で分割される
        assert_eq!(
            parse_build_arg("OPTS=a=b").unwrap(),
            ("OPTS".to_string(), "a=b".to_string())
        );
        assert!(parse_build_arg("NO_VALUE").is_err());
        assert!(parse_build_arg("=value").is_err());
    }

    #[test]
    fn test_parse_memory_limit() {
        assert_eq!(parse_memory_limit("1024").unwrap(), 1024);
        assert_eq!(parse_memory_limit("512k").unwrap(), 512 * 1024);
        assert_eq!(parse_memory_limit("512M").unwrap(), 512 * 1024 * 1024);
        assert_eq!(parse_memory_limit("2g").unwrap(), 2 * 1024 * 1024 * 1024);
        assert!(parse_memory_limit("abc").is_err());
        assert!(parse_memory_limit("2t").is_err());
    }

    #[test]
    fn test_default_image_tag() {
        assert_eq!(
            default_image_tag(Path::new("/work/My Repo")),
            "kiln-my-repo:latest"
        );
        assert_eq!(
            default_image_tag(Path::new("/work/app_v2")),
            "kiln-app_v2:latest"
        );
    }

    #[test]
    fn test_parse_engine_option() {
        let (key, value) = parse_engine_option("forcerm=false").unwrap();
        assert_eq!(key, "forcerm");
        assert_eq!(value, serde_json::json!(false));

        let (key, value) = parse_engine_option("dockerfile=Dockerfile.alt").unwrap();
        assert_eq!(key, "dockerfile");
        assert_eq!(value, serde_json::json!("Dockerfile.alt"));

        assert!(parse_engine_option("invalid").is_err());
    }

    #[test]
    fn test_rewrite_template_from_overrides() {
        let config = kilnflow_config::KilnConfig {
            legacy: Some(kilnflow_config::LegacyTemplateConfig {
                base_image: Some("registry.example/base@sha256:0000".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let template = rewrite_template_from(&config);
        assert_eq!(template.base_image, "registry.example/base@sha256:0000");
        // 未指定のフィールドは既定値のまま
        assert_eq!(
            template.legacy_image,
            RewriteTemplate::default().legacy_image
        );
    }
}
