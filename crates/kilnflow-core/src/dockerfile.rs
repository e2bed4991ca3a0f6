//! Dockerfileの行単位スキャン
//!
//! Dockerfileを構造化ドキュメントとしてパースはしない。
//! 行頭プレフィックスの照合のみを行う1パスのスキャナで、
//! before-FROM / after-FROM の2状態だけを持つ。

/// リポジトリルートに置かれるDockerfileの名前
pub const DOCKERFILE: &str = "Dockerfile";

/// 最初のFROM行で分割した結果
///
/// 上から走査して最初に現れた（trim後に`FROM`で始まる）行を
/// ベースイメージ宣言とみなす。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerfileSplit<'a> {
    /// ベースイメージ宣言の行（存在しない場合はNone）
    pub base_line: Option<&'a str>,
    /// ベースイメージ宣言より後の本文（バイト単位でそのまま）
    ///
    /// FROM行が存在しない場合はファイル全体が入る。
    pub body: &'a str,
}

/// Dockerfile本文を最初のFROM行の前後に分割する
///
/// FROM行そのものは`base_line`に入り、`body`には含まれない。
pub fn split_at_base_image(text: &str) -> DockerfileSplit<'_> {
    let mut offset = 0;
    while offset < text.len() {
        let (line, next) = match text[offset..].find('\n') {
            Some(i) => (&text[offset..offset + i], offset + i + 1),
            None => (&text[offset..], text.len()),
        };

        if line.trim().starts_with("FROM") {
            return DockerfileSplit {
                base_line: Some(line),
                body: &text[next..],
            };
        }

        offset = next;
    }

    // FROM行なし。本文はファイル全体として扱う
    DockerfileSplit {
        base_line: None,
        body: text,
    }
}

/// `#`以降の行末コメントを落とす
pub fn strip_line_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        let text = "FROM ubuntu:20.04\nRUN echo hi\n";
        let split = split_at_base_image(text);
        assert_eq!(split.base_line, Some("FROM ubuntu:20.04"));
        assert_eq!(split.body, "RUN echo hi\n");
    }

    #[test]
    fn test_split_skips_lines_before_from() {
        let text = "# comment\nARG VERSION=1\nFROM alpine\nRUN true\n";
        let split = split_at_base_image(text);
        assert_eq!(split.base_line, Some("FROM alpine"));
        assert_eq!(split.body, "RUN true\n");
    }

    #[test]
    fn test_split_indented_from() {
        let text = "  FROM alpine\nRUN true\n";
        let split = split_at_base_image(text);
        assert_eq!(split.base_line, Some("  FROM alpine"));
        assert_eq!(split.body, "RUN true\n");
    }

    #[test]
    fn test_split_from_is_last_line_without_newline() {
        let text = "# header\nFROM alpine";
        let split = split_at_base_image(text);
        assert_eq!(split.base_line, Some("FROM alpine"));
        assert_eq!(split.body, "");
    }

    #[test]
    fn test_split_without_from_returns_whole_text() {
        let text = "RUN echo hi\nCMD [\"sh\"]\n";
        let split = split_at_base_image(text);
        assert_eq!(split.base_line, None);
        assert_eq!(split.body, text);
    }

    #[test]
    fn test_split_preserves_body_bytes() {
        let body = "RUN apt-get update\n\n# trailing comment\nCMD bash";
        let text = format!("FROM base:1\n{}", body);
        let split = split_at_base_image(&text);
        assert_eq!(split.body, body);
    }

    #[test]
    fn test_strip_line_comment() {
        assert_eq!(strip_line_comment("FROM a # b"), "FROM a ");
        assert_eq!(strip_line_comment("FROM a"), "FROM a");
        assert_eq!(strip_line_comment("# all comment"), "");
    }
}
