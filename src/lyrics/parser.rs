//! # LRC 格式解析器
//!
//! 容错策略：单个格式错误的时间标签只会被跳过并记录警告，
//! 不含任何有效时间标签的行视为元数据或注释行，整个解析过程不会因单行出错而中止。

use std::{collections::HashMap, path::Path, sync::LazyLock};

use regex::Regex;
use tracing::{debug, warn};

use crate::{
    error::Result,
    lyrics::types::{LyricDocument, LyricLine, ParseError},
};

/// 匹配时间标签括号内的部分，例如 `01:23.45`、`1:23`、`01:23:456`。
static LRC_TIME_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+):(\d{1,2})(?:[.:](\d{1,3}))?$").expect("未能编译 LRC_TIME_TAG_REGEX")
});

/// 匹配 `key:value` 格式的元数据标签内容
static LRC_METADATA_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z_][a-zA-Z0-9_]*):(.*)$").expect("未能编译 LRC_METADATA_TAG_REGEX")
});

/// 解析歌词文件的原始字节。
///
/// 字节流必须是 UTF-8 编码（下载时已完成转码），开头的 BOM 会被忽略。
pub fn parse_lrc_bytes(bytes: &[u8]) -> std::result::Result<LyricDocument, ParseError> {
    let content = std::str::from_utf8(bytes)?;
    Ok(parse_lrc(content))
}

/// 读取并解析磁盘上的歌词文件。
pub fn parse_lrc_file(path: &Path) -> Result<LyricDocument> {
    let bytes = std::fs::read(path)?;
    let document = parse_lrc_bytes(&bytes)?;
    debug!(
        "已解析歌词文件 {:?}: {} 行, {} 条警告",
        path,
        document.len(),
        document.warnings.len()
    );
    Ok(document)
}

/// 解析 LRC 文本内容。
///
/// 没有任何带时间行的输入会得到一个空文档，而不是错误。
pub fn parse_lrc(content: &str) -> LyricDocument {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut metadata: HashMap<String, Vec<String>> = HashMap::new();
    let mut warnings: Vec<String> = Vec::new();
    let mut lines: Vec<LyricLine> = Vec::new();

    for (line_num_zero_based, raw_line) in content.lines().enumerate() {
        let line_num = line_num_zero_based + 1;
        let mut rest = raw_line.trim();
        if rest.is_empty() {
            continue;
        }

        let mut timestamps: Vec<u64> = Vec::new();

        while let Some(after_open) = rest.strip_prefix('[') {
            let Some(close) = after_open.find(']') else {
                warnings.push(format!(
                    "LRC解析警告 (行 {line_num}): 标签缺少右括号 '[{after_open}'。"
                ));
                rest = "";
                break;
            };
            let inner = &after_open[..close];
            rest = &after_open[close + 1..];

            if let Some(ts) = parse_time_tag(inner) {
                timestamps.push(ts);
            } else if timestamps.is_empty()
                && let Some(caps) = LRC_METADATA_TAG_REGEX.captures(inner)
            {
                let key = caps.get(1).map_or("", |m| m.as_str()).to_string();
                let value = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
                metadata.entry(key).or_default().push(value);
            } else {
                warnings.push(format!(
                    "LRC解析警告 (行 {line_num}): 无法解析的标签 '[{inner}]'，已跳过。"
                ));
            }
        }

        if timestamps.is_empty() {
            continue;
        }

        let text = rest.trim();
        lines.extend(
            timestamps
                .into_iter()
                .map(|timestamp_ms| LyricLine::new(timestamp_ms, text)),
        );
    }

    if !warnings.is_empty() {
        warn!("LRC 解析完成，共跳过 {} 处格式错误。", warnings.len());
    }

    let mut document = LyricDocument::from_lines(lines);

    // LRC 的 offset 为正表示歌词提前，与查询偏移量的方向相反
    if let Some(raw_offset) = metadata.get("offset").and_then(|v| v.last()) {
        match raw_offset.trim().parse::<i64>() {
            Ok(offset) => document.set_offset(offset.saturating_neg()),
            Err(_) => warnings.push(format!("LRC解析警告: 无效的 offset 值 '{raw_offset}'。")),
        }
    }

    document.metadata = metadata;
    document.warnings = warnings;
    document
}

/// 将 `mm:ss.xx` 形式的标签内容解析为毫秒。
///
/// 小数部分一位表示十分之一秒，两位表示百分之一秒，三位表示毫秒。
fn parse_time_tag(inner: &str) -> Option<u64> {
    let caps = LRC_TIME_TAG_REGEX.captures(inner.trim())?;

    let minutes: u64 = caps.get(1)?.as_str().parse().ok()?;
    let seconds: u64 = caps.get(2)?.as_str().parse().ok()?;
    if seconds >= 60 {
        return None;
    }

    let fraction_ms = match caps.get(3) {
        None => 0,
        Some(m) => {
            let digits = m.as_str();
            let value: u64 = digits.parse().ok()?;
            match digits.len() {
                1 => value * 100,
                2 => value * 10,
                _ => value,
            }
        }
    };

    minutes
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(fraction_ms)
}
