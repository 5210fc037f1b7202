//! 定义了歌词解析与同步查询中使用的核心数据类型。

use std::collections::HashMap;

use thiserror::Error;

/// 最后一行歌词没有下一行作为边界，插值时使用的默认时长（毫秒）。
pub const LAST_LINE_SPAN_MS: u64 = 10_000;

//=============================================================================
// 1. 错误枚举
//=============================================================================

/// 歌词解析过程中可能发生的错误。
///
/// 单个时间标签或单行的问题不会产生错误，只会记录为警告。
#[derive(Error, Debug)]
pub enum ParseError {
    /// 输入不是合法的 UTF-8 文本。
    #[error("歌词文本不是有效的 UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

//=============================================================================
// 2. 歌词行与文档
//=============================================================================

/// 一行带时间戳的歌词。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LyricLine {
    /// 该行开始的时间（毫秒）。
    pub timestamp_ms: u64,
    /// 该行的文本，可以为空。
    pub text: String,
}

impl LyricLine {
    /// 创建一个歌词行。
    pub fn new(timestamp_ms: u64, text: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            text: text.into(),
        }
    }
}

/// 某一时刻的歌词位置，由 [`LyricDocument::query`] 返回。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePosition {
    /// 当前行的下标。
    pub index: usize,
    /// 在当前行与下一行之间的插值进度，范围 `[0, 1]`。
    pub fraction: f64,
}

/// 一份已解析的、可按播放时间查询的歌词。
///
/// 歌词行按时间戳非递减排列，相同时间戳的行保持解析顺序。
/// 解析完成后行内容不再改变，唯一可变的是全局偏移量。
#[derive(Debug, Clone, Default)]
pub struct LyricDocument {
    lines: Vec<LyricLine>,
    offset_ms: i64,
    /// 解析出的 `[key:value]` 元数据标签。
    pub metadata: HashMap<String, Vec<String>>,
    /// 解析过程中跳过的标签或行的说明。
    pub warnings: Vec<String>,
}

impl LyricDocument {
    /// 由歌词行创建文档，会对行做稳定排序。
    pub fn from_lines(mut lines: Vec<LyricLine>) -> Self {
        lines.sort_by_key(|l| l.timestamp_ms);
        Self {
            lines,
            ..Default::default()
        }
    }

    /// 所有歌词行。
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    /// 下标对应的歌词行。
    pub fn line(&self, index: usize) -> Option<&LyricLine> {
        self.lines.get(index)
    }

    /// 歌词行数。
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// 是否不含任何带时间的行。
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 当前的全局偏移量（毫秒）。正数表示歌词延后显示。
    pub fn offset_ms(&self) -> i64 {
        self.offset_ms
    }

    /// 直接设置全局偏移量。
    pub fn set_offset(&mut self, offset_ms: i64) {
        self.offset_ms = offset_ms;
    }

    /// 在当前偏移量上累加 `delta_ms`。
    ///
    /// 偏移量只在查询时生效，存储的时间戳与行顺序不变。
    pub fn adjust_offset(&mut self, delta_ms: i64) {
        self.offset_ms = self.offset_ms.saturating_add(delta_ms);
    }

    /// 查询播放到 `elapsed_ms` 时的当前行及插值进度。
    ///
    /// 返回满足 `timestamp_ms + offset_ms <= elapsed_ms` 的最大下标；
    /// 若播放时间早于第一行，或文档为空，返回 `None`。
    pub fn query(&self, elapsed_ms: i64) -> Option<LinePosition> {
        let active_count = self
            .lines
            .partition_point(|l| self.shifted(l.timestamp_ms) <= elapsed_ms);
        let index = active_count.checked_sub(1)?;

        let start = self.lines[index].timestamp_ms;
        let into_line = elapsed_ms.saturating_sub(self.shifted(start));

        let fraction = match self.lines.get(index + 1) {
            Some(next) if next.timestamp_ms == start => 0.0,
            Some(next) => into_line as f64 / (next.timestamp_ms - start) as f64,
            None => (into_line as f64 / LAST_LINE_SPAN_MS as f64).min(1.0),
        };

        Some(LinePosition { index, fraction })
    }

    /// 从 `index` 开始向后查找第一行文本非空的歌词。
    ///
    /// 空行通常是间奏占位，显示时应跳到下一句真正的歌词。
    pub fn real_line(&self, index: usize) -> Option<(usize, &LyricLine)> {
        self.lines
            .iter()
            .enumerate()
            .skip(index)
            .find(|(_, l)| !l.text.trim().is_empty())
    }

    /// 下标为 `index` 的行持续的时长（毫秒）。最后一行使用默认时长。
    pub fn line_duration_ms(&self, index: usize) -> Option<u64> {
        let line = self.lines.get(index)?;
        Some(match self.lines.get(index + 1) {
            Some(next) => next.timestamp_ms - line.timestamp_ms,
            None => LAST_LINE_SPAN_MS,
        })
    }

    /// 元数据中某个键的第一个值。
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    fn shifted(&self, timestamp_ms: u64) -> i64 {
        i64::try_from(timestamp_ms)
            .unwrap_or(i64::MAX)
            .saturating_add(self.offset_ms)
    }
}
