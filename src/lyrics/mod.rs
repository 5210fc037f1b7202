//! 歌词模型：LRC 解析与按播放时间的同步查询。

pub mod parser;
pub mod types;

pub use parser::{parse_lrc, parse_lrc_bytes, parse_lrc_file};
pub use types::{LAST_LINE_SPAN_MS, LinePosition, LyricDocument, LyricLine, ParseError};
