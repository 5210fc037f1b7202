//! 定义了整个 `osd-lyrics` 核心库的错误类型 `OsdLyricsError`。

use std::{io, time::Duration};
use thiserror::Error;

use crate::lyrics::types::ParseError;

/// `osd-lyrics` 核心库的通用错误枚举。
#[derive(Error, Debug)]
pub enum OsdLyricsError {
    /// 网络请求失败 (源自 `reqwest::Error`)
    #[error("网络请求失败: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// JSON 解析失败 (源自 `serde_json::Error`)
    #[error("JSON 解析失败: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O 错误 (源自 `io::Error`)
    #[error("I/O 错误: {0}")]
    Io(#[from] io::Error),

    /// 歌词解析失败
    #[error("歌词解析失败: {0}")]
    Parser(#[from] ParseError),

    /// 搜索响应的格式不符合协议
    #[error("协议错误: {0}")]
    Protocol(String),

    /// 更通用的网络层错误，例如服务器返回了非成功的状态码
    #[error("网络错误: {0}")]
    Network(String),

    /// 字符集转换失败
    #[error("字符集转换失败: {0}")]
    Transcode(String),

    /// 无法识别的字符集名称
    #[error("未知的字符集: '{0}'")]
    UnknownCharset(String),

    /// 请求在规定时间内未完成
    #[error("请求超时 ({0:?})")]
    Timeout(Duration),

    /// 不支持的歌词下载引擎
    #[error("不支持的下载引擎: '{0}'")]
    EngineNotSupported(String),

    /// 搜索没有返回任何候选歌词
    #[error("未找到候选歌词")]
    NoCandidates,

    /// 播放器不可用或已退出
    #[error("播放器不可用")]
    PlayerUnavailable,

    /// 播放器不支持该操作
    #[error("播放器不支持操作: {0}")]
    Unsupported(&'static str),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// `OsdLyricsError` 的 `Result` 类型别名，方便在函数签名中使用。
pub type Result<T> = std::result::Result<T, OsdLyricsError>;
