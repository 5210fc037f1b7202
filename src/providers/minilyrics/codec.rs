//! MiniLyrics (ViewLyrics) 搜索协议的请求构造与响应解析。
//!
//! 请求的字节布局为 `[6 字节前缀][16 字节 MD5 摘要][XML 载荷]`，没有长度字段。
//! 响应是一串自闭合标签，每个标签的 `link`、`title`、`artist` 属性描述一个候选歌词。

use std::borrow::Cow;

use md5::{Digest, Md5};
use tracing::{debug, trace};

use crate::model::{LyricCandidate, MusicInfo};

/// 请求的固定二进制前缀。
pub const REQUEST_PREFIX: [u8; 6] = [0x02, 0x00, 0x04, 0x00, 0x00, 0x00];
/// 计算摘要时追加在 XML 之后的应用密钥。
const DIGEST_SALT: &str = "Mlv1clt4.0";
/// MD5 摘要长度。
pub const DIGEST_SIZE: usize = 16;

const TAG_END: &str = "/>";

/// 生成搜索请求的 XML 载荷。
fn request_xml(artist: &str, title: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding='utf-8'?>\r\n\
         <search filetype=\"lyrics\" artist=\"{artist}\" title=\"{title}\" \
         ClientCharEncoding=\"utf-8\"/>\r\n"
    )
}

/// 构造一次搜索请求的完整字节序列。
///
/// 相同的 `MusicInfo` 总是得到逐字节相同的结果。
#[must_use]
pub fn build_request(info: &MusicInfo) -> Vec<u8> {
    let xml = request_xml(info.artist_or_empty(), info.title_or_empty());

    let mut hasher = Md5::new();
    hasher.update(xml.as_bytes());
    hasher.update(DIGEST_SALT.as_bytes());
    let digest = hasher.finalize();

    trace!(digest = %hex::encode(digest), "MiniLyrics 请求摘要");

    let mut request = Vec::with_capacity(REQUEST_PREFIX.len() + DIGEST_SIZE + xml.len());
    request.extend_from_slice(&REQUEST_PREFIX);
    request.extend_from_slice(&digest);
    request.extend_from_slice(xml.as_bytes());
    request
}

/// 从一个标签片段中读取 `attr="..."` 的值。
///
/// 值会做 XML 反转义，无法反转义时保留原文。
fn attribute_value(span: &str, attr: &str) -> Option<String> {
    let needle = format!("{attr}=\"");
    let start = span.find(&needle)? + needle.len();
    let value = &span[start..];
    let raw = value.find('"').map_or(value, |end| &value[..end]);

    Some(
        quick_xml::escape::unescape(raw)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| raw.to_string()),
    )
}

/// 响应按请求中声明的 UTF-8 解码，不是合法 UTF-8 时按 GBK 解码。
fn decode_response(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            debug!("搜索响应不是有效的 UTF-8，按 GBK 解码。");
            encoding_rs::GBK.decode_without_bom_handling(bytes).0
        }
    }
}

/// 将搜索响应解析为候选歌词列表，保持响应中的顺序。
///
/// * 链接不以 `lrc` 结尾的记录会被跳过；
/// * 缺少 `link` 或 `title` 的记录会终止解析，返回已收集的候选；
/// * 缺少 `artist` 时视为空字符串；
/// * 找不到下一个 `/>` 时正常结束。
pub fn parse_response(bytes: &[u8]) -> Vec<LyricCandidate> {
    let text = decode_response(bytes);
    let mut candidates = Vec::new();
    let mut rest: &str = &text;

    while let Some(end) = rest.find(TAG_END) {
        let span = &rest[..end];
        rest = &rest[end + TAG_END.len()..];

        let Some(link) = attribute_value(span, "link") else {
            debug!("响应记录缺少 link 属性，停止解析。");
            break;
        };
        if !link.ends_with("lrc") {
            debug!("跳过非 LRC 链接: {}", link);
            continue;
        }
        let Some(title) = attribute_value(span, "title") else {
            debug!("响应记录缺少 title 属性，停止解析。");
            break;
        };
        let artist = attribute_value(span, "artist").unwrap_or_default();

        candidates.push(LyricCandidate::new(title, artist, link));
    }

    candidates
}
