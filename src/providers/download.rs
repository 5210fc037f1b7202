//! 下载后处理：字符集转换与歌词文件的安全写入。

use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use tracing::debug;

use crate::error::{OsdLyricsError, Result};

/// 未指定目标字符集时使用的编码。
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// 根据名称查找字符集，名称遵循 WHATWG 的编码标签（不区分大小写）。
pub fn lookup_charset(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| OsdLyricsError::UnknownCharset(label.to_string()))
}

/// 将 `bytes` 从 `from` 字符集转换为 `to` 字符集。
///
/// 源数据若带有 BOM，则以 BOM 指示的编码为准。
///
/// # 错误
/// * `OsdLyricsError::UnknownCharset` - 字符集名称无法识别。
/// * `OsdLyricsError::Transcode` - 目标字符集无法用于输出（如 UTF-16），源数据包含非法序列，
///   或存在目标字符集无法表示的字符。
pub fn transcode(bytes: &[u8], from: &str, to: &str) -> Result<Vec<u8>> {
    let source = lookup_charset(from)?;
    let requested = lookup_charset(to)?;
    let target = requested.output_encoding();
    // encoding_rs 只能解码 UTF-16，不能编码
    if target != requested {
        return Err(OsdLyricsError::Transcode(format!(
            "不支持输出 {} 编码",
            requested.name()
        )));
    }

    let (text, actual_source, had_errors) = source.decode(bytes);
    if had_errors {
        return Err(OsdLyricsError::Transcode(format!(
            "数据不是有效的 {} 编码",
            actual_source.name()
        )));
    }

    if target == encoding_rs::UTF_8 {
        return Ok(text.into_owned().into_bytes());
    }

    let (encoded, _, unmappable) = target.encode(&text);
    if unmappable {
        return Err(OsdLyricsError::Transcode(format!(
            "部分字符无法用 {} 表示",
            target.name()
        )));
    }
    Ok(encoded.into_owned())
}

/// 将歌词内容写入 `path`，会覆盖已有文件。
///
/// 内容先写入同目录下的临时文件再重命名，失败时不会留下写了一半的目标文件。
pub async fn write_lyric_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp_path = temp_path_for(path);
    if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }

    debug!("歌词已写入 {:?} ({} 字节)", path, bytes.len());
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "lyric".to_string());
    path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4().simple()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gbk_to_utf8() {
        // "周杰伦" 的 GBK 编码
        let gbk: &[u8] = &[0xD6, 0xDC, 0xBD, 0xDC, 0xC2, 0xD7];
        let out = transcode(gbk, "GBK", DEFAULT_CHARSET).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "周杰伦");
    }

    #[test]
    fn test_utf8_to_gbk() {
        let out = transcode("周杰伦".as_bytes(), "utf-8", "gbk").unwrap();
        assert_eq!(out, vec![0xD6, 0xDC, 0xBD, 0xDC, 0xC2, 0xD7]);
    }

    #[test]
    fn test_unknown_charset() {
        assert!(matches!(
            transcode(b"abc", "no-such-charset", "UTF-8"),
            Err(OsdLyricsError::UnknownCharset(_))
        ));
    }

    #[test]
    fn test_utf16_target_is_rejected() {
        for label in ["UTF-16LE", "utf-16be"] {
            assert!(matches!(
                transcode(b"[00:01.00]abc", "UTF-8", label),
                Err(OsdLyricsError::Transcode(_))
            ));
        }
        // 作为源字符集仍然可用
        let utf16: Vec<u8> = "ab".encode_utf16().flat_map(u16::to_le_bytes).collect();
        assert_eq!(transcode(&utf16, "UTF-16LE", "UTF-8").unwrap(), b"ab");
    }

    #[test]
    fn test_unmappable_character_fails() {
        assert!(matches!(
            transcode("😀".as_bytes(), "UTF-8", "GBK"),
            Err(OsdLyricsError::Transcode(_))
        ));
    }

    #[tokio::test]
    async fn test_write_lyric_file_overwrites() {
        let dir = std::env::temp_dir().join(format!("osd-lyrics-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("Singer-Song.lrc");

        write_lyric_file(&path, b"[00:01.00]old").await.unwrap();
        write_lyric_file(&path, b"[00:01.00]new").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"[00:01.00]new");
        let leftovers = std::fs::read_dir(&dir).unwrap().count();
        assert_eq!(leftovers, 1, "不应残留临时文件");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
