//! 定义了用于标识一首歌曲的核心数据结构 `MusicInfo`。

use serde::{Deserialize, Serialize};

/// 代表当前播放歌曲的元数据，由播放器控制器提供。
///
/// 判断“是否为同一首歌”只比较 `title` 和 `artist`（精确、区分大小写），
/// 其余字段不参与比较。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicInfo {
    /// 歌曲标题。
    pub title: Option<String>,
    /// 艺术家。可以为空。
    pub artist: Option<String>,
    /// 专辑名。
    pub album: Option<String>,
    /// 音轨序号。
    pub track_number: Option<u32>,
    /// 播放器报告的歌曲 URI。
    pub uri: Option<String>,
    /// 歌曲时长提示（毫秒）。
    pub duration_ms: Option<u64>,
}

impl MusicInfo {
    /// 使用标题和艺术家创建一个 `MusicInfo`。
    pub fn new(title: impl Into<String>, artist: Option<&str>) -> Self {
        Self {
            title: Some(title.into()),
            artist: artist.map(str::to_string),
            ..Default::default()
        }
    }

    /// 设置时长提示。
    #[must_use]
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// 标题，缺失时返回空字符串。
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// 艺术家，缺失时返回空字符串。
    pub fn artist_or_empty(&self) -> &str {
        self.artist.as_deref().unwrap_or_default()
    }

    /// 判断两个 `MusicInfo` 是否代表同一首歌。
    pub fn is_same_track(&self, other: &MusicInfo) -> bool {
        self.title == other.title && self.artist == other.artist
    }

    /// 是否有可用于搜索的标题。
    pub fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl std::fmt::Display for MusicInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.artist, &self.title) {
            (Some(artist), Some(title)) => write!(f, "{artist} - {title}"),
            (None, Some(title)) => write!(f, "{title}"),
            (Some(artist), None) => write!(f, "{artist} - <未知标题>"),
            (None, None) => write!(f, "<未知歌曲>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_track_ignores_album_and_duration() {
        let a = MusicInfo {
            album: Some("专辑 A".into()),
            ..MusicInfo::new("Song", Some("Singer"))
        };
        let b = MusicInfo::new("Song", Some("Singer")).with_duration(180_000);
        assert!(a.is_same_track(&b));
    }

    #[test]
    fn test_same_track_is_case_sensitive() {
        let a = MusicInfo::new("Song", Some("Singer"));
        let b = MusicInfo::new("song", Some("Singer"));
        assert!(!a.is_same_track(&b));

        let c = MusicInfo::new("Song", None);
        assert!(!a.is_same_track(&c), "缺少艺术家时应视为不同歌曲");
    }
}
