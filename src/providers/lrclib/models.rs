//! LRCLIB API 的响应结构。

use serde::Deserialize;

use crate::model::LyricCandidate;

/// `/api/search` 与 `/api/get/{id}` 返回的歌词记录。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LrclibRecord {
    /// 记录 ID
    pub id: i64,
    /// 歌曲标题
    #[serde(default)]
    pub track_name: String,
    /// 艺术家
    #[serde(default)]
    pub artist_name: String,
    /// 专辑名
    pub album_name: Option<String>,
    /// 时长（秒）
    pub duration: Option<f64>,
    /// 是否为纯音乐
    #[serde(default)]
    pub instrumental: bool,
    /// 不带时间轴的歌词
    pub plain_lyrics: Option<String>,
    /// LRC 格式的同步歌词
    pub synced_lyrics: Option<String>,
}

impl LrclibRecord {
    /// 是否带有非空的同步歌词。
    pub fn has_synced(&self) -> bool {
        self.synced_lyrics
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }

    pub(crate) fn into_candidate(self, url: String) -> LyricCandidate {
        let mut candidate = LyricCandidate::new(self.track_name, self.artist_name, url);
        if let Some(album) = self.album_name {
            candidate.extra.insert("album".to_string(), album);
        }
        if let Some(duration) = self.duration {
            let ms = (duration * 1000.0).round() as u64;
            candidate.extra.insert("duration_ms".to_string(), ms.to_string());
        }
        candidate
    }
}
