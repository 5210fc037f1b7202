//! 定义了搜索得到的候选歌词及其匹配度量。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 单次搜索最多保留的候选歌词数量。
pub const MAX_CANDIDATE_COUNT: usize = 5;

/// 一个指向远程歌词文件、尚未下载的搜索结果。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricCandidate {
    /// 候选歌词的歌曲标题。
    pub title: String,
    /// 候选歌词的艺术家，可能为空字符串。
    pub artist: String,
    /// 歌词文件的下载地址。
    pub url: String,
    /// 引擎特有的附加信息，例如评分、上传者等。
    pub extra: HashMap<String, String>,
}

impl LyricCandidate {
    /// 创建一个不带附加信息的候选歌词。
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            url: url.into(),
            extra: HashMap::new(),
        }
    }

    /// 两个候选是否具有相同的 (标题, 艺术家)。
    pub fn same_song_as(&self, other: &LyricCandidate) -> bool {
        self.title == other.title && self.artist == other.artist
    }
}

/// 将候选歌词加入有界的结果列表。
///
/// 若列表中已有相同 (标题, 艺术家) 的候选，新的候选会被丢弃（保留先到者）；
/// 列表达到 `max_count` 后不再插入。
///
/// # 返回
/// 候选是否被实际插入。
pub fn add_candidate(
    candidates: &mut Vec<LyricCandidate>,
    max_count: usize,
    candidate: LyricCandidate,
) -> bool {
    if candidates.len() >= max_count {
        return false;
    }
    if candidates.iter().any(|c| c.same_song_as(&candidate)) {
        tracing::debug!(
            "丢弃重复的候选歌词: {} - {}",
            candidate.artist,
            candidate.title
        );
        return false;
    }
    candidates.push(candidate);
    true
}

/// 代表候选歌词与查询歌曲的匹配程度。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum MatchType {
    /// 没有匹配或匹配度极低。
    #[default]
    None = -1,
    /// 匹配度非常低。
    VeryLow = 10,
    /// 匹配度低。
    Low = 30,
    /// 匹配度中等。
    Medium = 70,
    /// 匹配度较高。
    PrettyHigh = 90,
    /// 匹配度高。
    High = 95,
    /// 匹配度非常高。
    VeryHigh = 99,
    /// 完美匹配。
    Perfect = 100,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_title_artist_keeps_first() {
        let mut list = Vec::new();
        assert!(add_candidate(
            &mut list,
            MAX_CANDIDATE_COUNT,
            LyricCandidate::new("A", "B", "http://x/1.lrc")
        ));
        assert!(!add_candidate(
            &mut list,
            MAX_CANDIDATE_COUNT,
            LyricCandidate::new("A", "B", "http://x/2.lrc")
        ));

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].url, "http://x/1.lrc");
    }

    #[test]
    fn test_insert_stops_at_max_count() {
        let mut list = Vec::new();
        for i in 0..8 {
            add_candidate(
                &mut list,
                3,
                LyricCandidate::new(format!("T{i}"), "", format!("http://x/{i}.lrc")),
            );
        }
        assert_eq!(list.len(), 3);
        assert_eq!(list[2].title, "T2");
    }

    #[test]
    fn test_same_title_different_artist_is_kept() {
        let mut list = vec![LyricCandidate::new("A", "B", "u1")];
        assert!(add_candidate(&mut list, 5, LyricCandidate::new("A", "C", "u2")));
        assert_eq!(list.len(), 2);
    }
}
