//! 匹配算法模块，简单实现

use std::cmp::Reverse;

use strsim::normalized_levenshtein;

use crate::model::{LyricCandidate, MatchType, MusicInfo};

// 字符串相似度阈值，高于此值则认为匹配
const SIMILARITY_THRESHOLD: f64 = 0.85;

/// 比较歌曲信息和候选歌词，返回匹配类型
pub fn compare_candidate(info: &MusicInfo, candidate: &LyricCandidate) -> MatchType {
    let title = info.title_or_empty().to_lowercase();
    if title.is_empty() {
        return MatchType::None;
    }

    let title_score = normalized_levenshtein(&title, &candidate.title.to_lowercase());
    if title_score < SIMILARITY_THRESHOLD {
        return if title_score >= 0.5 {
            MatchType::VeryLow
        } else {
            MatchType::None
        };
    }
    let exact_title = title_score >= 1.0;

    // 如果没有提供艺术家，则认为匹配
    let (artist_match, exact_artist) = match info.artist.as_deref().filter(|a| !a.is_empty()) {
        None => (true, false),
        Some(artist) => {
            let artist = artist.to_lowercase();
            let candidate_artist = candidate.artist.to_lowercase();
            let exact = artist == candidate_artist;
            let similar = exact
                || candidate_artist.contains(&artist)
                || normalized_levenshtein(&artist, &candidate_artist) >= SIMILARITY_THRESHOLD;
            (similar, exact)
        }
    };

    match (exact_title, artist_match, exact_artist) {
        (true, _, true) => MatchType::Perfect,
        (true, true, false) => MatchType::VeryHigh,
        (false, true, _) => MatchType::High,
        (true, false, _) => MatchType::Medium,
        (false, false, _) => MatchType::Low,
    }
}

/// 按匹配度从高到低对候选歌词做稳定排序，匹配度相同的保持原有顺序。
pub fn rank_candidates(info: &MusicInfo, candidates: &mut [LyricCandidate]) {
    candidates.sort_by_cached_key(|c| Reverse(compare_candidate(info, c)));
}
