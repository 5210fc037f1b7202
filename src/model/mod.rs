//! 定义了整个库通用的核心数据模型。

pub mod candidate;
pub mod track;

pub use candidate::{LyricCandidate, MAX_CANDIDATE_COUNT, MatchType, add_candidate};
pub use track::MusicInfo;
