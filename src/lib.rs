#![warn(missing_docs)]

//! # OSD Lyrics RS
//!
//! OSD Lyrics 的核心库：解析 LRC 歌词并按播放进度查询当前行，
//! 从在线服务搜索、下载歌词，以及轮询播放器驱动整个流程。
//!
//! ## 主要功能
//!
//! - **歌词模型**: 解析 LRC 文件，支持多时间标签、元数据标签与全局偏移。
//! - **歌词获取**: MiniLyrics (ViewLyrics) 与 LRCLIB 两个下载引擎，请求异步执行，
//!   回调只在拥有者的上下文中触发。
//! - **播放器驱动**: 检测歌曲切换，优先使用本地歌词，否则自动搜索下载。
//!
//! ## 查询歌词
//!
//! ```rust
//! use osd_lyrics_rs::lyrics::parse_lrc;
//!
//! let doc = parse_lrc("[00:01.00]Hello\n[00:03.00]World");
//! let position = doc.query(2000).unwrap();
//! assert_eq!(position.index, 0);
//! assert!((position.fraction - 0.5).abs() < 1e-9);
//! ```
//!
//! ## 搜索歌词
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use osd_lyrics_rs::{
//!     fetch::{CoordinatorOptions, FetchCoordinator},
//!     model::MusicInfo,
//!     providers::{FetchEngine, minilyrics::MiniLyrics},
//! };
//!
//! # async fn demo() -> osd_lyrics_rs::Result<()> {
//! let mut coordinator = FetchCoordinator::new(CoordinatorOptions::default())?;
//! let engine: Arc<dyn FetchEngine> = Arc::new(MiniLyrics::new());
//! let info = MusicInfo::new("Yesterday", Some("The Beatles"));
//!
//! coordinator.begin_search(engine, &info, |outcome| match outcome {
//!     Ok(result) => println!("找到 {} 个候选歌词。", result.candidates.len()),
//!     Err(failure) => eprintln!("搜索失败: {}", failure.error),
//! });
//! coordinator.dispatch_all().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod lyrics;
pub mod model;
pub mod player;
pub mod providers;

pub use config::{ConfigAccessor, FetchSettings, MemoryConfig};
pub use driver::{DisplaySink, LyricsContext, LyricsDriver};
pub use error::{OsdLyricsError, Result};
pub use fetch::{FetchCoordinator, RequestId};
pub use lyrics::{LinePosition, LyricDocument, LyricLine};
pub use model::{LyricCandidate, MusicInfo};
pub use player::{PlayerController, PlayerRegistry, PlayerStatus};
pub use providers::{EngineRegistry, FetchEngine};
