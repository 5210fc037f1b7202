//! 歌词下载引擎模块
//!
//! 该模块定义了与远程歌词服务交互的核心抽象 `FetchEngine`，
//! 以及按名称查找引擎的 `EngineRegistry`。

use std::{path::Path, sync::Arc};

use async_trait::async_trait;

use crate::{
    error::{OsdLyricsError, Result},
    model::{LyricCandidate, MusicInfo},
};

pub mod download;
pub mod lrclib;
pub mod minilyrics;

pub use download::DEFAULT_CHARSET;

/// 定义了所有歌词下载引擎需要实现的通用接口。
///
/// 引擎本身不保存任何与单次请求相关的状态，请求状态由 `FetchCoordinator` 管理。
#[async_trait]
pub trait FetchEngine: Send + Sync {
    ///
    /// 返回引擎的唯一名称。
    ///
    /// 一个全小写的静态字符串，例如 `"minilyrics"`。
    ///
    fn name(&self) -> &'static str;

    ///
    /// 根据歌曲信息搜索候选歌词。
    ///
    /// # 参数
    /// * `info` - 要搜索的歌曲。
    /// * `charset` - 调用方期望的字符集，部分引擎会据此调整请求。
    ///
    /// # 返回
    /// 一个 `Result`，成功时包含去重后的候选歌词，数量不超过 `MAX_CANDIDATE_COUNT`。
    ///
    async fn search(&self, info: &MusicInfo, charset: &str) -> Result<Vec<LyricCandidate>>;

    ///
    /// 下载候选歌词，转码为 `charset` 后写入 `target`，覆盖已有文件。
    ///
    /// 任一阶段（网络、转码、写文件）失败都会返回错误，且不会留下写了一半的目标文件。
    ///
    async fn download(
        &self,
        candidate: &LyricCandidate,
        target: &Path,
        charset: &str,
    ) -> Result<()>;
}

/// 按名称管理可用的下载引擎。
///
/// 替代全局的引擎表，在启动时构造并注入到驱动中。
#[derive(Clone, Default)]
pub struct EngineRegistry {
    engines: Vec<Arc<dyn FetchEngine>>,
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl EngineRegistry {
    /// 创建一个空的注册表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 包含所有内置引擎的注册表，`minilyrics` 排在首位。
    pub fn with_builtin_engines() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(minilyrics::MiniLyrics::new()));
        registry.register(Arc::new(lrclib::Lrclib::new()));
        registry
    }

    /// 注册一个引擎。同名引擎会被替换。
    pub fn register(&mut self, engine: Arc<dyn FetchEngine>) {
        if let Some(slot) = self.engines.iter_mut().find(|e| e.name() == engine.name()) {
            *slot = engine;
        } else {
            self.engines.push(engine);
        }
    }

    /// 按名称（不区分大小写）查找引擎。
    pub fn get(&self, name: &str) -> Option<Arc<dyn FetchEngine>> {
        self.engines
            .iter()
            .find(|e| e.name().eq_ignore_ascii_case(name.trim()))
            .cloned()
    }

    /// 按名称查找引擎，找不到时返回 [`OsdLyricsError::EngineNotSupported`]。
    pub fn require(&self, name: &str) -> Result<Arc<dyn FetchEngine>> {
        self.get(name)
            .ok_or_else(|| OsdLyricsError::EngineNotSupported(name.trim().to_string()))
    }

    /// 按名称查找引擎，找不到时退回到第一个注册的引擎。
    pub fn get_or_first(&self, name: Option<&str>) -> Option<Arc<dyn FetchEngine>> {
        if let Some(name) = name {
            match self.require(name) {
                Ok(engine) => return Some(engine),
                Err(e) => tracing::warn!("{}，将使用默认引擎。", e),
            }
        }
        self.engines.first().cloned()
    }

    /// 所有已注册引擎的名称。
    pub fn names(&self) -> Vec<&'static str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    /// 是否没有注册任何引擎。
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
