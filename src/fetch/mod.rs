//! 歌词获取调度模块
//!
//! `FetchCoordinator` 把搜索和下载请求派发到 tokio 的工作线程上执行，
//! 完成后的结果经由通道送回，并且只在调用 `dispatch_pending` 或
//! `dispatch_next` 的上下文中触发回调。每个请求的回调恰好被调用一次。

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use futures::future;
use tokio::{runtime::Handle, sync::mpsc};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{OsdLyricsError, Result},
    model::{LyricCandidate, MAX_CANDIDATE_COUNT, MusicInfo, add_candidate},
    providers::{DEFAULT_CHARSET, FetchEngine},
};

pub mod matcher;

pub use matcher::{compare_candidate, rank_candidates};

/// 请求的唯一标识，从 1 开始单调递增。
pub type RequestId = u64;

/// 默认的请求超时时间。
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// 一次成功的搜索。
pub struct FetchResult {
    /// 请求 ID
    pub id: RequestId,
    /// 发起搜索时的歌曲信息副本
    pub info: MusicInfo,
    /// 去重并按匹配度排序后的候选歌词
    pub candidates: Vec<LyricCandidate>,
    /// 执行搜索的引擎，下载时应使用同一个引擎
    pub engine: Arc<dyn FetchEngine>,
}

/// 一次失败的搜索。
pub struct FetchFailure {
    /// 请求 ID
    pub id: RequestId,
    /// 发起搜索时的歌曲信息副本
    pub info: MusicInfo,
    /// 执行搜索的引擎
    pub engine: Arc<dyn FetchEngine>,
    /// 失败原因
    pub error: OsdLyricsError,
}

/// 搜索回调收到的结果。
pub type SearchOutcome = std::result::Result<FetchResult, FetchFailure>;

/// 一次下载的结果。
#[derive(Debug)]
pub struct DownloadResult {
    /// 请求 ID
    pub id: RequestId,
    /// 发起下载时的歌曲信息副本
    pub info: MusicInfo,
    /// 被下载的候选歌词
    pub candidate: LyricCandidate,
    /// 成功时为写入的文件路径
    pub outcome: Result<PathBuf>,
}

impl DownloadResult {
    /// 下载成功时返回写入的文件路径。
    pub fn filepath(&self) -> Option<&Path> {
        self.outcome.as_ref().ok().map(PathBuf::as_path)
    }
}

type SearchCallback = Box<dyn FnOnce(SearchOutcome)>;
type DownloadCallback = Box<dyn FnOnce(DownloadResult)>;

enum Pending {
    Search {
        info: MusicInfo,
        engine: Arc<dyn FetchEngine>,
        callback: SearchCallback,
    },
    Download {
        info: MusicInfo,
        candidate: LyricCandidate,
        callback: DownloadCallback,
    },
}

/// 工作线程发回的完成消息。
enum Completion {
    Search {
        id: RequestId,
        outcome: Result<Vec<LyricCandidate>>,
    },
    Download {
        id: RequestId,
        outcome: Result<PathBuf>,
    },
}

impl Completion {
    fn id(&self) -> RequestId {
        match self {
            Completion::Search { id, .. } | Completion::Download { id, .. } => *id,
        }
    }
}

/// `FetchCoordinator` 的可调参数。
#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    /// 单个请求的超时时间
    pub timeout: Duration,
    /// 下载歌词时的目标字符集
    pub charset: String,
    /// 单次搜索最多保留的候选数量
    pub max_candidates: usize,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            charset: DEFAULT_CHARSET.to_string(),
            max_candidates: MAX_CANDIDATE_COUNT,
        }
    }
}

/// 管理进行中的搜索与下载请求。
///
/// 协调器本身只能在创建它的上下文中使用（回调不要求 `Send`），
/// 网络操作则在 tokio 运行时的任务中执行。
pub struct FetchCoordinator {
    runtime: Handle,
    options: CoordinatorOptions,
    next_id: RequestId,
    pending: HashMap<RequestId, Pending>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl std::fmt::Debug for FetchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchCoordinator")
            .field("options", &self.options)
            .field("next_id", &self.next_id)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl FetchCoordinator {
    /// 在当前的 tokio 运行时上创建协调器。
    ///
    /// # 错误
    /// 不在 tokio 运行时上下文中调用时返回 `OsdLyricsError::Internal`。
    pub fn new(options: CoordinatorOptions) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| OsdLyricsError::Internal(format!("没有可用的 tokio 运行时: {e}")))?;
        Ok(Self::with_handle(runtime, options))
    }

    /// 使用指定的运行时句柄创建协调器。
    pub fn with_handle(runtime: Handle, options: CoordinatorOptions) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            options,
            next_id: 1,
            pending: HashMap::new(),
            tx,
            rx,
        }
    }

    /// 当前的参数。
    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    fn allocate_id(&mut self) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// 异步搜索歌词。
    ///
    /// `info` 会被复制，调用返回后调用方可以自由修改原值。
    /// 回调在之后的某次 `dispatch_pending`/`dispatch_next` 中被调用恰好一次，
    /// 除非请求在完成前被 `discard`。
    #[instrument(skip(self, engine, callback), fields(engine = engine.name(), track = %info))]
    pub fn begin_search<F>(
        &mut self,
        engine: Arc<dyn FetchEngine>,
        info: &MusicInfo,
        callback: F,
    ) -> RequestId
    where
        F: FnOnce(SearchOutcome) + 'static,
    {
        let id = self.allocate_id();
        let timeout = self.options.timeout;
        let charset = self.options.charset.clone();
        let tx = self.tx.clone();
        let worker_engine = Arc::clone(&engine);
        let worker_info = info.clone();

        self.runtime.spawn(async move {
            let outcome = match tokio::time::timeout(
                timeout,
                worker_engine.search(&worker_info, &charset),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(OsdLyricsError::Timeout(timeout)),
            };
            // 接收端关闭说明协调器已被丢弃，结果无人关心
            let _ = tx.send(Completion::Search { id, outcome });
        });

        self.pending.insert(
            id,
            Pending::Search {
                info: info.clone(),
                engine,
                callback: Box::new(callback),
            },
        );
        debug!(id, "搜索请求已派发。");
        id
    }

    /// 异步下载一个候选歌词到 `path`。
    ///
    /// 候选、歌曲信息和路径都会被复制。
    #[instrument(
        skip(self, engine, candidate, callback),
        fields(engine = engine.name(), track = %info)
    )]
    pub fn begin_download<F>(
        &mut self,
        engine: Arc<dyn FetchEngine>,
        candidate: &LyricCandidate,
        info: &MusicInfo,
        path: &Path,
        callback: F,
    ) -> RequestId
    where
        F: FnOnce(DownloadResult) + 'static,
    {
        let id = self.allocate_id();
        let timeout = self.options.timeout;
        let charset = self.options.charset.clone();
        let tx = self.tx.clone();
        let worker_candidate = candidate.clone();
        let target = path.to_path_buf();

        self.runtime.spawn(async move {
            let outcome = match tokio::time::timeout(
                timeout,
                engine.download(&worker_candidate, &target, &charset),
            )
            .await
            {
                Ok(Ok(())) => Ok(target),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(OsdLyricsError::Timeout(timeout)),
            };
            let _ = tx.send(Completion::Download { id, outcome });
        });

        self.pending.insert(
            id,
            Pending::Download {
                info: info.clone(),
                candidate: candidate.clone(),
                callback: Box::new(callback),
            },
        );
        debug!(id, path = %path.display(), "下载请求已派发。");
        id
    }

    /// 放弃一个进行中的请求，其回调不会再被调用。
    ///
    /// # 返回
    /// 请求是否仍处于进行中。
    pub fn discard(&mut self, id: RequestId) -> bool {
        let removed = self.pending.remove(&id).is_some();
        if removed {
            debug!(id, "请求已被放弃。");
        }
        removed
    }

    /// 进行中（尚未回调）的请求数量。
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// 请求是否仍在进行中。
    pub fn is_pending(&self, id: RequestId) -> bool {
        self.pending.contains_key(&id)
    }

    /// 处理所有已经完成的请求，不会等待。
    ///
    /// # 返回
    /// 被调用的回调数量。
    pub fn dispatch_pending(&mut self) -> usize {
        let mut dispatched = 0;
        while let Ok(completion) = self.rx.try_recv() {
            if self.complete(completion) {
                dispatched += 1;
            }
        }
        dispatched
    }

    /// 等待下一个请求完成并调用其回调。
    ///
    /// 没有进行中的请求时立即返回 `None`。
    pub async fn dispatch_next(&mut self) -> Option<RequestId> {
        while !self.pending.is_empty() {
            // 协调器自身持有一个发送端，通道不会关闭
            let completion = self.rx.recv().await?;
            let id = completion.id();
            if self.complete(completion) {
                return Some(id);
            }
        }
        None
    }

    /// 等待所有进行中的请求完成。
    pub async fn dispatch_all(&mut self) -> usize {
        let mut dispatched = 0;
        while self.dispatch_next().await.is_some() {
            dispatched += 1;
        }
        dispatched
    }

    fn complete(&mut self, completion: Completion) -> bool {
        let id = completion.id();
        let Some(pending) = self.pending.remove(&id) else {
            debug!(id, "忽略已被放弃的请求的结果。");
            return false;
        };

        match (pending, completion) {
            (
                Pending::Search {
                    info,
                    engine,
                    callback,
                },
                Completion::Search { outcome, .. },
            ) => {
                let outcome = match outcome {
                    Ok(raw) => {
                        let candidates = self.finalize_candidates(&info, raw);
                        info!(id, "搜索完成，得到 {} 个候选歌词。", candidates.len());
                        Ok(FetchResult {
                            id,
                            info,
                            candidates,
                            engine,
                        })
                    }
                    Err(error) => {
                        warn!(id, "搜索失败: {}", error);
                        Err(FetchFailure {
                            id,
                            info,
                            engine,
                            error,
                        })
                    }
                };
                callback(outcome);
            }
            (
                Pending::Download {
                    info,
                    candidate,
                    callback,
                },
                Completion::Download { outcome, .. },
            ) => {
                match &outcome {
                    Ok(path) => info!(id, path = %path.display(), "歌词下载完成。"),
                    Err(e) => warn!(id, "歌词下载失败: {}", e),
                }
                callback(DownloadResult {
                    id,
                    info,
                    candidate,
                    outcome,
                });
            }
            _ => {
                warn!(id, "请求类型与完成消息不一致，已丢弃。");
                return false;
            }
        }
        true
    }

    fn finalize_candidates(
        &self,
        info: &MusicInfo,
        raw: Vec<LyricCandidate>,
    ) -> Vec<LyricCandidate> {
        let mut candidates = Vec::with_capacity(raw.len().min(self.options.max_candidates));
        for candidate in raw {
            add_candidate(&mut candidates, self.options.max_candidates, candidate);
        }
        rank_candidates(info, &mut candidates);
        candidates
    }
}

/// 在多个引擎中并发搜索同一首歌。
///
/// 单个引擎的失败只会被记录，不影响其他引擎的结果。
///
/// # 返回
/// 每个成功的引擎及其按匹配度排序的候选歌词，顺序与 `engines` 一致。
pub async fn search_in_engines(
    engines: &[Arc<dyn FetchEngine>],
    info: &MusicInfo,
    charset: &str,
) -> Vec<(Arc<dyn FetchEngine>, Vec<LyricCandidate>)> {
    info!("开始对歌曲 '{}' 在 {} 个引擎中进行搜索...", info, engines.len());

    let searches = engines.iter().map(|engine| engine.search(info, charset));
    let results = future::join_all(searches).await;

    let mut combined = Vec::new();
    for (engine, result) in engines.iter().zip(results) {
        match result {
            Ok(mut candidates) => {
                info!("引擎 '{}' 返回 {} 个候选歌词。", engine.name(), candidates.len());
                rank_candidates(info, &mut candidates);
                combined.push((Arc::clone(engine), candidates));
            }
            Err(e) => {
                warn!("引擎 '{}' 的搜索失败: {}. 将忽略此引擎的结果。", engine.name(), e);
            }
        }
    }
    combined
}
