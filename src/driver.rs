//! 顶层驱动
//!
//! 以固定间隔轮询播放器，检测歌曲变化，为新歌曲加载本地歌词或通过
//! `FetchCoordinator` 搜索并下载歌词，再把当前歌词位置交给显示层。

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use tokio::{
    sync::{mpsc, oneshot},
    time::MissedTickBehavior,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    config::{
        ConfigAccessor, DOWNLOAD_FIRST_LYRIC_KEY, DOWNLOAD_GROUP, FetchSettings, lyric_path_for,
    },
    error::{OsdLyricsError, Result},
    fetch::{
        CoordinatorOptions, DownloadResult, FetchCoordinator, FetchResult, RequestId,
        SearchOutcome,
    },
    lyrics::{LinePosition, LyricDocument, parse_lrc_file},
    model::{LyricCandidate, MusicInfo},
    player::{PlayerController, PlayerRegistry},
    providers::{EngineRegistry, FetchEngine},
};

/// 原程序使用的轮询间隔。
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 显示层需要实现的接口。
pub trait DisplaySink {
    /// 当前歌曲发生变化。`None` 表示没有正在播放的歌曲。
    fn set_music_info(&mut self, info: Option<&MusicInfo>);

    /// 当前歌曲的总时长（毫秒）。
    fn set_duration(&mut self, duration_ms: u64);

    /// 当前歌曲的歌词。`None` 表示暂无歌词。
    fn set_lyrics(&mut self, lyrics: Option<Arc<LyricDocument>>);

    /// 当前播放进度及对应的歌词位置。
    fn set_position(&mut self, elapsed_ms: u64, position: Option<LinePosition>);

    /// 让用户从多个候选歌词中选择一个，选择结果经由 [`LyricsDriver::choose_candidate`] 返回。
    fn show_candidates(&mut self, info: &MusicInfo, candidates: &[LyricCandidate]);
}

/// 驱动运行所需的全部外部依赖。
pub struct LyricsContext {
    /// 配置读写
    pub config: Box<dyn ConfigAccessor>,
    /// 可用的下载引擎
    pub engines: EngineRegistry,
    /// 歌词文件存放目录
    pub lyric_dir: PathBuf,
    /// 请求超时等参数
    pub options: CoordinatorOptions,
}

impl LyricsContext {
    /// 使用默认参数创建。
    pub fn new(
        config: Box<dyn ConfigAccessor>,
        engines: EngineRegistry,
        lyric_dir: impl Into<PathBuf>,
    ) -> Self {
        let options = FetchSettings::from_accessor(config.as_ref()).coordinator_options();
        Self {
            config,
            engines,
            lyric_dir: lyric_dir.into(),
            options,
        }
    }

    /// 当前的下载设置，每次调用都重新读取配置。
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings::from_accessor(self.config.as_ref())
    }
}

/// 等待用户选择的候选歌词。
struct PendingChoice {
    info: MusicInfo,
    engine: Arc<dyn FetchEngine>,
    candidates: Vec<LyricCandidate>,
}

enum DriverEvent {
    Search(SearchOutcome),
    Download(DownloadResult),
}

/// 轮询播放器并维护当前歌词的驱动。
pub struct LyricsDriver<S: DisplaySink> {
    context: LyricsContext,
    players: PlayerRegistry,
    active: Option<usize>,
    sink: S,
    coordinator: FetchCoordinator,
    current: Option<MusicInfo>,
    duration_ms: u64,
    previous_position: Option<u64>,
    lyrics: Option<Arc<LyricDocument>>,
    search_request: Option<RequestId>,
    download_request: Option<RequestId>,
    pending_choice: Option<PendingChoice>,
    events_tx: mpsc::UnboundedSender<DriverEvent>,
    events_rx: mpsc::UnboundedReceiver<DriverEvent>,
}

impl<S: DisplaySink> LyricsDriver<S> {
    /// 在当前的 tokio 运行时上创建驱动。
    pub fn new(context: LyricsContext, players: PlayerRegistry, sink: S) -> Result<Self> {
        let coordinator = FetchCoordinator::new(context.options.clone())?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            context,
            players,
            active: None,
            sink,
            coordinator,
            current: None,
            duration_ms: 0,
            previous_position: None,
            lyrics: None,
            search_request: None,
            download_request: None,
            pending_choice: None,
            events_tx,
            events_rx,
        })
    }

    /// 外部依赖。
    pub fn context(&self) -> &LyricsContext {
        &self.context
    }

    /// 显示层。
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// 显示层的可变引用。
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// 当前歌曲。
    pub fn current_music(&self) -> Option<&MusicInfo> {
        self.current.as_ref()
    }

    /// 当前歌曲的总时长（毫秒）。
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// 当前歌词。
    pub fn lyrics(&self) -> Option<&Arc<LyricDocument>> {
        self.lyrics.as_ref()
    }

    /// 等待用户选择的候选歌词。
    pub fn pending_candidates(&self) -> Option<&[LyricCandidate]> {
        self.pending_choice.as_ref().map(|c| c.candidates.as_slice())
    }

    /// 正在控制的播放器。
    pub fn active_player(&mut self) -> Option<&mut dyn PlayerController> {
        self.players.get_mut(self.active?)
    }

    /// 对正在控制的播放器执行操作，例如 `driver.control_player(|p| p.pause())`。
    ///
    /// 没有活动的播放器时返回 [`OsdLyricsError::PlayerUnavailable`]。
    pub fn control_player<T>(
        &mut self,
        command: impl FnOnce(&mut dyn PlayerController) -> Result<T>,
    ) -> Result<T> {
        let player = self
            .active_player()
            .ok_or(OsdLyricsError::PlayerUnavailable)?;
        command(player)
    }

    /// 执行一次轮询。
    pub fn tick(&mut self) {
        self.process_completions();

        if self.active.is_none() {
            self.active = self.players.find_active();
            if let Some(index) = self.active {
                debug!(index, "找到活动的播放器。");
            }
        }

        let played = self
            .active
            .and_then(|index| self.players.get_mut(index))
            .and_then(|player| player.get_played_time());
        let Some(time) = played else {
            self.drop_player();
            return;
        };

        self.check_music_change(time);
        if self.active.is_none() {
            return;
        }
        self.previous_position = Some(time);

        let position = self
            .lyrics
            .as_ref()
            .and_then(|doc| doc.query(i64::try_from(time).unwrap_or(i64::MAX)));
        self.sink.set_position(time, position);
    }

    /// 按 `interval` 持续轮询，直到收到 `shutdown` 信号。
    ///
    /// 两次轮询之间完成的请求会立即处理。
    pub async fn run(&mut self, interval: Duration, mut shutdown: oneshot::Receiver<()>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("歌词驱动开始运行，轮询间隔 {:?}。", interval);

        loop {
            let tick = tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => true,
                Some(_) = self.coordinator.dispatch_next() => false,
            };
            if tick {
                self.tick();
            } else {
                self.drain_events();
            }
        }
        info!("歌词驱动已停止。");
    }

    /// 等待所有进行中的搜索和下载完成并处理其结果。
    pub async fn wait_for_fetches(&mut self) {
        while self.coordinator.dispatch_next().await.is_some() {
            self.drain_events();
        }
    }

    /// 下载用户选中的候选歌词。
    ///
    /// `remember` 为真时写入配置，以后直接下载第一个候选。
    pub fn choose_candidate(&mut self, index: usize, remember: bool) -> Result<RequestId> {
        let choice = self.pending_choice.take().ok_or(OsdLyricsError::NoCandidates)?;
        let count = choice.candidates.len();
        if index >= count {
            self.pending_choice = Some(choice);
            return Err(OsdLyricsError::Internal(format!(
                "候选序号 {index} 超出范围 (共 {count} 个)"
            )));
        }
        let candidate = &choice.candidates[index];

        if remember {
            self.context
                .config
                .set_bool(DOWNLOAD_GROUP, DOWNLOAD_FIRST_LYRIC_KEY, true);
        }
        let path = lyric_path_for(&self.context.lyric_dir, &choice.info)
            .ok_or_else(|| OsdLyricsError::Internal("歌曲没有标题".into()))?;
        Ok(self.start_download(choice.engine, candidate, &choice.info, &path))
    }

    /// 放弃选择候选歌词。
    pub fn cancel_choice(&mut self) {
        self.pending_choice = None;
    }

    /// 调整当前歌词的偏移量。
    pub fn adjust_offset(&mut self, delta_ms: i64) {
        if let Some(doc) = self.lyrics.as_mut() {
            let mut updated = LyricDocument::clone(doc);
            updated.adjust_offset(delta_ms);
            let updated = Arc::new(updated);
            *doc = Arc::clone(&updated);
            self.sink.set_lyrics(Some(updated));
        }
    }

    fn drop_player(&mut self) {
        if self.active.take().is_some() {
            info!("播放器已不可用。");
        }
        self.previous_position = None;
    }

    fn check_music_change(&mut self, time: u64) {
        // 进度仍在前进时认为歌曲没有变化
        if let Some(previous) = self.previous_position
            && time >= previous
            && self.current.is_some()
        {
            return;
        }

        let Some(player) = self.active.and_then(|index| self.players.get_mut(index)) else {
            return;
        };
        let (Some(info), Some(duration)) = (player.get_music_info(), player.get_music_length())
        else {
            self.drop_player();
            return;
        };
        self.duration_ms = duration;

        if !info.has_title() {
            if self.current.take().is_some() {
                self.reset_track_state();
                self.sink.set_music_info(None);
                self.sink.set_lyrics(None);
            }
            return;
        }

        if self.current.as_ref().is_some_and(|c| c.is_same_track(&info)) {
            return;
        }
        self.change_music(info, duration);
    }

    #[instrument(skip(self, info), fields(track = %info))]
    fn change_music(&mut self, info: MusicInfo, duration_ms: u64) {
        info!("歌曲已切换。");
        self.reset_track_state();
        self.sink.set_music_info(Some(&info));
        self.sink.set_duration(duration_ms);
        self.sink.set_lyrics(None);

        let path = lyric_path_for(&self.context.lyric_dir, &info);
        self.current = Some(info);
        let Some(path) = path else {
            return;
        };

        if path.is_file() {
            self.load_lyrics(&path);
        } else {
            self.start_search();
        }
    }

    fn reset_track_state(&mut self) {
        for id in [self.search_request.take(), self.download_request.take()]
            .into_iter()
            .flatten()
        {
            self.coordinator.discard(id);
        }
        self.pending_choice = None;
        self.lyrics = None;
    }

    fn load_lyrics(&mut self, path: &Path) {
        match parse_lrc_file(path) {
            Ok(doc) => {
                for warning in &doc.warnings {
                    debug!("歌词解析警告: {}", warning);
                }
                info!(path = %path.display(), "已加载 {} 行歌词。", doc.len());
                let doc = Arc::new(doc);
                self.lyrics = Some(Arc::clone(&doc));
                self.sink.set_lyrics(Some(doc));
            }
            Err(e) => warn!(path = %path.display(), "读取歌词文件失败: {}", e),
        }
    }

    fn start_search(&mut self) {
        let Some(info) = self.current.clone() else {
            return;
        };
        let settings = self.context.fetch_settings();
        let Some(engine) = self
            .context
            .engines
            .get_or_first(settings.download_engine.as_deref())
        else {
            warn!("没有可用的下载引擎。");
            return;
        };

        let tx = self.events_tx.clone();
        let id = self.coordinator.begin_search(engine, &info, move |outcome| {
            let _ = tx.send(DriverEvent::Search(outcome));
        });
        self.search_request = Some(id);
    }

    fn start_download(
        &mut self,
        engine: Arc<dyn FetchEngine>,
        candidate: &LyricCandidate,
        info: &MusicInfo,
        path: &Path,
    ) -> RequestId {
        let tx = self.events_tx.clone();
        let id = self
            .coordinator
            .begin_download(engine, candidate, info, path, move |result| {
                let _ = tx.send(DriverEvent::Download(result));
            });
        self.download_request = Some(id);
        id
    }

    fn process_completions(&mut self) {
        self.coordinator.dispatch_pending();
        self.drain_events();
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                DriverEvent::Search(outcome) => self.on_search_finished(outcome),
                DriverEvent::Download(result) => self.on_download_finished(result),
            }
        }
    }

    fn is_current(&self, info: &MusicInfo) -> bool {
        self.current.as_ref().is_some_and(|c| c.is_same_track(info))
    }

    fn on_search_finished(&mut self, outcome: SearchOutcome) {
        let result = match outcome {
            Ok(result) => result,
            Err(failure) => {
                if self.search_request == Some(failure.id) {
                    self.search_request = None;
                }
                warn!("搜索 '{}' 的歌词失败: {}", failure.info, failure.error);
                return;
            }
        };
        if self.search_request != Some(result.id) || !self.is_current(&result.info) {
            debug!(id = result.id, "忽略过期的搜索结果。");
            return;
        }
        self.search_request = None;

        let FetchResult {
            info,
            candidates,
            engine,
            ..
        } = result;
        if candidates.is_empty() {
            info!("未找到 '{}' 的歌词。", info);
            return;
        }

        let settings = self.context.fetch_settings();
        if settings.download_first_lyric || candidates.len() == 1 {
            let Some(path) = lyric_path_for(&self.context.lyric_dir, &info) else {
                return;
            };
            self.start_download(engine, &candidates[0], &info, &path);
        } else {
            self.sink.show_candidates(&info, &candidates);
            self.pending_choice = Some(PendingChoice {
                info,
                engine,
                candidates,
            });
        }
    }

    fn on_download_finished(&mut self, result: DownloadResult) {
        if self.download_request == Some(result.id) {
            self.download_request = None;
        }
        match &result.outcome {
            Ok(path) if self.is_current(&result.info) => {
                let path = path.clone();
                self.load_lyrics(&path);
            }
            Ok(path) => debug!(path = %path.display(), "歌曲已切换，不加载下载的歌词。"),
            Err(e) => warn!("下载 '{}' 的歌词失败: {}", result.info, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use async_trait::async_trait;

    use super::*;
    use crate::config::{DOWNLOAD_ENGINE_KEY, MemoryConfig};

    #[derive(Default)]
    struct PlayerState {
        active: bool,
        info: Option<MusicInfo>,
        time: u64,
    }

    struct FakePlayer(Rc<RefCell<PlayerState>>);

    impl PlayerController for FakePlayer {
        fn name(&self) -> &str {
            "fake"
        }
        fn is_activated(&mut self) -> bool {
            self.0.borrow().active
        }
        fn get_music_info(&mut self) -> Option<MusicInfo> {
            let state = self.0.borrow();
            state.active.then(|| state.info.clone().unwrap_or_default())
        }
        fn get_played_time(&mut self) -> Option<u64> {
            let state = self.0.borrow();
            state.active.then_some(state.time)
        }
        fn get_music_length(&mut self) -> Option<u64> {
            self.0.borrow().active.then_some(180_000)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        music: Vec<Option<String>>,
        lyrics: Option<Arc<LyricDocument>>,
        positions: Vec<(u64, Option<LinePosition>)>,
        shown_candidates: usize,
    }

    impl DisplaySink for RecordingSink {
        fn set_music_info(&mut self, info: Option<&MusicInfo>) {
            self.music.push(info.map(|i| i.to_string()));
        }
        fn set_duration(&mut self, _duration_ms: u64) {}
        fn set_lyrics(&mut self, lyrics: Option<Arc<LyricDocument>>) {
            self.lyrics = lyrics;
        }
        fn set_position(&mut self, elapsed_ms: u64, position: Option<LinePosition>) {
            self.positions.push((elapsed_ms, position));
        }
        fn show_candidates(&mut self, _info: &MusicInfo, candidates: &[LyricCandidate]) {
            self.shown_candidates = candidates.len();
        }
    }

    struct FakeEngine {
        candidates: Vec<LyricCandidate>,
        delay: Duration,
    }

    #[async_trait]
    impl FetchEngine for FakeEngine {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn search(&self, _info: &MusicInfo, _charset: &str) -> Result<Vec<LyricCandidate>> {
            Ok(self.candidates.clone())
        }

        async fn download(
            &self,
            candidate: &LyricCandidate,
            target: &Path,
            _charset: &str,
        ) -> Result<()> {
            tokio::time::sleep(self.delay).await;
            let body = format!("[00:01.00]{}\n[00:03.00]end", candidate.url);
            crate::providers::download::write_lyric_file(target, body.as_bytes()).await
        }
    }

    struct Fixture {
        dir: PathBuf,
        state: Rc<RefCell<PlayerState>>,
        driver: LyricsDriver<RecordingSink>,
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    fn fixture(candidates: Vec<LyricCandidate>, config: MemoryConfig) -> Fixture {
        fixture_with_delay(candidates, config, Duration::ZERO)
    }

    fn fixture_with_delay(
        candidates: Vec<LyricCandidate>,
        mut config: MemoryConfig,
        delay: Duration,
    ) -> Fixture {
        let dir = std::env::temp_dir().join(format!("osd-driver-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        config.set_string(DOWNLOAD_GROUP, DOWNLOAD_ENGINE_KEY, "fake");
        let mut engines = EngineRegistry::new();
        engines.register(Arc::new(FakeEngine { candidates, delay }));
        let context = LyricsContext::new(Box::new(config), engines, &dir);

        let state = Rc::new(RefCell::new(PlayerState::default()));
        let mut players = PlayerRegistry::new();
        players.register(Box::new(FakePlayer(state.clone())));

        let driver = LyricsDriver::new(context, players, RecordingSink::default()).unwrap();
        Fixture { dir, state, driver }
    }

    fn play(state: &Rc<RefCell<PlayerState>>, title: &str, artist: &str, time: u64) {
        let mut state = state.borrow_mut();
        state.active = true;
        state.info = Some(MusicInfo::new(title, Some(artist)));
        state.time = time;
    }

    #[tokio::test]
    async fn test_inactive_player_reports_nothing() {
        let mut f = fixture(vec![], MemoryConfig::new());
        f.driver.tick();
        assert!(f.driver.sink().positions.is_empty());
        assert!(f.driver.current_music().is_none());
    }

    #[tokio::test]
    async fn test_existing_lyric_file_is_loaded_without_search() {
        let mut f = fixture(vec![], MemoryConfig::new());
        std::fs::write(f.dir.join("Singer-Song.lrc"), "[00:01.00]one\n[00:02.00]two").unwrap();
        play(&f.state, "Song", "Singer", 1500);

        f.driver.tick();

        assert_eq!(f.driver.sink().music, vec![Some("Singer - Song".to_string())]);
        assert_eq!(f.driver.lyrics().map(|d| d.len()), Some(2));
        let (elapsed, position) = f.driver.sink().positions[0];
        assert_eq!(elapsed, 1500);
        assert_eq!(position.map(|p| p.index), Some(0));
        assert_eq!(f.driver.coordinator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_single_candidate_is_downloaded_and_loaded() {
        let mut f = fixture(
            vec![LyricCandidate::new("Song", "Singer", "only")],
            MemoryConfig::new(),
        );
        play(&f.state, "Song", "Singer", 0);

        f.driver.tick();
        assert!(f.driver.lyrics().is_none());
        f.driver.wait_for_fetches().await;

        let lyrics = f.driver.lyrics().unwrap();
        assert_eq!(lyrics.line(0).unwrap().text, "only");
        assert!(f.dir.join("Singer-Song.lrc").is_file());
        assert!(f.driver.sink().lyrics.is_some());
    }

    #[tokio::test]
    async fn test_multiple_candidates_wait_for_choice() {
        let mut f = fixture(
            vec![
                LyricCandidate::new("Song", "Singer", "first"),
                LyricCandidate::new("Song", "Other", "second"),
            ],
            MemoryConfig::new(),
        );
        play(&f.state, "Song", "Singer", 0);

        f.driver.tick();
        f.driver.wait_for_fetches().await;
        assert_eq!(f.driver.sink().shown_candidates, 2);
        assert!(f.driver.lyrics().is_none());
        assert_eq!(f.driver.pending_candidates().map(<[_]>::len), Some(2));

        assert!(f.driver.choose_candidate(5, false).is_err());
        f.driver.choose_candidate(1, true).unwrap();
        f.driver.wait_for_fetches().await;

        assert_eq!(f.driver.lyrics().unwrap().line(0).unwrap().text, "second");
        assert_eq!(
            f.driver
                .context()
                .config
                .get_bool(DOWNLOAD_GROUP, DOWNLOAD_FIRST_LYRIC_KEY),
            Some(true)
        );
        assert!(f.driver.choose_candidate(0, false).is_err());
    }

    #[tokio::test]
    async fn test_download_first_lyric_skips_choice() {
        let mut config = MemoryConfig::new();
        config.set_bool(DOWNLOAD_GROUP, DOWNLOAD_FIRST_LYRIC_KEY, true);
        let mut f = fixture(
            vec![
                LyricCandidate::new("Song", "Singer", "first"),
                LyricCandidate::new("Song", "Other", "second"),
            ],
            config,
        );
        play(&f.state, "Song", "Singer", 0);

        f.driver.tick();
        f.driver.wait_for_fetches().await;
        assert_eq!(f.driver.sink().shown_candidates, 0);
        assert_eq!(f.driver.lyrics().unwrap().line(0).unwrap().text, "first");
    }

    #[tokio::test]
    async fn test_track_change_discards_stale_download() {
        let mut f = fixture_with_delay(
            vec![LyricCandidate::new("Song", "Singer", "stale")],
            MemoryConfig::new(),
            Duration::from_millis(50),
        );
        play(&f.state, "Song", "Singer", 5000);
        f.driver.tick();
        // 处理搜索结果并开始下载
        tokio::time::sleep(Duration::from_millis(10)).await;
        f.driver.tick();

        std::fs::write(f.dir.join("Band-Next.lrc"), "[00:00.50]next").unwrap();
        play(&f.state, "Next", "Band", 0);
        f.driver.tick();
        f.driver.wait_for_fetches().await;

        // 旧的下载完成后也不会覆盖新歌曲的歌词
        tokio::time::sleep(Duration::from_millis(80)).await;
        f.driver.tick();

        assert_eq!(f.driver.current_music().unwrap().title_or_empty(), "Next");
        assert_eq!(f.driver.lyrics().unwrap().line(0).unwrap().text, "next");
        assert_eq!(f.driver.sink().music.len(), 2);
    }

    #[tokio::test]
    async fn test_player_exit_drops_controller() {
        let mut f = fixture(vec![], MemoryConfig::new());
        std::fs::write(f.dir.join("Singer-Song.lrc"), "[00:01.00]one").unwrap();
        play(&f.state, "Song", "Singer", 1000);
        f.driver.tick();
        assert_eq!(f.driver.sink().positions.len(), 1);

        f.state.borrow_mut().active = false;
        f.driver.tick();
        assert_eq!(f.driver.sink().positions.len(), 1);
        assert!(f.driver.active_player().is_none());
    }

    #[tokio::test]
    async fn test_adjust_offset_replaces_document() {
        let mut f = fixture(vec![], MemoryConfig::new());
        std::fs::write(f.dir.join("Singer-Song.lrc"), "[00:01.00]one\n[00:02.00]two").unwrap();
        play(&f.state, "Song", "Singer", 1500);
        f.driver.tick();
        let before = Arc::clone(f.driver.lyrics().unwrap());

        f.driver.adjust_offset(1000);
        assert_eq!(before.offset_ms(), 0);
        assert_eq!(f.driver.lyrics().unwrap().offset_ms(), 1000);
        assert_eq!(f.driver.sink().lyrics.as_ref().unwrap().offset_ms(), 1000);
    }

    #[tokio::test]
    async fn test_control_player_requires_active_player() {
        let mut f = fixture(vec![], MemoryConfig::new());
        let result = f.driver.control_player(|p| p.pause());
        assert!(matches!(result, Err(OsdLyricsError::PlayerUnavailable)));

        play(&f.state, "Song", "Singer", 0);
        f.driver.tick();
        assert_eq!(
            f.driver.control_player(|p| Ok(p.name().to_string())).unwrap(),
            "fake"
        );
        assert!(matches!(
            f.driver.control_player(|p| p.pause()),
            Err(OsdLyricsError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut f = fixture(vec![], MemoryConfig::new());
        let (tx, rx) = oneshot::channel();
        tx.send(()).unwrap();
        f.driver.run(Duration::from_millis(10), rx).await;
    }
}
