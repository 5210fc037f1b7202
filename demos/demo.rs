//! 模拟一个正在播放的播放器，驱动歌词的搜索、下载与同步显示。
//!
//! 用法: `cargo run --example demo -- <标题> [艺术家]`

use std::{sync::Arc, time::Instant};

use anyhow::Context;
use osd_lyrics_rs::{
    ConfigAccessor, DisplaySink, EngineRegistry, LinePosition, LyricDocument, LyricsContext,
    LyricsDriver, MemoryConfig, MusicInfo, PlayerController, PlayerRegistry, PlayerStatus,
    config::{DOWNLOAD_FIRST_LYRIC_KEY, DOWNLOAD_GROUP, prepare_default_lyric_dir},
    driver::DEFAULT_POLL_INTERVAL,
    model::LyricCandidate,
    player::{PlayerCapability, SmoothedPlayer},
};
use tokio::sync::oneshot;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// 从启动时刻开始计时、精度为一秒的假播放器。
struct SimulatedPlayer {
    info: MusicInfo,
    started: Instant,
}

impl PlayerController for SimulatedPlayer {
    fn name(&self) -> &str {
        "simulated"
    }

    fn is_activated(&mut self) -> bool {
        true
    }

    fn get_music_info(&mut self) -> Option<MusicInfo> {
        Some(self.info.clone())
    }

    fn get_played_time(&mut self) -> Option<u64> {
        Some(self.started.elapsed().as_secs() * 1000)
    }

    fn get_music_length(&mut self) -> Option<u64> {
        Some(300_000)
    }

    fn get_status(&mut self) -> PlayerStatus {
        PlayerStatus::Playing
    }

    fn get_capacity(&self) -> PlayerCapability {
        PlayerCapability::STATUS
    }
}

#[derive(Default)]
struct ConsoleSink {
    lyrics: Option<Arc<LyricDocument>>,
    shown_index: Option<usize>,
}

impl DisplaySink for ConsoleSink {
    fn set_music_info(&mut self, info: Option<&MusicInfo>) {
        if let Some(info) = info {
            println!("正在播放: {info}");
        }
    }

    fn set_duration(&mut self, duration_ms: u64) {
        println!("时长: {} 秒", duration_ms / 1000);
    }

    fn set_lyrics(&mut self, lyrics: Option<Arc<LyricDocument>>) {
        if let Some(doc) = &lyrics {
            println!("歌词已加载，共 {} 行。", doc.len());
        }
        self.lyrics = lyrics;
        self.shown_index = None;
    }

    fn set_position(&mut self, _elapsed_ms: u64, position: Option<LinePosition>) {
        let (Some(doc), Some(position)) = (&self.lyrics, position) else {
            return;
        };
        if self.shown_index == Some(position.index) {
            return;
        }
        self.shown_index = Some(position.index);
        if let Some((_, line)) = doc.real_line(position.index) {
            println!("♪ {}", line.text);
        }
    }

    fn show_candidates(&mut self, _info: &MusicInfo, candidates: &[LyricCandidate]) {
        for (i, candidate) in candidates.iter().enumerate() {
            println!("  [{i}] {} - {}", candidate.artist, candidate.title);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,osd_lyrics_rs=debug"));
    FmtSubscriber::builder().with_env_filter(filter).init();

    let mut args = std::env::args().skip(1);
    let title = args.next().context("用法: demo <标题> [艺术家]")?;
    let artist = args.next();

    let lyric_dir = prepare_default_lyric_dir()?;
    let mut config = MemoryConfig::new();
    config.set_bool(DOWNLOAD_GROUP, DOWNLOAD_FIRST_LYRIC_KEY, true);
    let context = LyricsContext::new(
        Box::new(config),
        EngineRegistry::with_builtin_engines(),
        lyric_dir,
    );

    let mut players = PlayerRegistry::new();
    players.register(Box::new(SmoothedPlayer::new(
        SimulatedPlayer {
            info: MusicInfo::new(title, artist.as_deref()),
            started: Instant::now(),
        },
        1000,
    )));

    let mut driver = LyricsDriver::new(context, players, ConsoleSink::default())?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    info!("按 Ctrl-C 退出。");
    driver.run(DEFAULT_POLL_INTERVAL, shutdown_rx).await;
    Ok(())
}
