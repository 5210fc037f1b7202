//! 播放进度平滑
//!
//! 部分播放器只能以秒为精度报告播放进度，直接使用会让歌词每秒跳动一次。
//! `ElapseEmulator` 以本地单调时钟推算两次报告之间的进度。

use std::time::{Duration, Instant};

use crate::{
    error::Result,
    model::MusicInfo,
    player::{PlayerCapability, PlayerController, PlayerStatus},
};

/// 播放器报告精度为秒时的默认精度。
pub const DEFAULT_ACCURACY_MS: u64 = 1000;

/// 用本地时钟插值播放进度。
#[derive(Debug, Clone)]
pub struct ElapseEmulator {
    anchor_ms: u64,
    anchor_at: Instant,
    accuracy_ms: u64,
    last_ms: u64,
}

impl ElapseEmulator {
    /// 以 `initial_ms` 为起点创建。`accuracy_ms` 是播放器报告的精度。
    pub fn new(initial_ms: u64, accuracy_ms: u64) -> Self {
        Self::new_at(initial_ms, accuracy_ms, Instant::now())
    }

    /// 同 `new`，但指定起点的时刻。
    pub fn new_at(initial_ms: u64, accuracy_ms: u64, now: Instant) -> Self {
        Self {
            anchor_ms: initial_ms,
            anchor_at: now,
            accuracy_ms: accuracy_ms.max(1),
            last_ms: initial_ms,
        }
    }

    fn reanchor(&mut self, ms: u64, now: Instant) {
        self.anchor_ms = ms;
        self.anchor_at = now;
    }

    /// 播放中时调用，返回推算出的真实进度。
    pub fn get_real_ms(&mut self, reported_ms: u64) -> u64 {
        self.get_real_ms_at(reported_ms, Instant::now())
    }

    /// 同 `get_real_ms`，但指定当前时刻。
    ///
    /// 推算值落后于报告值，或领先报告值达到一个精度单位时，
    /// 视为播放器发生了跳转，以报告值重新定锚。
    pub fn get_real_ms_at(&mut self, reported_ms: u64, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.anchor_at);
        let estimated = self.anchor_ms.saturating_add(duration_ms(elapsed));

        let real = if estimated < reported_ms || estimated - reported_ms >= self.accuracy_ms {
            self.reanchor(reported_ms, now);
            reported_ms
        } else {
            estimated
        };
        self.last_ms = real;
        real
    }

    /// 暂停时调用，返回上一次的进度，保证暂停前后进度不倒退。
    pub fn get_last_ms(&mut self, reported_ms: u64) -> u64 {
        self.get_last_ms_at(reported_ms, Instant::now())
    }

    /// 同 `get_last_ms`，但指定当前时刻。
    pub fn get_last_ms_at(&mut self, reported_ms: u64, now: Instant) -> u64 {
        let in_window =
            self.last_ms >= reported_ms && self.last_ms - reported_ms < self.accuracy_ms;
        if !in_window {
            self.last_ms = reported_ms;
        }
        // 恢复播放时从暂停处继续推算
        self.reanchor(self.last_ms, now);
        self.last_ms
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// 为任意播放器加上进度平滑的包装。
#[derive(Debug)]
pub struct SmoothedPlayer<P> {
    inner: P,
    accuracy_ms: u64,
    emulator: Option<ElapseEmulator>,
}

impl<P: PlayerController> SmoothedPlayer<P> {
    /// 包装 `inner`，其进度报告精度为 `accuracy_ms`。
    pub fn new(inner: P, accuracy_ms: u64) -> Self {
        Self {
            inner,
            accuracy_ms,
            emulator: None,
        }
    }

    /// 被包装的播放器。
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: PlayerController> PlayerController for SmoothedPlayer<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_activated(&mut self) -> bool {
        self.inner.is_activated()
    }

    fn get_music_info(&mut self) -> Option<MusicInfo> {
        self.inner.get_music_info()
    }

    /// 播放器停止时进度为 0。无法报告状态的播放器按播放中处理。
    fn get_played_time(&mut self) -> Option<u64> {
        let reported = self.inner.get_played_time()?;
        let status = self.inner.get_status();
        if status == PlayerStatus::Stopped {
            self.emulator = None;
            return Some(0);
        }
        let accuracy = self.accuracy_ms;
        let emulator = self
            .emulator
            .get_or_insert_with(|| ElapseEmulator::new(reported, accuracy));
        match status {
            PlayerStatus::Paused => Some(emulator.get_last_ms(reported)),
            _ => Some(emulator.get_real_ms(reported)),
        }
    }

    fn get_music_length(&mut self) -> Option<u64> {
        self.inner.get_music_length()
    }

    fn get_status(&mut self) -> PlayerStatus {
        self.inner.get_status()
    }

    fn get_capacity(&self) -> PlayerCapability {
        self.inner.get_capacity()
    }

    fn play(&mut self) -> Result<()> {
        self.inner.play()
    }

    fn pause(&mut self) -> Result<()> {
        self.inner.pause()
    }

    fn stop(&mut self) -> Result<()> {
        self.inner.stop()
    }

    fn prev(&mut self) -> Result<()> {
        self.inner.prev()
    }

    fn next(&mut self) -> Result<()> {
        self.inner.next()
    }

    fn seek(&mut self, position_ms: u64) -> Result<()> {
        self.emulator = None;
        self.inner.seek(position_ms)
    }
}
