//! 播放器控制模块
//!
//! 每种播放器（MPRIS、各类客户端适配）都实现 `PlayerController`，
//! 驱动只通过这一接口读取播放状态。

use bitflags::bitflags;
use strum_macros::{Display, EnumString};

use crate::{
    error::{OsdLyricsError, Result},
    model::MusicInfo,
};

pub mod elapse;

pub use elapse::{ElapseEmulator, SmoothedPlayer};

/// 播放器的播放状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum PlayerStatus {
    /// 正在播放
    Playing,
    /// 已暂停
    Paused,
    /// 已停止
    Stopped,
    /// 无法获取状态
    #[default]
    Unknown,
}

bitflags! {
    /// 播放器支持的控制操作
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PlayerCapability: u32 {
        /// 可以开始播放
        const PLAY       = 1 << 0;
        /// 可以暂停
        const PAUSE      = 1 << 1;
        /// 可以停止
        const STOP       = 1 << 2;
        /// 可以切换到上一首
        const PREV       = 1 << 3;
        /// 可以切换到下一首
        const NEXT       = 1 << 4;
        /// 可以报告播放状态
        const STATUS     = 1 << 5;
        /// 可以跳转
        const SEEK       = 1 << 6;
        /// 可以在播放/暂停之间切换
        const PLAY_PAUSE = 1 << 7;
    }
}

/// 播放器控制接口。
///
/// 查询方法失败时返回 `None`，表示本次轮询无法得到该值。
/// 控制方法的默认实现返回 `OsdLyricsError::Unsupported`。
pub trait PlayerController {
    /// 播放器名称。
    fn name(&self) -> &str;

    /// 播放器是否正在运行。
    fn is_activated(&mut self) -> bool;

    /// 当前歌曲的信息。
    fn get_music_info(&mut self) -> Option<MusicInfo>;

    /// 已播放的时间（毫秒）。
    fn get_played_time(&mut self) -> Option<u64>;

    /// 歌曲总时长（毫秒）。
    fn get_music_length(&mut self) -> Option<u64>;

    /// 播放状态。
    fn get_status(&mut self) -> PlayerStatus {
        PlayerStatus::Unknown
    }

    /// 支持的控制操作。
    fn get_capacity(&self) -> PlayerCapability {
        PlayerCapability::empty()
    }

    /// 开始播放。
    fn play(&mut self) -> Result<()> {
        Err(OsdLyricsError::Unsupported("play"))
    }

    /// 暂停。
    fn pause(&mut self) -> Result<()> {
        Err(OsdLyricsError::Unsupported("pause"))
    }

    /// 停止。
    fn stop(&mut self) -> Result<()> {
        Err(OsdLyricsError::Unsupported("stop"))
    }

    /// 上一首。
    fn prev(&mut self) -> Result<()> {
        Err(OsdLyricsError::Unsupported("prev"))
    }

    /// 下一首。
    fn next(&mut self) -> Result<()> {
        Err(OsdLyricsError::Unsupported("next"))
    }

    /// 跳转到 `position_ms`。
    fn seek(&mut self, _position_ms: u64) -> Result<()> {
        Err(OsdLyricsError::Unsupported("seek"))
    }
}

impl<P: PlayerController + ?Sized> PlayerController for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn is_activated(&mut self) -> bool {
        (**self).is_activated()
    }
    fn get_music_info(&mut self) -> Option<MusicInfo> {
        (**self).get_music_info()
    }
    fn get_played_time(&mut self) -> Option<u64> {
        (**self).get_played_time()
    }
    fn get_music_length(&mut self) -> Option<u64> {
        (**self).get_music_length()
    }
    fn get_status(&mut self) -> PlayerStatus {
        (**self).get_status()
    }
    fn get_capacity(&self) -> PlayerCapability {
        (**self).get_capacity()
    }
    fn play(&mut self) -> Result<()> {
        (**self).play()
    }
    fn pause(&mut self) -> Result<()> {
        (**self).pause()
    }
    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }
    fn prev(&mut self) -> Result<()> {
        (**self).prev()
    }
    fn next(&mut self) -> Result<()> {
        (**self).next()
    }
    fn seek(&mut self, position_ms: u64) -> Result<()> {
        (**self).seek(position_ms)
    }
}

/// 已知播放器的列表。
#[derive(Default)]
pub struct PlayerRegistry {
    players: Vec<Box<dyn PlayerController>>,
}

impl std::fmt::Debug for PlayerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.players.iter().map(|p| p.name()))
            .finish()
    }
}

impl PlayerRegistry {
    /// 创建一个空的列表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个播放器，靠前的播放器优先。
    pub fn register(&mut self, player: Box<dyn PlayerController>) {
        tracing::debug!("注册播放器: {}", player.name());
        self.players.push(player);
    }

    /// 已注册的播放器数量。
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// 是否没有注册任何播放器。
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// 返回第一个正在运行的播放器的序号。
    pub fn find_active(&mut self) -> Option<usize> {
        self.players.iter_mut().position(|p| p.is_activated())
    }

    /// 返回第一个正在运行的播放器。
    pub fn active_player(&mut self) -> Option<&mut dyn PlayerController> {
        let index = self.find_active()?;
        self.get_mut(index)
    }

    /// 按序号取得播放器。
    pub fn get_mut(&mut self, index: usize) -> Option<&mut dyn PlayerController> {
        self.players.get_mut(index).map(|p| p.as_mut() as &mut dyn PlayerController)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticPlayer {
        name: &'static str,
        active: bool,
    }

    impl PlayerController for StaticPlayer {
        fn name(&self) -> &str {
            self.name
        }
        fn is_activated(&mut self) -> bool {
            self.active
        }
        fn get_music_info(&mut self) -> Option<MusicInfo> {
            Some(MusicInfo::new(self.name, None))
        }
        fn get_played_time(&mut self) -> Option<u64> {
            Some(0)
        }
        fn get_music_length(&mut self) -> Option<u64> {
            None
        }
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("playing".parse::<PlayerStatus>().unwrap(), PlayerStatus::Playing);
        assert_eq!("Paused".parse::<PlayerStatus>().unwrap(), PlayerStatus::Paused);
        assert!("rewinding".parse::<PlayerStatus>().is_err());
        assert_eq!(PlayerStatus::Stopped.to_string(), "Stopped");
    }

    #[test]
    fn test_default_controls_are_unsupported() {
        let mut player = StaticPlayer {
            name: "static",
            active: true,
        };
        assert!(player.get_capacity().is_empty());
        assert!(matches!(
            player.seek(1000),
            Err(OsdLyricsError::Unsupported("seek"))
        ));
        assert_eq!(player.get_status(), PlayerStatus::Unknown);
    }

    #[test]
    fn test_active_player_is_first_activated() {
        let mut registry = PlayerRegistry::new();
        assert!(registry.active_player().is_none());

        registry.register(Box::new(StaticPlayer {
            name: "idle",
            active: false,
        }));
        registry.register(Box::new(StaticPlayer {
            name: "first",
            active: true,
        }));
        registry.register(Box::new(StaticPlayer {
            name: "second",
            active: true,
        }));

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.find_active(), Some(1));
        assert_eq!(registry.active_player().map(|p| p.name().to_string()), Some("first".into()));
    }

    #[test]
    fn test_capability_flags_combine() {
        let caps = PlayerCapability::PLAY | PlayerCapability::PAUSE | PlayerCapability::SEEK;
        assert!(caps.contains(PlayerCapability::SEEK));
        assert!(!caps.contains(PlayerCapability::NEXT));
    }
}
