//! 负责读取下载相关的配置，以及歌词文件的存放位置。

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::{OsdLyricsError, Result},
    fetch::{CoordinatorOptions, DEFAULT_TIMEOUT},
    model::{MAX_CANDIDATE_COUNT, MusicInfo},
    providers::DEFAULT_CHARSET,
};

/// 下载相关配置所在的分组。
pub const DOWNLOAD_GROUP: &str = "Download";
/// 使用的下载引擎名称。
pub const DOWNLOAD_ENGINE_KEY: &str = "download-engine";
/// 为真时直接下载第一个候选歌词，不再让用户选择。
pub const DOWNLOAD_FIRST_LYRIC_KEY: &str = "download-first-lyric";
/// 保存歌词文件使用的字符集。
pub const DOWNLOAD_CHARSET_KEY: &str = "charset";
/// 单个请求的超时时间（毫秒）。
pub const DOWNLOAD_TIMEOUT_KEY: &str = "timeout-ms";

/// 默认歌词目录在用户主目录下的名称。
const LYRIC_DIR_NAME: &str = ".lyrics";

/// 以 (分组, 键) 读写配置项的接口。
///
/// 具体的存储方式由宿主程序决定。
pub trait ConfigAccessor {
    /// 读取字符串值。
    fn get_string(&self, group: &str, key: &str) -> Option<String>;

    /// 读取布尔值。
    fn get_bool(&self, group: &str, key: &str) -> Option<bool>;

    /// 写入布尔值。
    fn set_bool(&mut self, group: &str, key: &str, value: bool);

    /// 写入字符串值。
    fn set_string(&mut self, group: &str, key: &str, value: &str);
}

/// 仅保存在内存中的配置。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryConfig {
    groups: HashMap<String, HashMap<String, String>>,
}

impl MemoryConfig {
    /// 创建一个空的配置。
    pub fn new() -> Self {
        Self::default()
    }

    fn raw(&self, group: &str, key: &str) -> Option<&str> {
        self.groups.get(group)?.get(key).map(String::as_str)
    }

    fn set_raw(&mut self, group: &str, key: &str, value: String) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }
}

impl ConfigAccessor for MemoryConfig {
    fn get_string(&self, group: &str, key: &str) -> Option<String> {
        self.raw(group, key).map(str::to_string)
    }

    fn get_bool(&self, group: &str, key: &str) -> Option<bool> {
        match self.raw(group, key)?.trim() {
            v if v.eq_ignore_ascii_case("true") || v == "1" => Some(true),
            v if v.eq_ignore_ascii_case("false") || v == "0" => Some(false),
            _ => None,
        }
    }

    fn set_bool(&mut self, group: &str, key: &str, value: bool) {
        self.set_raw(group, key, value.to_string());
    }

    fn set_string(&mut self, group: &str, key: &str, value: &str) {
        self.set_raw(group, key, value.to_string());
    }
}

/// 歌词获取的设置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchSettings {
    /// 下载引擎名称，为 `None` 时使用第一个注册的引擎
    pub download_engine: Option<String>,
    /// 是否直接下载第一个候选歌词
    pub download_first_lyric: bool,
    /// 保存歌词文件使用的字符集
    pub charset: String,
    /// 单个请求的超时时间（毫秒）
    pub timeout_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            download_engine: None,
            download_first_lyric: false,
            charset: DEFAULT_CHARSET.to_string(),
            timeout_ms: u64::try_from(DEFAULT_TIMEOUT.as_millis()).unwrap_or(30_000),
        }
    }
}

impl FetchSettings {
    /// 从配置中读取，缺失的项使用默认值。
    pub fn from_accessor(config: &dyn ConfigAccessor) -> Self {
        let defaults = Self::default();
        Self {
            download_engine: config
                .get_string(DOWNLOAD_GROUP, DOWNLOAD_ENGINE_KEY)
                .filter(|name| !name.trim().is_empty()),
            download_first_lyric: config
                .get_bool(DOWNLOAD_GROUP, DOWNLOAD_FIRST_LYRIC_KEY)
                .unwrap_or(defaults.download_first_lyric),
            charset: config
                .get_string(DOWNLOAD_GROUP, DOWNLOAD_CHARSET_KEY)
                .map(|charset| charset.trim().to_string())
                .filter(|charset| !charset.is_empty())
                .unwrap_or(defaults.charset),
            timeout_ms: config
                .get_string(DOWNLOAD_GROUP, DOWNLOAD_TIMEOUT_KEY)
                .and_then(|raw| match raw.trim().parse::<u64>() {
                    Ok(ms) if ms > 0 => Some(ms),
                    _ => {
                        warn!("无效的超时配置 '{}'，将使用默认值。", raw);
                        None
                    }
                })
                .unwrap_or(defaults.timeout_ms),
        }
    }

    /// 从 JSON 文本读取，缺失的项使用默认值。
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 转换为 `FetchCoordinator` 的参数。
    pub fn coordinator_options(&self) -> CoordinatorOptions {
        CoordinatorOptions {
            timeout: Duration::from_millis(self.timeout_ms),
            charset: self.charset.clone(),
            max_candidates: MAX_CANDIDATE_COUNT,
        }
    }
}

/// 将文件名中不能出现的字符替换为 `_`。
fn sanitize_component(s: &str) -> String {
    s.replace(['/', '\\'], "_")
}

/// 计算歌曲对应的歌词文件路径。
///
/// 有艺术家时为 `<dir>/<artist>-<title>.lrc`，否则为 `<dir>/<title>.lrc`。
///
/// # 返回
/// 歌曲没有标题时返回 `None`。
pub fn lyric_path_for(dir: &Path, info: &MusicInfo) -> Option<PathBuf> {
    if !info.has_title() {
        return None;
    }
    let title = sanitize_component(info.title_or_empty());
    let file_name = match info.artist.as_deref().filter(|a| !a.is_empty()) {
        Some(artist) => format!("{}-{}.lrc", sanitize_component(artist), title),
        None => format!("{title}.lrc"),
    };
    Some(dir.join(file_name))
}

/// 默认的歌词目录，即 `$HOME/.lyrics`。
pub fn default_lyric_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LYRIC_DIR_NAME))
}

/// 确保歌词目录存在。
pub fn ensure_lyric_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        fs::create_dir_all(dir)?;
        info!("已创建歌词目录: {}", dir.display());
    }
    Ok(())
}

/// 取得默认歌词目录并确保其存在。
pub fn prepare_default_lyric_dir() -> Result<PathBuf> {
    let dir = default_lyric_dir().ok_or_else(|| {
        OsdLyricsError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "无法找到用户主目录",
        ))
    })?;
    ensure_lyric_dir(&dir)?;
    Ok(dir)
}
