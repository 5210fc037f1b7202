//! 实现了基于 MiniLyrics (ViewLyrics) 搜索服务的歌词下载引擎。
//!
//! # 使用流程
//!
//! 1. 使用 `search` 以歌曲标题和艺术家搜索，得到至多 5 个候选歌词。
//! 2. 选择一个候选，调用 `download` 将歌词下载、转码并保存到本地。

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{CONTENT_TYPE, USER_AGENT},
};
use tracing::{debug, info, instrument};

use crate::{
    error::{OsdLyricsError, Result},
    model::{LyricCandidate, MAX_CANDIDATE_COUNT, MusicInfo, add_candidate},
    providers::{
        FetchEngine,
        download::{transcode, write_lyric_file},
    },
};

pub mod codec;

const SEARCH_URL: &str = "http://www.viewlyrics.com:1212/searchlyrics.htm";
const MINILYRICS_USER_AGENT: &str = "MiniLyrics";
/// MiniLyrics 服务器上的歌词文件使用的编码。
const SOURCE_CHARSET: &str = "GBK";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// MiniLyrics 的下载引擎实现
#[derive(Debug, Clone)]
pub struct MiniLyrics {
    search_url: String,
    http_client: Client,
}

impl Default for MiniLyrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MiniLyrics {
    /// 使用官方搜索地址创建引擎。
    pub fn new() -> Self {
        Self::with_search_url(SEARCH_URL)
    }

    /// 使用自定义的搜索地址创建引擎。
    pub fn with_search_url(search_url: impl Into<String>) -> Self {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            search_url: search_url.into(),
            http_client,
        }
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http_client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(OsdLyricsError::Network(format!(
                "下载歌词失败，HTTP状态码: {}",
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl FetchEngine for MiniLyrics {
    fn name(&self) -> &'static str {
        "minilyrics"
    }

    #[instrument(skip(self, info), fields(track = %info))]
    async fn search(&self, info: &MusicInfo, _charset: &str) -> Result<Vec<LyricCandidate>> {
        if !info.has_title() {
            return Ok(vec![]);
        }

        let request = codec::build_request(info);
        let response = self
            .http_client
            .post(&self.search_url)
            .header(USER_AGENT, MINILYRICS_USER_AGENT)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OsdLyricsError::Network(format!(
                "MiniLyrics 搜索失败，HTTP状态码: {}",
                response.status()
            )));
        }

        let body = response.bytes().await?;
        let mut candidates = Vec::with_capacity(MAX_CANDIDATE_COUNT);
        for candidate in codec::parse_response(&body) {
            debug!(
                "新的候选歌词: title: {}, artist: {}, url: {}",
                candidate.title, candidate.artist, candidate.url
            );
            add_candidate(&mut candidates, MAX_CANDIDATE_COUNT, candidate);
        }

        info!("MiniLyrics 返回 {} 个候选歌词。", candidates.len());
        Ok(candidates)
    }

    #[instrument(skip(self, candidate), fields(url = %candidate.url))]
    async fn download(
        &self,
        candidate: &LyricCandidate,
        target: &Path,
        charset: &str,
    ) -> Result<()> {
        let raw = self.fetch_bytes(&candidate.url).await?;
        let converted = transcode(&raw, SOURCE_CHARSET, charset)?;
        write_lyric_file(target, &converted).await
    }
}
