//! 实现了基于 LRCLIB 开放 API 的歌词下载引擎。
//!
//! API 文档: <https://lrclib.net/docs>

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{info, instrument};

use crate::{
    error::{OsdLyricsError, Result},
    model::{LyricCandidate, MAX_CANDIDATE_COUNT, MusicInfo, add_candidate},
    providers::{
        FetchEngine,
        download::{transcode, write_lyric_file},
    },
};

pub mod models;

const BASE_URL: &str = "https://lrclib.net/api";
const LRCLIB_USER_AGENT: &str = concat!("osd-lyrics-rs/", env!("CARGO_PKG_VERSION"));
const SOURCE_CHARSET: &str = "UTF-8";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// LRCLIB 的下载引擎实现
#[derive(Debug, Clone)]
pub struct Lrclib {
    base_url: String,
    http_client: Client,
}

impl Default for Lrclib {
    fn default() -> Self {
        Self::new()
    }
}

impl Lrclib {
    /// 使用官方 API 地址创建引擎。
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// 使用自定义的 API 地址创建引擎。
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http_client = Client::builder()
            .user_agent(LRCLIB_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        }
    }

    fn record_url(&self, id: i64) -> String {
        format!("{}/get/{id}", self.base_url)
    }
}

#[async_trait]
impl FetchEngine for Lrclib {
    fn name(&self) -> &'static str {
        "lrclib"
    }

    #[instrument(skip(self, info), fields(track = %info))]
    async fn search(&self, info: &MusicInfo, _charset: &str) -> Result<Vec<LyricCandidate>> {
        if !info.has_title() {
            return Ok(vec![]);
        }

        let mut query = vec![("track_name", info.title_or_empty())];
        if let Some(artist) = info.artist.as_deref().filter(|a| !a.is_empty()) {
            query.push(("artist_name", artist));
        }

        let response = self
            .http_client
            .get(format!("{}/search", self.base_url))
            .query(&query)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(vec![]);
        }
        if !response.status().is_success() {
            return Err(OsdLyricsError::Network(format!(
                "LRCLIB 搜索失败，HTTP状态码: {}",
                response.status()
            )));
        }

        let records: Vec<models::LrclibRecord> = response.json().await?;

        let mut candidates = Vec::with_capacity(MAX_CANDIDATE_COUNT);
        for record in records.into_iter().filter(models::LrclibRecord::has_synced) {
            let url = self.record_url(record.id);
            add_candidate(&mut candidates, MAX_CANDIDATE_COUNT, record.into_candidate(url));
        }

        info!("LRCLIB 返回 {} 个带时间轴的候选歌词。", candidates.len());
        Ok(candidates)
    }

    #[instrument(skip(self, candidate), fields(url = %candidate.url))]
    async fn download(
        &self,
        candidate: &LyricCandidate,
        target: &Path,
        charset: &str,
    ) -> Result<()> {
        let response = self.http_client.get(&candidate.url).send().await?;
        if !response.status().is_success() {
            return Err(OsdLyricsError::Network(format!(
                "LRCLIB 下载失败，HTTP状态码: {}",
                response.status()
            )));
        }

        let record: models::LrclibRecord = response.json().await?;
        let synced = record.synced_lyrics.ok_or_else(|| {
            OsdLyricsError::Protocol(format!("LRCLIB 记录 {} 没有带时间轴的歌词", record.id))
        })?;

        let converted = transcode(synced.as_bytes(), SOURCE_CHARSET, charset)?;
        write_lyric_file(target, &converted).await
    }
}
