//! 페이지 렌더링 capability.
//!
//! fallback 추출기는 구체적인 브라우저 엔진이 아니라 이 trait에만 의존합니다.
//!
//! - [`HttpPageDriver`]: 서버 렌더링된 HTML을 받아 `scraper`로 조회 (JavaScript 미실행, 기본값)
//! - `WebDriverBrowser`: WebDriver로 실제 브라우저 구동 (`webdriver` feature)
//!
//! 테스트에서는 고정 HTML을 돌려주는 stub으로 대체합니다.

use crate::error::FallbackError;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

/// 페이지를 렌더링하는 브라우저.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// URL을 열고 렌더링된 페이지 핸들을 반환합니다.
    async fn render(&self, url: &str) -> Result<Box<dyn RenderedPage>, FallbackError>;
}

/// 렌더링된 페이지(DOM) 핸들.
#[async_trait]
pub trait RenderedPage: Send + Sync {
    /// 셀렉터에 맞는 요소가 나타날 때까지 최대 `timeout` 동안 기다립니다.
    ///
    /// 시간 안에 나타나면 `true`.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool, FallbackError>;

    /// 첫 번째 매칭 요소의 텍스트 (공백 정리). 없거나 비어 있으면 `None`.
    async fn read_text(&self, selector: &str) -> Result<Option<String>, FallbackError>;

    /// 매칭되는 각 행의 `td`/`th` 셀 텍스트.
    async fn read_rows(&self, row_selector: &str) -> Result<Vec<Vec<String>>, FallbackError>;

    /// 페이지/세션 정리.
    async fn close(&mut self) -> Result<(), FallbackError> {
        Ok(())
    }
}

/// 요소 텍스트의 연속 공백을 하나로 합칩니다.
pub(crate) fn normalize_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(|part| part.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_selector(selector: &str) -> Result<Selector, FallbackError> {
    Selector::parse(selector)
        .map_err(|e| FallbackError::Browser(format!("잘못된 셀렉터 {:?}: {}", selector, e)))
}

/// HTTP로 받은 정적 HTML 문서.
///
/// `scraper::Html`은 스레드 간 이동이 불가하므로 원문을 보관하고 조회 시마다 파싱합니다.
#[derive(Debug, Clone)]
pub struct StaticPage {
    html: String,
}

impl StaticPage {
    /// HTML 원문으로 생성합니다.
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// 동기 조회: 첫 번째 매칭 요소 텍스트.
    pub fn text_of(&self, selector: &str) -> Result<Option<String>, FallbackError> {
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(&self.html);
        Ok(document
            .select(&selector)
            .map(|el| normalize_text(el.text()))
            .find(|text| !text.is_empty()))
    }

    /// 동기 조회: 요소 존재 여부.
    pub fn contains(&self, selector: &str) -> Result<bool, FallbackError> {
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(&self.html);
        let found = document.select(&selector).next().is_some();
        Ok(found)
    }

    /// 동기 조회: 행별 셀 텍스트.
    pub fn rows_of(&self, row_selector: &str) -> Result<Vec<Vec<String>>, FallbackError> {
        let row_selector = parse_selector(row_selector)?;
        let cell_selector = parse_selector("td, th")?;
        let document = Html::parse_document(&self.html);
        Ok(document
            .select(&row_selector)
            .map(|row| {
                row.select(&cell_selector)
                    .map(|cell| normalize_text(cell.text()))
                    .collect()
            })
            .collect())
    }
}

#[async_trait]
impl RenderedPage for StaticPage {
    async fn wait_for(&mut self, selector: &str, _timeout: Duration) -> Result<bool, FallbackError> {
        // 스크립트가 실행되지 않으므로 기다려도 DOM은 바뀌지 않습니다.
        self.contains(selector)
    }

    async fn read_text(&self, selector: &str) -> Result<Option<String>, FallbackError> {
        self.text_of(selector)
    }

    async fn read_rows(&self, row_selector: &str) -> Result<Vec<Vec<String>>, FallbackError> {
        self.rows_of(row_selector)
    }
}

/// reqwest로 페이지를 받아 [`StaticPage`]로 돌려주는 드라이버.
pub struct HttpPageDriver {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpPageDriver {
    /// 페이지 로드 타임아웃을 지정해 생성합니다.
    pub fn new(timeout: Duration) -> Result<Self, FallbackError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .map_err(|e| FallbackError::Browser(format!("HTTP 클라이언트 생성 실패: {}", e)))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl BrowserDriver for HttpPageDriver {
    async fn render(&self, url: &str) -> Result<Box<dyn RenderedPage>, FallbackError> {
        debug!(url, "페이지 요청 (HTTP)");

        let to_error = |e: reqwest::Error| {
            if e.is_timeout() {
                FallbackError::RenderTimeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                }
            } else {
                FallbackError::Browser(format!("페이지 요청 실패 {}: {}", url, e))
            }
        };

        let response = self.client.get(url).send().await.map_err(to_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FallbackError::Browser(format!(
                "페이지 HTTP 오류 {}: {}",
                status.as_u16(),
                url
            )));
        }

        let html = response.text().await.map_err(to_error)?;
        debug!(url, bytes = html.len(), "페이지 수신");
        Ok(Box::new(StaticPage::new(html)))
    }
}
