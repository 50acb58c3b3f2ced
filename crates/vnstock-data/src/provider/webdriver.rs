//! WebDriver 기반 실제 브라우저 드라이버.
//!
//! chromedriver/geckodriver 등 WebDriver 서버에 접속해 페이지를 렌더링합니다.
//! 클라이언트 측 스크립트로 채워지는 가격 위젯을 읽을 때 사용합니다.
//!
//! ```bash
//! chromedriver --port=4444 &
//! vnstock-collector --webdriver-url http://localhost:4444 realtime --symbol ACV ...
//! ```

use super::browser::{BrowserDriver, RenderedPage};
use crate::error::FallbackError;
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use std::time::Duration;
use tracing::{debug, warn};

/// WebDriver 세션을 페이지마다 새로 여는 드라이버.
pub struct WebDriverBrowser {
    webdriver_url: String,
    page_load_timeout: Duration,
}

impl WebDriverBrowser {
    /// WebDriver 서버 주소와 페이지 로드 타임아웃으로 생성합니다.
    pub fn new(webdriver_url: impl Into<String>, page_load_timeout: Duration) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            page_load_timeout,
        }
    }
}

fn cmd_error(context: &str, e: CmdError) -> FallbackError {
    FallbackError::Browser(format!("{}: {}", context, e))
}

#[async_trait]
impl BrowserDriver for WebDriverBrowser {
    async fn render(&self, url: &str) -> Result<Box<dyn RenderedPage>, FallbackError> {
        debug!(url, webdriver = %self.webdriver_url, "WebDriver 세션 시작");

        let client = ClientBuilder::native()
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| FallbackError::Browser(format!("WebDriver 연결 실패: {}", e)))?;

        let navigation = tokio::time::timeout(self.page_load_timeout, client.goto(url)).await;
        match navigation {
            Ok(Ok(())) => Ok(Box::new(WebDriverPage { client })),
            Ok(Err(e)) => {
                let _ = client.close().await;
                Err(cmd_error("페이지 이동 실패", e))
            }
            Err(_) => {
                let _ = client.close().await;
                Err(FallbackError::RenderTimeout {
                    url: url.to_string(),
                    timeout: self.page_load_timeout,
                })
            }
        }
    }
}

/// 열린 WebDriver 세션 위의 페이지.
struct WebDriverPage {
    client: Client,
}

#[async_trait]
impl RenderedPage for WebDriverPage {
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool, FallbackError> {
        match self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
        {
            Ok(_) => Ok(true),
            Err(CmdError::WaitTimeout) => Ok(false),
            Err(e) => Err(cmd_error("요소 대기 실패", e)),
        }
    }

    async fn read_text(&self, selector: &str) -> Result<Option<String>, FallbackError> {
        let element = match self.client.find(Locator::Css(selector)).await {
            Ok(element) => element,
            Err(e) if e.is_no_such_element() => return Ok(None),
            Err(e) => return Err(cmd_error("요소 조회 실패", e)),
        };
        let text = element
            .text()
            .await
            .map_err(|e| cmd_error("텍스트 읽기 실패", e))?;
        let text = super::browser::normalize_text(std::iter::once(text.as_str()));
        Ok(if text.is_empty() { None } else { Some(text) })
    }

    async fn read_rows(&self, row_selector: &str) -> Result<Vec<Vec<String>>, FallbackError> {
        let rows = self
            .client
            .find_all(Locator::Css(row_selector))
            .await
            .map_err(|e| cmd_error("행 조회 실패", e))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let cells = row
                .find_all(Locator::Css("td, th"))
                .await
                .map_err(|e| cmd_error("셀 조회 실패", e))?;
            let mut texts = Vec::with_capacity(cells.len());
            for cell in cells {
                let text = cell.text().await.map_err(|e| cmd_error("셀 텍스트 실패", e))?;
                texts.push(super::browser::normalize_text(std::iter::once(text.as_str())));
            }
            out.push(texts);
        }
        Ok(out)
    }

    async fn close(&mut self) -> Result<(), FallbackError> {
        if let Err(e) = self.client.clone().close().await {
            warn!(error = %e, "WebDriver 세션 종료 실패");
        }
        Ok(())
    }
}
