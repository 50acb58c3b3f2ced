//! cafef.vn 페이지 fallback 추출기.
//!
//! JSON API가 실패했을 때만 사용하는 안전망입니다.
//! [`BrowserDriver`]로 종목 페이지를 렌더링하고, 가격 위젯이 채워질 때까지
//! 제한된 시간 동안 기다린 뒤 DOM에서 값을 읽습니다.
//!
//! ## 추출 순서
//! 1. 설정된 CSS 셀렉터 (`QuoteSelectors`)
//! 2. 셀렉터가 비어 있으면 페이지 텍스트에서 라벨 검색 (`Cao nhất`, `High` 등)
//!
//! 없는 필드는 `None`으로 남기고, 현재가가 없을 때만 실패로 처리합니다.

use super::browser::{BrowserDriver, RenderedPage};
use crate::error::FallbackError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use vnstock_core::parse::{is_date_like, parse_change_percent, parse_leading_number, parse_vn_date, parse_vn_number};
use vnstock_core::{HistoricalBar, Symbol};

/// cafef 거래 이력 페이지 기본 템플릿.
pub const DEFAULT_HISTORY_PAGE_TEMPLATE: &str =
    "https://cafef.vn/du-lieu/lich-su-giao-dich-{symbol_lower}-1.chn";

/// 가격 위젯 대기 기본 시간.
pub const DEFAULT_RENDER_WAIT: Duration = Duration::from_secs(5);

/// `{symbol}` / `{symbol_lower}` 자리표시자를 가진 URL 템플릿.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// 자리표시자가 하나도 없으면 에러.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if !raw.contains("{symbol}") && !raw.contains("{symbol_lower}") {
            return Err(format!(
                "URL 템플릿에 {{symbol}} 또는 {{symbol_lower}}가 없습니다: {}",
                raw
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// 종목 URL 생성.
    pub fn render(&self, symbol: &Symbol) -> String {
        self.0
            .replace("{symbol_lower}", &symbol.to_lowercase())
            .replace("{symbol}", symbol.as_str())
    }

    /// 원본 템플릿 문자열.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 시세 위젯 셀렉터. 쉼표로 여러 후보를 줄 수 있습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSelectors {
    pub price: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub volume: String,
    pub change: String,
    /// 거래 이력 표의 행
    pub history_rows: String,
}

impl Default for QuoteSelectors {
    fn default() -> Self {
        Self {
            price: "#price__0, .boxprice .price, .price, .stock-price, #price".to_string(),
            open: "#open__0, .boxprice .open, .stock-open".to_string(),
            high: "#high__0, .boxprice .high, .stock-high".to_string(),
            low: "#low__0, .boxprice .low, .stock-low".to_string(),
            volume: "#volume__0, .boxprice .volume, .stock-volume".to_string(),
            change: "#change__0, .boxprice .change, .stock-change".to_string(),
            history_rows: "table tr".to_string(),
        }
    }
}

/// 페이지 텍스트 라벨 (베트남어, 영어).
const OPEN_LABELS: &[&str] = &["giá mở cửa", "open"];
const HIGH_LABELS: &[&str] = &["cao nhất", "high"];
const LOW_LABELS: &[&str] = &["thấp nhất", "low"];
const VOLUME_LABELS: &[&str] = &["khối lượng", "volume"];
const CHANGE_LABELS: &[&str] = &["thay đổi", "change"];

/// 라벨 뒤에서 값을 찾을 최대 문자 수.
const LABEL_WINDOW: usize = 32;

/// 페이지에서 읽은 시세. 현재가 외에는 선택입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuote {
    pub price: Option<Decimal>,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub volume: Option<u64>,
    pub change: Option<Decimal>,
}

/// 거래 이력 표 열 순서 (cafef lich-su-giao-dich 페이지).
///
/// 날짜 | 수정종가 | 종가 | 등락 | 매칭 KL | 매칭 GT | 협상 KL | 협상 GT | 시가 | 고가 | 저가
const HISTORY_COLUMNS: usize = 11;

/// 등락 텍스트 파싱: 괄호 안 퍼센트 우선, 없으면 앞쪽 숫자.
fn parse_change_text(text: &str) -> Option<Decimal> {
    match (text.find('('), text.find(')')) {
        (Some(open), Some(close)) if open < close => parse_change_percent(&text[..=close]).ok(),
        _ => parse_leading_number(text),
    }
}

fn to_volume(value: Decimal) -> Option<u64> {
    if value.fract().is_zero() {
        value.to_u64()
    } else {
        None
    }
}

/// 라벨 뒤에 숫자가 오는 첫 위치의 값.
///
/// 라벨이 다른 단어 안에 들어 있으면 (`follow`의 `low`) 숫자가 이어지지 않으므로
/// 다음 위치로 넘어갑니다.
fn label_value(
    lowered_text: &str,
    labels: &[&str],
    parse: fn(&str) -> Option<Decimal>,
) -> Option<Decimal> {
    labels.iter().find_map(|label| {
        lowered_text.match_indices(label).find_map(|(idx, _)| {
            let window: String = lowered_text[idx + label.len()..]
                .chars()
                .take(LABEL_WINDOW)
                .collect();
            parse(&window)
        })
    })
}

/// 표의 한 행을 bar로 변환. 날짜 행이 아니거나 값이 깨졌으면 `None`.
fn parse_history_row(symbol: &Symbol, cells: &[String]) -> Option<HistoricalBar> {
    if cells.len() < HISTORY_COLUMNS {
        return None;
    }
    let number = |i: usize| parse_vn_number(&cells[i]);

    let bar = HistoricalBar {
        symbol: symbol.clone(),
        date: parse_vn_date(&cells[0]).ok()?,
        adj_close: number(1)?,
        close: number(2)?,
        change: parse_change_text(&cells[3])?,
        volume: to_volume(number(4)?)?,
        value: number(5)?,
        deal_volume: to_volume(number(6)?)?,
        deal_value: number(7)?,
        open: number(8)?,
        high: number(9)?,
        low: number(10)?,
    };
    bar.validate().ok()?;
    Some(bar)
}

/// HTML fallback 추출기.
#[derive(Clone)]
pub struct CafefPageExtractor {
    driver: Arc<dyn BrowserDriver>,
    selectors: QuoteSelectors,
    render_wait: Duration,
}

impl CafefPageExtractor {
    /// 기본 셀렉터와 대기 시간으로 생성합니다.
    pub fn new(driver: Arc<dyn BrowserDriver>) -> Self {
        Self {
            driver,
            selectors: QuoteSelectors::default(),
            render_wait: DEFAULT_RENDER_WAIT,
        }
    }

    /// 셀렉터 교체.
    pub fn with_selectors(mut self, selectors: QuoteSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// 위젯 대기 시간 설정.
    pub fn with_render_wait(mut self, render_wait: Duration) -> Self {
        self.render_wait = render_wait;
        self
    }

    /// 종목 페이지에서 현재 시세를 추출합니다.
    pub async fn extract_quote(
        &self,
        symbol: &Symbol,
        template: &UrlTemplate,
    ) -> Result<PageQuote, FallbackError> {
        let url = template.render(symbol);
        let mut page = self.driver.render(&url).await?;
        let result = self.read_quote(page.as_mut(), &url).await;
        close_page(page.as_mut(), &url).await;
        result
    }

    /// 거래 이력 페이지의 표에서 일별 시세를 추출합니다 (페이지 표시 순서 유지).
    pub async fn extract_history(
        &self,
        symbol: &Symbol,
        template: &UrlTemplate,
    ) -> Result<Vec<HistoricalBar>, FallbackError> {
        let url = template.render(symbol);
        let mut page = self.driver.render(&url).await?;
        let result = self.read_history(symbol, page.as_mut(), &url).await;
        close_page(page.as_mut(), &url).await;
        result
    }

    async fn read_quote(
        &self,
        page: &mut dyn RenderedPage,
        url: &str,
    ) -> Result<PageQuote, FallbackError> {
        if !page.wait_for(&self.selectors.price, self.render_wait).await? {
            debug!(url, wait = ?self.render_wait, "가격 위젯 대기 초과, 현재 DOM으로 추출");
        }

        let page_text = page
            .read_text("body")
            .await?
            .unwrap_or_default()
            .to_lowercase();

        let price = match page.read_text(&self.selectors.price).await? {
            Some(text) => parse_leading_number(&text),
            None => None,
        };
        let Some(price) = price else {
            return Err(FallbackError::ExtractionFailed {
                url: url.to_string(),
                reason: "현재가 요소 없음".to_string(),
            });
        };

        let open = self
            .read_field(page, &self.selectors.open, &page_text, OPEN_LABELS, parse_leading_number)
            .await?;
        let high = self
            .read_field(page, &self.selectors.high, &page_text, HIGH_LABELS, parse_leading_number)
            .await?;
        let low = self
            .read_field(page, &self.selectors.low, &page_text, LOW_LABELS, parse_leading_number)
            .await?;
        let volume = self
            .read_field(page, &self.selectors.volume, &page_text, VOLUME_LABELS, parse_leading_number)
            .await?
            .and_then(to_volume);
        let change = self
            .read_field(page, &self.selectors.change, &page_text, CHANGE_LABELS, parse_change_text)
            .await?;

        let quote = PageQuote {
            price: Some(price),
            open,
            high,
            low,
            volume,
            change,
        };
        debug!(url, ?quote, "페이지 시세 추출");
        Ok(quote)
    }

    /// 셀렉터 → 라벨 검색 순으로 값 하나를 읽습니다.
    async fn read_field(
        &self,
        page: &mut dyn RenderedPage,
        selector: &str,
        page_text: &str,
        labels: &[&str],
        parse: fn(&str) -> Option<Decimal>,
    ) -> Result<Option<Decimal>, FallbackError> {
        if let Some(value) = page.read_text(selector).await?.as_deref().and_then(parse) {
            return Ok(Some(value));
        }
        Ok(label_value(page_text, labels, parse))
    }

    async fn read_history(
        &self,
        symbol: &Symbol,
        page: &mut dyn RenderedPage,
        url: &str,
    ) -> Result<Vec<HistoricalBar>, FallbackError> {
        if !page
            .wait_for(&self.selectors.history_rows, self.render_wait)
            .await?
        {
            debug!(url, "거래 이력 표 대기 초과, 현재 DOM으로 추출");
        }

        let rows = page.read_rows(&self.selectors.history_rows).await?;
        let mut bars = Vec::new();
        let mut skipped = 0usize;

        for cells in rows.iter().filter(|cells| cells.first().is_some_and(|c| is_date_like(c))) {
            match parse_history_row(symbol, cells) {
                Some(bar) => bars.push(bar),
                None => {
                    skipped += 1;
                    warn!(symbol = %symbol, row = ?cells, "거래 이력 행 파싱 실패, 건너뜀");
                }
            }
        }

        if bars.is_empty() {
            return Err(FallbackError::ExtractionFailed {
                url: url.to_string(),
                reason: format!("날짜 행 없음 (전체 {}행, 실패 {}행)", rows.len(), skipped),
            });
        }

        debug!(symbol = %symbol, rows = bars.len(), skipped, "페이지 거래 이력 추출");
        Ok(bars)
    }
}

async fn close_page(page: &mut dyn RenderedPage, url: &str) {
    if let Err(e) = page.close().await {
        warn!(url, error = %e, "페이지 정리 실패");
    }
}
