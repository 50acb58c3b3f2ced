//! cafef.vn JSON API 클라이언트.
//!
//! cafef 웹 페이지가 내부적으로 호출하는 가격 이력 API를 직접 호출합니다.
//! HTML을 파싱하는 것보다 빠르고 안정적이므로 기본 수집 경로입니다.
//!
//! # 엔드포인트
//!
//! ```text
//! GET {base}/du-lieu/Ajax/PageNew/DataHistory/PriceHistory.ashx
//!     ?Symbol=ACV&StartDate=&EndDate=&PageIndex=1&PageSize=1000
//!
//! {"Data": {"TotalCount": 2500, "Data": [ {"Ngay": "15/01/2026", ...}, ... ]}}
//! ```
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! let client = CafefApiClient::new(CafefApiConfig::default())?;
//! let symbol = Symbol::parse("ACV")?;
//! let bars = client.fetch_history(&symbol, DateRange::default()).await?;
//! ```

use crate::error::ApiError;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use vnstock_core::parse::{format_api_date, parse_change_percent, parse_vn_date};
use vnstock_core::{HistoricalBar, Symbol};

/// cafef 기본 URL.
pub const DEFAULT_BASE_URL: &str = "https://cafef.vn";

/// 가격 이력 API 경로.
pub const PRICE_HISTORY_PATH: &str = "/du-lieu/Ajax/PageNew/DataHistory/PriceHistory.ashx";

/// 업스트림이 허용하는 최대 페이지 크기.
pub const MAX_PAGE_SIZE: u32 = 1000;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 조회 기간. 양 끝 모두 선택이며, 비어 있으면 업스트림 기본값(전체)을 사용합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// 시작일
    pub start: Option<NaiveDate>,
    /// 종료일
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// 기간 생성.
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    fn api_params(&self) -> (String, String) {
        (
            self.start.map(format_api_date).unwrap_or_default(),
            self.end.map(format_api_date).unwrap_or_default(),
        )
    }
}

/// 가격 이력 API 추상화.
///
/// 코디네이터는 이 trait에만 의존하므로 테스트에서 stub으로 대체할 수 있습니다.
#[async_trait]
pub trait PriceHistoryApi: Send + Sync {
    /// 기간 내 전체 일별 시세 (업스트림 반환 순서 유지).
    async fn fetch_history(
        &self,
        symbol: &Symbol,
        range: DateRange,
    ) -> Result<Vec<HistoricalBar>, ApiError>;

    /// 가장 최근 거래일 하나.
    async fn fetch_latest(&self, symbol: &Symbol) -> Result<HistoricalBar, ApiError>;
}

/// API 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct CafefApiConfig {
    /// 기본 URL (테스트에서는 mock 서버 주소)
    pub base_url: String,
    /// 페이지 크기 (1..=1000)
    pub page_size: u32,
    /// 최대 페이지 수 (무한 루프 방지)
    pub max_pages: u32,
    /// 요청 타임아웃
    pub timeout: Duration,
    /// 페이지 요청 간 딜레이
    pub page_delay: Duration,
}

impl Default for CafefApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: MAX_PAGE_SIZE,
            max_pages: 50,
            timeout: Duration::from_secs(30),
            page_delay: Duration::from_millis(500),
        }
    }
}

/// API 응답 최상위.
#[derive(Debug, Deserialize)]
struct PriceHistoryEnvelope {
    #[serde(rename = "Data")]
    data: PriceHistoryPage,
}

/// 한 페이지.
#[derive(Debug, Deserialize)]
struct PriceHistoryPage {
    #[serde(rename = "TotalCount")]
    total_count: u64,
    #[serde(rename = "Data")]
    rows: Vec<PriceHistoryRecord>,
}

/// 일별 레코드. 필드명은 업스트림 표기(베트남어 약어) 그대로입니다.
#[derive(Debug, Deserialize)]
struct PriceHistoryRecord {
    /// 거래일 (dd/mm/yyyy)
    #[serde(rename = "Ngay")]
    date: String,
    #[serde(rename = "GiaMoCua")]
    open: Decimal,
    #[serde(rename = "GiaCaoNhat")]
    high: Decimal,
    #[serde(rename = "GiaThapNhat")]
    low: Decimal,
    #[serde(rename = "GiaDongCua")]
    close: Decimal,
    #[serde(rename = "GiaDieuChinh")]
    adj_close: Decimal,
    #[serde(rename = "KhoiLuongKhopLenh")]
    volume: Decimal,
    #[serde(rename = "GiaTriKhopLenh")]
    value: Decimal,
    #[serde(rename = "KLThoaThuan")]
    deal_volume: Decimal,
    #[serde(rename = "GtThoaThuan")]
    deal_value: Decimal,
    /// 숫자 또는 `"-1.2(-1.38 %)"` 형식 문자열
    #[serde(rename = "ThayDoi")]
    change: ChangeField,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChangeField {
    Number(Decimal),
    Text(String),
}

impl PriceHistoryRecord {
    fn into_bar(self, symbol: &Symbol) -> Result<HistoricalBar, ApiError> {
        let date = parse_vn_date(&self.date)
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
        let change = match self.change {
            ChangeField::Number(n) => n,
            ChangeField::Text(text) => parse_change_percent(&text)
                .map_err(|e| ApiError::MalformedResponse(format!("ThayDoi: {}", e)))?,
        };

        let bar = HistoricalBar {
            symbol: symbol.clone(),
            date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            adj_close: self.adj_close,
            volume: decimal_to_volume("KhoiLuongKhopLenh", self.volume)?,
            value: self.value,
            deal_volume: decimal_to_volume("KLThoaThuan", self.deal_volume)?,
            deal_value: self.deal_value,
            change,
        };
        bar.validate()
            .map_err(|e| ApiError::MalformedResponse(format!("{} {}: {}", symbol, date, e)))?;
        Ok(bar)
    }
}

/// 거래량은 음이 아닌 정수여야 합니다.
fn decimal_to_volume(field: &str, value: Decimal) -> Result<u64, ApiError> {
    if !value.fract().is_zero() {
        return Err(ApiError::MalformedResponse(format!(
            "{}: 정수가 아닌 거래량 {}",
            field, value
        )));
    }
    value.to_u64().ok_or_else(|| {
        ApiError::MalformedResponse(format!("{}: 잘못된 거래량 {}", field, value))
    })
}

/// 응답 본문 앞부분 (로그/에러 메시지용).
fn body_snippet(text: &str) -> String {
    text.chars().take(200).collect()
}

/// cafef 가격 이력 API 클라이언트.
#[derive(Clone)]
pub struct CafefApiClient {
    client: reqwest::Client,
    config: CafefApiConfig,
}

impl CafefApiClient {
    /// 새 클라이언트를 생성합니다.
    ///
    /// 페이지 크기는 `1..=1000`으로 보정됩니다.
    pub fn new(mut config: CafefApiConfig) -> Result<Self, ApiError> {
        let bounded = config.page_size.clamp(1, MAX_PAGE_SIZE);
        if bounded != config.page_size {
            warn!(requested = config.page_size, used = bounded, "페이지 크기 보정");
            config.page_size = bounded;
        }

        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://cafef.vn/"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// 설정 반환.
    pub fn config(&self) -> &CafefApiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            PRICE_HISTORY_PATH
        )
    }

    /// 한 페이지 요청 및 디코딩.
    async fn fetch_page(
        &self,
        symbol: &Symbol,
        range: DateRange,
        page_index: u32,
        page_size: u32,
    ) -> Result<PriceHistoryPage, ApiError> {
        let (start, end) = range.api_params();
        let params = [
            ("Symbol", symbol.as_str().to_string()),
            ("StartDate", start),
            ("EndDate", end),
            ("PageIndex", page_index.to_string()),
            ("PageSize", page_size.to_string()),
        ];

        debug!(symbol = %symbol, page = page_index, page_size, "cafef API 요청");

        let response = self.client.get(self.endpoint()).query(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Upstream {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let envelope: PriceHistoryEnvelope = serde_json::from_str(&text).map_err(|e| {
            ApiError::MalformedResponse(format!("{} - {}", e, body_snippet(&text)))
        })?;

        debug!(
            symbol = %symbol,
            page = page_index,
            rows = envelope.data.rows.len(),
            total = envelope.data.total_count,
            "cafef API 응답 수신"
        );

        Ok(envelope.data)
    }
}

fn decode_rows(symbol: &Symbol, rows: Vec<PriceHistoryRecord>) -> Result<Vec<HistoricalBar>, ApiError> {
    rows.into_iter().map(|r| r.into_bar(symbol)).collect()
}

#[async_trait]
impl PriceHistoryApi for CafefApiClient {
    async fn fetch_history(
        &self,
        symbol: &Symbol,
        range: DateRange,
    ) -> Result<Vec<HistoricalBar>, ApiError> {
        let page_size = self.config.page_size;
        let first = self.fetch_page(symbol, range, 1, page_size).await?;
        let total = first.total_count;
        let first_len = first.rows.len() as u64;

        let mut bars = decode_rows(symbol, first.rows)?;
        if bars.is_empty() {
            return Err(ApiError::NoRecords);
        }

        let pages_needed = total.div_ceil(u64::from(page_size));
        if pages_needed > u64::from(self.config.max_pages) {
            return Err(ApiError::IncompletePagination(format!(
                "TotalCount {}는 최대 {}페이지를 초과합니다",
                total, self.config.max_pages
            )));
        }
        if first_len < total && first_len < u64::from(page_size) {
            return Err(ApiError::IncompletePagination(format!(
                "1페이지 행 수 {} < 페이지 크기 {} (TotalCount {})",
                first_len, page_size, total
            )));
        }

        let mut page_index = 1u32;
        while (bars.len() as u64) < total {
            page_index += 1;
            if !self.config.page_delay.is_zero() {
                tokio::time::sleep(self.config.page_delay).await;
            }

            let page = self.fetch_page(symbol, range, page_index, page_size).await?;
            if page.total_count != total {
                return Err(ApiError::IncompletePagination(format!(
                    "{}페이지 TotalCount {} != {}",
                    page_index, page.total_count, total
                )));
            }

            let received = page.rows.len() as u64;
            let is_last = bars.len() as u64 + received >= total;
            if received == 0 || (!is_last && received < u64::from(page_size)) {
                return Err(ApiError::IncompletePagination(format!(
                    "{}페이지 행 수 {} (수집 {}/{})",
                    page_index,
                    received,
                    bars.len(),
                    total
                )));
            }

            bars.extend(decode_rows(symbol, page.rows)?);
        }

        if bars.len() as u64 > total {
            warn!(symbol = %symbol, rows = bars.len(), total, "TotalCount보다 많은 행 수신");
        }

        info!(symbol = %symbol, rows = bars.len(), pages = page_index, "cafef API 수집 완료");
        Ok(bars)
    }

    async fn fetch_latest(&self, symbol: &Symbol) -> Result<HistoricalBar, ApiError> {
        let page = self.fetch_page(symbol, DateRange::default(), 1, 1).await?;
        let record = page.rows.into_iter().next().ok_or(ApiError::NoRecords)?;
        record.into_bar(symbol)
    }
}
