//! 수집 코디네이터.
//!
//! 종목마다 JSON API를 먼저 시도하고, 실패했을 때만 HTML fallback을 정확히 한 번 실행합니다.
//!
//! ```text
//! ┌──────────────┐  Ok(rows)   ┌─────────────────────┐
//! │ cafef API    │────────────▶│ Acquired { Api }    │
//! └──────┬───────┘             └─────────────────────┘
//!        │ Err(ApiError)
//!        ▼
//! ┌──────────────┐  Ok(rows)   ┌─────────────────────┐
//! │ HTML 페이지  │────────────▶│ Acquired { Page }   │
//! └──────┬───────┘             └─────────────────────┘
//!        │ Err(FallbackError)
//!        ▼
//!   AcquisitionFailed { api, fallback }
//! ```
//!
//! 재시도는 하지 않습니다. 다음 주기나 다음 실행이 재시도 역할을 합니다.

use crate::error::{AcquisitionFailed, ApiError, FallbackError};
use crate::provider::{CafefPageExtractor, DateRange, PageQuote, PriceHistoryApi, UrlTemplate};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vnstock_core::{HistoricalBar, QuoteSource, RealtimeQuote, Symbol};

/// 수집 성공 결과와 사용된 경로.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquired<T> {
    pub records: T,
    pub source: QuoteSource,
}

impl<T> Acquired<T> {
    /// fallback 경로로 얻은 결과인지.
    pub fn used_fallback(&self) -> bool {
        self.source == QuoteSource::Page
    }
}

/// 종목 하나의 수집 결과.
pub type AcquisitionResult<T> = Result<Acquired<T>, AcquisitionFailed>;

/// API → HTML fallback 코디네이터.
#[derive(Clone)]
pub struct AcquisitionCoordinator {
    api: Arc<dyn PriceHistoryApi>,
    extractor: CafefPageExtractor,
    history_template: Option<UrlTemplate>,
}

impl AcquisitionCoordinator {
    /// 거래 이력 fallback 템플릿 없이 생성합니다.
    pub fn new(api: Arc<dyn PriceHistoryApi>, extractor: CafefPageExtractor) -> Self {
        Self {
            api,
            extractor,
            history_template: None,
        }
    }

    /// 일별 시세 fallback에 사용할 페이지 템플릿.
    pub fn with_history_template(mut self, template: Option<UrlTemplate>) -> Self {
        self.history_template = template;
        self
    }

    /// 일별 시세 수집.
    pub async fn acquire_history(
        &self,
        symbol: &Symbol,
        range: DateRange,
    ) -> AcquisitionResult<Vec<HistoricalBar>> {
        let api_error = match self.api.fetch_history(symbol, range).await {
            Ok(bars) => {
                debug!(symbol = %symbol, rows = bars.len(), "API 경로 성공");
                return Ok(Acquired {
                    records: bars,
                    source: QuoteSource::Api,
                });
            }
            Err(e) => e,
        };

        warn!(
            symbol = %symbol,
            kind = api_error.kind(),
            error = %api_error,
            "API 실패, HTML 페이지로 Fallback"
        );

        let fallback = match &self.history_template {
            Some(template) => self
                .extractor
                .extract_history(symbol, template)
                .await
                .and_then(|bars| filter_range(bars, range, &template.render(symbol))),
            None => Err(no_template()),
        };

        finish(symbol, api_error, fallback)
    }

    /// 현재 시세 스냅샷 수집.
    ///
    /// API 경로는 가격 이력의 최신 1건을 사용합니다. 장중에는 이 행이 전일 종가일 수
    /// 있으며, API가 응답하는 한 그 값을 성공으로 기록하고 페이지 fallback은 실행되지
    /// 않습니다.
    /// `page_template`이 없으면 fallback은 즉시 실패합니다.
    pub async fn acquire_quote(
        &self,
        symbol: &Symbol,
        page_template: Option<&UrlTemplate>,
        captured_at: DateTime<Utc>,
    ) -> AcquisitionResult<RealtimeQuote> {
        let api_error = match self.api.fetch_latest(symbol).await {
            Ok(bar) => {
                return Ok(Acquired {
                    records: RealtimeQuote::from_latest_bar(&bar, captured_at),
                    source: QuoteSource::Api,
                });
            }
            Err(e) => e,
        };

        warn!(
            symbol = %symbol,
            kind = api_error.kind(),
            error = %api_error,
            "API 실패, HTML 페이지로 Fallback"
        );

        let fallback = match page_template {
            Some(template) => self
                .extractor
                .extract_quote(symbol, template)
                .await
                .and_then(|quote| page_quote_to_realtime(symbol, quote, captured_at, template)),
            None => Err(no_template()),
        };

        finish(symbol, api_error, fallback)
    }
}

fn no_template() -> FallbackError {
    FallbackError::Browser("no page template".to_string())
}

fn finish<T>(
    symbol: &Symbol,
    api: ApiError,
    fallback: Result<T, FallbackError>,
) -> AcquisitionResult<T> {
    match fallback {
        Ok(records) => {
            info!(symbol = %symbol, "Fallback 성공");
            Ok(Acquired {
                records,
                source: QuoteSource::Page,
            })
        }
        Err(fallback) => Err(AcquisitionFailed {
            symbol: symbol.clone(),
            api,
            fallback,
        }),
    }
}

/// 페이지는 조회 기간과 무관한 최근 구간을 보여주므로 요청 기간으로 자릅니다.
fn filter_range(
    bars: Vec<HistoricalBar>,
    range: DateRange,
    url: &str,
) -> Result<Vec<HistoricalBar>, FallbackError> {
    let total = bars.len();
    let kept: Vec<_> = bars
        .into_iter()
        .filter(|bar| range.start.map_or(true, |start| bar.date >= start))
        .filter(|bar| range.end.map_or(true, |end| bar.date <= end))
        .collect();

    if kept.is_empty() {
        return Err(FallbackError::ExtractionFailed {
            url: url.to_string(),
            reason: format!("요청 기간 내 행 없음 (페이지 {}행)", total),
        });
    }
    Ok(kept)
}

fn page_quote_to_realtime(
    symbol: &Symbol,
    quote: PageQuote,
    captured_at: DateTime<Utc>,
    template: &UrlTemplate,
) -> Result<RealtimeQuote, FallbackError> {
    let price = quote.price.ok_or_else(|| FallbackError::ExtractionFailed {
        url: template.render(symbol),
        reason: "현재가 없음".to_string(),
    })?;

    Ok(RealtimeQuote {
        symbol: symbol.clone(),
        captured_at,
        price,
        open: quote.open,
        high: quote.high,
        low: quote.low,
        volume: quote.volume,
        change: quote.change,
        source: QuoteSource::Page,
    })
}
