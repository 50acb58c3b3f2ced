//! 실시간 시세 스냅샷.

use super::{HistoricalBar, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 스냅샷을 만든 수집 경로.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteSource {
    /// JSON API
    Api,
    /// 렌더링된 HTML 페이지
    Page,
}

impl fmt::Display for QuoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteSource::Api => write!(f, "api"),
            QuoteSource::Page => write!(f, "page"),
        }
    }
}

/// 폴링 시점의 시세 스냅샷.
///
/// 현재가 외 필드는 업스트림이 제공하는 경우에만 채워집니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeQuote {
    /// 종목
    pub symbol: Symbol,
    /// 수집 시각
    pub captured_at: DateTime<Utc>,
    /// 현재가
    pub price: Decimal,
    /// 시가
    pub open: Option<Decimal>,
    /// 고가
    pub high: Option<Decimal>,
    /// 저가
    pub low: Option<Decimal>,
    /// 거래량
    pub volume: Option<u64>,
    /// 등락률 (%)
    pub change: Option<Decimal>,
    /// 수집 경로
    pub source: QuoteSource,
}

impl RealtimeQuote {
    /// API가 돌려준 최신 bar로부터 스냅샷을 만듭니다. 현재가는 종가입니다.
    pub fn from_latest_bar(bar: &HistoricalBar, captured_at: DateTime<Utc>) -> Self {
        Self {
            symbol: bar.symbol.clone(),
            captured_at,
            price: bar.close,
            open: Some(bar.open),
            high: Some(bar.high),
            low: Some(bar.low),
            volume: Some(bar.volume),
            change: Some(bar.change),
            source: QuoteSource::Api,
        }
    }
}
