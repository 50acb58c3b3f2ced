//! 수집기 통합 테스트 공용 stub.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vnstock_collector::CollectorContext;
use vnstock_core::{HistoricalBar, Symbol};
use vnstock_data::provider::{BrowserDriver, RenderedPage, StaticPage};
use vnstock_data::{
    AcquisitionCoordinator, ApiError, CafefPageExtractor, CsvStorage, DateRange, FallbackError,
    PriceHistoryApi, UrlTemplate,
};

pub fn bar(symbol: &str, date: NaiveDate, close: Decimal) -> HistoricalBar {
    HistoricalBar {
        symbol: Symbol::parse(symbol).unwrap(),
        date,
        open: close,
        high: close + dec!(0.5),
        low: close - dec!(0.5),
        close,
        adj_close: close,
        volume: 10_000,
        value: close * dec!(10000),
        deal_volume: 0,
        deal_value: dec!(0),
        change: dec!(0.12),
    }
}

/// 종목별 고정 응답 API. 등록되지 않은 종목은 실패합니다.
#[derive(Default)]
pub struct StubApi {
    pub bars: HashMap<String, Vec<HistoricalBar>>,
    pub calls: AtomicUsize,
}

impl StubApi {
    pub fn with(mut self, symbol: &str, bars: Vec<HistoricalBar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }
}

#[async_trait]
impl PriceHistoryApi for StubApi {
    async fn fetch_history(
        &self,
        symbol: &Symbol,
        _range: DateRange,
    ) -> Result<Vec<HistoricalBar>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bars
            .get(symbol.as_str())
            .cloned()
            .ok_or_else(|| ApiError::MalformedResponse("missing field `Data`".to_string()))
    }

    async fn fetch_latest(&self, symbol: &Symbol) -> Result<HistoricalBar, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bars
            .get(symbol.as_str())
            .and_then(|bars| bars.first().cloned())
            .ok_or(ApiError::Upstream { status: 502 })
    }
}

/// 고정 HTML을 돌려주는 브라우저.
pub struct StubBrowser {
    pub html: String,
    pub renders: Arc<AtomicUsize>,
}

#[async_trait]
impl BrowserDriver for StubBrowser {
    async fn render(&self, _url: &str) -> Result<Box<dyn RenderedPage>, FallbackError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticPage::new(self.html.clone())))
    }
}

/// stub API/브라우저와 임시 디렉터리 저장소로 컨텍스트를 만듭니다.
pub fn context(api: StubApi, page_html: &str, out: &Path) -> (CollectorContext, Arc<AtomicUsize>) {
    let renders = Arc::new(AtomicUsize::new(0));
    let browser = StubBrowser {
        html: page_html.to_string(),
        renders: renders.clone(),
    };
    let extractor = CafefPageExtractor::new(Arc::new(browser)).with_render_wait(Duration::ZERO);
    let coordinator = AcquisitionCoordinator::new(Arc::new(api), extractor).with_history_template(
        Some(UrlTemplate::parse("https://cafef.vn/lich-su-{symbol_lower}.chn").unwrap()),
    );
    let storage = CsvStorage::new(out.join("historical"), out.join("realtime"));
    (
        CollectorContext::new(coordinator, storage, Duration::from_millis(10)),
        renders,
    )
}
