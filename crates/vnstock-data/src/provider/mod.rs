//! cafef.vn 데이터 프로바이더.
//!
//! - `cafef_api`: JSON 가격 이력 API (1차 경로)
//! - `cafef_page`: 렌더링된 HTML 페이지 추출 (fallback)
//! - `browser`: 페이지 렌더링 capability와 HTTP 구현
//! - `webdriver`: WebDriver 기반 실제 브라우저 (`webdriver` feature)

pub mod browser;
pub mod cafef_api;
pub mod cafef_page;
#[cfg(feature = "webdriver")]
pub mod webdriver;

pub use browser::{BrowserDriver, HttpPageDriver, RenderedPage, StaticPage};
pub use cafef_api::{CafefApiClient, CafefApiConfig, DateRange, PriceHistoryApi};
pub use cafef_page::{
    CafefPageExtractor, PageQuote, QuoteSelectors, UrlTemplate, DEFAULT_HISTORY_PAGE_TEMPLATE,
    DEFAULT_RENDER_WAIT,
};
#[cfg(feature = "webdriver")]
pub use webdriver::WebDriverBrowser;
