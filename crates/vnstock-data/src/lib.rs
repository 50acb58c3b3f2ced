//! cafef.vn 데이터 수집 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - cafef JSON 가격 이력 API 클라이언트 (페이지네이션 포함)
//! - 렌더링된 HTML 페이지 fallback 추출기
//! - API → HTML fallback 수집 코디네이터
//! - 종목별 CSV 저장소
//! - 종목 목록 로딩
//! - 실시간 폴링 스케줄러

pub mod acquisition;
pub mod error;
pub mod provider;
pub mod schedule;
pub mod storage;
pub mod symbols;

pub use error::{AcquisitionFailed, ApiError, FallbackError, SymbolError, WriteError};

// 수집 경로 재내보내기
pub use acquisition::{Acquired, AcquisitionCoordinator, AcquisitionResult};
pub use provider::{
    BrowserDriver, CafefApiClient, CafefApiConfig, CafefPageExtractor, DateRange,
    HttpPageDriver, PriceHistoryApi, QuoteSelectors, UrlTemplate,
};

// 저장소/스케줄 재내보내기
pub use schedule::{MonotonicClock, PollScheduler, TickDecision};
pub use storage::{CsvStorage, HistoricalWritePolicy};
pub use symbols::SymbolRegistry;
