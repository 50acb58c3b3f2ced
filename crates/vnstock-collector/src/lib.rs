//! cafef.vn standalone data collector.
//!
//! 이 crate는 수집기 바이너리와 그 실행 단위를 제공합니다:
//! - 일별 시세 CSV 수집 (`historical`)
//! - 실시간 시세 주기 폴링 (`realtime`)
//! - 종목 목록 검증/조회 (`symbols`)

pub mod config;
pub mod context;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use context::CollectorContext;
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
