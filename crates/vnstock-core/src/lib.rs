//! # VnStock Core
//!
//! 베트남 주식 데이터 수집기의 핵심 도메인 타입을 제공합니다.
//!
//! 이 크레이트는 수집기 전반에서 사용되는 기본 타입을 제공합니다:
//! - 종목 심볼 (`Symbol`)
//! - 일별 시세 (`HistoricalBar`)
//! - 실시간 시세 스냅샷 (`RealtimeQuote`)
//! - 베트남식 숫자/날짜 문자열 파싱
//! - 로깅 인프라

pub mod error;
pub mod logging;
pub mod parse;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use types::*;
