//! 에러 타입 정의.
//!
//! 종목 단위 수집/저장 실패는 러너가 로그와 통계로 처리하므로 여기에는
//! 실행 전체를 중단시키는 에러만 둡니다.

use std::fmt;
use vnstock_data::SymbolError;

/// Collector 에러 타입
#[derive(Debug)]
pub enum CollectorError {
    /// 설정 에러 (잘못된 옵션, 템플릿, 간격, 클라이언트 초기화 등)
    Config(String),
    /// 종목 목록 에러
    Symbols(SymbolError),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Symbols(e) => write!(f, "Symbol list error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::Symbols(e) => Some(e),
        }
    }
}

impl From<SymbolError> for CollectorError {
    fn from(err: SymbolError) -> Self {
        Self::Symbols(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
