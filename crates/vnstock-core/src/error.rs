//! 도메인 타입 에러.

use thiserror::Error;

/// 도메인 값 생성/파싱 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// 잘못된 종목 심볼
    #[error("잘못된 심볼: {0:?}")]
    InvalidSymbol(String),

    /// 숫자 파싱 실패
    #[error("숫자 파싱 실패: {0:?}")]
    InvalidNumber(String),

    /// 날짜 파싱 실패
    #[error("날짜 파싱 실패: {0:?}")]
    InvalidDate(String),

    /// 불변식 위반 (음수 가격 등)
    #[error("잘못된 값: {field} = {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// 도메인 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;
