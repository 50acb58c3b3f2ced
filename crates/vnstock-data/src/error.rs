//! 수집/저장 경로별 에러 타입.
//!
//! API 경로와 fallback 경로의 에러는 코디네이터가 잡아서
//! [`AcquisitionFailed`] 하나로 묶어 호출자에게 전달합니다.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use vnstock_core::{CoreError, Symbol};

/// JSON API 경로 에러.
///
/// 모든 variant는 코디네이터에서 "API 실패"로 취급되어 fallback을 유발합니다.
/// 구분은 로그/진단용입니다.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 네트워크 오류 또는 타임아웃
    #[error("API 전송 실패: {0}")]
    Transport(#[from] reqwest::Error),

    /// 2xx가 아닌 HTTP 상태
    #[error("API HTTP 오류: {status}")]
    Upstream { status: u16 },

    /// JSON 파싱 실패, 필수 필드 누락, 숫자가 아닌 값
    #[error("API 응답 형식 오류: {0}")]
    MalformedResponse(String),

    /// 페이지 간 TotalCount 불일치 또는 중간 페이지 누락
    #[error("페이지네이션 불완전: {0}")]
    IncompletePagination(String),

    /// 조회는 성공했으나 레코드 없음
    #[error("API 데이터 없음")]
    NoRecords,
}

impl ApiError {
    /// 로그 필드용 분류 이름.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Transport(_) => "transport",
            ApiError::Upstream { .. } => "upstream",
            ApiError::MalformedResponse(_) => "malformed_response",
            ApiError::IncompletePagination(_) => "incomplete_pagination",
            ApiError::NoRecords => "no_records",
        }
    }
}

/// HTML fallback 경로 에러.
#[derive(Debug, Error)]
pub enum FallbackError {
    /// 페이지 로드 타임아웃
    #[error("페이지 로드 타임아웃 ({timeout:?}): {url}")]
    RenderTimeout { url: String, timeout: Duration },

    /// 브라우저 실행/이동 실패
    #[error("브라우저 오류: {0}")]
    Browser(String),

    /// 필수 DOM 요소를 하나도 찾지 못함
    #[error("추출 실패 ({url}): {reason}")]
    ExtractionFailed { url: String, reason: String },
}

impl FallbackError {
    /// 로그 필드용 분류 이름.
    pub fn kind(&self) -> &'static str {
        match self {
            FallbackError::RenderTimeout { .. } => "render_timeout",
            FallbackError::Browser(_) => "browser",
            FallbackError::ExtractionFailed { .. } => "extraction_failed",
        }
    }
}

/// 두 경로가 모두 실패했을 때의 집계 에러.
#[derive(Debug, Error)]
#[error("{symbol} 수집 실패 - API: {api}; fallback: {fallback}")]
pub struct AcquisitionFailed {
    /// 대상 종목
    pub symbol: Symbol,
    /// API 경로 에러
    pub api: ApiError,
    /// fallback 경로 에러
    pub fallback: FallbackError,
}

/// CSV 저장 에러. 해당 종목의 파일에만 영향을 줍니다.
#[derive(Debug, Error)]
pub enum WriteError {
    /// 파일 시스템 오류
    #[error("파일 쓰기 실패 ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV 직렬화/역직렬화 오류
    #[error("CSV 처리 실패 ({}): {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// 심볼 목록 로딩 에러.
#[derive(Debug, Error)]
pub enum SymbolError {
    /// 파일을 읽을 수 없음
    #[error("심볼 파일을 읽을 수 없음 ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 잘못된 심볼 행
    #[error("{origin}:{line}: {source}")]
    Invalid {
        origin: String,
        line: usize,
        #[source]
        source: CoreError,
    },

    /// 유효한 심볼이 하나도 없음
    #[error("심볼 목록이 비어 있음: {0}")]
    Empty(String),

    /// 목록 페이지 조회 실패
    #[error("심볼 페이지 조회 실패: {0}")]
    Fetch(String),
}
