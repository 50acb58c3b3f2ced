//! 환경변수 기반 설정 모듈.
//!
//! `.env` 파일과 `VNSTOCK_*` 환경변수에서 기본값을 읽고,
//! 명령행 옵션은 [`CollectorConfig`]를 만든 뒤 덮어씁니다.

use crate::error::CollectorError;
use crate::Result;
use std::path::PathBuf;
use std::time::Duration;
use vnstock_data::provider::cafef_api::{DEFAULT_BASE_URL, MAX_PAGE_SIZE};
use vnstock_data::provider::DEFAULT_HISTORY_PAGE_TEMPLATE;
use vnstock_data::{CafefApiConfig, UrlTemplate};

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// JSON API 설정
    pub api: ApiConfig,
    /// HTML fallback 설정
    pub fallback: FallbackConfig,
    /// 출력 디렉터리
    pub output: OutputConfig,
    /// 실시간 폴링 설정
    pub realtime: RealtimeConfig,
}

/// JSON API 설정
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API 기본 URL
    pub base_url: String,
    /// HTTP 요청 타임아웃 (초)
    pub http_timeout_secs: u64,
    /// 페이지당 행 수
    pub page_size: u32,
    /// 종목당 최대 페이지 수
    pub max_pages: u32,
    /// 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
}

/// HTML fallback 설정
#[derive(Debug, Clone)]
pub struct FallbackConfig {
    /// 거래 이력 페이지 템플릿
    pub history_page_template: String,
    /// 가격 위젯 대기 시간 (밀리초)
    pub render_wait_ms: u64,
    /// 페이지 로드 타임아웃 (초)
    pub page_load_timeout_secs: u64,
    /// WebDriver 서버 URL (없으면 HTTP 렌더링)
    pub webdriver_url: Option<String>,
}

/// 출력 디렉터리
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub historical_dir: PathBuf,
    pub realtime_dir: PathBuf,
}

/// 실시간 폴링 설정
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// 폴링 간격 (초)
    pub poll_interval_secs: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정을 만듭니다. 값이 없거나 파싱에 실패하면 기본값.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let parse = |key: &str, default: u64| -> u64 {
            lookup(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
        };
        let text = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let config = Self {
            api: ApiConfig {
                base_url: text("VNSTOCK_BASE_URL", DEFAULT_BASE_URL),
                http_timeout_secs: parse("VNSTOCK_HTTP_TIMEOUT_SECS", 30),
                page_size: lookup("VNSTOCK_PAGE_SIZE")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(MAX_PAGE_SIZE),
                max_pages: lookup("VNSTOCK_MAX_PAGES")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(50),
                request_delay_ms: parse("VNSTOCK_REQUEST_DELAY_MS", 500),
            },
            fallback: FallbackConfig {
                history_page_template: text(
                    "VNSTOCK_HISTORY_PAGE_TEMPLATE",
                    DEFAULT_HISTORY_PAGE_TEMPLATE,
                ),
                render_wait_ms: parse("VNSTOCK_RENDER_WAIT_MS", 5000),
                page_load_timeout_secs: parse("VNSTOCK_PAGE_LOAD_TIMEOUT_SECS", 30),
                webdriver_url: lookup("VNSTOCK_WEBDRIVER_URL").filter(|v| !v.trim().is_empty()),
            },
            output: OutputConfig {
                historical_dir: PathBuf::from(text("VNSTOCK_HISTORICAL_DIR", "data/historical")),
                realtime_dir: PathBuf::from(text("VNSTOCK_REALTIME_DIR", "data/realtime")),
            },
            realtime: RealtimeConfig {
                poll_interval_secs: parse("VNSTOCK_POLL_INTERVAL_SECS", 60),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// 값 범위 검증. 명령행 옵션을 덮어쓴 뒤에도 다시 호출합니다.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.api.page_size) {
            return Err(CollectorError::Config(format!(
                "페이지 크기는 1~{} 범위여야 합니다: {}",
                MAX_PAGE_SIZE, self.api.page_size
            )));
        }
        if self.api.max_pages == 0 {
            return Err(CollectorError::Config("최대 페이지 수는 1 이상이어야 합니다".to_string()));
        }
        if self.realtime.poll_interval_secs == 0 {
            return Err(CollectorError::Config("폴링 간격은 1초 이상이어야 합니다".to_string()));
        }
        self.history_template()?;
        Ok(())
    }

    /// 거래 이력 fallback 템플릿.
    pub fn history_template(&self) -> Result<UrlTemplate> {
        UrlTemplate::parse(&self.fallback.history_page_template).map_err(CollectorError::Config)
    }

    /// API 클라이언트 설정.
    pub fn api_client_config(&self) -> CafefApiConfig {
        CafefApiConfig {
            base_url: self.api.base_url.clone(),
            page_size: self.api.page_size,
            max_pages: self.api.max_pages,
            timeout: Duration::from_secs(self.api.http_timeout_secs),
            page_delay: self.request_delay(),
        }
    }

    /// 요청 간 딜레이.
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.api.request_delay_ms)
    }

    /// 가격 위젯 대기 시간.
    pub fn render_wait(&self) -> Duration {
        Duration::from_millis(self.fallback.render_wait_ms)
    }

    /// 페이지 로드 타임아웃.
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.fallback.page_load_timeout_secs)
    }

    /// 폴링 간격.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.realtime.poll_interval_secs)
    }
}
