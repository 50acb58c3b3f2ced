//! 실행 컨텍스트: 설정으로부터 수집/저장 구성요소를 한 번 조립합니다.

use crate::error::CollectorError;
use crate::{CollectorConfig, Result};
use std::sync::Arc;
use std::time::Duration;
use vnstock_data::{
    AcquisitionCoordinator, BrowserDriver, CafefApiClient, CafefPageExtractor, CsvStorage,
    HttpPageDriver,
};

/// 수집 실행에 필요한 구성요소 묶음.
#[derive(Clone)]
pub struct CollectorContext {
    pub coordinator: AcquisitionCoordinator,
    pub storage: CsvStorage,
    /// 종목 간 요청 딜레이
    pub request_delay: Duration,
}

impl CollectorContext {
    /// 구성요소를 직접 지정해 생성합니다.
    pub fn new(
        coordinator: AcquisitionCoordinator,
        storage: CsvStorage,
        request_delay: Duration,
    ) -> Self {
        Self {
            coordinator,
            storage,
            request_delay,
        }
    }

    /// 설정으로부터 API 클라이언트, 브라우저, 저장소를 조립합니다.
    pub fn from_config(config: &CollectorConfig) -> Result<Self> {
        let api = CafefApiClient::new(config.api_client_config())
            .map_err(|e| CollectorError::Config(format!("API 클라이언트 생성 실패: {}", e)))?;

        let driver = browser_driver(config)?;
        let extractor = CafefPageExtractor::new(driver).with_render_wait(config.render_wait());

        let coordinator = AcquisitionCoordinator::new(Arc::new(api), extractor)
            .with_history_template(Some(config.history_template()?));

        let storage = CsvStorage::new(
            config.output.historical_dir.clone(),
            config.output.realtime_dir.clone(),
        );

        tracing::debug!(
            base_url = %config.api.base_url,
            historical_dir = %config.output.historical_dir.display(),
            realtime_dir = %config.output.realtime_dir.display(),
            "실행 컨텍스트 구성 완료"
        );

        Ok(Self::new(coordinator, storage, config.request_delay()))
    }
}

#[cfg(feature = "webdriver")]
fn browser_driver(config: &CollectorConfig) -> Result<Arc<dyn BrowserDriver>> {
    use vnstock_data::provider::WebDriverBrowser;

    match &config.fallback.webdriver_url {
        Some(url) => {
            tracing::info!(webdriver = %url, "WebDriver 브라우저 사용");
            Ok(Arc::new(WebDriverBrowser::new(url.clone(), config.page_load_timeout())))
        }
        None => http_driver(config),
    }
}

#[cfg(not(feature = "webdriver"))]
fn browser_driver(config: &CollectorConfig) -> Result<Arc<dyn BrowserDriver>> {
    if config.fallback.webdriver_url.is_some() {
        return Err(CollectorError::Config(
            "--webdriver-url을 사용하려면 `webdriver` feature로 빌드해야 합니다".to_string(),
        ));
    }
    http_driver(config)
}

fn http_driver(config: &CollectorConfig) -> Result<Arc<dyn BrowserDriver>> {
    let driver = HttpPageDriver::new(config.page_load_timeout())
        .map_err(|e| CollectorError::Config(format!("HTTP 페이지 드라이버 생성 실패: {}", e)))?;
    Ok(Arc::new(driver))
}
