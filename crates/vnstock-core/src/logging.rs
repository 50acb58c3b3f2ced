//! tracing 기반 로깅 초기화.
//!
//! 수집기 바이너리는 시작 시 한 번 [`init_logging`]을 호출합니다.
//! - **pretty**: 터미널에서 읽기 쉬운 형식
//! - **json**: 로그 수집기로 보내기 위한 JSON 형식
//! - **compact**: cron 실행 등에 쓰는 한 줄 형식
//!
//! `RUST_LOG`가 설정되어 있으면 `LogConfig::level`보다 우선합니다.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 사람이 읽기 쉬운 형식
    #[default]
    Pretty,
    /// JSON 형식
    Json,
    /// 간결한 한 줄 형식
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 기본 필터 (예: "info", "vnstock_data=debug")
    pub level: String,
    /// 출력 형식
    pub format: LogFormat,
    /// 대상(모듈 경로) 포함 여부
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            with_target: false,
        }
    }
}

impl LogConfig {
    /// 레벨만 지정해 생성합니다.
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    /// 로그 형식을 설정합니다.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// 모듈 경로 출력 여부를 설정합니다.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// 크레이트 이름 접두사를 붙인 필터 문자열을 만듭니다.
    ///
    /// `"debug"` → `"vnstock_core=debug,vnstock_data=debug,vnstock_collector=debug"`.
    /// 이미 `=`가 포함된 지시어는 그대로 사용합니다.
    pub fn filter_directive(&self) -> String {
        if self.level.contains('=') {
            return self.level.clone();
        }
        ["vnstock_core", "vnstock_data", "vnstock_collector"]
            .iter()
            .map(|krate| format!("{}={}", krate, self.level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// 주어진 설정으로 전역 subscriber를 설치합니다.
///
/// 두 번 호출하면 에러를 반환합니다.
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.filter_directive()))?;

    // stdout은 `symbols` 명령 출력용이므로 로그는 stderr로 보냅니다.
    match config.format {
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_target(config.with_target);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(layer)
                .try_init()?;
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(config.with_target);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(layer)
                .try_init()?;
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(config.with_target);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(layer)
                .try_init()?;
        }
    }

    tracing::debug!(format = ?config.format, level = %config.level, "Logging initialized");
    Ok(())
}

/// 종목/단계 필드를 가진 span을 생성하는 매크로.
#[macro_export]
macro_rules! symbol_span {
    ($name:expr, $symbol:expr) => {
        tracing::info_span!($name, symbol = %$symbol)
    };
    ($name:expr, $symbol:expr, $stage:expr) => {
        tracing::info_span!($name, symbol = %$symbol, stage = $stage)
    };
}
