//! Standalone cafef.vn data collector CLI.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use vnstock_collector::modules::{self, HistoricalOptions, RealtimeOptions, SymbolSource};
use vnstock_collector::{CollectorConfig, CollectorContext, CollectorError, Result};
use vnstock_core::{init_logging, LogConfig, LogFormat};
use vnstock_data::{DateRange, HistoricalWritePolicy, SymbolRegistry, UrlTemplate};

#[derive(Parser)]
#[command(name = "vnstock-collector")]
#[command(about = "cafef.vn Vietnamese stock data collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    /// WebDriver 서버 URL (fallback 페이지를 실제 브라우저로 렌더링)
    #[arg(long, global = true)]
    webdriver_url: Option<String>,
}

/// 종목 지정 옵션 (`--symbol`, `--symbols-file` 중 하나 이상)
#[derive(Args, Debug)]
#[group(required = true, multiple = true)]
struct SymbolArgs {
    /// 종목 (쉼표로 구분, 예: "ACV,VNM")
    #[arg(long)]
    symbol: Option<String>,

    /// 종목 파일 (한 줄에 하나)
    #[arg(long)]
    symbols_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// 일별 시세를 종목별 CSV로 저장
    Historical {
        #[command(flatten)]
        symbols: SymbolArgs,

        /// 출력 디렉터리 (기본: data/historical)
        #[arg(long)]
        outdir: Option<PathBuf>,

        /// 시작일 (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<NaiveDate>,

        /// 종료일 (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<NaiveDate>,

        /// fallback 거래 이력 페이지 템플릿 ({symbol}, {symbol_lower})
        #[arg(long)]
        url_template: Option<String>,

        /// 기존 파일과 날짜 기준 병합 (기본: 덮어쓰기)
        #[arg(long)]
        merge: bool,
    },

    /// 실시간 시세를 주기적으로 수집해 종목별 CSV에 추가
    Realtime {
        #[command(flatten)]
        symbols: SymbolArgs,

        /// fallback 종목 페이지 템플릿 ({symbol}, {symbol_lower})
        #[arg(long)]
        url_template: String,

        /// 폴링 간격 (초)
        #[arg(long)]
        interval: u64,

        /// 최대 폴링 횟수 (생략 시 Ctrl-C까지)
        #[arg(long)]
        iterations: Option<u64>,

        /// 출력 디렉터리 (기본: data/realtime)
        #[arg(long)]
        outdir: Option<PathBuf>,
    },

    /// 종목 목록 검증 후 출력
    Symbols {
        /// 종목 파일
        #[arg(long, conflicts_with = "from_url", required_unless_present = "from_url")]
        from_file: Option<PathBuf>,

        /// 종목 목록 페이지 URL
        #[arg(long)]
        from_url: Option<String>,
    },
}

impl SymbolArgs {
    fn load(&self) -> Result<SymbolRegistry> {
        Ok(SymbolRegistry::from_sources(
            self.symbol.as_deref(),
            self.symbols_file.as_deref(),
        )?)
    }
}

fn parse_template(raw: &str) -> Result<UrlTemplate> {
    UrlTemplate::parse(raw).map_err(CollectorError::Config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 로깅 초기화
    let log_config = LogConfig::new(cli.log_level.clone()).with_format(cli.log_format);
    if let Err(e) = init_logging(log_config) {
        eprintln!("로깅 초기화 실패: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!("VnStock Data Collector 시작");

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "실행 실패");
            ExitCode::FAILURE
        }
    };

    tracing::info!("VnStock Data Collector 종료");
    code
}

async fn run(cli: Cli) -> Result<ExitCode> {
    // 설정 로드
    let mut config = CollectorConfig::from_env()?;
    if cli.webdriver_url.is_some() {
        config.fallback.webdriver_url = cli.webdriver_url;
    }

    match cli.command {
        Commands::Historical {
            symbols,
            outdir,
            start_date,
            end_date,
            url_template,
            merge,
        } => {
            if let Some(dir) = outdir {
                config.output.historical_dir = dir;
            }
            if let Some(template) = url_template {
                config.fallback.history_page_template = template;
            }
            if let (Some(start), Some(end)) = (start_date, end_date) {
                if start > end {
                    return Err(CollectorError::Config(format!(
                        "시작일 {}이 종료일 {}보다 늦습니다",
                        start, end
                    )));
                }
            }
            config.validate()?;

            let registry = symbols.load()?;
            let ctx = CollectorContext::from_config(&config)?;
            let options = HistoricalOptions {
                range: DateRange::new(start_date, end_date),
                policy: if merge {
                    HistoricalWritePolicy::MergeByDate
                } else {
                    HistoricalWritePolicy::Overwrite
                },
            };

            let stats = modules::collect_historical(&ctx, &registry, options).await;
            stats.log_summary("일별 시세 수집");

            Ok(if stats.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Realtime {
            symbols,
            url_template,
            interval,
            iterations,
            outdir,
        } => {
            if let Some(dir) = outdir {
                config.output.realtime_dir = dir;
            }
            config.realtime.poll_interval_secs = interval;
            config.validate()?;

            let page_template = Some(parse_template(&url_template)?);

            let registry = symbols.load()?;
            let ctx = CollectorContext::from_config(&config)?;
            let options = RealtimeOptions {
                page_template,
                interval: config.poll_interval(),
                iterations,
            };

            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "종료 신호 대기 실패");
                    std::future::pending::<()>().await;
                }
            };

            let stats = modules::poll_realtime(&ctx, &registry, &options, shutdown).await;
            stats.log_summary("실시간 시세 수집");

            // 종목별 실패는 건너뛰므로 종료 코드에 반영하지 않음
            Ok(ExitCode::SUCCESS)
        }
        Commands::Symbols {
            from_file,
            from_url,
        } => {
            let source = match (&from_file, &from_url) {
                (Some(path), _) => SymbolSource::File(path),
                (None, Some(url)) => SymbolSource::Url(url),
                (None, None) => {
                    return Err(CollectorError::Config(
                        "--from-file 또는 --from-url이 필요합니다".to_string(),
                    ))
                }
            };

            let timeout = Duration::from_secs(config.api.http_timeout_secs);
            let registry = modules::load_symbols(source, timeout).await?;
            print!("{}", modules::render_symbols(&registry));
            Ok(ExitCode::SUCCESS)
        }
    }
}
