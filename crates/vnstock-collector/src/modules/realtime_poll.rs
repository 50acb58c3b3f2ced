//! 실시간 시세 폴링 모듈.
//!
//! 고정 간격으로 모든 종목의 스냅샷을 수집해 종목별 파일 끝에 추가합니다.
//! 종료 신호는 폴링 사이 대기 중에만 반영되며, 진행 중인 요청은 끝까지 처리합니다.

use crate::{CollectionStats, CollectorContext};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;
use vnstock_data::{MonotonicClock, PollScheduler, SymbolRegistry, TickDecision, UrlTemplate};

/// `realtime` 실행 옵션
#[derive(Debug, Clone)]
pub struct RealtimeOptions {
    /// fallback 페이지 템플릿
    pub page_template: Option<UrlTemplate>,
    /// 폴링 간격
    pub interval: Duration,
    /// 최대 폴링 횟수 (`None`이면 종료 신호까지)
    pub iterations: Option<u64>,
}

/// 폴링 루프 실행.
///
/// `shutdown`이 완료되면 다음 폴링 전에 멈춥니다.
pub async fn poll_realtime(
    ctx: &CollectorContext,
    symbols: &SymbolRegistry,
    options: &RealtimeOptions,
    shutdown: impl Future<Output = ()>,
) -> CollectionStats {
    let start = std::time::Instant::now();
    let mut stats = CollectionStats::new();
    let clock = MonotonicClock::start();
    let mut scheduler = PollScheduler::new(options.interval, options.iterations);
    let mut last_tick: Option<Instant> = None;
    tokio::pin!(shutdown);

    tracing::info!(
        symbols = symbols.len(),
        interval_secs = options.interval.as_secs(),
        iterations = ?options.iterations,
        "실시간 폴링 시작"
    );

    loop {
        match scheduler.decide(last_tick.map(|tick| tick.elapsed())) {
            TickDecision::Finished => {
                tracing::info!(ticks = scheduler.completed(), "폴링 횟수 도달");
                break;
            }
            TickDecision::Wait(remaining) => {
                tokio::select! {
                    _ = &mut shutdown => {
                        tracing::info!("종료 신호 수신, 폴링 종료 중...");
                        break;
                    }
                    _ = tokio::time::sleep(remaining) => {}
                }
            }
            TickDecision::PollNow => {
                last_tick = Some(Instant::now());
                let captured_at = clock.now();
                poll_once(ctx, symbols, options, captured_at, &mut stats).await;
                scheduler.record_poll();
                tracing::debug!(tick = scheduler.completed(), "폴링 완료");
            }
        }
    }

    stats.ticks = scheduler.completed();
    stats.elapsed = start.elapsed();
    stats
}

/// 한 번의 폴링: 모든 종목의 스냅샷을 수집해 추가합니다.
async fn poll_once(
    ctx: &CollectorContext,
    symbols: &SymbolRegistry,
    options: &RealtimeOptions,
    captured_at: DateTime<Utc>,
    stats: &mut CollectionStats,
) {
    for (idx, symbol) in symbols.iter().enumerate() {
        if idx > 0 && !ctx.request_delay.is_zero() {
            tokio::time::sleep(ctx.request_delay).await;
        }
        stats.total += 1;

        let span = vnstock_core::symbol_span!("realtime", symbol);
        async {
            let acquired = match ctx
                .coordinator
                .acquire_quote(symbol, options.page_template.as_ref(), captured_at)
                .await
            {
                Ok(acquired) => acquired,
                Err(e) => {
                    stats.errors += 1;
                    tracing::warn!(stage = "acquire", error = %e, "시세 수집 실패, 건너뜀");
                    return;
                }
            };
            if acquired.used_fallback() {
                stats.fallback_used += 1;
            }

            match ctx.storage.append_realtime(&acquired.records) {
                Ok(()) => {
                    stats.success += 1;
                    stats.rows_written += 1;
                    tracing::debug!(price = %acquired.records.price, source = %acquired.source, "시세 기록");
                }
                Err(e) => {
                    stats.write_errors += 1;
                    tracing::warn!(stage = "write", error = %e, "시세 저장 실패");
                }
            }
        }
        .instrument(span)
        .await;
    }
}
