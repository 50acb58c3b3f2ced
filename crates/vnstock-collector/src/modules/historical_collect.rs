//! 일별 시세 수집 모듈.

use crate::{CollectionStats, CollectorContext};
use std::time::Instant;
use tracing::Instrument;
use vnstock_data::{DateRange, HistoricalWritePolicy, SymbolRegistry};

/// `historical` 실행 옵션
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoricalOptions {
    /// 조회 기간
    pub range: DateRange,
    /// 기존 파일 처리 방식
    pub policy: HistoricalWritePolicy,
}

/// 종목별 일별 시세를 수집해 CSV로 저장합니다.
///
/// 종목 하나의 실패는 기록만 하고 다음 종목으로 넘어갑니다.
pub async fn collect_historical(
    ctx: &CollectorContext,
    symbols: &SymbolRegistry,
    options: HistoricalOptions,
) -> CollectionStats {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    tracing::info!(
        symbols = symbols.len(),
        start_date = ?options.range.start,
        end_date = ?options.range.end,
        policy = ?options.policy,
        "일별 시세 수집 시작"
    );

    for (idx, symbol) in symbols.iter().enumerate() {
        if idx > 0 && !ctx.request_delay.is_zero() {
            tokio::time::sleep(ctx.request_delay).await;
        }
        stats.total += 1;

        let span = vnstock_core::symbol_span!("historical", symbol);
        async {
            tracing::debug!(progress = format!("{}/{}", idx + 1, symbols.len()), "수집 시작");

            let acquired = match ctx.coordinator.acquire_history(symbol, options.range).await {
                Ok(acquired) => acquired,
                Err(e) => {
                    stats.errors += 1;
                    tracing::error!(
                        stage = "acquire",
                        api_kind = e.api.kind(),
                        fallback_kind = e.fallback.kind(),
                        error = %e,
                        "수집 실패"
                    );
                    return;
                }
            };
            if acquired.used_fallback() {
                stats.fallback_used += 1;
            }

            match ctx
                .storage
                .write_historical(symbol, &acquired.records, options.policy)
            {
                Ok(rows) => {
                    stats.success += 1;
                    stats.rows_written += rows;
                    tracing::info!(rows, source = %acquired.source, "수집 및 저장 완료");
                }
                Err(e) => {
                    stats.write_errors += 1;
                    tracing::error!(stage = "write", error = %e, "저장 실패");
                }
            }
        }
        .instrument(span)
        .await;
    }

    stats.elapsed = start.elapsed();
    stats
}
