//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 수집 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 총 시도 횟수 (종목 × 폴링 횟수)
    pub total: usize,
    /// 수집 및 저장 성공 횟수
    pub success: usize,
    /// 수집 실패 횟수 (API, fallback 모두 실패)
    pub errors: usize,
    /// fallback 경로로 성공한 횟수
    pub fallback_used: usize,
    /// 저장 실패 횟수
    pub write_errors: usize,
    /// 기록된 총 행 수
    pub rows_written: usize,
    /// 실행된 폴링 횟수 (실시간 모드)
    pub ticks: u64,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 실패가 하나라도 있었는지 (종료 코드 결정용)
    pub fn has_failures(&self) -> bool {
        self.errors > 0 || self.write_errors > 0
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            fallback_used = self.fallback_used,
            write_errors = self.write_errors,
            rows_written = self.rows_written,
            ticks = self.ticks,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}
